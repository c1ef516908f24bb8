use std::iter::Peekable;

use crate::{
    ast::{
        BinaryOperator, ComparisonOperator, ConversionTarget, Expr, LogicalOperator, TypeName,
        UnaryOperator,
    },
    error::ParseError,
    interpreter::{
        lexer::{Keyword, Token},
        parser::{
            core::ParseResult,
            unary::parse_unary,
            units::{scan_units, starts_unit},
            utils::{peek, peek_nth, token_text},
        },
        units,
    },
};

/// Parses logical OR expressions.
///
/// Grammar: `logical_or := logical_and (("or" | "||") logical_and)*`
pub fn parse_logical_or<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_logical_and(tokens)?;
    while let Some((Token::Or, offset)) = peek(tokens) {
        tokens.next();
        let right = parse_logical_and(tokens)?;
        left = Expr::Logical { left:   Box::new(left),
                               op:     LogicalOperator::Or,
                               right:  Box::new(right),
                               offset: *offset, };
    }
    Ok(left)
}

/// Parses logical AND expressions.
///
/// Grammar: `logical_and := comparison (("and" | "&&") comparison)*`
pub fn parse_logical_and<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_comparison(tokens)?;
    while let Some((Token::And, offset)) = peek(tokens) {
        tokens.next();
        let right = parse_comparison(tokens)?;
        left = Expr::Logical { left:   Box::new(left),
                               op:     LogicalOperator::And,
                               right:  Box::new(right),
                               offset: *offset, };
    }
    Ok(left)
}

/// Parses relational, equality and `is` type-check expressions.
///
/// Grammar: `comparison := conversion ((CMP conversion) | ("is" TYPE))*`
///
/// # Errors
/// `ExpectedToken` if `is` is not followed by a known type name.
pub fn parse_comparison<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_conversion(tokens)?;
    loop {
        let Some((token, offset)) = peek(tokens) else {
            break;
        };
        if let Token::Keyword(Keyword::Is) = token {
            tokens.next();
            let type_name = match tokens.next() {
                Some((token, offset)) => {
                    token_text(token).and_then(TypeName::from_name).ok_or_else(|| {
                        ParseError::ExpectedToken { expected: "type name after 'is'",
                                                    found:    token.to_string(),
                                                    offset:   *offset, }
                    })?
                },
                None => return Err(ParseError::UnexpectedEndOfInput { offset: *offset }),
            };
            left = Expr::TypeCheck { expr: Box::new(left),
                                     type_name,
                                     offset: *offset };
            continue;
        }
        let Some(op) = token_to_comparison_operator(token) else {
            break;
        };
        tokens.next();
        let right = parse_conversion(tokens)?;
        left = Expr::Comparison { left: Box::new(left),
                                  op,
                                  right: Box::new(right),
                                  offset: *offset };
    }
    Ok(left)
}

/// Parses `as` / `to` / `in` conversions.
///
/// The keyword is disambiguated by what follows it, in this order:
///
/// 1. a type name makes it a cast (`x as string`);
/// 2. a timezone after an instant-like operand makes it a timezone
///    conversion (`now in Tokyo`);
/// 3. a unit or currency makes it a unit conversion (`5 km in miles`),
///    unless the operand is a date literal;
/// 4. any other name or keyword after an instant-like operand is taken as a
///    timezone, to be validated at evaluation (`now to Atlantis` fails there);
/// 5. otherwise the keyword is dropped and the operand returned unchanged.
///
/// Grammar: `conversion := of (("as" | "to" | "in") target)*`
pub fn parse_conversion<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_of(tokens)?;
    while let Some((Token::Keyword(keyword), offset)) = peek(tokens)
          && keyword.is_conversion()
    {
        tokens.next();
        let offset = *offset;
        let Some((target, _)) = peek(tokens) else {
            break;
        };

        if let Some(type_name) = token_text(target).and_then(TypeName::from_name) {
            tokens.next();
            left = Expr::TypeCast { expr: Box::new(left),
                                    target: type_name,
                                    offset };
            continue;
        }
        if let Token::Timezone(zone) = target
           && left.may_be_instant()
        {
            tokens.next();
            left = conversion(left, ConversionTarget::Timezone(zone.clone()), offset);
            continue;
        }
        if !left.is_date_literal()
           && let Some(units) = scan_units(tokens)
        {
            left = conversion(left, ConversionTarget::Units(units), offset);
            continue;
        }
        if left.may_be_instant()
           && let Some(zone) = token_text(target)
        {
            tokens.next();
            left = conversion(left, ConversionTarget::Timezone(zone.to_string()), offset);
            continue;
        }
    }
    Ok(left)
}

fn conversion(expr: Expr, target: ConversionTarget, offset: usize) -> Expr {
    Expr::Conversion { expr: Box::new(expr),
                       target,
                       offset }
}

/// Parses `X of Y`, which multiplies; with a percentage on the left this
/// reads as "X percent of Y".
///
/// Grammar: `of := additive ("of" additive)*`
pub fn parse_of<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_additive(tokens)?;
    while let Some((Token::Keyword(Keyword::Of), offset)) = peek(tokens) {
        tokens.next();
        let right = parse_additive(tokens)?;
        left = Expr::Binary { left:   Box::new(left),
                              op:     BinaryOperator::Mul,
                              right:  Box::new(right),
                              offset: *offset, };
    }
    Ok(left)
}

/// Parses addition and subtraction.
///
/// Three shapes are rewritten here:
/// - `date ± N unit`, with a calendar unit, becomes a date operation;
/// - `X ± Y%` becomes `X ± X * Y%`;
/// - `Y% ± Z%` becomes `(Y ± Z)%`.
///
/// Grammar: `additive := multiplicative (("+" | "-") multiplicative)*`
pub fn parse_additive<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_multiplicative(tokens)?;
    loop {
        let op = match peek(tokens) {
            Some((Token::Plus, _)) => BinaryOperator::Add,
            Some((Token::Minus, _)) => BinaryOperator::Sub,
            _ => break,
        };
        let Some((_, offset)) = tokens.next() else {
            break;
        };
        let right = parse_multiplicative(tokens)?;
        left = combine_additive(left, op, right, *offset);
    }
    Ok(left)
}

fn combine_additive(left: Expr, op: BinaryOperator, right: Expr, offset: usize) -> Expr {
    if left.is_date_literal()
       && let Expr::Number { value,
                             units: terms,
                             offset: amount_offset, } = &right
       && let [term] = terms.as_slice()
       && term.exponent == 1
       && let Some(unit) = units::lookup(&term.unit).and_then(units::UnitDef::calendar_unit)
    {
        let amount = Expr::Number { value:  *value,
                                    units:  Vec::new(),
                                    offset: *amount_offset, };
        return Expr::DateOperation { date: Box::new(left),
                                     op,
                                     amount: Box::new(amount),
                                     unit,
                                     offset };
    }

    match (left, right) {
        (Expr::Unary { op: UnaryOperator::Percent,
                       expr: left_inner,
                       offset: percent_offset, },
         Expr::Unary { op: UnaryOperator::Percent,
                       expr: right_inner,
                       .. }) => {
            let sum = Expr::Binary { left: left_inner,
                                     op,
                                     right: right_inner,
                                     offset };
            Expr::Unary { op:     UnaryOperator::Percent,
                          expr:   Box::new(sum),
                          offset: percent_offset, }
        },
        (left, right) if right.is_percent() => {
            let share = Expr::Binary { left: Box::new(left.clone()),
                                       op: BinaryOperator::Mul,
                                       right: Box::new(right),
                                       offset };
            Expr::Binary { left: Box::new(left),
                           op,
                           right: Box::new(share),
                           offset }
        },
        (left, right) => Expr::Binary { left: Box::new(left),
                                        op,
                                        right: Box::new(right),
                                        offset },
    }
}

/// Parses multiplication, division and modulo.
///
/// A `%` reaching this level was not taken as a percent sign by the postfix
/// parser, so it is modulo here, as is the word `mod`.
///
/// Grammar: `multiplicative := power (("*" | "/" | "%" | "mod") power)*`
pub fn parse_multiplicative<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_power(tokens)?;
    loop {
        let op = match peek(tokens) {
            Some((Token::Star, _)) => BinaryOperator::Mul,
            Some((Token::Slash, _)) => BinaryOperator::Div,
            Some((Token::Percent | Token::Mod, _)) => BinaryOperator::Mod,
            _ => break,
        };
        let Some((_, offset)) = tokens.next() else {
            break;
        };
        let right = parse_power(tokens)?;
        left = Expr::Binary { left: Box::new(left),
                              op,
                              right: Box::new(right),
                              offset: *offset };
    }
    Ok(left)
}

/// Parses exponentiation with right-associativity: `a ^ b ^ c` parses as
/// `a ^ (b ^ c)`. `**` is lexed as `^`.
///
/// Grammar: `power := bitwise ("^" power)?`
pub fn parse_power<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let left = parse_bitwise(tokens)?;
    let Some((Token::Caret, offset)) = peek(tokens) else {
        return Ok(left);
    };
    tokens.next();
    let right = parse_power(tokens)?;
    Ok(Expr::Binary { left:   Box::new(left),
                      op:     BinaryOperator::Pow,
                      right:  Box::new(right),
                      offset: *offset, })
}

/// Parses the bitwise operators `&`, `|`, `<<` and `>>`, left-associative.
///
/// Grammar: `bitwise := unary (("&" | "|" | "<<" | ">>") unary)*`
pub fn parse_bitwise<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_unary(tokens)?;
    loop {
        let op = match peek(tokens) {
            Some((Token::Ampersand, _)) => BinaryOperator::BitAnd,
            Some((Token::Pipe, _)) => BinaryOperator::BitOr,
            Some((Token::ShiftLeft, _)) => BinaryOperator::Shl,
            Some((Token::ShiftRight, _)) => BinaryOperator::Shr,
            _ => break,
        };
        let Some((_, offset)) = tokens.next() else {
            break;
        };
        let right = parse_unary(tokens)?;
        left = Expr::Binary { left: Box::new(left),
                              op,
                              right: Box::new(right),
                              offset: *offset };
    }
    Ok(left)
}

/// Maps a token to the comparison operator it denotes.
fn token_to_comparison_operator(token: &Token) -> Option<ComparisonOperator> {
    match token {
        Token::EqualEqual => Some(ComparisonOperator::Equal),
        Token::BangEqual => Some(ComparisonOperator::NotEqual),
        Token::Less => Some(ComparisonOperator::Less),
        Token::LessEqual => Some(ComparisonOperator::LessEqual),
        Token::Greater => Some(ComparisonOperator::Greater),
        Token::GreaterEqual => Some(ComparisonOperator::GreaterEqual),
        _ => None,
    }
}

/// Returns `true` if a unit-conversion target follows a conversion keyword
/// at the next token.
pub(in crate::interpreter::parser) fn unit_conversion_ahead<'a, I>(tokens: &Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut cursor = tokens.clone();
    matches!(cursor.next(), Some((Token::Keyword(keyword), _)) if keyword.is_conversion())
    && !matches!(peek_nth(&cursor, 0), Some((token, _))
                 if token_text(token).and_then(TypeName::from_name).is_some())
    && starts_unit(&cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{CalendarUnit, UnitTerm},
        interpreter::{lexer::tokenize, parser::core::parse},
    };

    fn parse_source(source: &str) -> Expr {
        parse(&tokenize(source)).unwrap()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let Expr::Binary { op, right, .. } = parse_source("2 + 3 * 4") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOperator::Add);
        assert!(matches!(*right, Expr::Binary { op: BinaryOperator::Mul, .. }));
    }

    #[test]
    fn power_is_right_associative() {
        let Expr::Binary { right, .. } = parse_source("2 ^ 3 ^ 2") else {
            panic!("expected binary");
        };
        assert!(matches!(*right, Expr::Binary { op: BinaryOperator::Pow, .. }));
    }

    #[test]
    fn date_plus_calendar_quantity_is_a_date_operation() {
        assert!(matches!(parse_source("today + 5 days"),
                         Expr::DateOperation { unit: CalendarUnit::Day,
                                               op: BinaryOperator::Add,
                                               .. }));
        assert!(matches!(parse_source("today + 5 km"), Expr::Binary { .. }));
    }

    #[test]
    fn percent_of_base() {
        let Expr::Binary { right, .. } = parse_source("100 + 10%") else {
            panic!("expected binary");
        };
        assert!(matches!(*right, Expr::Binary { op: BinaryOperator::Mul, .. }));
        assert!(parse_source("5% + 5%").is_percent());
        assert!(matches!(parse_source("20% of 150"), Expr::Binary { op: BinaryOperator::Mul, .. }));
    }

    #[test]
    fn modulo_when_not_a_percentage() {
        assert!(matches!(parse_source("10 % 3"), Expr::Binary { op: BinaryOperator::Mod, .. }));
        assert!(matches!(parse_source("10 mod 3"), Expr::Binary { op: BinaryOperator::Mod, .. }));
    }

    #[test]
    fn conversion_keyword_disambiguation() {
        assert!(matches!(parse_source("x as string"), Expr::TypeCast { target: TypeName::String, .. }));
        assert!(matches!(parse_source("now in Tokyo"),
                         Expr::Conversion { target: ConversionTarget::Timezone(_), .. }));
        let Expr::Conversion { target: ConversionTarget::Units(units), .. } =
            parse_source("(a + b) in km/h")
        else {
            panic!("expected unit conversion");
        };
        assert_eq!(units, vec![UnitTerm::new("km", 1), UnitTerm::new("h", -1)]);
        assert!(matches!(parse_source("now to somewhere"),
                         Expr::Conversion { target: ConversionTarget::Timezone(_), .. }));
        assert!(matches!(parse_source("5 to"), Expr::Number { .. }));
    }

    #[test]
    fn is_requires_type_name() {
        assert!(matches!(parse_source("x is number"), Expr::TypeCheck { .. }));
        assert!(parse(&tokenize("x is 3")).is_err());
    }
}
