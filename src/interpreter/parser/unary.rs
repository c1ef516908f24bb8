use std::iter::Peekable;

use crate::{
    ast::{Callee, ConversionTarget, Expr, StringPart, UnaryOperator},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            binary::unit_conversion_ahead,
            core::{ParseResult, parse_expression},
            literal::parse_primary,
            units::{scan_units, starts_unit},
            utils::{expect, parse_comma_separated, peek, peek_nth, token_text},
        },
    },
};

/// Parses prefix operators: `-`, `+`, `not` / `!`.
///
/// Prefix operators bind tighter than every binary operator, so `-2 ^ 2` is
/// `(-2) ^ 2`.
///
/// Grammar: `unary := ("-" | "+" | "not" | "!") unary | postfix`
pub fn parse_unary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let op = match peek(tokens) {
        Some((Token::Minus, _)) => UnaryOperator::Negate,
        Some((Token::Plus, _)) => UnaryOperator::Plus,
        Some((Token::Not, _)) => UnaryOperator::Not,
        _ => return parse_postfix(tokens),
    };
    let Some((_, offset)) = tokens.next() else {
        return parse_postfix(tokens);
    };
    let expr = parse_unary(tokens)?;

    Ok(Expr::Unary { op,
                     expr: Box::new(expr),
                     offset: *offset })
}

/// Parses a primary expression followed by any number of postfix forms.
///
/// Postfix forms, applied left to right:
/// - `.name` property access and `[expr]` indexing;
/// - `(args)` calls on an accessed or computed callable;
/// - a unit suffix on a bare number literal (`5 km`, `9.81 m/s^2`);
/// - a timezone suffix on a date or time literal (`14:30 EST`);
/// - a percent sign, when what follows makes it a percentage;
/// - an immediate unit conversion on a number with units, unless the target
///   unit ends the input, in which case the conversion is left to the
///   expression level.
///
/// Grammar: `postfix := primary ("." NAME | "[" expression "]" | "(" args ")" | UNIT | TZ | "%" | CONV)*`
pub fn parse_postfix<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut expr = parse_primary(tokens)?;
    loop {
        let Some((token, offset)) = peek(tokens) else {
            break;
        };
        let offset = *offset;
        match token {
            Token::Dot => {
                tokens.next();
                let key = parse_property_name(tokens)?;
                expr = Expr::Access { object: Box::new(expr),
                                      key: Box::new(key),
                                      offset };
            },
            Token::LBracket => {
                tokens.next();
                let key = parse_expression(tokens)?;
                expect(tokens, &Token::RBracket, "']' after index")?;
                expr = Expr::Access { object: Box::new(expr),
                                      key: Box::new(key),
                                      offset };
            },
            Token::LParen if is_callable_shape(&expr) => {
                tokens.next();
                let args = parse_comma_separated(tokens, parse_expression, &Token::RParen)?;
                expr = Expr::Call { callee: Callee::Expr(Box::new(expr)),
                                    args,
                                    offset };
            },
            Token::Percent if percentage_context(peek_nth(tokens, 1).map(|(t, _)| t)) => {
                tokens.next();
                expr = Expr::Unary { op: UnaryOperator::Percent,
                                     expr: Box::new(expr),
                                     offset };
            },
            Token::Timezone(zone) if is_untagged_literal(&expr) => {
                tokens.next();
                attach_zone(&mut expr, zone);
            },
            _ if is_bare_number(&expr) && starts_unit(tokens) => {
                if let Some(terms) = scan_units(tokens)
                   && let Expr::Number { units, .. } = &mut expr
                {
                    *units = terms;
                }
            },
            _ if has_units(&expr) && unit_conversion_ahead(tokens) => {
                let mut cursor = tokens.clone();
                cursor.next();
                let Some(target) = scan_units(&mut cursor) else {
                    break;
                };
                if matches!(peek(&mut cursor), Some((Token::Eof, _)) | None) {
                    break;
                }
                *tokens = cursor;
                expr = Expr::Conversion { expr: Box::new(expr),
                                          target: ConversionTarget::Units(target),
                                          offset };
            },
            _ => break,
        }
    }
    Ok(expr)
}

/// Parses the name after `.`; any name-like token is accepted as a key.
fn parse_property_name<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((token, offset)) => match token_text(token) {
            Some(name) => Ok(Expr::Str { parts:  vec![StringPart::Text(name.to_string())],
                                         offset: *offset, }),
            None => Err(ParseError::ExpectedToken { expected: "property name after '.'",
                                                    found:    token.to_string(),
                                                    offset:   *offset, }),
        },
        None => Err(ParseError::UnexpectedEndOfInput { offset: 0 }),
    }
}

/// A `%` is a percentage only when followed by the end of input, a closing
/// bracket, a separator, a keyword or another operator. Anything else makes
/// it modulo.
fn percentage_context(next: Option<&Token>) -> bool {
    matches!(next,
             None | Some(Token::Eof
                         | Token::RParen
                         | Token::RBracket
                         | Token::RBrace
                         | Token::Comma
                         | Token::Keyword(_)
                         | Token::Question
                         | Token::Colon
                         | Token::Plus
                         | Token::Minus
                         | Token::Star
                         | Token::Slash
                         | Token::Caret
                         | Token::Mod
                         | Token::Ampersand
                         | Token::Pipe
                         | Token::ShiftLeft
                         | Token::ShiftRight
                         | Token::And
                         | Token::Or
                         | Token::EqualEqual
                         | Token::BangEqual
                         | Token::Less
                         | Token::LessEqual
                         | Token::Greater
                         | Token::GreaterEqual))
}

fn is_untagged_literal(expr: &Expr) -> bool {
    matches!(expr,
             Expr::Date { zone: None, .. }
             | Expr::Time { zone: None, .. }
             | Expr::DateTime { zone: None, .. })
}

/// Tags a date or time literal with a timezone.
fn attach_zone(expr: &mut Expr, name: &str) {
    if let Expr::Date { zone, .. } | Expr::Time { zone, .. } | Expr::DateTime { zone, .. } = expr {
        *zone = Some(name.to_string());
    }
}

fn is_bare_number(expr: &Expr) -> bool {
    matches!(expr, Expr::Number { units, .. } if units.is_empty())
}

fn has_units(expr: &Expr) -> bool {
    matches!(expr, Expr::Number { units, .. } if !units.is_empty())
}

const fn is_callable_shape(expr: &Expr) -> bool {
    matches!(expr, Expr::Access { .. } | Expr::Call { .. } | Expr::Lambda { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{BinaryOperator, UnitTerm},
        interpreter::{lexer::tokenize, parser::core::parse},
    };

    fn parse_source(source: &str) -> Expr {
        parse(&tokenize(source)).unwrap()
    }

    #[test]
    fn unit_suffix_attaches_to_number() {
        let Expr::Number { units, .. } = parse_source("9.81 m/s^2") else {
            panic!("expected number");
        };
        assert_eq!(units, vec![UnitTerm::new("m", 1), UnitTerm::new("s", -2)]);
    }

    #[test]
    fn unary_binds_tighter_than_power() {
        let Expr::Binary { left, op, .. } = parse_source("-2 ^ 2") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOperator::Pow);
        assert!(matches!(*left, Expr::Unary { op: UnaryOperator::Negate, .. }));
    }

    #[test]
    fn access_and_calls_chain() {
        let Expr::Access { object, .. } = parse_source("obj.f(1)[0]") else {
            panic!("expected index access");
        };
        let Expr::Call { callee: Callee::Expr(callee),
                         args,
                         .. } = *object
        else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(*callee, Expr::Access { .. }));
    }

    #[test]
    fn conversion_before_end_is_deferred() {
        assert!(matches!(parse_source("5 km in m"), Expr::Conversion { .. }));
        let Expr::Binary { left, .. } = parse_source("5 km in m + 3 m") else {
            panic!("expected binary");
        };
        assert!(matches!(*left, Expr::Conversion { .. }));
    }

    #[test]
    fn timezone_suffix_tags_literals() {
        assert!(matches!(parse_source("14:30 EST"), Expr::Time { zone: Some(_), .. }));
    }
}
