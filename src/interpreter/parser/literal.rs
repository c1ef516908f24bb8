use std::iter::Peekable;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::{
    ast::{AggregateKind, Callee, Constant, DateSpec, DateTimeSpec, Expr, StringPart, UnitTerm},
    error::ParseError,
    interpreter::{
        lexer::{Keyword, Segment, StringLiteral, Token, tokenize},
        parser::{
            core::{ParseResult, lambda_ahead, parse, parse_expression, parse_lambda},
            units::scan_units,
            utils::{eat, expect, parse_comma_separated, peek, token_text, unexpected},
        },
    },
    util::num::parse_decimal,
};

/// Parses a primary expression: literals, names, calls, lambdas, grouping,
/// arrays and objects.
///
/// Grammar:
/// ```text
/// primary := NUMBER | CURRENCY NUMBER | STRING | DATE | TIME | DATETIME
///          | "true" | "false" | "null" | "now" | "today" | "tomorrow" | "yesterday"
///          | aggregate | CONSTANT | lambda | NAME "(" args ")" | NAME
///          | "(" expression ")" | "[" elements "]" | "{" entries "}"
/// ```
///
/// Unit, currency and timezone names outside a unit position read as
/// variables, so a binding may reuse such a name.
///
/// # Errors
/// `UnexpectedToken` or `UnexpectedEndOfInput` if no primary starts here,
/// `InvalidLiteral` for malformed numbers or impossible calendar dates.
pub fn parse_primary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if lambda_ahead(tokens) {
        return parse_lambda(tokens);
    }
    let Some(next) = peek(tokens) else {
        return Err(ParseError::UnexpectedEndOfInput { offset: 0 });
    };
    let (token, offset) = (&next.0, next.1);

    match token {
        Token::Number(text) => {
            tokens.next();
            number(text, Vec::new(), offset)
        },
        Token::Currency(code) => {
            tokens.next();
            if let Some((Token::Number(text), _)) = peek(tokens) {
                tokens.next();
                return number(text, vec![UnitTerm::new(code.clone(), 1)], offset);
            }
            Ok(variable(code, offset))
        },
        Token::Str(literal) => {
            tokens.next();
            string(literal, offset)
        },
        Token::Date(text) => {
            tokens.next();
            Ok(Expr::Date { date: DateSpec::Calendar(parse_date(text, offset)?),
                            zone: None,
                            offset })
        },
        Token::Time(text) => {
            tokens.next();
            Ok(Expr::Time { time: parse_time(text, offset)?,
                            zone: None,
                            offset })
        },
        Token::DateTime(text) => {
            tokens.next();
            let invalid = || ParseError::InvalidLiteral { literal: text.clone(),
                                                          offset };
            let (date, time) = text.split_once('T').ok_or_else(invalid)?;
            let datetime = NaiveDateTime::new(parse_date(date, offset)?, parse_time(time, offset)?);
            Ok(Expr::DateTime { datetime: DateTimeSpec::Literal(datetime),
                                zone: None,
                                offset })
        },
        Token::Keyword(keyword) => {
            tokens.next();
            parse_keyword(tokens, *keyword, offset)
        },
        Token::Constant(name) => {
            tokens.next();
            Ok(match Constant::from_name(name) {
                Some(constant) => Expr::Constant { constant, offset },
                None => variable(name, offset),
            })
        },
        Token::Function(name)
        | Token::Variable(name)
        | Token::Unit(name)
        | Token::Timezone(name) => {
            tokens.next();
            if eat(tokens, &Token::LParen) {
                let args = parse_comma_separated(tokens, parse_expression, &Token::RParen)?;
                return Ok(Expr::Call { callee: Callee::Named(name.clone()),
                                       args,
                                       offset });
            }
            Ok(variable(name, offset))
        },
        Token::LParen => {
            tokens.next();
            let expr = parse_expression(tokens)?;
            expect(tokens, &Token::RParen, "')'")?;
            Ok(expr)
        },
        Token::LBracket => {
            tokens.next();
            let elements = parse_comma_separated(tokens, parse_expression, &Token::RBracket)?;
            Ok(Expr::Array { elements, offset })
        },
        Token::LBrace => {
            tokens.next();
            let entries = parse_comma_separated(tokens, parse_entry, &Token::RBrace)?;
            Ok(Expr::Object { entries, offset })
        },
        _ => Err(unexpected(Some(next))),
    }
}

/// Literal keywords, relative dates and aggregates.
///
/// `total`/`sum` and `average`/`avg` followed by `(` call the builtin of the
/// same name; otherwise they aggregate the prior results, optionally into a
/// target unit given by `in`/`to`.
fn parse_keyword<'a, I>(tokens: &mut Peekable<I>, keyword: Keyword, offset: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let constant = |constant| Ok(Expr::Constant { constant, offset });
    let date = |date| Ok(Expr::Date { date,
                                      zone: None,
                                      offset });
    match keyword {
        Keyword::True => constant(Constant::True),
        Keyword::False => constant(Constant::False),
        Keyword::Null => constant(Constant::Null),
        Keyword::Today => date(DateSpec::Today),
        Keyword::Tomorrow => date(DateSpec::Tomorrow),
        Keyword::Yesterday => date(DateSpec::Yesterday),
        Keyword::Now => Ok(Expr::DateTime { datetime: DateTimeSpec::Now,
                                            zone: None,
                                            offset }),
        Keyword::Total | Keyword::Sum | Keyword::Average | Keyword::Avg => {
            let kind = if matches!(keyword, Keyword::Total | Keyword::Sum) {
                AggregateKind::Total
            } else {
                AggregateKind::Average
            };
            if eat(tokens, &Token::LParen) {
                let args = parse_comma_separated(tokens, parse_expression, &Token::RParen)?;
                let name = match kind {
                    AggregateKind::Total => "sum",
                    AggregateKind::Average => "average",
                };
                return Ok(Expr::Call { callee: Callee::Named(name.to_string()),
                                       args,
                                       offset });
            }
            let target = aggregate_target(tokens);
            Ok(Expr::Aggregate { kind, target, offset })
        },
        Keyword::To | Keyword::In | Keyword::As | Keyword::Of | Keyword::Is => {
            Err(ParseError::UnexpectedToken { token: format!("'{}'", keyword.name()),
                                              offset })
        },
    }
}

/// `in UNIT` / `to UNIT` directly after an aggregate keyword.
fn aggregate_target<'a, I>(tokens: &mut Peekable<I>) -> Option<Vec<UnitTerm>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if !matches!(peek(tokens), Some((Token::Keyword(Keyword::In | Keyword::To), _))) {
        return None;
    }
    let mut cursor = tokens.clone();
    cursor.next();
    let units = scan_units(&mut cursor)?;
    *tokens = cursor;
    Some(units)
}

/// One `key: value` entry of an object literal.
///
/// Keys may be names, keywords, units, currencies, strings or numbers; all are
/// stored as strings.
fn parse_entry<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<(String, Expr)>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let key = match tokens.next() {
        Some((Token::Str(literal), _)) => plain_text(literal),
        Some((Token::Number(text), _)) => text.clone(),
        Some((token, offset)) => match token_text(token) {
            Some(name) => name.to_string(),
            None => {
                return Err(ParseError::ExpectedToken { expected: "object key",
                                                       found:    token.to_string(),
                                                       offset:   *offset, });
            },
        },
        None => return Err(ParseError::UnexpectedEndOfInput { offset: 0 }),
    };
    expect(tokens, &Token::Colon, "':' after object key")?;
    let value = parse_expression(tokens)?;
    Ok((key, value))
}

fn plain_text(literal: &StringLiteral) -> String {
    literal.segments
           .iter()
           .map(|segment| match segment {
               Segment::Text(text) => text.as_str(),
               Segment::Interpolation { source, .. } => source.as_str(),
           })
           .collect()
}

/// Builds a string node, lexing and parsing each interpolation on its own.
/// Offsets inside an interpolation are reported relative to the whole input.
fn string(literal: &StringLiteral, offset: usize) -> ParseResult<Expr> {
    let parts = literal.segments
                       .iter()
                       .map(|segment| match segment {
                           Segment::Text(text) => Ok(StringPart::Text(text.clone())),
                           Segment::Interpolation { source, offset } => {
                               let tokens: Vec<(Token, usize)> =
                                   tokenize(source).into_iter()
                                                   .map(|(token, at)| (token, at + offset))
                                                   .collect();
                               parse(&tokens).map(StringPart::Interpolation)
                           },
                       })
                       .collect::<ParseResult<Vec<_>>>()?;
    Ok(Expr::Str { parts, offset })
}

fn number(text: &str, units: Vec<UnitTerm>, offset: usize) -> ParseResult<Expr> {
    let value = parse_decimal(text).ok_or_else(|| ParseError::InvalidLiteral { literal: text.to_string(),
                                                                                offset })?;
    Ok(Expr::Number { value, units, offset })
}

fn variable(name: &str, offset: usize) -> Expr {
    Expr::Variable { name: name.to_string(),
                     offset }
}

/// `DD.MM.YYYY` or `DD/MM/YYYY`; rejects impossible dates such as `31.02.2024`.
fn parse_date(text: &str, offset: usize) -> ParseResult<NaiveDate> {
    let fields: Vec<u32> = text.split(['.', '/']).filter_map(|part| part.parse().ok()).collect();
    if let [day, month, year] = fields.as_slice()
       && let Ok(year) = i32::try_from(*year)
       && let Some(date) = NaiveDate::from_ymd_opt(year, *month, *day)
    {
        return Ok(date);
    }
    Err(ParseError::InvalidLiteral { literal: text.to_string(),
                                     offset })
}

fn parse_time(text: &str, offset: usize) -> ParseResult<NaiveTime> {
    if let Some((hour, minute)) = text.split_once(':')
       && let (Ok(hour), Ok(minute)) = (hour.parse(), minute.parse())
       && let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0)
    {
        return Ok(time);
    }
    Err(ParseError::InvalidLiteral { literal: text.to_string(),
                                     offset })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator;

    fn parse_source(source: &str) -> ParseResult<Expr> {
        parse(&tokenize(source))
    }

    #[test]
    fn lambdas_and_grouping() {
        assert!(matches!(parse_source("x => x * x"), Ok(Expr::Lambda { .. })));
        assert!(matches!(parse_source("(a, b) => a - b"), Ok(Expr::Lambda { ref params, .. }) if params.len() == 2));
        assert!(matches!(parse_source("() => 1"), Ok(Expr::Lambda { ref params, .. }) if params.is_empty()));
        assert!(matches!(parse_source("(a + b)"), Ok(Expr::Binary { op: BinaryOperator::Add, .. })));
    }

    #[test]
    fn collections_tolerate_trailing_commas() {
        assert!(matches!(parse_source("[1, 2, 3,]"), Ok(Expr::Array { ref elements, .. }) if elements.len() == 3));
        assert!(matches!(parse_source("[]"), Ok(Expr::Array { ref elements, .. }) if elements.is_empty()));
        let Ok(Expr::Object { entries, .. }) = parse_source("{a: 1, \"b c\": 2, km: 3, 4: 5,}") else {
            panic!("expected object");
        };
        let keys: Vec<&str> = entries.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["a", "b c", "km", "4"]);
    }

    #[test]
    fn currency_prefix_makes_a_quantity() {
        let Ok(Expr::Number { units, .. }) = parse_source("$100") else {
            panic!("expected number");
        };
        assert_eq!(units, vec![UnitTerm::new("USD", 1)]);
    }

    #[test]
    fn aggregates_and_their_call_forms() {
        assert!(matches!(parse_source("total"), Ok(Expr::Aggregate { target: None, .. })));
        assert!(matches!(parse_source("avg in km"), Ok(Expr::Aggregate { target: Some(_), .. })));
        assert!(matches!(parse_source("sum(1, 2)"),
                         Ok(Expr::Call { callee: Callee::Named(ref name), .. }) if name == "sum"));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        assert!(matches!(parse_source("31.02.2024"), Err(ParseError::InvalidLiteral { .. })));
        assert!(matches!(parse_source("29.02.2024"), Ok(Expr::Date { .. })));
    }

    #[test]
    fn interpolations_are_parsed() {
        let Ok(Expr::Str { parts, .. }) = parse_source("`total: ${1 + 2}!`") else {
            panic!("expected string");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[1], StringPart::Interpolation(Expr::Binary { offset: 12, .. })));
    }
}
