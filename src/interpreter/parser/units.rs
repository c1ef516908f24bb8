use std::iter::Peekable;

use crate::{
    ast::UnitTerm,
    interpreter::{
        lexer::Token,
        parser::utils::{peek, peek_nth},
    },
};

/// Scans a compound unit such as `kg`, `km/h` or `m*s^-2`.
///
/// Grammar: `compound := unit ("^" ["-"] NUMBER)? (("*" | "/") unit ("^" ["-"] NUMBER)?)*`
///
/// `*` makes the following unit's exponent positive and `/` negative; a `^`
/// scales that unit's own exponent by the running sign. An operator that is
/// not followed by a unit is left for the expression parser, so `2 m * 3`
/// scans only `m`.
///
/// Nothing is consumed when the next token is not a unit.
///
/// # Returns
/// The unit terms in source order, or `None` if no unit starts here.
pub fn scan_units<'a, I>(tokens: &mut Peekable<I>) -> Option<Vec<UnitTerm>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut cursor = tokens.clone();
    let first = take_unit(&mut cursor)?;
    let exponent = take_exponent(&mut cursor, 1);
    let mut terms = vec![UnitTerm::new(first, exponent)];

    loop {
        let mut attempt = cursor.clone();
        let sign = match attempt.next() {
            Some((Token::Star, _)) => 1,
            Some((Token::Slash, _)) => -1,
            _ => break,
        };
        let Some(unit) = take_unit(&mut attempt) else {
            break;
        };
        let exponent = take_exponent(&mut attempt, sign);
        terms.push(UnitTerm::new(unit, exponent));
        cursor = attempt;
    }

    *tokens = cursor;
    Some(terms)
}

/// Returns `true` if a unit starts at the next token.
pub fn starts_unit<'a, I>(tokens: &Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut cursor = tokens.clone();
    take_unit(&mut cursor).is_some()
}

fn take_unit<'a, I>(tokens: &mut Peekable<I>) -> Option<String>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (token, _) = peek(tokens)?;
    let name = token.unit_name()?;
    if matches!(token, Token::Function(_))
       && matches!(peek_nth(tokens, 1), Some((Token::LParen, _)))
    {
        return None;
    }
    tokens.next();
    Some(name.to_string())
}

fn take_exponent<'a, I>(tokens: &mut Peekable<I>, sign: i32) -> i32
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut attempt = tokens.clone();
    if !matches!(attempt.next(), Some((Token::Caret, _))) {
        return sign;
    }
    let negative = matches!(peek(&mut attempt), Some((Token::Minus, _)));
    if negative {
        attempt.next();
    }
    let Some((Token::Number(text), _)) = attempt.next() else {
        return sign;
    };
    let Ok(power) = text.parse::<i32>() else {
        return sign;
    };
    *tokens = attempt;
    if negative { -sign * power } else { sign * power }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::lexer::tokenize;

    fn scan(source: &str) -> (Option<Vec<UnitTerm>>, Option<Token>) {
        let tokens = tokenize(source);
        let mut iter = tokens.iter().peekable();
        let terms = scan_units(&mut iter);
        (terms, iter.next().map(|(token, _)| token.clone()))
    }

    #[test]
    fn simple_and_compound_units() {
        assert_eq!(scan("km").0, Some(vec![UnitTerm::new("km", 1)]));
        assert_eq!(scan("km/h").0, Some(vec![UnitTerm::new("km", 1), UnitTerm::new("h", -1)]));
        assert_eq!(scan("m*s^-2").0, Some(vec![UnitTerm::new("m", 1), UnitTerm::new("s", -2)]));
        assert_eq!(scan("m/s^2").0, Some(vec![UnitTerm::new("m", 1), UnitTerm::new("s", -2)]));
    }

    #[test]
    fn stops_before_non_unit_operand() {
        let (terms, rest) = scan("m * 3");
        assert_eq!(terms, Some(vec![UnitTerm::new("m", 1)]));
        assert_eq!(rest, Some(Token::Star));
    }

    #[test]
    fn function_call_is_not_a_unit() {
        assert_eq!(scan("min(1, 2)").0, None);
        assert_eq!(scan("min").0, Some(vec![UnitTerm::new("min", 1)]));
    }
}
