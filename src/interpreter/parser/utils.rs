use std::iter::Peekable;

use crate::{
    error::ParseError,
    interpreter::{lexer::Token, parser::core::ParseResult},
};

/// Returns the next token without consuming it.
///
/// The returned reference borrows from the token slice, not from the
/// iterator, so the caller may keep it while advancing.
pub(in crate::interpreter::parser) fn peek<'a, I>(tokens: &mut Peekable<I>) -> Option<&'a (Token, usize)>
    where I: Iterator<Item = &'a (Token, usize)>
{
    tokens.peek().copied()
}

/// Returns the token `n` positions ahead (`0` is the next token) without
/// consuming anything.
pub(in crate::interpreter::parser) fn peek_nth<'a, I>(tokens: &Peekable<I>, n: usize) -> Option<&'a (Token, usize)>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    tokens.clone().nth(n)
}

/// Returns `true` if the next token equals `expected`.
pub(in crate::interpreter::parser) fn next_is<'a, I>(tokens: &mut Peekable<I>, expected: &Token) -> bool
    where I: Iterator<Item = &'a (Token, usize)>
{
    matches!(tokens.peek(), Some((token, _)) if token == expected)
}

/// Consumes the next token if it equals `expected`.
pub(in crate::interpreter::parser) fn eat<'a, I>(tokens: &mut Peekable<I>, expected: &Token) -> bool
    where I: Iterator<Item = &'a (Token, usize)>
{
    if next_is(tokens, expected) {
        tokens.next();
        return true;
    }
    false
}

/// Consumes `expected` or fails naming what was wanted and what was found.
///
/// # Returns
/// The offset of the consumed token.
pub(in crate::interpreter::parser) fn expect<'a, I>(tokens: &mut Peekable<I>,
                                                    expected: &Token,
                                                    description: &'static str)
                                                    -> ParseResult<usize>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((token, offset)) if token == expected => Ok(*offset),
        Some((token, offset)) => Err(ParseError::ExpectedToken { expected: description,
                                                                 found:    token.to_string(),
                                                                 offset:   *offset, }),
        None => Err(ParseError::UnexpectedEndOfInput { offset: 0 }),
    }
}

/// Builds the error for a token that cannot start or continue an expression.
pub(in crate::interpreter::parser) fn unexpected(found: Option<&(Token, usize)>) -> ParseError {
    match found {
        Some((Token::Eof, offset)) => ParseError::UnexpectedEndOfInput { offset: *offset },
        Some((token, offset)) => ParseError::UnexpectedToken { token:  token.to_string(),
                                                               offset: *offset, },
        None => ParseError::UnexpectedEndOfInput { offset: 0 },
    }
}

/// Text of a name-like token, used for type names, object keys and property
/// names.
pub(in crate::interpreter::parser) fn token_text(token: &Token) -> Option<&str> {
    match token {
        Token::Variable(name)
        | Token::Function(name)
        | Token::Unit(name)
        | Token::Currency(name)
        | Token::Timezone(name)
        | Token::Constant(name) => Some(name),
        Token::Keyword(keyword) => Some(keyword.name()),
        _ => None,
    }
}

/// Parses a comma-separated list of items until a closing token.
///
/// Shared by array literals, object literals, argument lists and lambda
/// parameter lists. An immediately encountered closing token produces an
/// empty list, and a trailing comma before the closing token is accepted.
///
/// Grammar (simplified): `list := (item ("," item)* ","?)?`
///
/// # Parameters
/// - `tokens`: Token iterator positioned after the opening token.
/// - `parse_item`: Function used to parse each list element.
/// - `closing`: The token that terminates the list (e.g., `]` or `)`).
///
/// # Errors
/// Returns a `ParseError` if an item fails to parse, an unexpected token is
/// encountered, or the input ends before the closing token.
pub(in crate::interpreter::parser) fn parse_comma_separated<'a, I, T>(
    tokens: &mut Peekable<I>,
    parse_item: impl Fn(&mut Peekable<I>) -> ParseResult<T>,
    closing: &Token)
    -> ParseResult<Vec<T>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut items = Vec::new();
    loop {
        if eat(tokens, closing) {
            return Ok(items);
        }
        items.push(parse_item(tokens)?);
        match tokens.next() {
            Some((Token::Comma, _)) => {},
            Some((token, _)) if token == closing => return Ok(items),
            Some((Token::Eof, offset)) => {
                return Err(ParseError::UnexpectedEndOfInput { offset: *offset });
            },
            Some((token, offset)) => {
                return Err(ParseError::ExpectedToken { expected: "',' or closing bracket",
                                                       found:    token.to_string(),
                                                       offset:   *offset, });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { offset: 0 }),
        }
    }
}
