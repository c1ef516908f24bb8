use std::{iter::Peekable, rc::Rc};

use crate::{
    ast::{BinaryOperator, Expr},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            binary::parse_logical_or,
            utils::{eat, expect, parse_comma_separated, peek, peek_nth},
        },
    },
};

pub type ParseResult<T> = Result<T, ParseError>;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Parses a complete token sequence into one expression.
///
/// The sequence must be terminated by [`Token::Eof`], as produced by
/// [`tokenize`](crate::interpreter::lexer::tokenize).
///
/// # Errors
/// - Any syntax error inside the expression.
/// - `UnexpectedTrailingTokens` if tokens remain after a complete expression.
///
/// # Example
/// ```
/// use tally::{ast::Expr, interpreter::{lexer::tokenize, parser::core::parse}};
///
/// let expr = parse(&tokenize("1 + 2")).unwrap();
/// assert!(matches!(expr, Expr::Binary { .. }));
/// assert!(parse(&tokenize("1 + 2 3")).is_err());
/// ```
pub fn parse(tokens: &[(Token, usize)]) -> ParseResult<Expr> {
    let mut iter = tokens.iter().peekable();
    let expr = parse_expression(&mut iter)?;
    match iter.next() {
        Some((Token::Eof, _)) | None => Ok(expr),
        Some((token, offset)) => Err(ParseError::UnexpectedTrailingTokens { token:  token.to_string(),
                                                                            offset: *offset, }),
    }
}

/// Parses a full expression.
///
/// This is the entry point for expression parsing. It begins at the
/// lowest-precedence level, assignment, and recursively descends through the
/// precedence hierarchy.
///
/// Grammar: `expression := assignment`
pub fn parse_expression<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || parse_assignment(tokens))
}

/// Parses assignments and function definitions.
///
/// Grammar:
/// ```text
///     assignment := NAME "(" params ")" "=" expression
///                 | ternary (("=" | "+=" | "-=") expression)?
/// ```
///
/// A function definition is recognized by lookahead before anything is
/// consumed; it binds a named lambda, which lets the body call itself.
/// Compound assignment keeps its operator so that evaluation can read the
/// current binding first.
///
/// # Errors
/// `InvalidAssignmentTarget` if the left side of `=` is not a name.
pub fn parse_assignment<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if let Some(definition) = parse_function_definition(tokens)? {
        return Ok(definition);
    }

    let target = parse_ternary(tokens)?;
    let compound = match peek(tokens) {
        Some((Token::Equals, _)) => None,
        Some((Token::PlusAssign, _)) => Some(BinaryOperator::Add),
        Some((Token::MinusAssign, _)) => Some(BinaryOperator::Sub),
        _ => return Ok(target),
    };
    let Some((_, offset)) = tokens.next() else {
        return Ok(target);
    };
    let name = match &target {
        Expr::Variable { name, .. } => name.clone(),
        Expr::Constant { constant, .. } => constant.name().to_string(),
        _ => return Err(ParseError::InvalidAssignmentTarget { offset: *offset }),
    };
    let value = parse_expression(tokens)?;

    Ok(Expr::Assignment { name,
                          value: Box::new(value),
                          compound,
                          offset: *offset })
}

/// Parses `name(params) = body` if the upcoming tokens have exactly that
/// shape; otherwise consumes nothing and returns `None`.
fn parse_function_definition<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<Expr>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut cursor = tokens.clone();
    let Some((name_token, offset)) = cursor.next() else {
        return Ok(None);
    };
    let Some(name) = name_token.binding_name() else {
        return Ok(None);
    };
    if !eat(&mut cursor, &Token::LParen) {
        return Ok(None);
    }
    let Ok(params) = parse_comma_separated(&mut cursor, parse_parameter, &Token::RParen) else {
        return Ok(None);
    };
    if !eat(&mut cursor, &Token::Equals) {
        return Ok(None);
    }

    *tokens = cursor;
    let body = parse_expression(tokens)?;
    let lambda = Expr::Lambda { name: Some(name.to_string()),
                                params,
                                body: Rc::new(body),
                                offset: *offset };

    Ok(Some(Expr::Assignment { name:     name.to_string(),
                               value:    Box::new(lambda),
                               compound: None,
                               offset:   *offset, }))
}

/// Parses a single lambda or function parameter name.
pub(in crate::interpreter::parser) fn parse_parameter<'a, I>(tokens: &mut Peekable<I>)
                                                             -> ParseResult<String>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((token, offset)) => match token.binding_name() {
            Some(name) => Ok(name.to_string()),
            None => Err(ParseError::ExpectedToken { expected: "parameter name",
                                                    found:    token.to_string(),
                                                    offset:   *offset, }),
        },
        None => Err(ParseError::UnexpectedEndOfInput { offset: 0 }),
    }
}

/// Parses a conditional expression `condition ? then : else`.
///
/// Grammar: `ternary := logical_or ("?" ternary ":" ternary)?`
///
/// The operator is right-associative, so `a ? b : c ? d : e` groups as
/// `a ? b : (c ? d : e)`.
pub fn parse_ternary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let condition = parse_logical_or(tokens)?;
    let Some((Token::Question, offset)) = peek(tokens) else {
        return Ok(condition);
    };
    tokens.next();

    let then_branch = parse_ternary(tokens)?;
    expect(tokens, &Token::Colon, "':' in conditional expression")?;
    let else_branch = parse_ternary(tokens)?;

    Ok(Expr::Ternary { condition:   Box::new(condition),
                       then_branch: Box::new(then_branch),
                       else_branch: Box::new(else_branch),
                       offset:      *offset, })
}

/// Returns `true` if a lambda head (`x =>`, `(x, y) =>` or `() =>`) starts
/// at the next token.
pub(in crate::interpreter::parser) fn lambda_ahead<'a, I>(tokens: &Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    match peek_nth(tokens, 0) {
        Some((token, _)) if token.binding_name().is_some() => {
            matches!(peek_nth(tokens, 1), Some((Token::Arrow, _)))
        },
        Some((Token::LParen, _)) => {
            let mut cursor = tokens.clone();
            cursor.next();
            parse_comma_separated(&mut cursor, parse_parameter, &Token::RParen).is_ok()
            && matches!(cursor.next(), Some((Token::Arrow, _)))
        },
        _ => false,
    }
}

/// Parses a lambda whose head was confirmed by [`lambda_ahead`].
///
/// Grammar: `lambda := (NAME | "(" params ")") "=>" expression`
pub(in crate::interpreter::parser) fn parse_lambda<'a, I>(tokens: &mut Peekable<I>)
                                                          -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (params, offset) = match tokens.next() {
        Some((Token::LParen, offset)) => {
            (parse_comma_separated(tokens, parse_parameter, &Token::RParen)?, *offset)
        },
        Some((token, offset)) => match token.binding_name() {
            Some(name) => (vec![name.to_string()], *offset),
            None => {
                return Err(ParseError::ExpectedToken { expected: "lambda parameters",
                                                       found:    token.to_string(),
                                                       offset:   *offset, });
            },
        },
        None => return Err(ParseError::UnexpectedEndOfInput { offset: 0 }),
    };
    expect(tokens, &Token::Arrow, "'=>'")?;
    let body = parse_expression(tokens)?;

    Ok(Expr::Lambda { name: None,
                      params,
                      body: Rc::new(body),
                      offset })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::lexer::tokenize;

    fn parse_source(source: &str) -> ParseResult<Expr> {
        parse(&tokenize(source))
    }

    #[test]
    fn assignment_forms() {
        assert!(matches!(parse_source("x = 1 + 2"),
                         Ok(Expr::Assignment { compound: None, .. })));
        assert!(matches!(parse_source("x += 2"),
                         Ok(Expr::Assignment { compound: Some(BinaryOperator::Add),
                                               .. })));
        assert!(matches!(parse_source("3 = 4"),
                         Err(ParseError::InvalidAssignmentTarget { .. })));
    }

    #[test]
    fn function_definition_binds_named_lambda() {
        let Ok(Expr::Assignment { name, value, .. }) = parse_source("square(x) = x * x") else {
            panic!("expected assignment");
        };
        assert_eq!(name, "square");
        assert!(matches!(*value,
                         Expr::Lambda { name: Some(_),
                                        ref params,
                                        .. } if params == &["x".to_string()]));
    }

    #[test]
    fn call_is_not_mistaken_for_definition() {
        assert!(matches!(parse_source("f(2) == 4"), Ok(Expr::Comparison { .. })));
    }

    #[test]
    fn ternary_is_right_associative() {
        let Ok(Expr::Ternary { else_branch, .. }) = parse_source("a ? 1 : b ? 2 : 3") else {
            panic!("expected ternary");
        };
        assert!(matches!(*else_branch, Expr::Ternary { .. }));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(matches!(parse_source("1 2"),
                         Err(ParseError::UnexpectedTrailingTokens { .. })));
        assert!(matches!(parse_source("(1 + 2"), Err(ParseError::ExpectedToken { .. })));
    }
}
