//! # tally
//!
//! tally is an embeddable calculator language written in Rust. It evaluates
//! one expression at a time: decimal arithmetic, units and currencies,
//! dates and timezones, strings, arrays and objects, lambdas and a library
//! of built-in functions.
//!
//! The host owns everything that outlives a single call: the variable
//! [`Environment`] and the [`Context`] with the result history, external
//! argument, exchange rates and clock.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use std::rc::Rc;

pub use crate::{
    error::{Error, ErrorKind},
    interpreter::{context::Context, environment::Environment, value::core::Value},
};
use crate::interpreter::{evaluator::core::Evaluator, lexer::tokenize, parser::core::parse};

/// Defines the structure of parsed code.
///
/// This module declares the `Expr` enum and related types that represent the
/// syntactic structure of an expression as a tree. The AST is built by the
/// parser and traversed by the evaluator.
///
/// # Responsibilities
/// - Defines expression nodes for all language constructs.
/// - Attaches source offsets to AST nodes for error reporting.
pub mod ast;
/// Provides unified error types for parsing and evaluation.
///
/// Every error carries the byte offset of the token or node it refers to and
/// maps onto one [`ErrorKind`].
///
/// # Responsibilities
/// - Defines error enums for all failure modes (parser, evaluator).
/// - Supports integration with standard error handling traits.
pub mod error;
/// Orchestrates the entire process of evaluation.
///
/// This module ties together lexing, parsing, evaluation, value
/// representations, units, timezones and the host-facing context.
pub mod interpreter;
/// General utilities for safe numeric conversion.
///
/// # Responsibilities
/// - Convert between decimals, integers and floats without silent data loss.
/// - Parse numeric literals.
pub mod util;

/// Evaluates one expression.
///
/// The source is tokenized, parsed and evaluated against `env`. Assignments
/// and function definitions write to `env`; everything the host supplies for
/// this call comes from `context`.
///
/// # Errors
/// Returns [`Error::Parse`] for syntax errors and [`Error::Runtime`] for
/// anything that fails during evaluation. A failed assignment leaves `env`
/// unchanged.
///
/// # Examples
/// ```
/// use tally::{Context, Environment, ErrorKind, evaluate};
///
/// let mut env = Environment::new();
/// let context = Context::new();
///
/// assert_eq!(evaluate("2 + 3 * 4", &mut env, &context).unwrap().to_string(), "14");
/// assert_eq!(evaluate("100 cm in meters", &mut env, &context).unwrap().to_string(), "1 meters");
///
/// evaluate("rate = 20%", &mut env, &context).unwrap();
/// assert_eq!(evaluate("rate of 150", &mut env, &context).unwrap().to_string(), "30");
///
/// let error = evaluate("1 m + 1 kg", &mut env, &context).unwrap_err();
/// assert_eq!(error.kind(), ErrorKind::Dimension);
/// ```
pub fn evaluate(source: &str, env: &mut Environment, context: &Context) -> Result<Value, Error> {
    let tokens = tokenize(source);
    let ast = parse(&tokens)?;
    let root = Rc::clone(env.scope());
    let mut evaluator = Evaluator::new(context, Rc::clone(&root));
    Ok(evaluator.eval(&ast, &root)?)
}
