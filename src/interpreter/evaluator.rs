/// Property and index access on arrays, strings, objects, dates and
/// quantities.
pub mod access;

/// `total` and `average` over the session history.
pub mod aggregate;

/// Binary operator evaluation logic.
///
/// Handles arithmetic, exponentiation, bitwise operators and comparisons,
/// including unit conversion between quantity operands and date arithmetic.
pub mod binary;

/// Function calls.
///
/// Resolves callees, checks arity and depth, and runs user functions in a
/// scope chained to the one they were defined in.
pub mod call;

/// `to`/`in` conversions and `as` casts.
pub mod convert;

/// Core evaluation logic.
///
/// Contains the evaluator itself and the dispatch over every expression
/// node.
pub mod core;

/// Date, time and datetime literals and calendar arithmetic.
pub mod date;

/// Built-in functions.
pub mod function;

/// Unary operator evaluation logic.
///
/// Implements negation, unary plus, logical NOT and postfix percent.
pub mod unary;
