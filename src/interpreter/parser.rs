/// Binary operator parsing.
///
/// One function per precedence level, from logical OR down to the bitwise
/// operators, including the conversion keywords and the `of` operator.
pub mod binary;

/// Entry points, assignment, ternary and lambda heads.
pub mod core;

/// Primary expressions: literals, names, calls, collections and aggregates.
pub mod literal;

/// Prefix operators and postfix forms.
pub mod unary;

/// Compound-unit scanner shared by unit suffixes and conversion targets.
pub mod units;

/// Token-stream helpers shared by the parser modules.
pub mod utils;
