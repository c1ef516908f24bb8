/// The built-in table.
///
/// Maps every built-in name to its arity and handler, and dispatches calls
/// after checking the argument count.
pub mod core;

/// Numeric built-ins: roots, rounding, logarithms, trigonometry, `min`,
/// `max`, `sum` and `average`.
pub mod math;

/// String built-ins.
pub mod string;

/// Array built-ins, including the higher-order `map`, `filter`, `reduce`,
/// `sort` and `groupBy`.
///
/// `append`/`push` and `pop` mutate their array in place.
pub mod array;

/// Object built-ins.
pub mod object;

/// Date component accessors and the `date` constructor.
pub mod date;

/// `partial`, `env` and `arg`: built-ins that reach the host or wrap
/// callables.
pub mod host;
