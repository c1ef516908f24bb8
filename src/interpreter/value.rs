/// The `Value` enum and its shared helpers.
///
/// Covers type names, truthiness, deep copies for environment writes,
/// structural equality and display.
pub mod core;

/// Instants with a display zone.
///
/// Defines `DateValue`, calendar-aware shifting by days, weeks, months and
/// years, fixed-duration shifting by hours, minutes and seconds, and
/// instant-based comparison.
pub mod date;

/// Callable values: lambdas, named user functions, built-ins and partials.
pub mod function;

/// Insertion-ordered string maps backing object values.
pub mod object;

/// Dimensional analysis.
///
/// Defines dimension vectors (one unit and exponent per category) and the
/// `Quantity` type with unit-aware addition, multiplication, division,
/// exponentiation and conversion.
pub mod quantity;
