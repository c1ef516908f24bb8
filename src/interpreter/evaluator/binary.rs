/// Multiplication, division, modulo and the bitwise operators.
pub mod arithmetic;
/// Comparison operators and the value ordering shared with `sort`, `min` and
/// `max`.
pub mod comparison;
/// Operator dispatch, addition and subtraction.
///
/// Addition and subtraction cover numbers, quantities, strings, arrays and
/// date shifting.
pub mod core;
/// Exponentiation of numbers and quantities.
pub mod power;
