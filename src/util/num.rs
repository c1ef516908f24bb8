use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Parses a numeric literal such as `42`, `3.14` or `2.5e-3` into a decimal.
///
/// ## Returns
/// - `Some(Decimal)`: The parsed value.
/// - `None`: If the text is not a number or does not fit into a decimal.
///
/// ## Example
/// ```
/// use rust_decimal::Decimal;
/// use tally::util::num::parse_decimal;
///
/// assert_eq!(parse_decimal("2.5e2"), Some(Decimal::from(250)));
/// assert_eq!(parse_decimal("abc"), None);
/// ```
#[must_use]
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok().map(|d| d.normalize())
    } else {
        text.parse::<Decimal>().ok()
    }
}

/// Converts a decimal to `i64` if and only if it is an exact integer.
///
/// ## Errors
/// Returns `RuntimeError::TypeError` for fractional values and
/// `RuntimeError::UnsupportedDomain` for values outside the `i64` range.
///
/// ## Example
/// ```
/// use rust_decimal::Decimal;
/// use tally::util::num::decimal_to_i64;
///
/// assert_eq!(decimal_to_i64(Decimal::from(7), 0).unwrap(), 7);
/// assert!(decimal_to_i64(Decimal::new(75, 1), 0).is_err());
/// ```
pub fn decimal_to_i64(value: Decimal, offset: usize) -> EvalResult<i64> {
    if !value.fract().is_zero() {
        return Err(RuntimeError::type_error(format!("expected an integer, found {value}"),
                                            offset));
    }
    value.to_i64()
         .ok_or_else(|| RuntimeError::domain("Integer is too large", offset))
}

/// Converts a decimal to `usize` if it is a non-negative exact integer.
///
/// ## Errors
/// Returns an error for fractional, negative or oversized values.
///
/// ## Example
/// ```
/// use rust_decimal::Decimal;
/// use tally::util::num::decimal_to_usize;
///
/// assert_eq!(decimal_to_usize(Decimal::from(3), 0).unwrap(), 3);
/// assert!(decimal_to_usize(Decimal::from(-3), 0).is_err());
/// ```
pub fn decimal_to_usize(value: Decimal, offset: usize) -> EvalResult<usize> {
    let int = decimal_to_i64(value, offset)?;
    usize::try_from(int).map_err(|_| {
                            RuntimeError::InvalidArgument { details: format!("expected a non-negative integer, found {int}"),
                                                            offset }
                        })
}

/// Converts a decimal to the nearest `f64`.
///
/// ## Errors
/// Never fails for finite decimals; the `Result` mirrors the other helpers.
pub fn decimal_to_f64(value: Decimal, offset: usize) -> EvalResult<f64> {
    value.to_f64()
         .ok_or_else(|| RuntimeError::domain("Number cannot be represented as a float", offset))
}

/// Converts an `f64` result back into a decimal.
///
/// Results are rounded to 15 significant fraction digits so that float noise
/// from transcendental functions does not leak into decimal arithmetic.
///
/// ## Errors
/// Returns `RuntimeError::UnsupportedDomain` for NaN and infinite values.
///
/// ## Example
/// ```
/// use rust_decimal::Decimal;
/// use tally::util::num::f64_to_decimal;
///
/// assert_eq!(f64_to_decimal(0.5, 0).unwrap(), Decimal::new(5, 1));
/// assert!(f64_to_decimal(f64::NAN, 0).is_err());
/// ```
pub fn f64_to_decimal(value: f64, offset: usize) -> EvalResult<Decimal> {
    if !value.is_finite() {
        return Err(RuntimeError::domain("Result is not a finite number", offset));
    }
    Decimal::from_f64(value).map(|d| d.round_dp(15).normalize())
                            .ok_or_else(|| RuntimeError::domain("Result is out of range", offset))
}

/// Converts a `usize` (lengths, counts) into a decimal.
#[must_use]
pub fn usize_to_decimal(value: usize) -> Decimal {
    Decimal::from(value)
}
