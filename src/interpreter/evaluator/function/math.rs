use std::cmp::Ordering;

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::core::Value,
    },
    util::num::{decimal_to_f64, decimal_to_i64, f64_to_decimal, usize_to_decimal},
};

/// Applies `f` to the magnitude of a number or quantity, keeping units.
fn map_magnitude(value: &Value,
                 offset: usize,
                 f: impl FnOnce(Decimal) -> EvalResult<Decimal>)
                 -> EvalResult<Value> {
    match value {
        Value::Number(n) => Ok(Value::Number(f(*n)?)),
        Value::Quantity(q) => Ok(Value::Quantity(q.with_value(f(q.value)?))),
        other => Err(other.expected("number", offset)),
    }
}

/// Rounds results of approximate functions so float and series noise does
/// not show up in displayed digits.
fn settle(value: Decimal) -> Decimal {
    value.round_dp(15).normalize()
}

/// Computes the square root of a number.
///
/// # Errors
/// `UnsupportedDomain` for negative input.
///
/// # Example
/// ```
/// use tally::interpreter::{evaluator::function::math::sqrt, value::core::Value};
///
/// assert_eq!(sqrt(&[Value::from(16)], 0).unwrap(), Value::from(4));
/// assert!(sqrt(&[Value::from(-1)], 0).is_err());
/// ```
pub fn sqrt(args: &[Value], offset: usize) -> EvalResult<Value> {
    let n = args[0].as_number(offset)?;
    if n.is_sign_negative() && !n.is_zero() {
        return Err(RuntimeError::domain("Square root of a negative number", offset));
    }
    n.sqrt()
     .map(|root| Value::Number(settle(root)))
     .ok_or_else(|| RuntimeError::domain("Square root failed to converge", offset))
}

/// Evaluates a float-backed function (`cbrt` and trigonometry in radians).
///
/// # Errors
/// `UnsupportedDomain` when the result is not finite, e.g. `asin(2)`.
pub fn float(name: &str, args: &[Value], offset: usize) -> EvalResult<Value> {
    let x = decimal_to_f64(args[0].as_number(offset)?, offset)?;
    let y = match name {
        "cbrt" => x.cbrt(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" => x.asin(),
        "acos" => x.acos(),
        "atan" => x.atan(),
        _ => return Err(RuntimeError::UnknownFunction { name: name.to_string(),
                                                        offset }),
    };
    f64_to_decimal(y, offset).map(Value::Number)
}

pub fn abs(args: &[Value], offset: usize) -> EvalResult<Value> {
    map_magnitude(&args[0], offset, |n| Ok(n.abs()))
}

/// Implements `round`, `floor`, `ceil` and `trunc`.
///
/// `round` rounds half away from zero and takes an optional number of
/// decimal places. Quantities keep their units.
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use tally::interpreter::{evaluator::function::math::round, value::core::Value};
///
/// let half = Value::from(Decimal::new(25, 1));
/// assert_eq!(round("round", &[half.clone()], 0).unwrap(), Value::from(3));
/// assert_eq!(round("floor", &[half], 0).unwrap(), Value::from(2));
///
/// let pi = Value::from(Decimal::new(314_159, 5));
/// assert_eq!(round("round", &[pi, Value::from(2)], 0).unwrap().to_string(), "3.14");
/// ```
pub fn round(name: &str, args: &[Value], offset: usize) -> EvalResult<Value> {
    let places = match args.get(1) {
        Some(places) => {
            let places = decimal_to_i64(places.as_number(offset)?, offset)?;
            u32::try_from(places).ok().filter(|p| *p <= 28).ok_or_else(|| {
                RuntimeError::InvalidArgument { details: format!("cannot round to {places} places"),
                                                offset }
            })?
        },
        None => 0,
    };
    map_magnitude(&args[0], offset, |n| {
        Ok(match name {
            "floor" => n.floor(),
            "ceil" => n.ceil(),
            "trunc" => n.trunc(),
            _ => n.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero),
        })
    })
}

/// Returns -1, 0 or 1. Quantities report the sign of their magnitude.
pub fn sign(args: &[Value], offset: usize) -> EvalResult<Value> {
    let n = args[0].as_magnitude(offset)?;
    let sign = match n.cmp(&Decimal::ZERO) {
        Ordering::Less => Decimal::NEGATIVE_ONE,
        Ordering::Equal => Decimal::ZERO,
        Ordering::Greater => Decimal::ONE,
    };
    Ok(Value::Number(sign))
}

/// Spreads a lone array argument into its elements.
fn spread(args: &[Value]) -> Vec<Value> {
    match args {
        [Value::Array(items)] => items.borrow().clone(),
        _ => args.to_vec(),
    }
}

/// Implements `min` (`want == Less`) and `max` (`want == Greater`).
///
/// Accepts any number of comparable values or one array of them. Ties keep
/// the earliest argument.
///
/// # Errors
/// - `InvalidArgument` for an empty array.
/// - `TypeError` or `IncompatibleUnits` for values that cannot be ordered.
pub fn extreme(evaluator: &mut Evaluator<'_>,
               args: &[Value],
               want: Ordering,
               offset: usize)
               -> EvalResult<Value> {
    let items = spread(args);
    let mut iter = items.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(RuntimeError::InvalidArgument { details: "expected at least one value".into(),
                                                   offset });
    };
    for candidate in iter {
        if evaluator.compare_values(&candidate, &best, offset)? == want {
            best = candidate;
        }
    }
    Ok(best)
}

/// Restricts `value` to `[low, high]`.
///
/// # Errors
/// `InvalidArgument` when `low > high`.
pub fn clamp(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    let [value, low, high] = args else {
        return Err(RuntimeError::InvalidArgument { details: "clamp takes three values".into(),
                                                   offset });
    };
    if evaluator.compare_values(low, high, offset)? == Ordering::Greater {
        return Err(RuntimeError::InvalidArgument { details: format!("lower bound {low} exceeds upper bound {high}"),
                                                   offset });
    }
    if evaluator.compare_values(value, low, offset)? == Ordering::Less {
        Ok(low.clone())
    } else if evaluator.compare_values(value, high, offset)? == Ordering::Greater {
        Ok(high.clone())
    } else {
        Ok(value.clone())
    }
}

pub fn exp(args: &[Value], offset: usize) -> EvalResult<Value> {
    let x = args[0].as_number(offset)?;
    let y = match x.checked_exp() {
        Some(y) => y,
        None => f64_to_decimal(decimal_to_f64(x, offset)?.exp(), offset)?,
    };
    Ok(Value::Number(settle(y)))
}

/// Logarithms.
///
/// `base` is `None` for the natural logarithm. A second argument, when
/// present, overrides the base.
///
/// # Errors
/// `UnsupportedDomain` for non-positive input or a base of 1 or below zero.
///
/// # Example
/// ```
/// use tally::interpreter::{evaluator::function::math::log, value::core::Value};
///
/// assert_eq!(log(&[Value::from(1000)], Some(10), 0).unwrap(), Value::from(3));
/// assert_eq!(log(&[Value::from(8), Value::from(2)], Some(10), 0).unwrap(), Value::from(3));
/// assert!(log(&[Value::from(0)], None, 0).is_err());
/// ```
pub fn log(args: &[Value], base: Option<i64>, offset: usize) -> EvalResult<Value> {
    let x = args[0].as_number(offset)?;
    let base = match args.get(1) {
        Some(b) => Some(b.as_number(offset)?),
        None => base.map(Decimal::from),
    };
    let ln = |n: Decimal| {
        n.checked_ln()
         .filter(|_| n > Decimal::ZERO)
         .ok_or_else(|| RuntimeError::domain(format!("Logarithm of {n}"), offset))
    };

    let value = match base {
        None => ln(x)?,
        Some(b) if b == Decimal::TEN => x.checked_log10()
                                         .filter(|_| x > Decimal::ZERO)
                                         .ok_or_else(|| RuntimeError::domain(format!("Logarithm of {x}"), offset))?,
        Some(b) => {
            let denominator = ln(b)?;
            if denominator.is_zero() {
                return Err(RuntimeError::domain("Logarithm base 1", offset));
            }
            ln(x)?.checked_div(denominator)
                  .ok_or_else(|| RuntimeError::domain("Logarithm out of range", offset))?
        },
    };
    Ok(Value::Number(settle(value)))
}

pub fn pow(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    evaluator.eval_binary(BinaryOperator::Pow, &args[0], &args[1], offset)
}

/// Computes `n!` for a non-negative integer.
///
/// # Errors
/// - `InvalidArgument` for negative input.
/// - `UnsupportedDomain` once the result no longer fits.
pub fn factorial(args: &[Value], offset: usize) -> EvalResult<Value> {
    let n = decimal_to_i64(args[0].as_number(offset)?, offset)?;
    if n < 0 {
        return Err(RuntimeError::InvalidArgument { details: format!("factorial of negative number {n}"),
                                                   offset });
    }
    let mut acc = Decimal::ONE;
    for k in 2..=n {
        acc = acc.checked_mul(Decimal::from(k))
                 .ok_or_else(|| RuntimeError::domain(format!("{n}! is too large"), offset))?;
    }
    Ok(Value::Number(acc))
}

/// Greatest common divisor or least common multiple of two integers.
///
/// Results are never negative.
pub fn gcd_lcm(name: &str, args: &[Value], offset: usize) -> EvalResult<Value> {
    let a = decimal_to_i64(args[0].as_number(offset)?, offset)?.unsigned_abs();
    let b = decimal_to_i64(args[1].as_number(offset)?, offset)?.unsigned_abs();
    let gcd = {
        let (mut x, mut y) = (a, b);
        while y != 0 {
            (x, y) = (y, x % y);
        }
        x
    };
    let result = if name == "gcd" {
        gcd
    } else if gcd == 0 {
        0
    } else {
        (a / gcd).checked_mul(b)
                 .ok_or_else(|| RuntimeError::domain("Least common multiple is too large", offset))?
    };
    Ok(Value::Number(Decimal::from(result)))
}

/// Implements `sum` and `average`/`avg`.
///
/// Accepts numbers and quantities as separate arguments or as one array.
/// Quantities are added with unit conversion into the first one's units.
///
/// # Errors
/// - `NoValues` for the average of nothing.
/// - `TypeError` for non-numeric elements.
pub fn sum(evaluator: &mut Evaluator<'_>, args: &[Value], average: bool, offset: usize) -> EvalResult<Value> {
    let items = spread(args);
    if items.is_empty() {
        return if average {
            Err(RuntimeError::NoValues { aggregate: "average",
                                         offset })
        } else {
            Ok(Value::Number(Decimal::ZERO))
        };
    }

    let mut total = Value::Number(Decimal::ZERO);
    for item in &items {
        if !item.is_numeric() {
            return Err(item.expected("number", offset));
        }
        total = evaluator.eval_binary(BinaryOperator::Add, &total, item, offset)?;
    }
    if average {
        let count = Value::Number(usize_to_decimal(items.len()));
        total = evaluator.eval_binary(BinaryOperator::Div, &total, &count, offset)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{context::Context, environment::Scope};

    fn numbers(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn min_and_max_spread_a_single_array() {
        let context = Context::new();
        let mut evaluator = Evaluator::new(&context, Scope::root());
        let list = Value::from(numbers(&[4, -2, 9]));
        assert_eq!(extreme(&mut evaluator, &[list.clone()], Ordering::Less, 0), Ok(Value::from(-2)));
        assert_eq!(extreme(&mut evaluator, &[list], Ordering::Greater, 0), Ok(Value::from(9)));
        assert!(extreme(&mut evaluator, &[Value::from(Vec::new())], Ordering::Less, 0).is_err());
    }

    #[test]
    fn clamp_rejects_inverted_bounds() {
        let context = Context::new();
        let mut evaluator = Evaluator::new(&context, Scope::root());
        assert_eq!(clamp(&mut evaluator, &numbers(&[15, 0, 10]), 0), Ok(Value::from(10)));
        assert!(matches!(clamp(&mut evaluator, &numbers(&[1, 10, 0]), 0),
                         Err(RuntimeError::InvalidArgument { .. })));
    }

    #[test]
    fn average_of_nothing_is_fatal() {
        let context = Context::new();
        let mut evaluator = Evaluator::new(&context, Scope::root());
        assert_eq!(sum(&mut evaluator, &numbers(&[1, 2, 3, 4]), true, 0).unwrap().to_string(), "2.5");
        assert_eq!(sum(&mut evaluator, &[], false, 0), Ok(Value::from(0)));
        assert_eq!(sum(&mut evaluator, &[], true, 4),
                   Err(RuntimeError::NoValues { aggregate: "average",
                                                offset:    4, }));
    }

    #[test]
    fn integer_helpers() {
        assert_eq!(factorial(&numbers(&[5]), 0), Ok(Value::from(120)));
        assert!(factorial(&numbers(&[40]), 0).is_err());
        assert_eq!(gcd_lcm("gcd", &numbers(&[12, -18]), 0), Ok(Value::from(6)));
        assert_eq!(gcd_lcm("lcm", &numbers(&[4, 6]), 0), Ok(Value::from(12)));
    }

    #[test]
    fn trigonometry_settles_float_noise() {
        assert_eq!(float("sin", &numbers(&[0]), 0), Ok(Value::from(0)));
        assert!(float("asin", &numbers(&[2]), 0).is_err());
        assert_eq!(exp(&numbers(&[0]), 0), Ok(Value::from(1)));
    }
}
