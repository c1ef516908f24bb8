use rust_decimal::{Decimal, MathematicalOps};

use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            binary::core::mismatch,
            core::{EvalResult, Evaluator},
        },
        value::core::Value,
    },
    util::num::{decimal_to_f64, decimal_to_i64, f64_to_decimal},
};

impl Evaluator<'_> {
    /// Evaluates exponentiation.
    ///
    /// - Integer exponents are computed exactly, negative ones as reciprocals.
    /// - Fractional exponents follow real exponentiation and fail for a
    ///   negative base.
    /// - A quantity may only be raised to an integer power, which scales its
    ///   exponents (`(3 m)^2` is `9 m^2`).
    ///
    /// # Errors
    /// - `TypeError` if either side is not numeric or the exponent has units.
    /// - `DivisionByZero` for zero raised to a negative power.
    /// - `UnsupportedDomain` for a negative base with a fractional exponent,
    ///   or on overflow.
    pub(super) fn eval_pow(base: &Value, exponent: &Value, offset: usize) -> EvalResult<Value> {
        let Value::Number(exp) = exponent else {
            return Err(mismatch(BinaryOperator::Pow, base, exponent, offset));
        };
        match base {
            Value::Number(b) => Ok(Value::Number(pow_decimal(*b, *exp, offset)?)),
            Value::Quantity(q) => {
                if !exp.fract().is_zero() {
                    return Err(RuntimeError::type_error("Quantities can only be raised to whole powers",
                                                        offset));
                }
                let power = i32::try_from(decimal_to_i64(*exp, offset)?)
                    .map_err(|_| RuntimeError::domain("Exponent is too large", offset))?;
                if q.value.is_zero() && power < 0 {
                    return Err(RuntimeError::DivisionByZero { offset });
                }
                q.powi(power, offset)
            },
            _ => Err(mismatch(BinaryOperator::Pow, base, exponent, offset)),
        }
    }
}

/// `base ^ exp` on decimals.
pub(crate) fn pow_decimal(base: Decimal, exp: Decimal, offset: usize) -> EvalResult<Decimal> {
    if exp.fract().is_zero() {
        let exp = decimal_to_i64(exp, offset)?;
        if base.is_zero() && exp < 0 {
            return Err(RuntimeError::DivisionByZero { offset });
        }
        return base.checked_powi(exp)
                   .ok_or_else(|| RuntimeError::overflow(offset));
    }
    if base.is_sign_negative() && !base.is_zero() {
        return Err(RuntimeError::domain(format!("Cannot raise negative number {base} to a fractional power"),
                                        offset));
    }
    if base.is_zero() {
        return Ok(Decimal::ZERO);
    }
    match base.checked_powd(exp) {
        Some(result) => Ok(result),
        None => {
            let result = decimal_to_f64(base, offset)?.powf(decimal_to_f64(exp, offset)?);
            f64_to_decimal(result, offset)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_powers_are_exact() {
        assert_eq!(pow_decimal(Decimal::from(2), Decimal::from(10), 0), Ok(Decimal::from(1024)));
        assert_eq!(pow_decimal(Decimal::from(2), Decimal::from(-2), 0), Ok(Decimal::new(25, 2)));
    }

    #[test]
    fn fractional_powers() {
        let root = pow_decimal(Decimal::from(9), Decimal::new(5, 1), 0).unwrap();
        assert_eq!(root.round_dp(10), Decimal::from(3));
        assert!(matches!(pow_decimal(Decimal::from(-8), Decimal::new(5, 1), 0),
                         Err(RuntimeError::UnsupportedDomain { .. })));
    }

    #[test]
    fn zero_to_negative_power() {
        assert_eq!(pow_decimal(Decimal::ZERO, Decimal::from(-1), 4),
                   Err(RuntimeError::DivisionByZero { offset: 4 }));
    }
}
