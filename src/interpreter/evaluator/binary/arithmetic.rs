use rust_decimal::Decimal;

use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            binary::core::mismatch,
            core::{EvalResult, Evaluator},
        },
        value::{core::Value, quantity::Quantity},
    },
    util::num::decimal_to_i64,
};

impl Evaluator<'_> {
    /// Multiplication. Exponents of shared categories add up; a quantity
    /// whose exponents all cancel becomes a plain number.
    pub(super) fn eval_mul(&self, left: &Value, right: &Value, offset: usize) -> EvalResult<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => a.checked_mul(*b)
                                                     .map(Value::Number)
                                                     .ok_or_else(|| RuntimeError::overflow(offset)),
            (Value::Number(n), Value::Quantity(q)) | (Value::Quantity(q), Value::Number(n)) => {
                Ok(Value::Quantity(q.scale(*n, offset)?))
            },
            (Value::Quantity(a), Value::Quantity(b)) => a.mul(b, &self.context.rates, offset),
            (a, b) => Err(mismatch(BinaryOperator::Mul, a, b, offset)),
        }
    }

    /// Division. Exponents of the divisor are subtracted per category.
    ///
    /// # Errors
    /// `DivisionByZero` if the divisor's magnitude is zero.
    pub(super) fn eval_div(&self, left: &Value, right: &Value, offset: usize) -> EvalResult<Value> {
        if matches!(right, Value::Number(_) | Value::Quantity(_))
           && right.as_magnitude(offset)?.is_zero()
        {
            return Err(RuntimeError::DivisionByZero { offset });
        }
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => a.checked_div(*b)
                                                     .map(Value::Number)
                                                     .ok_or_else(|| RuntimeError::overflow(offset)),
            (Value::Quantity(q), Value::Number(n)) => q.value
                                                       .checked_div(*n)
                                                       .map(|v| Value::Quantity(q.with_value(v)))
                                                       .ok_or_else(|| RuntimeError::overflow(offset)),
            (Value::Number(n), Value::Quantity(q)) => {
                dimensionless(*n).div(q, &self.context.rates, offset)
            },
            (Value::Quantity(a), Value::Quantity(b)) => a.div(b, &self.context.rates, offset),
            (a, b) => Err(mismatch(BinaryOperator::Div, a, b, offset)),
        }
    }

    /// Remainder, with the sign of the dividend.
    pub(super) fn eval_rem(&self, left: &Value, right: &Value, offset: usize) -> EvalResult<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => {
                if b.is_zero() {
                    return Err(RuntimeError::DivisionByZero { offset });
                }
                a.checked_rem(*b)
                 .map(Value::Number)
                 .ok_or_else(|| RuntimeError::overflow(offset))
            },
            (Value::Quantity(q), Value::Number(n)) => {
                if n.is_zero() {
                    return Err(RuntimeError::DivisionByZero { offset });
                }
                q.value
                 .checked_rem(*n)
                 .map(|v| Value::Quantity(q.with_value(v)))
                 .ok_or_else(|| RuntimeError::overflow(offset))
            },
            (Value::Quantity(a), Value::Quantity(b)) => {
                Ok(a.rem(b, &self.context.rates, offset)?.into_value())
            },
            (a, b) => Err(mismatch(BinaryOperator::Mod, a, b, offset)),
        }
    }

    /// Bitwise and, or and shifts on whole numbers.
    ///
    /// # Errors
    /// - `TypeError` for non-numbers.
    /// - `UnsupportedDomain` for fractions, values outside the 64-bit range,
    ///   or shift amounts outside `0..64`.
    pub(super) fn eval_bitwise(op: BinaryOperator,
                               left: &Value,
                               right: &Value,
                               offset: usize)
                               -> EvalResult<Value> {
        let (Value::Number(a), Value::Number(b)) = (left, right) else {
            return Err(mismatch(op, left, right, offset));
        };
        let a = decimal_to_i64(*a, offset)?;
        let b = decimal_to_i64(*b, offset)?;
        let shift = || {
            u32::try_from(b).ok()
                            .filter(|s| *s < 64)
                            .ok_or_else(|| RuntimeError::domain(format!("Shift amount {b} is out of range"),
                                                                offset))
        };
        let result = match op {
            BinaryOperator::BitAnd => a & b,
            BinaryOperator::BitOr => a | b,
            BinaryOperator::Shl => a.checked_shl(shift()?)
                                    .ok_or_else(|| RuntimeError::overflow(offset))?,
            BinaryOperator::Shr => a >> shift()?,
            _ => return Err(mismatch(op, left, right, offset)),
        };
        Ok(Value::from(result))
    }
}

/// A plain number viewed as a quantity with no units.
fn dimensionless(value: Decimal) -> Quantity {
    Quantity { value,
               dims: Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{context::Context, environment::Scope};

    #[test]
    fn division_by_zero_is_fatal() {
        let context = Context::new();
        let evaluator = Evaluator::new(&context, Scope::root());
        assert_eq!(evaluator.eval_div(&Value::from(1), &Value::from(0), 2),
                   Err(RuntimeError::DivisionByZero { offset: 2 }));
        assert_eq!(evaluator.eval_rem(&Value::from(1), &Value::from(0), 2),
                   Err(RuntimeError::DivisionByZero { offset: 2 }));
    }

    #[test]
    fn decimal_division_is_exact_enough() {
        let context = Context::new();
        let evaluator = Evaluator::new(&context, Scope::root());
        let third = evaluator.eval_div(&Value::from(1), &Value::from(3), 0).unwrap();
        let back = evaluator.eval_mul(&third, &Value::from(3), 0).unwrap();
        assert_eq!(back.to_string(), "1");
    }

    #[test]
    fn bitwise_operators() {
        assert_eq!(Evaluator::eval_bitwise(BinaryOperator::BitAnd, &Value::from(6), &Value::from(3), 0),
                   Ok(Value::from(2)));
        assert_eq!(Evaluator::eval_bitwise(BinaryOperator::Shl, &Value::from(1), &Value::from(4), 0),
                   Ok(Value::from(16)));
        assert!(Evaluator::eval_bitwise(BinaryOperator::Shr, &Value::from(1), &Value::from(64), 0).is_err());
    }
}
