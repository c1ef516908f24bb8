use crate::{
    ast::{BinaryOperator, UnitTerm},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        units::{self, Category},
        value::{core::Value, date::DateValue, quantity::Quantity},
    },
};

impl Evaluator<'_> {
    /// Evaluates a binary operation between two values.
    ///
    /// Routes the operation to a handler by operator: addition and
    /// subtraction here, multiplication, division, modulo and the bitwise
    /// operators in `arithmetic`, exponentiation in `power`.
    ///
    /// # Parameters
    /// - `op`: The operator.
    /// - `left`: Left operand.
    /// - `right`: Right operand.
    /// - `offset`: Byte offset of the operator, for error reporting.
    ///
    /// # Returns
    /// An `EvalResult<Value>` containing the evaluated result.
    ///
    /// # Example
    /// ```
    /// use tally::{
    ///     Context,
    ///     ast::BinaryOperator,
    ///     interpreter::{environment::Scope, evaluator::core::Evaluator, value::core::Value},
    /// };
    ///
    /// let context = Context::new();
    /// let evaluator = Evaluator::new(&context, Scope::root());
    ///
    /// let result = evaluator.eval_binary(BinaryOperator::Add, &Value::from(3), &Value::from(4), 0);
    /// assert_eq!(result.unwrap(), Value::from(7));
    /// ```
    pub fn eval_binary(&self,
                       op: BinaryOperator,
                       left: &Value,
                       right: &Value,
                       offset: usize)
                       -> EvalResult<Value> {
        use BinaryOperator::{Add, BitAnd, BitOr, Div, Mod, Mul, Pow, Shl, Shr, Sub};

        match op {
            Add => self.eval_add(left, right, offset),
            Sub => self.eval_sub(left, right, offset),
            Mul => self.eval_mul(left, right, offset),
            Div => self.eval_div(left, right, offset),
            Mod => self.eval_rem(left, right, offset),
            Pow => Self::eval_pow(left, right, offset),
            BitAnd | BitOr | Shl | Shr => Self::eval_bitwise(op, left, right, offset),
        }
    }

    /// Addition.
    ///
    /// Strings concatenate with the display form of the other side, arrays
    /// concatenate, a date moves by a time quantity and a plain number added
    /// to a quantity takes on its units.
    fn eval_add(&self, left: &Value, right: &Value, offset: usize) -> EvalResult<Value> {
        let rates = &self.context.rates;
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => a.checked_add(*b)
                                                     .map(Value::Number)
                                                     .ok_or_else(|| RuntimeError::overflow(offset)),
            (Value::Quantity(a), Value::Quantity(b)) => Ok(a.add(b, rates, offset)?.into_value()),
            (Value::Number(n), Value::Quantity(q)) | (Value::Quantity(q), Value::Number(n)) => {
                Ok(Value::Quantity(q.plus(*n, offset)?))
            },
            (Value::Date(d), Value::Quantity(q)) | (Value::Quantity(q), Value::Date(d)) => {
                Ok(Value::Date(shift_by_quantity(d, q, false, offset)?))
            },
            (Value::String(a), b) => Ok(Value::String(format!("{a}{b}"))),
            (a, Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (Value::Array(a), Value::Array(b)) => {
                let mut joined = a.borrow().clone();
                joined.extend(b.borrow().iter().cloned());
                Ok(Value::from(joined))
            },
            (a, b) => Err(mismatch(BinaryOperator::Add, a, b, offset)),
        }
    }

    /// Subtraction. Two dates give the duration between them in seconds.
    fn eval_sub(&self, left: &Value, right: &Value, offset: usize) -> EvalResult<Value> {
        let rates = &self.context.rates;
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => a.checked_sub(*b)
                                                     .map(Value::Number)
                                                     .ok_or_else(|| RuntimeError::overflow(offset)),
            (Value::Quantity(a), Value::Quantity(b)) => Ok(a.sub(b, rates, offset)?.into_value()),
            (Value::Quantity(q), Value::Number(n)) => Ok(Value::Quantity(q.plus(-n, offset)?)),
            (Value::Number(n), Value::Quantity(q)) => {
                Ok(Value::Quantity(q.with_value(-q.value).plus(*n, offset)?))
            },
            (Value::Date(d), Value::Quantity(q)) => {
                Ok(Value::Date(shift_by_quantity(d, q, true, offset)?))
            },
            (Value::Date(a), Value::Date(b)) => {
                let seconds = a.seconds_since(b);
                Ok(Value::Quantity(Quantity::from_terms(seconds,
                                                        &[UnitTerm::new("s", 1)],
                                                        rates,
                                                        offset)?))
            },
            (a, b) => Err(mismatch(BinaryOperator::Sub, a, b, offset)),
        }
    }
}

/// Moves a date by a quantity of time, using calendar rules for days, weeks,
/// months and years.
fn shift_by_quantity(date: &DateValue,
                     quantity: &Quantity,
                     negate: bool,
                     offset: usize)
                     -> EvalResult<DateValue> {
    let calendar = quantity.dims
                           .single()
                           .filter(|(category, term)| {
                               *category == Category::Time && term.exponent == 1
                           })
                           .and_then(|(_, term)| units::lookup(&term.unit))
                           .and_then(units::UnitDef::calendar_unit);
    let Some(unit) = calendar else {
        return Err(RuntimeError::type_error(format!("Cannot shift a date by '{}'", quantity.dims),
                                            offset));
    };
    let amount = if negate { -quantity.value } else { quantity.value };
    date.shift(amount, unit, offset)
}

/// Type error for an operator that does not accept this pair of operands.
pub(super) fn mismatch(op: BinaryOperator, left: &Value, right: &Value, offset: usize) -> RuntimeError {
    RuntimeError::type_error(format!("Cannot apply '{op}' to {} and {}",
                                     left.type_name(),
                                     right.type_name()),
                             offset)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::interpreter::{context::Context, environment::Scope, units::RateTable};

    fn quantity(value: i64, unit: &str) -> Value {
        Quantity::from_terms(Decimal::from(value), &[UnitTerm::new(unit, 1)], &RateTable::new(), 0)
            .unwrap()
            .into_value()
    }

    #[test]
    fn adding_converts_into_left_units() {
        let context = Context::new();
        let evaluator = Evaluator::new(&context, Scope::root());
        let sum = evaluator.eval_binary(BinaryOperator::Add, &quantity(1, "m"), &quantity(50, "cm"), 0)
                           .unwrap();
        assert_eq!(sum.to_string(), "1.5 m");
    }

    #[test]
    fn strings_concatenate_with_display_form() {
        let context = Context::new();
        let evaluator = Evaluator::new(&context, Scope::root());
        let joined = evaluator.eval_binary(BinaryOperator::Add, &Value::from("n="), &Value::from(3), 0)
                              .unwrap();
        assert_eq!(joined, Value::from("n=3"));
    }

    #[test]
    fn mixing_categories_fails() {
        let context = Context::new();
        let evaluator = Evaluator::new(&context, Scope::root());
        assert!(matches!(evaluator.eval_binary(BinaryOperator::Sub, &quantity(1, "kg"), &quantity(1, "m"), 9),
                         Err(RuntimeError::IncompatibleUnits { offset: 9, .. })));
    }
}
