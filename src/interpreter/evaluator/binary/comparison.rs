use std::cmp::Ordering;

use crate::{
    ast::ComparisonOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::core::Value,
    },
};

impl Evaluator<'_> {
    /// Evaluates a comparison operator and returns a boolean.
    ///
    /// Equality is structural and never fails: values of different kinds are
    /// simply unequal. Quantities of the same dimensions are converted before
    /// comparing, so `1 km == 1000 m`. Ordering operators go through
    /// [`Evaluator::compare_values`].
    ///
    /// # Errors
    /// Ordering operators fail for values without a natural order or for
    /// quantities of different dimensions.
    pub fn eval_comparison(&self,
                           op: ComparisonOperator,
                           left: &Value,
                           right: &Value,
                           offset: usize)
                           -> EvalResult<Value> {
        use ComparisonOperator::{Equal, Greater, GreaterEqual, Less, LessEqual, NotEqual};

        let result = match op {
            Equal => self.values_equal(left, right, offset),
            NotEqual => !self.values_equal(left, right, offset),
            Less => self.compare_values(left, right, offset)? == Ordering::Less,
            LessEqual => self.compare_values(left, right, offset)? != Ordering::Greater,
            Greater => self.compare_values(left, right, offset)? == Ordering::Greater,
            GreaterEqual => self.compare_values(left, right, offset)? != Ordering::Less,
        };
        Ok(Value::Bool(result))
    }

    fn values_equal(&self, left: &Value, right: &Value, offset: usize) -> bool {
        match (left, right) {
            (Value::Quantity(a), Value::Quantity(b)) if a.dims.compatible(&b.dims) => {
                b.convert_to(&a.dims, &self.context.rates, offset)
                 .is_ok_and(|b| b.value == a.value)
            },
            _ => left == right,
        }
    }

    /// Orders two values.
    ///
    /// Numbers and quantities order by magnitude (a quantity is converted
    /// into the other's units first), strings lexicographically, dates by
    /// instant and booleans with `false` first.
    ///
    /// # Errors
    /// - `IncompatibleUnits` for quantities of different dimensions.
    /// - `TypeError` for any other pairing.
    pub fn compare_values(&self, left: &Value, right: &Value, offset: usize) -> EvalResult<Ordering> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(a.cmp(b)),
            (Value::Quantity(a), Value::Quantity(b)) => {
                let b = b.convert_to(&a.dims, &self.context.rates, offset)?;
                Ok(a.value.cmp(&b.value))
            },
            (Value::Number(a), Value::Quantity(b)) => Ok(a.cmp(&b.value)),
            (Value::Quantity(a), Value::Number(b)) => Ok(a.value.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (a, b) => Err(RuntimeError::type_error(format!("Cannot compare {} with {}",
                                                           a.type_name(),
                                                           b.type_name()),
                                                   offset)),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        ast::UnitTerm,
        interpreter::{
            context::Context, environment::Scope, units::RateTable, value::quantity::Quantity,
        },
    };

    fn quantity(value: i64, unit: &str) -> Value {
        Quantity::from_terms(Decimal::from(value), &[UnitTerm::new(unit, 1)], &RateTable::new(), 0)
            .unwrap()
            .into_value()
    }

    #[test]
    fn quantities_compare_across_units() {
        let context = Context::new();
        let evaluator = Evaluator::new(&context, Scope::root());
        assert_eq!(evaluator.eval_comparison(ComparisonOperator::Equal,
                                             &quantity(1, "km"),
                                             &quantity(1000, "m"),
                                             0),
                   Ok(Value::Bool(true)));
        assert_eq!(evaluator.eval_comparison(ComparisonOperator::Less,
                                             &quantity(90, "cm"),
                                             &quantity(1, "m"),
                                             0),
                   Ok(Value::Bool(true)));
    }

    #[test]
    fn equality_across_kinds_is_false() {
        let context = Context::new();
        let evaluator = Evaluator::new(&context, Scope::root());
        assert_eq!(evaluator.eval_comparison(ComparisonOperator::Equal,
                                             &Value::from(1),
                                             &Value::from("1"),
                                             0),
                   Ok(Value::Bool(false)));
        assert!(evaluator.eval_comparison(ComparisonOperator::Less,
                                          &Value::from(1),
                                          &Value::from("1"),
                                          0)
                         .is_err());
    }
}
