use rust_decimal::Decimal;

use crate::{
    ast::UnaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::core::Value,
    },
};

impl Evaluator<'_> {
    /// Evaluates a unary operator applied to an already evaluated operand.
    ///
    /// - `-` negates numbers and quantities, keeping units.
    /// - `+` returns numbers and quantities unchanged.
    /// - `not` yields the negated truthiness of any value.
    /// - `%` divides by one hundred.
    ///
    /// # Errors
    /// `TypeError` when `-`, `+` or `%` is applied to a non-numeric value.
    pub fn eval_unary(&self, op: UnaryOperator, value: &Value, offset: usize) -> EvalResult<Value> {
        match (op, value) {
            (UnaryOperator::Not, v) => Ok(Value::Bool(!v.truthy())),
            (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
            (UnaryOperator::Negate, Value::Quantity(q)) => Ok(Value::Quantity(q.with_value(-q.value))),
            (UnaryOperator::Plus, v @ (Value::Number(_) | Value::Quantity(_))) => Ok(v.clone()),
            (UnaryOperator::Percent, Value::Number(n)) => Ok(Value::Number(n / Decimal::ONE_HUNDRED)),
            (UnaryOperator::Percent, Value::Quantity(q)) => {
                Ok(Value::Quantity(q.with_value(q.value / Decimal::ONE_HUNDRED)))
            },
            (op, v) => Err(RuntimeError::type_error(format!("Cannot apply '{op}' to {}",
                                                            v.type_name()),
                                                    offset)),
        }
    }
}
