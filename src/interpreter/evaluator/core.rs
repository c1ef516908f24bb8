use std::rc::Rc;

use rust_decimal::Decimal;

use crate::{
    ast::{Constant, Expr, LogicalOperator, StringPart},
    error::RuntimeError,
    interpreter::{
        context::Context,
        environment::Scope,
        evaluator::function::core::builtin_name,
        value::{
            core::Value,
            function::{Function, FunctionBody},
            object::Object,
            quantity::Quantity,
        },
    },
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Deepest nesting of user function calls before evaluation gives up.
pub const MAX_CALL_DEPTH: usize = 10_000;

/// Remaining stack below which evaluation continues on a new segment.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each new stack segment.
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// The golden ratio to 28 decimal places.
const PHI: Decimal = Decimal::from_parts(3_068_950_840, 3_775_324_002, 877_137_982, false, 28);

/// Walks an expression tree against a scope chain.
///
/// One evaluator serves one call to [`crate::evaluate`]. It borrows the
/// host's [`Context`] and holds the session root scope, which functions
/// defined at the top level resolve against when they are called.
pub struct Evaluator<'c> {
    pub(crate) context: &'c Context,
    pub(crate) root:    Rc<Scope>,
    pub(crate) depth:   usize,
}

impl<'c> Evaluator<'c> {
    /// Creates an evaluator over a session root scope.
    #[must_use]
    pub const fn new(context: &'c Context, root: Rc<Scope>) -> Self {
        Self { context,
               root,
               depth: 0 }
    }

    /// Evaluates an expression and returns the resulting value.
    ///
    /// This is the main dispatch point: every expression kind is handled here
    /// or forwarded to the module that implements it.
    ///
    /// # Parameters
    /// - `expr`: Expression to evaluate.
    /// - `scope`: Scope that names are resolved in and assignments bind into.
    ///
    /// # Returns
    /// The value of the expression, or the first error encountered.
    pub fn eval(&mut self, expr: &Expr, scope: &Rc<Scope>) -> EvalResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_node(expr, scope))
    }

    fn eval_node(&mut self, expr: &Expr, scope: &Rc<Scope>) -> EvalResult<Value> {
        match expr {
            Expr::Number { value, units, offset } => {
                if units.is_empty() {
                    Ok(Value::Number(*value))
                } else {
                    Ok(Quantity::from_terms(*value, units, &self.context.rates, *offset)?.into_value())
                }
            },
            Expr::Str { parts, .. } => self.eval_string(parts, scope),
            Expr::Constant { constant, .. } => Ok(eval_constant(*constant, scope)),
            Expr::Variable { name, offset } => eval_variable(name, *offset, scope),
            Expr::Unary { op, expr, offset } => {
                let value = self.eval(expr, scope)?;
                self.eval_unary(*op, &value, *offset)
            },
            Expr::Binary { left,
                           op,
                           right,
                           offset, } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                self.eval_binary(*op, &left, &right, *offset)
            },
            Expr::Logical { left, op, right, .. } => {
                let left = self.eval(left, scope)?.truthy();
                let result = match op {
                    LogicalOperator::And => left && self.eval(right, scope)?.truthy(),
                    LogicalOperator::Or => left || self.eval(right, scope)?.truthy(),
                };
                Ok(Value::Bool(result))
            },
            Expr::Comparison { left,
                               op,
                               right,
                               offset, } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                self.eval_comparison(*op, &left, &right, *offset)
            },
            Expr::Ternary { condition,
                            then_branch,
                            else_branch,
                            .. } => {
                if self.eval(condition, scope)?.truthy() {
                    self.eval(then_branch, scope)
                } else {
                    self.eval(else_branch, scope)
                }
            },
            Expr::TypeCheck { expr, type_name, .. } => {
                Ok(Value::Bool(self.eval(expr, scope)?.is_type(*type_name)))
            },
            Expr::TypeCast { expr, target, offset } => {
                let value = self.eval(expr, scope)?;
                self.eval_cast(&value, *target, *offset)
            },
            Expr::Conversion { expr, target, offset } => {
                let value = self.eval(expr, scope)?;
                self.eval_conversion(&value, target, *offset)
            },
            Expr::Call { callee, args, offset } => self.eval_call(callee, args, *offset, scope),
            Expr::Access { object, key, offset } => {
                let object = self.eval(object, scope)?;
                let key = self.eval(key, scope)?;
                Self::eval_access(&object, &key, *offset)
            },
            Expr::Assignment { name,
                               value,
                               compound,
                               offset, } => {
                let mut value = self.eval(value, scope)?;
                if let Some(op) = compound {
                    let current =
                        scope.get(name)
                             .ok_or_else(|| RuntimeError::UnknownVariable { name: name.clone(),
                                                                            offset: *offset })?;
                    value = self.eval_binary(*op, &current, &value, *offset)?;
                }
                scope.define(name, &value);
                Ok(value)
            },
            Expr::Aggregate { kind, target, offset } => {
                self.eval_aggregate(*kind, target.as_deref(), *offset)
            },
            Expr::Date { date, zone, offset } => self.eval_date(*date, zone.as_deref(), *offset),
            Expr::Time { time, zone, offset } => self.eval_time(*time, zone.as_deref(), *offset),
            Expr::DateTime { datetime,
                             zone,
                             offset, } => self.eval_datetime(*datetime, zone.as_deref(), *offset),
            Expr::DateOperation { date,
                                  op,
                                  amount,
                                  unit,
                                  offset, } => {
                let date = self.eval(date, scope)?;
                let amount = self.eval(amount, scope)?;
                Self::eval_date_operation(&date, *op, &amount, *unit, *offset)
            },
            Expr::Array { elements, .. } => {
                let values = elements.iter()
                                     .map(|element| self.eval(element, scope))
                                     .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::from(values))
            },
            Expr::Object { entries, .. } => {
                let mut object = Object::new();
                for (key, value) in entries {
                    object.insert(key.clone(), self.eval(value, scope)?);
                }
                Ok(Value::from(object))
            },
            Expr::Lambda { name, params, body, .. } => {
                let captured = if Rc::ptr_eq(scope, &self.root) {
                    None
                } else {
                    Some(Rc::clone(scope))
                };
                Ok(Value::from(Function { name:   name.clone(),
                                          params: params.clone(),
                                          body:   FunctionBody::Expr(Rc::clone(body)),
                                          scope:  captured, }))
            },
        }
    }

    /// Concatenates string parts, rendering interpolated values with their
    /// display form.
    fn eval_string(&mut self, parts: &[StringPart], scope: &Rc<Scope>) -> EvalResult<Value> {
        let mut text = String::new();
        for part in parts {
            match part {
                StringPart::Text(s) => text.push_str(s),
                StringPart::Interpolation(expr) => text.push_str(&self.eval(expr, scope)?.to_string()),
            }
        }
        Ok(Value::String(text))
    }
}

/// Resolves a constant. A binding with the same name shadows the
/// mathematical constants, so a lambda parameter called `e` works.
fn eval_constant(constant: Constant, scope: &Scope) -> Value {
    let value = match constant {
        Constant::True => return Value::Bool(true),
        Constant::False => return Value::Bool(false),
        Constant::Null => return Value::Null,
        Constant::Pi => Decimal::PI,
        Constant::E => Decimal::E,
        Constant::Tau => Decimal::TWO_PI,
        Constant::Phi => PHI,
    };
    scope.get(constant.name()).unwrap_or(Value::Number(value))
}

/// Resolves a variable, falling back to a built-in function of that name so
/// built-ins can be passed as values (`map(xs, sqrt)`).
fn eval_variable(name: &str, offset: usize, scope: &Scope) -> EvalResult<Value> {
    if let Some(value) = scope.get(name) {
        return Ok(value);
    }
    builtin_name(name).map(|builtin| Value::from(Function::builtin(builtin)))
                      .ok_or_else(|| RuntimeError::UnknownVariable { name: name.to_string(),
                                                                     offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phi_constant_is_golden_ratio() {
        assert_eq!(PHI.round_dp(10), Decimal::new(16_180_339_887, 10));
    }
}
