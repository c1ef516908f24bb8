use std::rc::Rc;

use crate::{
    ast::{Callee, Expr},
    error::RuntimeError,
    interpreter::{
        environment::Scope,
        evaluator::{
            core::{EvalResult, Evaluator, MAX_CALL_DEPTH},
            function::core::builtin_name,
        },
        value::{core::Value, function::FunctionBody},
    },
};

impl Evaluator<'_> {
    /// Evaluates a call expression.
    ///
    /// A named callee resolves to a callable binding in scope first, then to
    /// a built-in of that name. Any other callee is evaluated and must yield
    /// a function or partial. Arguments are evaluated left to right before
    /// the call.
    ///
    /// # Errors
    /// - `UnknownFunction` if the name is neither bound nor built in.
    /// - `TypeError` if the name or expression is bound to a non-callable.
    /// - Any error raised by the callee.
    pub fn eval_call(&mut self,
                     callee: &Callee,
                     args: &[Expr],
                     offset: usize,
                     scope: &Rc<Scope>)
                     -> EvalResult<Value> {
        let function = match callee {
            Callee::Named(name) => match scope.get(name) {
                Some(value) if value.is_callable() => value,
                bound => {
                    if let Some(builtin) = builtin_name(name) {
                        let args = self.eval_arguments(args, scope)?;
                        return self.call_builtin(builtin, &args, offset);
                    }
                    return Err(match bound {
                        Some(value) => RuntimeError::type_error(format!("'{name}' is a {}, not a function",
                                                                        value.type_name()),
                                                                offset),
                        None => RuntimeError::UnknownFunction { name: name.clone(),
                                                                offset },
                    });
                },
            },
            Callee::Expr(expr) => self.eval(expr, scope)?,
        };
        let args = self.eval_arguments(args, scope)?;
        self.call_value(&function, args, offset)
    }

    fn eval_arguments(&mut self, args: &[Expr], scope: &Rc<Scope>) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, scope)).collect()
    }

    /// Invokes a callable value with already evaluated arguments.
    ///
    /// User functions run in a fresh scope chained to the scope they were
    /// defined in, with each parameter bound to its argument. Partials
    /// prepend their bound arguments and call through.
    ///
    /// # Errors
    /// - `ArgumentCountMismatch` if the argument count differs from the
    ///   parameter count.
    /// - `RecursionLimit` once calls nest deeper than [`MAX_CALL_DEPTH`].
    /// - `TypeError` if `callee` is not callable.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>, offset: usize) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => match &function.body {
                FunctionBody::Builtin(name) => self.call_builtin(name, &args, offset),
                FunctionBody::Expr(body) => {
                    if args.len() != function.params.len() {
                        return Err(RuntimeError::ArgumentCountMismatch { name:     function.display_name()
                                                                                           .to_string(),
                                                                         expected: function.params
                                                                                           .len()
                                                                                           .to_string(),
                                                                         found:    args.len(),
                                                                         offset });
                    }
                    if self.depth >= MAX_CALL_DEPTH {
                        return Err(RuntimeError::RecursionLimit { depth: MAX_CALL_DEPTH,
                                                                  offset });
                    }
                    let parent = function.scope.clone().unwrap_or_else(|| Rc::clone(&self.root));
                    let local = Scope::child(&parent);
                    for (param, arg) in function.params.iter().zip(args) {
                        local.bind(param, arg);
                    }

                    self.depth += 1;
                    let result = self.eval(body, &local);
                    self.depth -= 1;
                    result
                },
            },
            Value::Partial(partial) => {
                let mut all = partial.bound.clone();
                all.extend(args);
                self.call_value(&partial.callee, all, offset)
            },
            other => Err(RuntimeError::type_error(format!("Cannot call a value of type {}",
                                                          other.type_name()),
                                                  offset)),
        }
    }

    /// Number of parameters a callable declares, if it is known.
    ///
    /// Built-ins report `None`; partials subtract their bound arguments.
    #[must_use]
    pub fn declared_arity(callee: &Value) -> Option<usize> {
        match callee {
            Value::Function(function) => match function.body {
                FunctionBody::Builtin(_) => None,
                FunctionBody::Expr(_) => Some(function.params.len()),
            },
            Value::Partial(partial) => {
                Self::declared_arity(&partial.callee).map(|n| n.saturating_sub(partial.bound.len()))
            },
            _ => None,
        }
    }
}
