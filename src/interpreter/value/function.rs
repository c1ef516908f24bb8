use std::rc::Rc;

use crate::{
    ast::Expr,
    interpreter::{environment::Scope, value::core::Value},
};

/// What runs when a function value is called.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// A built-in, referenced by its table name.
    Builtin(&'static str),
    /// A user expression.
    Expr(Rc<Expr>),
}

/// A callable value: a lambda, a named user function, or a built-in passed
/// around as a value.
#[derive(Debug)]
pub struct Function {
    /// `None` for anonymous lambdas.
    pub name:   Option<String>,
    pub params: Vec<String>,
    pub body:   FunctionBody,
    /// Scope the function was defined in. `None` means the session root,
    /// which is looked up at call time.
    pub scope:  Option<Rc<Scope>>,
}

impl Function {
    /// Wraps a built-in so it can be passed to higher-order functions.
    #[must_use]
    pub fn builtin(name: &'static str) -> Self {
        Self { name:   Some(name.to_string()),
               params: Vec::new(),
               body:   FunctionBody::Builtin(name),
               scope:  None, }
    }

    /// Name used in arity errors.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<lambda>")
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.body, &self.name) {
            (FunctionBody::Builtin(name), _) => write!(f, "<builtin {name}>"),
            (FunctionBody::Expr(_), Some(name)) => {
                write!(f, "<function {name}({})>", self.params.join(", "))
            },
            (FunctionBody::Expr(_), None) => write!(f, "<lambda({})>", self.params.join(", ")),
        }
    }
}

/// A callable with some leading arguments already bound.
#[derive(Debug)]
pub struct Partial {
    pub callee: Value,
    pub bound:  Vec<Value>,
}

impl std::fmt::Display for Partial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<partial {} with {} bound>", self.callee, self.bound.len())
    }
}
