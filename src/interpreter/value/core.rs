use std::{cell::RefCell, rc::Rc};

use rust_decimal::Decimal;

use crate::{
    ast::TypeName,
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::{
            date::DateValue,
            function::{Function, Partial},
            object::Object,
            quantity::Quantity,
        },
    },
};

/// Represents a runtime value in the interpreter.
///
/// Arrays and objects are shared, mutable handles: `push` and `set` act on
/// every alias of the same collection within one evaluation. Writing a value
/// into a scope takes a [`Value::deep_copy`] so stored bindings never change
/// behind the caller's back.
#[derive(Debug, Clone)]
pub enum Value {
    /// A dimensionless decimal number.
    Number(Decimal),
    /// A decimal tagged with units.
    Quantity(Quantity),
    String(String),
    Bool(bool),
    Null,
    /// An instant with the zone it is shown in.
    Date(DateValue),
    /// An ordered, mutable list.
    Array(Rc<RefCell<Vec<Self>>>),
    /// An insertion-ordered, mutable string map.
    Object(Rc<RefCell<Object>>),
    /// A lambda, user function or built-in.
    Function(Rc<Function>),
    /// A callable with leading arguments bound.
    Partial(Rc<Partial>),
    /// Text passed through untouched for a host renderer.
    Markdown(String),
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Number(Decimal::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(v)))
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(Rc::new(RefCell::new(v)))
    }
}

impl From<Quantity> for Value {
    fn from(v: Quantity) -> Self {
        v.into_value()
    }
}

impl From<DateValue> for Value {
    fn from(v: DateValue) -> Self {
        Self::Date(v)
    }
}

impl From<Function> for Value {
    fn from(v: Function) -> Self {
        Self::Function(Rc::new(v))
    }
}

impl Value {
    /// Name of this value's type, as used by `type()` and in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Quantity(_) => "quantity",
            Self::String(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Null => "null",
            Self::Date(_) => "date",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) | Self::Partial(_) => "function",
            Self::Markdown(_) => "markdown",
        }
    }

    /// Returns `true` if this value belongs to `type_name`, as tested by `is`.
    #[must_use]
    pub const fn is_type(&self, type_name: TypeName) -> bool {
        matches!((self, type_name),
                 (Self::Number(_), TypeName::Number)
                 | (Self::Quantity(_), TypeName::Quantity)
                 | (Self::String(_), TypeName::String)
                 | (Self::Bool(_), TypeName::Boolean)
                 | (Self::Null, TypeName::Null)
                 | (Self::Date(_), TypeName::Date)
                 | (Self::Array(_), TypeName::Array)
                 | (Self::Object(_), TypeName::Object)
                 | (Self::Function(_) | Self::Partial(_), TypeName::Function))
    }

    /// Truthiness used by `and`, `or`, `not`, the ternary and `as boolean`.
    ///
    /// Zero, the empty string, empty collections, `false` and `null` are
    /// falsy; everything else is truthy.
    ///
    /// # Example
    /// ```
    /// use tally::interpreter::value::core::Value;
    ///
    /// assert!(Value::from(3).truthy());
    /// assert!(!Value::from("").truthy());
    /// assert!(!Value::from(Vec::new()).truthy());
    /// ```
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Number(n) => !n.is_zero(),
            Self::Quantity(q) => !q.value.is_zero(),
            Self::String(s) | Self::Markdown(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Null => false,
            Self::Array(a) => !a.borrow().is_empty(),
            Self::Object(o) => !o.borrow().is_empty(),
            Self::Date(_) | Self::Function(_) | Self::Partial(_) => true,
        }
    }

    /// Copies arrays and objects recursively so the result shares no
    /// mutable state with `self`. Functions keep pointing at the same
    /// definition.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::Array(items) => items.borrow().iter().map(Self::deep_copy).collect::<Vec<_>>().into(),
            Self::Object(object) => object.borrow()
                                          .iter()
                                          .map(|(k, v)| (k.to_string(), v.deep_copy()))
                                          .collect::<Object>()
                                          .into(),
            other => other.clone(),
        }
    }

    /// Returns the number, or a type error naming what was found instead.
    pub fn as_number(&self, offset: usize) -> EvalResult<Decimal> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(other.expected("number", offset)),
        }
    }

    /// Returns the magnitude of a number or quantity.
    pub fn as_magnitude(&self, offset: usize) -> EvalResult<Decimal> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Quantity(q) => Ok(q.value),
            other => Err(other.expected("number", offset)),
        }
    }

    /// Borrows the string contents.
    pub fn as_str(&self, offset: usize) -> EvalResult<&str> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.expected("string", offset)),
        }
    }

    /// Returns the shared array handle.
    pub fn as_array(&self, offset: usize) -> EvalResult<Rc<RefCell<Vec<Self>>>> {
        match self {
            Self::Array(a) => Ok(Rc::clone(a)),
            other => Err(other.expected("array", offset)),
        }
    }

    /// Returns the shared object handle.
    pub fn as_object(&self, offset: usize) -> EvalResult<Rc<RefCell<Object>>> {
        match self {
            Self::Object(o) => Ok(Rc::clone(o)),
            other => Err(other.expected("object", offset)),
        }
    }

    pub fn as_date(&self, offset: usize) -> EvalResult<&DateValue> {
        match self {
            Self::Date(d) => Ok(d),
            other => Err(other.expected("date", offset)),
        }
    }

    /// Returns `true` for lambdas, functions and partials.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Partial(_))
    }

    /// Returns `true` for numbers and quantities.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Quantity(_))
    }

    /// Builds the type error for a value of the wrong kind.
    #[must_use]
    pub fn expected(&self, wanted: &str, offset: usize) -> RuntimeError {
        RuntimeError::type_error(format!("Expected {wanted}, found {}", self.type_name()), offset)
    }

    /// Formats the value as an element of a collection, quoting strings.
    fn fmt_nested(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality, except callables, which compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Quantity(a), Self::Quantity(b)) => a == b,
            (Self::String(a), Self::String(b)) | (Self::Markdown(a), Self::Markdown(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Partial(a), Self::Partial(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Renders a decimal without trailing zeros, rounded to 15 places.
#[must_use]
pub fn format_decimal(value: Decimal) -> String {
    value.round_dp(15).normalize().to_string()
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", format_decimal(*n)),
            Self::Quantity(q) => write!(f, "{q}"),
            Self::String(s) | Self::Markdown(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Array(a) => {
                write!(f, "[")?;

                for (index, value) in a.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }

                    value.fmt_nested(f)?;
                }

                write!(f, "]")
            },
            Self::Object(o) => {
                write!(f, "{{")?;
                for (index, (key, value)) in o.borrow().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: ")?;
                    value.fmt_nested(f)?;
                }
                write!(f, "}}")
            },
            Self::Function(func) => write!(f, "{func}"),
            Self::Partial(partial) => write!(f, "{partial}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_copy_detaches_collections() {
        let original = Value::from(vec![Value::from(1), Value::from(vec![Value::from(2)])]);
        let copy = original.deep_copy();
        if let Value::Array(items) = &original {
            items.borrow_mut().push(Value::from(3));
        }
        assert_eq!(copy.to_string(), "[1, [2]]");
        assert_eq!(original.to_string(), "[1, [2], 3]");
    }

    #[test]
    fn nested_strings_are_quoted() {
        let value = Value::from(vec![Value::from("a"), Value::Null]);
        assert_eq!(value.to_string(), r#"["a", null]"#);
        assert_eq!(Value::from("a").to_string(), "a");
    }

    #[test]
    fn functions_compare_by_identity() {
        let f = Value::from(Function::builtin("sqrt"));
        let g = Value::from(Function::builtin("sqrt"));
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
    }

    #[test]
    fn numbers_display_normalized() {
        assert_eq!(Value::Number(Decimal::new(1500, 2)).to_string(), "15");
        assert_eq!(Value::Number(Decimal::ONE / Decimal::from(3)).to_string(), "0.333333333333333");
    }
}
