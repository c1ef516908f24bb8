use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::interpreter::value::core::Value;

/// One link of the scope chain.
///
/// The session root has no parent; every function call gets a child scope
/// chained to the scope its function was defined in. Lookups walk the chain
/// outwards at the moment of the lookup, so closures see bindings as they are
/// at call time.
#[derive(Debug, Default)]
pub struct Scope {
    values: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Self>>,
}

impl Scope {
    /// Creates a scope with no parent.
    #[must_use]
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Creates an empty scope chained to `parent`.
    #[must_use]
    pub fn child(parent: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self { values: RefCell::new(HashMap::new()),
                       parent: Some(Rc::clone(parent)), })
    }

    /// Looks `name` up in this scope, then in each ancestor.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Binds a deep copy of `value` in this scope.
    pub fn define(&self, name: &str, value: &Value) {
        self.values.borrow_mut().insert(name.to_string(), value.deep_copy());
    }

    /// Binds `value` as is. Used for call arguments, which alias the
    /// caller's collections.
    pub fn bind(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    fn remove(&self, name: &str) -> Option<Value> {
        self.values.borrow_mut().remove(name)
    }

    fn names(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }
}

/// The variable environment a host keeps across evaluations.
///
/// Holds the session's root scope. Assignments and function definitions made
/// by [`crate::evaluate`] land here; the host can also read and seed bindings
/// directly.
///
/// # Example
/// ```
/// use tally::{Context, Environment, evaluate};
///
/// let mut env = Environment::new();
/// let context = Context::new();
///
/// evaluate("rate = 4", &mut env, &context).unwrap();
/// assert_eq!(evaluate("rate * 2", &mut env, &context).unwrap().to_string(), "8");
/// assert!(env.get("rate").is_some());
/// ```
#[derive(Debug)]
pub struct Environment {
    root: Rc<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self { root: Scope::root() }
    }

    /// Current value of a binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.root.get(name)
    }

    /// Stores a deep copy of `value` under `name`.
    pub fn set(&mut self, name: &str, value: &Value) {
        self.root.define(name, value);
    }

    /// Removes a binding, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.root.remove(name)
    }

    /// Names of all bindings, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names = self.root.names();
        names.sort();
        names
    }

    pub(crate) const fn scope(&self) -> &Rc<Scope> {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_walk_the_chain() {
        let root = Scope::root();
        root.define("x", &Value::from(1));
        let child = Scope::child(&root);
        child.bind("y", Value::from(2));
        assert_eq!(child.get("x"), Some(Value::from(1)));
        assert_eq!(root.get("y"), None);
    }

    #[test]
    fn define_detaches_collections() {
        let root = Scope::root();
        let list = Value::from(vec![Value::from(1)]);
        root.define("list", &list);
        if let Value::Array(items) = &list {
            items.borrow_mut().clear();
        }
        assert_eq!(root.get("list").map(|v| v.to_string()), Some("[1]".to_string()));
    }

    #[test]
    fn environment_names_are_sorted() {
        let mut env = Environment::new();
        env.set("b", &Value::Null);
        env.set("a", &Value::Null);
        assert_eq!(env.names(), ["a", "b"]);
        assert_eq!(env.remove("a"), Some(Value::Null));
    }
}
