use std::rc::Rc;

use crate::{
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::{core::Value, function::Partial, object::Object},
    },
    util::num::parse_decimal,
};

/// Binds leading arguments to a callable.
///
/// # Example
/// ```
/// use tally::{Context, Environment, evaluate};
///
/// let mut env = Environment::new();
/// let context = Context::new();
/// evaluate("add(a, b) = a + b", &mut env, &context).unwrap();
/// let result = evaluate("map([1, 2], partial(add, 10))", &mut env, &context).unwrap();
/// assert_eq!(result.to_string(), "[11, 12]");
/// ```
pub fn partial(args: &[Value], offset: usize) -> EvalResult<Value> {
    let callee = &args[0];
    if !callee.is_callable() {
        return Err(callee.expected("function", offset));
    }
    Ok(Value::Partial(Rc::new(Partial { callee: callee.clone(),
                                        bound:  args[1..].to_vec(), })))
}

/// Looks a name up through the host, `null` when it is unset.
pub fn env(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    let name = args[0].as_str(offset)?;
    Ok(evaluator.context.env(name).map_or(Value::Null, Value::String))
}

/// The external argument, parsed as JSON when it is JSON and kept as a
/// string otherwise.
pub fn arg(evaluator: &mut Evaluator<'_>, _args: &[Value], _offset: usize) -> EvalResult<Value> {
    let Some(raw) = evaluator.context.argument.as_deref() else {
        return Ok(Value::Null);
    };
    Ok(match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => from_json(json),
        Err(_) => Value::String(raw.to_string()),
    })
}

/// Converts parsed JSON into a runtime value.
///
/// Numbers outside the decimal range stay as their text.
#[must_use]
pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            parse_decimal(&text).map_or(Value::String(text), Value::Number)
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::from(items.into_iter().map(from_json).collect::<Vec<_>>()),
        serde_json::Value::Object(entries) => Value::from(entries.into_iter()
                                                                 .map(|(k, v)| (k, from_json(v)))
                                                                 .collect::<Object>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{context::Context, environment::Scope};

    fn argument(raw: &str) -> Value {
        let context = Context::new().with_argument(Some(raw), None);
        let mut evaluator = Evaluator::new(&context, Scope::root());
        arg(&mut evaluator, &[], 0).unwrap()
    }

    #[test]
    fn json_arguments_are_structured() {
        assert_eq!(argument("42"), Value::from(42));
        assert_eq!(argument(r#"{"b": [1, true], "a": null}"#).to_string(), "{b: [1, true], a: null}");
        assert_eq!(argument("plain words"), Value::from("plain words"));
    }

    #[test]
    fn missing_argument_is_null() {
        let context = Context::new();
        let mut evaluator = Evaluator::new(&context, Scope::root());
        assert_eq!(arg(&mut evaluator, &[], 0), Ok(Value::Null));
    }

    #[test]
    fn env_goes_through_the_host() {
        let context = Context::new().with_env_lookup(|name| (name == "HOME").then(|| "/home/t".to_string()));
        let mut evaluator = Evaluator::new(&context, Scope::root());
        assert_eq!(env(&mut evaluator, &[Value::from("HOME")], 0), Ok(Value::from("/home/t")));
        assert_eq!(env(&mut evaluator, &[Value::from("PATH")], 0), Ok(Value::Null));
    }
}
