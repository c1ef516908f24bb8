use crate::interpreter::{
    evaluator::core::EvalResult,
    value::{
        core::{Value, format_decimal},
        object::Object,
    },
};

/// Object keys are strings; numbers are accepted and formatted.
fn key_of(value: &Value, offset: usize) -> EvalResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(format_decimal(*n)),
        other => Err(other.expected("string key", offset)),
    }
}

/// Keys in insertion order.
pub fn keys(args: &[Value], offset: usize) -> EvalResult<Value> {
    let object = args[0].as_object(offset)?;
    let keys = object.borrow().keys().map(Value::from).collect::<Vec<_>>();
    Ok(Value::from(keys))
}

/// Values in insertion order.
pub fn values(args: &[Value], offset: usize) -> EvalResult<Value> {
    let object = args[0].as_object(offset)?;
    let values = object.borrow().values().cloned().collect::<Vec<_>>();
    Ok(Value::from(values))
}

pub fn has(args: &[Value], offset: usize) -> EvalResult<Value> {
    let object = args[0].as_object(offset)?;
    let key = key_of(&args[1], offset)?;
    Ok(Value::Bool(object.borrow().contains_key(&key)))
}

/// Looks up a key, returning the default (or `null`) when it is missing.
pub fn get(args: &[Value], offset: usize) -> EvalResult<Value> {
    let object = args[0].as_object(offset)?;
    let key = key_of(&args[1], offset)?;
    let found = object.borrow().get(&key).cloned();
    Ok(found.or_else(|| args.get(2).cloned()).unwrap_or(Value::Null))
}

/// Sets a key in place and returns the object.
///
/// # Example
/// ```
/// use tally::{Context, Environment, evaluate};
///
/// let mut env = Environment::new();
/// let context = Context::new();
/// evaluate("o = {a: 1}", &mut env, &context).unwrap();
/// let result = evaluate("set(o, 'b', 2)", &mut env, &context).unwrap();
/// assert_eq!(result.to_string(), "{a: 1, b: 2}");
/// ```
pub fn set(args: &[Value], offset: usize) -> EvalResult<Value> {
    let object = args[0].as_object(offset)?;
    let key = key_of(&args[1], offset)?;
    object.borrow_mut().insert(key, args[2].deep_copy());
    Ok(args[0].clone())
}

/// Merges objects left to right into a new object; later keys win.
pub fn merge(args: &[Value], offset: usize) -> EvalResult<Value> {
    let mut merged = Object::new();
    for arg in args {
        let object = arg.as_object(offset)?;
        for (key, value) in object.borrow().iter() {
            merged.insert(key, value.clone());
        }
    }
    Ok(Value::from(merged))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(entries: &[(&str, i64)]) -> Value {
        Value::from(entries.iter()
                           .map(|(k, v)| ((*k).to_string(), Value::from(*v)))
                           .collect::<Object>())
    }

    #[test]
    fn merge_keeps_first_positions() {
        let merged = merge(&[object(&[("a", 1), ("b", 2)]), object(&[("c", 3), ("a", 9)])], 0).unwrap();
        assert_eq!(merged.to_string(), "{a: 9, b: 2, c: 3}");
    }

    #[test]
    fn get_falls_back_to_default() {
        let o = object(&[("x", 1)]);
        assert_eq!(get(&[o.clone(), Value::from("x")], 0), Ok(Value::from(1)));
        assert_eq!(get(&[o.clone(), Value::from("y")], 0), Ok(Value::Null));
        assert_eq!(get(&[o, Value::from("y"), Value::from(0)], 0), Ok(Value::from(0)));
    }

    #[test]
    fn keys_require_an_object() {
        assert_eq!(keys(&[object(&[("b", 1), ("a", 2)])], 0).unwrap().to_string(), r#"["b", "a"]"#);
        assert!(keys(&[Value::from(1)], 0).is_err());
    }
}
