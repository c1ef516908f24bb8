use crate::{
    ast::TypeName,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::core::Value,
    },
    util::num::{decimal_to_i64, usize_to_decimal},
};

/// Length of a string (in characters), array or object.
///
/// # Example
/// ```
/// use tally::interpreter::{evaluator::function::string::len, value::core::Value};
///
/// assert_eq!(len(&[Value::from("héllo")], 0).unwrap(), Value::from(5));
/// assert!(len(&[Value::from(5)], 0).is_err());
/// ```
pub fn len(args: &[Value], offset: usize) -> EvalResult<Value> {
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.borrow().len(),
        Value::Object(entries) => entries.borrow().len(),
        other => return Err(other.expected("string, array or object", offset)),
    };
    Ok(Value::Number(usize_to_decimal(n)))
}

/// Applies a string-to-string transformation such as `upper` or `trim`.
pub fn map_str(args: &[Value], offset: usize, f: impl Fn(&str) -> String) -> EvalResult<Value> {
    Ok(Value::String(f(args[0].as_str(offset)?)))
}

/// Splits a string on a separator. An empty separator splits into
/// characters.
pub fn split(args: &[Value], offset: usize) -> EvalResult<Value> {
    let text = args[0].as_str(offset)?;
    let separator = args[1].as_str(offset)?;
    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        text.split(separator).map(Value::from).collect()
    };
    Ok(Value::from(parts))
}

/// Joins the display forms of an array's elements, with an optional
/// separator.
pub fn join(args: &[Value], offset: usize) -> EvalResult<Value> {
    let items = args[0].as_array(offset)?;
    let separator = match args.get(1) {
        Some(sep) => sep.as_str(offset)?,
        None => "",
    };
    let joined = items.borrow()
                      .iter()
                      .map(ToString::to_string)
                      .collect::<Vec<_>>()
                      .join(separator);
    Ok(Value::String(joined))
}

/// Replaces every occurrence of a substring.
///
/// # Errors
/// `InvalidArgument` for an empty pattern.
pub fn replace(args: &[Value], offset: usize) -> EvalResult<Value> {
    let text = args[0].as_str(offset)?;
    let from = args[1].as_str(offset)?;
    let to = args[2].as_str(offset)?;
    if from.is_empty() {
        return Err(RuntimeError::InvalidArgument { details: "cannot replace an empty string".into(),
                                                   offset });
    }
    Ok(Value::String(text.replace(from, to)))
}

/// Substring test for strings, membership test for arrays, key test for
/// objects.
pub fn contains(args: &[Value], offset: usize) -> EvalResult<Value> {
    let found = match (&args[0], &args[1]) {
        (Value::String(text), needle) => match needle {
            Value::String(needle) => text.contains(needle.as_str()),
            other => text.contains(&other.to_string()),
        },
        (Value::Array(items), needle) => items.borrow().iter().any(|item| item == needle),
        (Value::Object(entries), Value::String(key)) => entries.borrow().contains_key(key),
        (other, _) => return Err(other.expected("string or array", offset)),
    };
    Ok(Value::Bool(found))
}

/// `startsWith` (`prefix == true`) and `endsWith`.
pub fn affix(args: &[Value], prefix: bool, offset: usize) -> EvalResult<Value> {
    let text = args[0].as_str(offset)?;
    let part = args[1].as_str(offset)?;
    Ok(Value::Bool(if prefix { text.starts_with(part) } else { text.ends_with(part) }))
}

/// Characters from `start` up to, but excluding, `end`.
///
/// Indexes are clamped to the string. Swapped bounds are put in order.
///
/// # Example
/// ```
/// use tally::interpreter::{evaluator::function::string::substring, value::core::Value};
///
/// let text = Value::from("calculator");
/// assert_eq!(substring(&[text.clone(), Value::from(4)], 0).unwrap(), Value::from("ulator"));
/// assert_eq!(substring(&[text, Value::from(4), Value::from(0)], 0).unwrap(), Value::from("calc"));
/// ```
pub fn substring(args: &[Value], offset: usize) -> EvalResult<Value> {
    let chars: Vec<char> = args[0].as_str(offset)?.chars().collect();
    let bound = |value: &Value| -> EvalResult<usize> {
        let index = decimal_to_i64(value.as_number(offset)?, offset)?;
        Ok(usize::try_from(index.max(0)).unwrap_or(usize::MAX).min(chars.len()))
    };
    let start = bound(&args[1])?;
    let end = match args.get(2) {
        Some(end) => bound(end)?,
        None => chars.len(),
    };
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    Ok(Value::String(chars[start..end].iter().collect()))
}

/// Parses a value as a number, the same way `as number` does.
pub fn number(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    evaluator.eval_cast(&args[0], TypeName::Number, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn split_then_join() {
        let parts = split(&strings(&["a,b,,c", ","]), 0).unwrap();
        assert_eq!(parts.to_string(), r#"["a", "b", "", "c"]"#);
        assert_eq!(join(&[parts, Value::from("-")], 0), Ok(Value::from("a-b--c")));
        assert_eq!(split(&strings(&["ab", ""]), 0).unwrap().to_string(), r#"["a", "b"]"#);
    }

    #[test]
    fn contains_works_on_arrays() {
        let list = Value::from(vec![Value::from(1), Value::from("x")]);
        assert_eq!(contains(&[list.clone(), Value::from("x")], 0), Ok(Value::Bool(true)));
        assert_eq!(contains(&[list, Value::from(2)], 0), Ok(Value::Bool(false)));
        assert!(contains(&[Value::from(1), Value::from(1)], 0).is_err());
    }

    #[test]
    fn replace_rejects_empty_pattern() {
        assert_eq!(replace(&strings(&["aXbX", "X", "-"]), 0), Ok(Value::from("a-b-")));
        assert!(replace(&strings(&["abc", "", "-"]), 0).is_err());
    }
}
