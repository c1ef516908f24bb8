use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::core::{Value, format_decimal},
    },
    util::num::{decimal_to_i64, usize_to_decimal},
};

impl Evaluator<'_> {
    /// Evaluates `object.key` and `object[key]`.
    ///
    /// The object's kind decides what the key means:
    /// - arrays and strings take an integer index, negative counting from the
    ///   end, or the key `length`;
    /// - objects take a string or number key and yield `null` when it is
    ///   missing;
    /// - dates expose `year`, `month`, `day`, `hour`, `minute` and `weekday`;
    /// - quantities expose `value` and `unit`.
    ///
    /// # Errors
    /// - `IndexOutOfBounds` for an index past either end.
    /// - `TypeError` for keys the object kind does not support.
    pub fn eval_access(object: &Value, key: &Value, offset: usize) -> EvalResult<Value> {
        match (object, key) {
            (Value::Array(items), Value::Number(n)) => {
                let items = items.borrow();
                let index = resolve_index(decimal_to_i64(*n, offset)?, items.len(), offset)?;
                Ok(items[index].clone())
            },
            (Value::String(s), Value::Number(n)) => {
                let chars: Vec<char> = s.chars().collect();
                let index = resolve_index(decimal_to_i64(*n, offset)?, chars.len(), offset)?;
                Ok(Value::String(chars[index].to_string()))
            },
            (Value::Array(items), Value::String(k)) if k == "length" => {
                Ok(Value::Number(usize_to_decimal(items.borrow().len())))
            },
            (Value::String(s), Value::String(k)) if k == "length" => {
                Ok(Value::Number(usize_to_decimal(s.chars().count())))
            },
            (Value::Object(entries), key) => {
                let key = match key {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => format_decimal(*n),
                    other => return Err(other.expected("string key", offset)),
                };
                Ok(entries.borrow().get(&key).cloned().unwrap_or(Value::Null))
            },
            (Value::Date(date), Value::String(k)) => date.component(k)
                                                         .map(Value::from)
                                                         .ok_or_else(|| unknown_property(object, k, offset)),
            (Value::Quantity(q), Value::String(k)) => match k.as_str() {
                "value" => Ok(Value::Number(q.value)),
                "unit" => Ok(Value::String(q.dims.to_string())),
                _ => Err(unknown_property(object, k, offset)),
            },
            (Value::Array(_) | Value::String(_), Value::String(k)) => {
                Err(unknown_property(object, k, offset))
            },
            (object, key) => Err(RuntimeError::type_error(format!("Cannot index {} with {}",
                                                                  object.type_name(),
                                                                  key.type_name()),
                                                          offset)),
        }
    }
}

/// Maps a possibly negative index onto `0..len`.
fn resolve_index(index: i64, len: usize, offset: usize) -> EvalResult<usize> {
    let resolved = if index < 0 {
        usize::try_from(index.unsigned_abs()).ok().and_then(|back| len.checked_sub(back))
    } else {
        usize::try_from(index).ok().filter(|i| *i < len)
    };
    resolved.ok_or(RuntimeError::IndexOutOfBounds { index, len, offset })
}

fn unknown_property(object: &Value, key: &str, offset: usize) -> RuntimeError {
    RuntimeError::type_error(format!("{} has no property '{key}'", object.type_name()), offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::value::object::Object;

    #[test]
    fn negative_indexes_count_from_the_end() {
        let list = Value::from(vec![Value::from(1), Value::from(2), Value::from(3)]);
        assert_eq!(Evaluator::eval_access(&list, &Value::from(-1), 0), Ok(Value::from(3)));
        assert_eq!(Evaluator::eval_access(&list, &Value::from(3), 5),
                   Err(RuntimeError::IndexOutOfBounds { index:  3,
                                                        len:    3,
                                                        offset: 5, }));
    }

    #[test]
    fn missing_object_keys_are_null() {
        let mut object = Object::new();
        object.insert("1", Value::from("one"));
        let object = Value::from(object);
        assert_eq!(Evaluator::eval_access(&object, &Value::from(1), 0), Ok(Value::from("one")));
        assert_eq!(Evaluator::eval_access(&object, &Value::from("two"), 0), Ok(Value::Null));
    }
}
