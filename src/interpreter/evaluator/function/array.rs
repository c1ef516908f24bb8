use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::{core::Value, object::Object},
    },
    util::num::{decimal_to_i64, decimal_to_usize, usize_to_decimal},
};

/// Upper bound on the number of elements `range` may produce.
pub const MAX_RANGE_LEN: usize = 100_000;

/// Copies the elements out of an array argument so callbacks may mutate the
/// original while it is being walked.
fn snapshot(value: &Value, offset: usize) -> EvalResult<Vec<Value>> {
    Ok(value.as_array(offset)?.borrow().clone())
}

fn callable(value: &Value, offset: usize) -> EvalResult<&Value> {
    if value.is_callable() { Ok(value) } else { Err(value.expected("function", offset)) }
}

/// Calls `f` with an element, adding its index when `f` declares two
/// parameters.
fn call_with_index(evaluator: &mut Evaluator<'_>,
                   f: &Value,
                   item: Value,
                   index: usize,
                   offset: usize)
                   -> EvalResult<Value> {
    let args = if Evaluator::declared_arity(f) == Some(2) {
        vec![item, Value::Number(usize_to_decimal(index))]
    } else {
        vec![item]
    };
    evaluator.call_value(f, args, offset)
}

/// Applies a function to every element.
///
/// # Example
/// ```
/// use tally::{Context, Environment, evaluate};
///
/// let mut env = Environment::new();
/// let context = Context::new();
/// let squares = evaluate("map([1, 2, 3], x => x * x)", &mut env, &context).unwrap();
/// assert_eq!(squares.to_string(), "[1, 4, 9]");
/// let indexed = evaluate("map([5, 5], (x, i) => x + i)", &mut env, &context).unwrap();
/// assert_eq!(indexed.to_string(), "[5, 6]");
/// ```
pub fn map(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    let f = callable(&args[1], offset)?;
    let mut out = Vec::new();
    for (index, item) in snapshot(&args[0], offset)?.into_iter().enumerate() {
        out.push(call_with_index(evaluator, f, item, index, offset)?);
    }
    Ok(Value::from(out))
}

/// Keeps the elements for which the predicate is truthy.
pub fn filter(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    let f = callable(&args[1], offset)?;
    let mut out = Vec::new();
    for (index, item) in snapshot(&args[0], offset)?.into_iter().enumerate() {
        if call_with_index(evaluator, f, item.clone(), index, offset)?.truthy() {
            out.push(item);
        }
    }
    Ok(Value::from(out))
}

/// Folds an array with `f(accumulator, element)`.
///
/// Without an initial value the first element seeds the fold.
///
/// # Errors
/// `InvalidArgument` when reducing an empty array without an initial value.
pub fn reduce(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    let f = callable(&args[1], offset)?;
    let mut items = snapshot(&args[0], offset)?.into_iter();
    let mut acc = match args.get(2) {
        Some(initial) => initial.clone(),
        None => items.next().ok_or_else(|| {
                                RuntimeError::InvalidArgument { details: "cannot reduce an empty array without an initial value".into(),
                                                                offset }
                            })?,
    };
    for item in items {
        acc = evaluator.call_value(f, vec![acc, item], offset)?;
    }
    Ok(acc)
}

/// Sorts into a new array.
///
/// Without a comparator elements use the natural ordering of numbers,
/// quantities, strings, dates and booleans. A comparator takes two elements
/// and returns a number whose sign gives their order. Equal elements keep
/// their relative order.
///
/// # Errors
/// - `InvalidArgument` for a comparator that does not take two parameters.
/// - `TypeError` if the comparator returns something other than a number.
pub fn sort(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    let items = snapshot(&args[0], offset)?;
    let sorted = match args.get(1) {
        None => merge_sort(items, &mut |a, b| evaluator.compare_values(a, b, offset))?,
        Some(f) => {
            let f = callable(f, offset)?;
            if let Some(n) = Evaluator::declared_arity(f)
               && n != 2
            {
                return Err(RuntimeError::InvalidArgument { details: format!("sort comparator must take 2 parameters, not {n}"),
                                                           offset });
            }
            merge_sort(items, &mut |a, b| {
                let order = evaluator.call_value(f, vec![a.clone(), b.clone()], offset)?;
                Ok(order.as_number(offset)?.cmp(&Decimal::ZERO))
            })?
        },
    };
    Ok(Value::from(sorted))
}

/// Stable merge sort with a fallible comparison.
fn merge_sort<F>(mut items: Vec<Value>, cmp: &mut F) -> EvalResult<Vec<Value>>
    where F: FnMut(&Value, &Value) -> EvalResult<Ordering>
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp)?;
    let right = merge_sort(right, cmp)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        let next = if cmp(l, r)? == Ordering::Greater { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

/// Groups elements into an object keyed by the display form of `f(element)`.
///
/// # Errors
/// `TypeError` if a key is an array.
///
/// # Example
/// ```
/// use tally::{Context, Environment, evaluate};
///
/// let mut env = Environment::new();
/// let groups = evaluate("groupBy([1, 2, 3, 4], x => x % 2 == 0 ? 'even' : 'odd')",
///                       &mut env,
///                       &Context::new()).unwrap();
/// assert_eq!(groups.to_string(), "{odd: [1, 3], even: [2, 4]}");
/// ```
pub fn group_by(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    let f = callable(&args[1], offset)?;
    let mut groups: Vec<(String, Vec<Value>)> = Vec::new();
    for (index, item) in snapshot(&args[0], offset)?.into_iter().enumerate() {
        let key = call_with_index(evaluator, f, item.clone(), index, offset)?;
        if matches!(key, Value::Array(_)) {
            return Err(RuntimeError::type_error("groupBy key cannot be an array", offset));
        }
        let key = key.to_string();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(item),
            None => groups.push((key, vec![item])),
        }
    }
    Ok(Value::from(groups.into_iter()
                         .map(|(key, members)| (key, Value::from(members)))
                         .collect::<Object>()))
}

/// First element satisfying the predicate, or `null`.
pub fn find(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    let f = callable(&args[1], offset)?;
    for (index, item) in snapshot(&args[0], offset)?.into_iter().enumerate() {
        if call_with_index(evaluator, f, item.clone(), index, offset)?.truthy() {
            return Ok(item);
        }
    }
    Ok(Value::Null)
}

/// `every` (`all == true`) and `some`.
pub fn quantifier(evaluator: &mut Evaluator<'_>, args: &[Value], all: bool, offset: usize) -> EvalResult<Value> {
    let f = callable(&args[1], offset)?;
    for (index, item) in snapshot(&args[0], offset)?.into_iter().enumerate() {
        if call_with_index(evaluator, f, item, index, offset)?.truthy() != all {
            return Ok(Value::Bool(!all));
        }
    }
    Ok(Value::Bool(all))
}

/// Appends copies of the remaining arguments to the array in place and
/// returns it.
pub fn push(args: &[Value], offset: usize) -> EvalResult<Value> {
    let items = args[0].as_array(offset)?;
    items.borrow_mut().extend(args[1..].iter().map(Value::deep_copy));
    Ok(args[0].clone())
}

/// Removes and returns the last element, or `null` for an empty array.
pub fn pop(args: &[Value], offset: usize) -> EvalResult<Value> {
    Ok(args[0].as_array(offset)?.borrow_mut().pop().unwrap_or(Value::Null))
}

/// `first` (`front == true`) and `last`; `null` for an empty array.
pub fn end(args: &[Value], front: bool, offset: usize) -> EvalResult<Value> {
    let items = args[0].as_array(offset)?;
    let items = items.borrow();
    let item = if front { items.first() } else { items.last() };
    Ok(item.cloned().unwrap_or(Value::Null))
}

/// Reverses an array or string into a new value.
pub fn reverse(args: &[Value], offset: usize) -> EvalResult<Value> {
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        other => {
            let mut items = snapshot(other, offset)?;
            items.reverse();
            Ok(Value::from(items))
        },
    }
}

/// `range(end)`, `range(start, end)` or `range(start, end, step)`.
///
/// The end is exclusive. Steps may be fractional or negative.
///
/// # Errors
/// `InvalidArgument` for a zero step or more than [`MAX_RANGE_LEN`]
/// elements.
///
/// # Example
/// ```
/// use tally::interpreter::{evaluator::function::array::range, value::core::Value};
///
/// let r = range(&[Value::from(3)], 0).unwrap();
/// assert_eq!(r.to_string(), "[0, 1, 2]");
/// let r = range(&[Value::from(10), Value::from(0), Value::from(-4)], 0).unwrap();
/// assert_eq!(r.to_string(), "[10, 6, 2]");
/// assert!(range(&[Value::from(0), Value::from(1), Value::from(0)], 0).is_err());
/// ```
pub fn range(args: &[Value], offset: usize) -> EvalResult<Value> {
    let numbers = args.iter()
                      .map(|a| a.as_number(offset))
                      .collect::<EvalResult<Vec<_>>>()?;
    let (start, stop, step) = match numbers.as_slice() {
        [stop] => (Decimal::ZERO, *stop, Decimal::ONE),
        [start, stop] => (*start, *stop, Decimal::ONE),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(RuntimeError::InvalidArgument { details: "range takes 1 to 3 numbers".into(),
                                                        offset }),
    };
    if step.is_zero() {
        return Err(RuntimeError::InvalidArgument { details: "range step cannot be 0".into(),
                                                   offset });
    }

    let span = stop.checked_sub(start)
                   .and_then(|distance| distance.checked_div(step))
                   .ok_or_else(|| RuntimeError::domain("Range bounds are too large", offset))?
                   .ceil();
    let len = if span <= Decimal::ZERO { 0 } else { decimal_to_usize(span, offset)? };
    if len > MAX_RANGE_LEN {
        return Err(RuntimeError::InvalidArgument { details: format!("range of {len} elements exceeds {MAX_RANGE_LEN}"),
                                                   offset });
    }
    let items = (0..len).map(|i| {
                            step.checked_mul(Decimal::from(i))
                                .and_then(|delta| start.checked_add(delta))
                                .map(Value::Number)
                                .ok_or_else(|| RuntimeError::overflow(offset))
                        })
                        .collect::<EvalResult<Vec<_>>>()?;
    Ok(Value::from(items))
}

/// Elements (or characters) from `start` up to `end`, negative indexes
/// counting from the end. Out-of-range bounds are clamped.
pub fn slice(args: &[Value], offset: usize) -> EvalResult<Value> {
    let clamp = |value: &Value, len: usize| -> EvalResult<usize> {
        let index = decimal_to_i64(value.as_number(offset)?, offset)?;
        let len_i = i64::try_from(len).unwrap_or(i64::MAX);
        let resolved = if index < 0 { (len_i + index).max(0) } else { index.min(len_i) };
        Ok(usize::try_from(resolved).unwrap_or(0))
    };
    let bounds = |len: usize| -> EvalResult<(usize, usize)> {
        let start = clamp(&args[1], len)?;
        let end = match args.get(2) {
            Some(end) => clamp(end, len)?,
            None => len,
        };
        Ok((start, end.max(start)))
    };

    match &args[0] {
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = bounds(chars.len())?;
            Ok(Value::String(chars[start..end].iter().collect()))
        },
        other => {
            let items = snapshot(other, offset)?;
            let (start, end) = bounds(items.len())?;
            Ok(Value::from(items[start..end].to_vec()))
        },
    }
}

/// Flattens one level of nesting.
pub fn flatten(args: &[Value], offset: usize) -> EvalResult<Value> {
    let mut out = Vec::new();
    for item in snapshot(&args[0], offset)? {
        match item {
            Value::Array(inner) => out.extend(inner.borrow().iter().cloned()),
            other => out.push(other),
        }
    }
    Ok(Value::from(out))
}

/// Drops repeated elements, keeping first occurrences in order.
pub fn unique(args: &[Value], offset: usize) -> EvalResult<Value> {
    let mut out: Vec<Value> = Vec::new();
    for item in snapshot(&args[0], offset)? {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    Ok(Value::from(out))
}

/// Array length, or the number of elements satisfying a predicate.
pub fn count(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    let items = snapshot(&args[0], offset)?;
    let Some(f) = args.get(1) else {
        return Ok(Value::Number(usize_to_decimal(items.len())));
    };
    let f = callable(f, offset)?;
    let mut n = 0usize;
    for (index, item) in items.into_iter().enumerate() {
        if call_with_index(evaluator, f, item, index, offset)?.truthy() {
            n += 1;
        }
    }
    Ok(Value::Number(usize_to_decimal(n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[i64]) -> Value {
        Value::from(values.iter().map(|v| Value::from(*v)).collect::<Vec<_>>())
    }

    #[test]
    fn push_mutates_in_place() {
        let items = list(&[1]);
        let nested = list(&[2]);
        push(&[items.clone(), nested.clone()], 0).unwrap();
        push(&[nested.clone(), Value::from(3)], 0).unwrap();
        assert_eq!(items.to_string(), "[1, [2]]");
        assert_eq!(nested.to_string(), "[2, 3]");
        assert_eq!(pop(&[items.clone()], 0).unwrap().to_string(), "[2]");
        assert_eq!(pop(&[list(&[])], 0), Ok(Value::Null));
    }

    #[test]
    fn slice_counts_negative_indexes_from_the_end() {
        let items = list(&[1, 2, 3, 4, 5]);
        assert_eq!(slice(&[items.clone(), Value::from(-2)], 0).unwrap(), list(&[4, 5]));
        assert_eq!(slice(&[items.clone(), Value::from(1), Value::from(-1)], 0).unwrap(), list(&[2, 3, 4]));
        assert_eq!(slice(&[items, Value::from(9)], 0).unwrap(), list(&[]));
        assert_eq!(slice(&[Value::from("hello"), Value::from(1), Value::from(3)], 0),
                   Ok(Value::from("el")));
    }

    #[test]
    fn range_is_capped() {
        assert!(matches!(range(&[Value::from(1_000_000)], 0),
                         Err(RuntimeError::InvalidArgument { .. })));
        assert_eq!(range(&[Value::from(5), Value::from(1)], 0).unwrap(), list(&[]));
    }

    #[test]
    fn merge_sort_is_stable() {
        let pairs = vec![Value::from(vec![Value::from(1), Value::from("a")]),
                         Value::from(vec![Value::from(0), Value::from("b")]),
                         Value::from(vec![Value::from(1), Value::from("c")])];
        let sorted = merge_sort(pairs, &mut |a, b| {
                         let key = |v: &Value| v.as_array(0).map(|items| items.borrow()[0].clone());
                         Ok(key(a)?.as_number(0)?.cmp(&key(b)?.as_number(0)?))
                     }).unwrap();
        let order: Vec<String> = sorted.iter().map(|v| v.as_array(0).unwrap().borrow()[1].to_string()).collect();
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[test]
    fn flatten_and_unique() {
        let nested = Value::from(vec![list(&[1, 2]), Value::from(2), list(&[3])]);
        let flat = flatten(&[nested], 0).unwrap();
        assert_eq!(flat, list(&[1, 2, 2, 3]));
        assert_eq!(unique(&[flat], 0).unwrap(), list(&[1, 2, 3]));
    }
}
