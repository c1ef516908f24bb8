use std::cmp::Ordering;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{EvalResult, Evaluator},
            function::{array, date, host, math, object, string},
        },
        value::core::Value,
    },
};

/// Type alias for builtin function handlers.
///
/// A builtin receives the evaluator (so it can call back into user
/// functions), a slice of evaluated argument values and the byte offset of
/// the call.
type BuiltinFn = fn(&mut Evaluator<'_>, &[Value], usize) -> EvalResult<Value>;

/// Specifies the allowed number of arguments for a builtin.
///
/// - `Exact(n)` means the builtin must receive exactly `n` arguments.
/// - `OneOf(slice)` means the builtin accepts any arity listed in `slice`.
/// - `AtLeast(n)` accepts `n` or more arguments.
#[derive(Clone, Copy)]
enum Arity {
    Exact(usize),
    OneOf(&'static [usize]),
    AtLeast(usize),
}

/// Defines builtin functions by generating a lookup table and a name list.
///
/// Each entry provides:
/// - a string name,
/// - an arity specification,
/// - a function pointer implementing the builtin.
///
/// The macro produces:
/// - `BuiltinDef` (internal metadata),
/// - `BUILTIN_TABLE` (static table for lookup),
/// - `BUILTIN_FUNCTIONS` (public list of builtin names).
macro_rules! builtin_functions {
    (
        $(
            $name:literal => {
                arity: $arity:expr,
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        struct BuiltinDef {
            name:  &'static str,
            arity: Arity,
            func:  BuiltinFn,
        }
        static BUILTIN_TABLE: &[BuiltinDef] = &[
            $(
                BuiltinDef { name: $name, arity: $arity, func: $func },
            )*
        ];
        pub const BUILTIN_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

builtin_functions! {
    // math
    "sqrt"       => { arity: Arity::Exact(1), func: |_, args, offset| math::sqrt(args, offset) },
    "cbrt"       => { arity: Arity::Exact(1), func: |_, args, offset| math::float("cbrt", args, offset) },
    "abs"        => { arity: Arity::Exact(1), func: |_, args, offset| math::abs(args, offset) },
    "round"      => { arity: Arity::OneOf(&[1, 2]), func: |_, args, offset| math::round("round", args, offset) },
    "floor"      => { arity: Arity::Exact(1), func: |_, args, offset| math::round("floor", args, offset) },
    "ceil"       => { arity: Arity::Exact(1), func: |_, args, offset| math::round("ceil", args, offset) },
    "trunc"      => { arity: Arity::Exact(1), func: |_, args, offset| math::round("trunc", args, offset) },
    "sign"       => { arity: Arity::Exact(1), func: |_, args, offset| math::sign(args, offset) },
    "min"        => { arity: Arity::AtLeast(1), func: |ev, args, offset| math::extreme(ev, args, Ordering::Less, offset) },
    "max"        => { arity: Arity::AtLeast(1), func: |ev, args, offset| math::extreme(ev, args, Ordering::Greater, offset) },
    "clamp"      => { arity: Arity::Exact(3), func: math::clamp },
    "exp"        => { arity: Arity::Exact(1), func: |_, args, offset| math::exp(args, offset) },
    "ln"         => { arity: Arity::Exact(1), func: |_, args, offset| math::log(args, None, offset) },
    "log"        => { arity: Arity::OneOf(&[1, 2]), func: |_, args, offset| math::log(args, Some(10), offset) },
    "log10"      => { arity: Arity::Exact(1), func: |_, args, offset| math::log(args, Some(10), offset) },
    "log2"       => { arity: Arity::Exact(1), func: |_, args, offset| math::log(args, Some(2), offset) },
    "sin"        => { arity: Arity::Exact(1), func: |_, args, offset| math::float("sin", args, offset) },
    "cos"        => { arity: Arity::Exact(1), func: |_, args, offset| math::float("cos", args, offset) },
    "tan"        => { arity: Arity::Exact(1), func: |_, args, offset| math::float("tan", args, offset) },
    "asin"       => { arity: Arity::Exact(1), func: |_, args, offset| math::float("asin", args, offset) },
    "acos"       => { arity: Arity::Exact(1), func: |_, args, offset| math::float("acos", args, offset) },
    "atan"       => { arity: Arity::Exact(1), func: |_, args, offset| math::float("atan", args, offset) },
    "pow"        => { arity: Arity::Exact(2), func: math::pow },
    "factorial"  => { arity: Arity::Exact(1), func: |_, args, offset| math::factorial(args, offset) },
    "gcd"        => { arity: Arity::Exact(2), func: |_, args, offset| math::gcd_lcm("gcd", args, offset) },
    "lcm"        => { arity: Arity::Exact(2), func: |_, args, offset| math::gcd_lcm("lcm", args, offset) },
    "sum"        => { arity: Arity::AtLeast(0), func: |ev, args, offset| math::sum(ev, args, false, offset) },
    "average"    => { arity: Arity::AtLeast(0), func: |ev, args, offset| math::sum(ev, args, true, offset) },
    "avg"        => { arity: Arity::AtLeast(0), func: |ev, args, offset| math::sum(ev, args, true, offset) },
    // strings
    "len"        => { arity: Arity::Exact(1), func: |_, args, offset| string::len(args, offset) },
    "upper"      => { arity: Arity::Exact(1), func: |_, args, offset| string::map_str(args, offset, str::to_uppercase) },
    "lower"      => { arity: Arity::Exact(1), func: |_, args, offset| string::map_str(args, offset, str::to_lowercase) },
    "trim"       => { arity: Arity::Exact(1), func: |_, args, offset| string::map_str(args, offset, |s| s.trim().to_string()) },
    "split"      => { arity: Arity::Exact(2), func: |_, args, offset| string::split(args, offset) },
    "join"       => { arity: Arity::OneOf(&[1, 2]), func: |_, args, offset| string::join(args, offset) },
    "replace"    => { arity: Arity::Exact(3), func: |_, args, offset| string::replace(args, offset) },
    "contains"   => { arity: Arity::Exact(2), func: |_, args, offset| string::contains(args, offset) },
    "startsWith" => { arity: Arity::Exact(2), func: |_, args, offset| string::affix(args, true, offset) },
    "endsWith"   => { arity: Arity::Exact(2), func: |_, args, offset| string::affix(args, false, offset) },
    "substring"  => { arity: Arity::OneOf(&[2, 3]), func: |_, args, offset| string::substring(args, offset) },
    "str"        => { arity: Arity::Exact(1), func: |_, args, _| Ok(Value::String(args[0].to_string())) },
    "number"     => { arity: Arity::Exact(1), func: string::number },
    // arrays
    "map"        => { arity: Arity::Exact(2), func: array::map },
    "filter"     => { arity: Arity::Exact(2), func: array::filter },
    "reduce"     => { arity: Arity::OneOf(&[2, 3]), func: array::reduce },
    "sort"       => { arity: Arity::OneOf(&[1, 2]), func: array::sort },
    "groupBy"    => { arity: Arity::Exact(2), func: array::group_by },
    "find"       => { arity: Arity::Exact(2), func: array::find },
    "every"      => { arity: Arity::Exact(2), func: |ev, args, offset| array::quantifier(ev, args, true, offset) },
    "some"       => { arity: Arity::Exact(2), func: |ev, args, offset| array::quantifier(ev, args, false, offset) },
    "append"     => { arity: Arity::AtLeast(2), func: |_, args, offset| array::push(args, offset) },
    "push"       => { arity: Arity::AtLeast(2), func: |_, args, offset| array::push(args, offset) },
    "pop"        => { arity: Arity::Exact(1), func: |_, args, offset| array::pop(args, offset) },
    "first"      => { arity: Arity::Exact(1), func: |_, args, offset| array::end(args, true, offset) },
    "last"       => { arity: Arity::Exact(1), func: |_, args, offset| array::end(args, false, offset) },
    "reverse"    => { arity: Arity::Exact(1), func: |_, args, offset| array::reverse(args, offset) },
    "range"      => { arity: Arity::OneOf(&[1, 2, 3]), func: |_, args, offset| array::range(args, offset) },
    "slice"      => { arity: Arity::OneOf(&[2, 3]), func: |_, args, offset| array::slice(args, offset) },
    "flatten"    => { arity: Arity::Exact(1), func: |_, args, offset| array::flatten(args, offset) },
    "unique"     => { arity: Arity::Exact(1), func: |_, args, offset| array::unique(args, offset) },
    "count"      => { arity: Arity::OneOf(&[1, 2]), func: array::count },
    // objects
    "keys"       => { arity: Arity::Exact(1), func: |_, args, offset| object::keys(args, offset) },
    "values"     => { arity: Arity::Exact(1), func: |_, args, offset| object::values(args, offset) },
    "has"        => { arity: Arity::Exact(2), func: |_, args, offset| object::has(args, offset) },
    "get"        => { arity: Arity::OneOf(&[2, 3]), func: |_, args, offset| object::get(args, offset) },
    "set"        => { arity: Arity::Exact(3), func: |_, args, offset| object::set(args, offset) },
    "merge"      => { arity: Arity::AtLeast(1), func: |_, args, offset| object::merge(args, offset) },
    // dates
    "year"       => { arity: Arity::Exact(1), func: |_, args, offset| date::component("year", args, offset) },
    "month"      => { arity: Arity::Exact(1), func: |_, args, offset| date::component("month", args, offset) },
    "day"        => { arity: Arity::Exact(1), func: |_, args, offset| date::component("day", args, offset) },
    "hour"       => { arity: Arity::Exact(1), func: |_, args, offset| date::component("hour", args, offset) },
    "minute"     => { arity: Arity::Exact(1), func: |_, args, offset| date::component("minute", args, offset) },
    "weekday"    => { arity: Arity::Exact(1), func: |_, args, offset| date::component("weekday", args, offset) },
    "timestamp"  => { arity: Arity::Exact(1), func: |_, args, offset| date::timestamp(args, offset) },
    "date"       => { arity: Arity::OneOf(&[0, 1, 3]), func: date::date },
    // functional and host
    "partial"    => { arity: Arity::AtLeast(1), func: |_, args, offset| host::partial(args, offset) },
    "type"       => { arity: Arity::Exact(1), func: |_, args, _| Ok(Value::from(args[0].type_name())) },
    "env"        => { arity: Arity::Exact(1), func: host::env },
    "arg"        => { arity: Arity::Exact(0), func: host::arg },
}

impl Arity {
    /// Tests whether the given argument count satisfies this arity constraint.
    ///
    /// Returns `true` if the count is permitted, `false` otherwise.
    fn check(&self, n: usize) -> bool {
        match self {
            Self::Exact(m) => n == *m,
            Self::OneOf(arr) => arr.contains(&n),
            Self::AtLeast(m) => n >= *m,
        }
    }

    /// Describes the accepted counts for error messages.
    fn describe(&self) -> String {
        match self {
            Self::Exact(m) => m.to_string(),
            Self::OneOf(arr) => arr.iter().map(ToString::to_string).collect::<Vec<_>>().join(" or "),
            Self::AtLeast(m) => format!("at least {m}"),
        }
    }
}

/// Returns `true` if `name` is a built-in function.
///
/// # Example
/// ```
/// use tally::interpreter::evaluator::function::core::is_builtin;
///
/// assert!(is_builtin("sqrt"));
/// assert!(is_builtin("groupBy"));
/// assert!(!is_builtin("square"));
/// ```
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    builtin_name(name).is_some()
}

/// The table's own copy of a built-in's name.
#[must_use]
pub fn builtin_name(name: &str) -> Option<&'static str> {
    BUILTIN_TABLE.iter().find(|b| b.name == name).map(|b| b.name)
}

impl Evaluator<'_> {
    /// Calls a built-in with evaluated arguments.
    ///
    /// # Errors
    /// - `UnknownFunction` for names missing from the table.
    /// - `ArgumentCountMismatch` if the arity check fails.
    /// - Any error the built-in raises.
    pub fn call_builtin(&mut self, name: &str, args: &[Value], offset: usize) -> EvalResult<Value> {
        let Some(builtin) = BUILTIN_TABLE.iter().find(|b| b.name == name) else {
            return Err(RuntimeError::UnknownFunction { name: name.to_string(),
                                                       offset });
        };
        if !builtin.arity.check(args.len()) {
            return Err(RuntimeError::ArgumentCountMismatch { name: name.to_string(),
                                                             expected: builtin.arity.describe(),
                                                             found: args.len(),
                                                             offset });
        }
        (builtin.func)(self, args, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{context::Context, environment::Scope};

    #[test]
    fn arity_is_checked_before_calling() {
        let context = Context::new();
        let mut evaluator = Evaluator::new(&context, Scope::root());
        assert_eq!(evaluator.call_builtin("sqrt", &[], 7),
                   Err(RuntimeError::ArgumentCountMismatch { name:     "sqrt".into(),
                                                             expected: "1".into(),
                                                             found:    0,
                                                             offset:   7, }));
        assert!(matches!(evaluator.call_builtin("round", &[Value::Null, Value::Null, Value::Null], 0),
                         Err(RuntimeError::ArgumentCountMismatch { ref expected, .. }) if expected == "1 or 2"));
    }

    #[test]
    fn names_are_unique() {
        for (index, name) in BUILTIN_FUNCTIONS.iter().enumerate() {
            assert!(!BUILTIN_FUNCTIONS[index + 1..].contains(name), "duplicate builtin {name}");
        }
    }
}
