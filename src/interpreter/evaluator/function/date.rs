use chrono::NaiveDate;

use crate::{
    ast::{DateSpec, TypeName},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::core::Value,
    },
    util::num::decimal_to_i64,
};

/// Reads one calendar component of a date in its own zone.
///
/// `weekday` counts Monday as 1.
pub fn component(name: &str, args: &[Value], offset: usize) -> EvalResult<Value> {
    let date = args[0].as_date(offset)?;
    date.component(name)
        .map(Value::from)
        .ok_or_else(|| RuntimeError::type_error(format!("dates have no '{name}'"), offset))
}

/// Seconds since the Unix epoch.
pub fn timestamp(args: &[Value], offset: usize) -> EvalResult<Value> {
    Ok(Value::Number(args[0].as_date(offset)?.timestamp()))
}

/// Builds a date.
///
/// - `date()` is today.
/// - `date(x)` parses a string or takes Unix seconds.
/// - `date(year, month, day)` is that day at local midnight.
///
/// # Errors
/// `InvalidArgument` for a day that does not exist.
///
/// # Example
/// ```
/// use tally::{Context, Environment, evaluate};
///
/// let mut env = Environment::new();
/// let context = Context::new();
/// let leap = evaluate("date(2024, 2, 29)", &mut env, &context).unwrap();
/// assert_eq!(leap.to_string(), "29.02.2024");
/// assert!(evaluate("date(2023, 2, 29)", &mut env, &context).is_err());
/// ```
pub fn date(evaluator: &mut Evaluator<'_>, args: &[Value], offset: usize) -> EvalResult<Value> {
    match args {
        [] => evaluator.eval_date(DateSpec::Today, None, offset),
        [value] => evaluator.eval_cast(value, TypeName::Date, offset),
        [year, month, day] => {
            let part = |v: &Value| decimal_to_i64(v.as_number(offset)?, offset);
            let (y, m, d) = (part(year)?, part(month)?, part(day)?);
            let calendar = i32::try_from(y).ok()
                                           .zip(u32::try_from(m).ok())
                                           .zip(u32::try_from(d).ok())
                                           .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
                                           .ok_or_else(|| RuntimeError::InvalidArgument { details: format!("{y}-{m}-{d} is not a calendar date"),
                                                                                          offset })?;
            evaluator.eval_date(DateSpec::Calendar(calendar), None, offset)
        },
        _ => Err(RuntimeError::ArgumentCountMismatch { name: "date".into(),
                                                       expected: "0, 1 or 3".into(),
                                                       found: args.len(),
                                                       offset }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::interpreter::{
        context::Context,
        environment::Scope,
        value::date::{DateKind, DateValue},
        timezone,
    };

    #[test]
    fn components_follow_the_display_zone() {
        let zone = timezone::parse("Asia/Tokyo").unwrap();
        let instant = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
        let date = Value::Date(DateValue::new(instant, zone, DateKind::DateTime));
        assert_eq!(component("year", &[date.clone()], 0), Ok(Value::from(2025)));
        assert_eq!(component("day", &[date.clone()], 0), Ok(Value::from(1)));
        assert_eq!(component("weekday", &[date], 0), Ok(Value::from(3)));
    }

    #[test]
    fn unix_seconds_become_dates() {
        let context = Context::new().with_timezone(timezone::parse("UTC").unwrap());
        let mut evaluator = Evaluator::new(&context, Scope::root());
        let epoch = date(&mut evaluator, &[Value::from(86_400)], 0).unwrap();
        assert_eq!(timestamp(&[epoch], 0), Ok(Value::from(86_400)));
    }
}
