use chrono::{Days, NaiveDateTime, NaiveTime};

use crate::{
    ast::{BinaryOperator, CalendarUnit, DateSpec, DateTimeSpec},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        timezone::{self, Zone},
        value::{
            core::Value,
            date::{DateKind, DateValue},
        },
    },
};

impl Evaluator<'_> {
    /// Evaluates a date literal or `today`/`tomorrow`/`yesterday` to local
    /// midnight of that day.
    pub fn eval_date(&self, spec: DateSpec, zone: Option<&str>, offset: usize) -> EvalResult<Value> {
        let (zone, label) = self.resolve_zone(zone, offset)?;
        let today = || zone.wall_clock(self.context.clock()).date();
        let date = match spec {
            DateSpec::Calendar(date) => Some(date),
            DateSpec::Today => Some(today()),
            DateSpec::Tomorrow => today().checked_add_days(Days::new(1)),
            DateSpec::Yesterday => today().checked_sub_days(Days::new(1)),
        };
        let wall = date.and_then(|d| d.and_hms_opt(0, 0, 0));
        at_wall(wall, zone, label, DateKind::Date, offset)
    }

    /// Evaluates a clock time literal to that time on the current day.
    pub fn eval_time(&self, time: NaiveTime, zone: Option<&str>, offset: usize) -> EvalResult<Value> {
        let (zone, label) = self.resolve_zone(zone, offset)?;
        let today = zone.wall_clock(self.context.clock()).date();
        at_wall(Some(NaiveDateTime::new(today, time)), zone, label, DateKind::Time, offset)
    }

    /// Evaluates a datetime literal or `now`.
    pub fn eval_datetime(&self, spec: DateTimeSpec, zone: Option<&str>, offset: usize) -> EvalResult<Value> {
        let (zone, label) = self.resolve_zone(zone, offset)?;
        match spec {
            DateTimeSpec::Now => {
                let mut value = DateValue::new(self.context.clock(), zone, DateKind::DateTime);
                value.label = label;
                Ok(Value::Date(value))
            },
            DateTimeSpec::Literal(wall) => at_wall(Some(wall), zone, label, DateKind::DateTime, offset),
        }
    }

    /// Applies `date ± amount unit`.
    ///
    /// # Errors
    /// `TypeError` if the left side is not a date or the amount not a number.
    pub fn eval_date_operation(date: &Value,
                               op: BinaryOperator,
                               amount: &Value,
                               unit: CalendarUnit,
                               offset: usize)
                               -> EvalResult<Value> {
        let date = date.as_date(offset)?;
        let amount = amount.as_number(offset)?;
        let amount = match op {
            BinaryOperator::Sub => -amount,
            _ => amount,
        };
        Ok(Value::Date(date.shift(amount, unit, offset)?))
    }

    /// The zone a literal is written in, and its label. Untagged literals use
    /// the context's default zone without a label.
    fn resolve_zone(&self, name: Option<&str>, offset: usize) -> EvalResult<(Zone, Option<String>)> {
        match name {
            None => Ok((self.context.timezone, None)),
            Some(name) => timezone::parse(name).map(|zone| (zone, Some(name.to_string())))
                                               .ok_or_else(|| RuntimeError::InvalidTimezone { name: name.to_string(),
                                                                                              offset }),
        }
    }
}

fn at_wall(wall: Option<NaiveDateTime>,
           zone: Zone,
           label: Option<String>,
           kind: DateKind,
           offset: usize)
           -> EvalResult<Value> {
    let instant = wall.and_then(|wall| zone.instant_of(wall))
                      .ok_or_else(|| RuntimeError::domain("Date out of range", offset))?;
    let mut value = DateValue::new(instant, zone, kind);
    value.label = label;
    Ok(Value::Date(value))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::interpreter::{context::Context, environment::Scope};

    fn context() -> Context {
        Context::new().with_now(Utc.with_ymd_and_hms(2024, 3, 10, 15, 45, 0).unwrap())
                      .with_timezone(Zone::Fixed(chrono::FixedOffset::east_opt(0).unwrap()))
    }

    #[test]
    fn today_is_local_midnight() {
        let context = context();
        let evaluator = Evaluator::new(&context, Scope::root());
        let today = evaluator.eval_date(DateSpec::Today, None, 0).unwrap();
        assert_eq!(today.to_string(), "10.03.2024");
        let tomorrow = evaluator.eval_date(DateSpec::Tomorrow, None, 0).unwrap();
        assert_eq!(tomorrow.to_string(), "11.03.2024");
    }

    #[test]
    fn tagged_literals_keep_their_label() {
        let context = context();
        let evaluator = Evaluator::new(&context, Scope::root());
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let value = evaluator.eval_date(DateSpec::Calendar(date), Some("Europe/Berlin"), 0).unwrap();
        assert_eq!(value.to_string(), "01.07.2024 Europe/Berlin");
    }

    #[test]
    fn unknown_zone_is_fatal() {
        let context = context();
        let evaluator = Evaluator::new(&context, Scope::root());
        assert!(matches!(evaluator.eval_time(NaiveTime::MIN, Some("Atlantis"), 3),
                         Err(RuntimeError::InvalidTimezone { offset: 3, .. })));
    }
}
