use rust_decimal::Decimal;

use crate::{
    ast::{AggregateKind, UnitTerm},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        units::{self, Category},
        value::{
            core::Value,
            date::DateValue,
            quantity::{Dimensions, Quantity},
        },
    },
    util::num::usize_to_decimal,
};

impl Evaluator<'_> {
    /// Evaluates `total` or `average` over the context's history.
    ///
    /// Entries that are neither numbers nor quantities are skipped. With a
    /// target unit, compatible quantities are converted into it and the rest
    /// dropped. Without one, the first quantity seen sets the unit. Plain
    /// numbers are always added as they are.
    ///
    /// A `total` without a target over a history holding exactly one date,
    /// whose numeric entries are all calendar durations, shifts the date by
    /// each duration instead of summing.
    ///
    /// # Errors
    /// - `NoValues` when nothing in the history can be summed.
    /// - `UnsupportedDomain` when the sum overflows.
    pub fn eval_aggregate(&self,
                          kind: AggregateKind,
                          target: Option<&[UnitTerm]>,
                          offset: usize)
                          -> EvalResult<Value> {
        let history = &self.context.history;
        let rates = &self.context.rates;

        if kind == AggregateKind::Total
           && target.is_none()
           && let Some(date) = smart_total(history, offset)?
        {
            return Ok(Value::Date(date));
        }

        let mut dims: Option<Dimensions> = match target {
            Some(terms) => Some(Quantity::target_dims(terms, rates, offset)?),
            None => None,
        };
        let mut sum = Decimal::ZERO;
        let mut count = 0usize;
        for entry in history {
            match entry {
                Value::Number(n) => sum = add(sum, *n, offset)?,
                Value::Quantity(q) => {
                    let goal = dims.get_or_insert_with(|| q.dims.clone());
                    if !q.dims.compatible(goal) {
                        continue;
                    }
                    sum = add(sum, q.convert_to(goal, rates, offset)?.value, offset)?;
                },
                _ => continue,
            }
            count += 1;
        }

        if count == 0 {
            return Err(RuntimeError::NoValues { aggregate: kind.verb(),
                                                offset });
        }
        let value = match kind {
            AggregateKind::Total => sum,
            AggregateKind::Average => sum / usize_to_decimal(count),
        };
        Ok(match dims {
            Some(dims) if !dims.is_empty() => Value::Quantity(Quantity { value, dims }),
            _ => Value::Number(value),
        })
    }
}

fn add(sum: Decimal, value: Decimal, offset: usize) -> EvalResult<Decimal> {
    sum.checked_add(value).ok_or_else(|| RuntimeError::overflow(offset))
}

/// Folds calendar durations into the single date in `history`.
///
/// Returns `None` when the history holds no date, more than one, or any
/// numeric entry that is not a calendar duration.
fn smart_total(history: &[Value], offset: usize) -> EvalResult<Option<DateValue>> {
    let mut dates = history.iter().filter_map(|v| match v {
                                      Value::Date(d) => Some(d),
                                      _ => None,
                                  });
    let (Some(date), None) = (dates.next(), dates.next()) else {
        return Ok(None);
    };

    let mut shifts = Vec::new();
    for entry in history {
        match entry {
            Value::Quantity(q) => {
                let calendar = q.dims
                                .single()
                                .filter(|(category, term)| {
                                    *category == Category::Time && term.exponent == 1
                                })
                                .and_then(|(_, term)| units::lookup(&term.unit))
                                .and_then(units::UnitDef::calendar_unit);
                match calendar {
                    Some(unit) => shifts.push((q.value, unit)),
                    None => return Ok(None),
                }
            },
            Value::Number(_) => return Ok(None),
            _ => {},
        }
    }

    let mut result = date.clone();
    for (amount, unit) in shifts {
        result = result.shift(amount, unit, offset)?;
    }
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::interpreter::{
        context::Context,
        environment::Scope,
        timezone,
        units::RateTable,
        value::date::DateKind,
    };

    fn quantity(value: Decimal, unit: &str) -> Value {
        Quantity::from_terms(value, &[UnitTerm::new(unit, 1)], &RateTable::new(), 0).unwrap()
                                                                                       .into_value()
    }

    fn aggregate(history: Vec<Value>, kind: AggregateKind, target: Option<&[UnitTerm]>) -> EvalResult<Value> {
        let context = Context::new().with_history(history);
        let evaluator = Evaluator::new(&context, Scope::root());
        evaluator.eval_aggregate(kind, target, 0)
    }

    #[test]
    fn first_unit_becomes_the_target() {
        let history = vec![quantity(Decimal::from(10), "m"),
                           quantity(Decimal::from(500), "cm"),
                           quantity(Decimal::from(100), "mm")];
        let total = aggregate(history, AggregateKind::Total, None).unwrap();
        assert_eq!(total.to_string(), "15.1 m");
    }

    #[test]
    fn explicit_target_drops_incompatible_entries() {
        let history = vec![quantity(Decimal::from(1), "km"),
                           quantity(Decimal::from(3), "kg"),
                           Value::from("note"),
                           quantity(Decimal::from(500), "m")];
        let target = [UnitTerm::new("m", 1)];
        let average = aggregate(history, AggregateKind::Average, Some(&target)).unwrap();
        assert_eq!(average.to_string(), "750 m");
    }

    #[test]
    fn empty_history_is_fatal() {
        assert_eq!(aggregate(Vec::new(), AggregateKind::Total, None),
                   Err(RuntimeError::NoValues { aggregate: "total",
                                                offset:    0, }));
        assert!(aggregate(vec![Value::from("x")], AggregateKind::Average, None).is_err());
    }

    #[test]
    fn single_date_absorbs_calendar_durations() {
        let zone = timezone::parse("UTC").unwrap();
        let start = DateValue::new(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(), zone, DateKind::Date);
        let history = vec![Value::Date(start),
                           quantity(Decimal::ONE, "month"),
                           quantity(Decimal::from(2), "days")];
        let total = aggregate(history, AggregateKind::Total, None).unwrap();
        assert_eq!(total.to_string(), "02.03.2024");
    }

    #[test]
    fn two_dates_disable_date_folding() {
        let zone = timezone::parse("UTC").unwrap();
        let date = DateValue::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), zone, DateKind::Date);
        let history = vec![Value::Date(date.clone()), Value::Date(date), quantity(Decimal::ONE, "day")];
        assert_eq!(aggregate(history, AggregateKind::Total, None).unwrap().to_string(), "1 day");
    }
}
