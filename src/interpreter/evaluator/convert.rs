use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    ast::{ConversionTarget, TypeName, UnitTerm},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        timezone,
        value::{
            core::Value,
            date::{DateKind, DateValue},
            quantity::Quantity,
        },
    },
    util::num::{decimal_to_i64, parse_decimal},
};

/// Wall-clock formats accepted when casting a string to a date.
const DATETIME_FORMATS: &[&str] = &["%d.%m.%YT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%d/%m/%Y", "%Y-%m-%d"];

impl Evaluator<'_> {
    /// Evaluates a unit or timezone conversion.
    ///
    /// - A quantity converts into the target units; a plain number takes them
    ///   on as is.
    /// - A date is re-labelled with the target zone; the instant is kept.
    ///   A single-unit target that names a zone (`in PT`) counts as a zone.
    ///
    /// # Errors
    /// - `IncompatibleUnits` when the dimensions differ.
    /// - `InvalidTimezone` for unknown zone names.
    /// - `TypeError` for values that cannot be converted at all.
    pub fn eval_conversion(&self,
                           value: &Value,
                           target: &ConversionTarget,
                           offset: usize)
                           -> EvalResult<Value> {
        let rates = &self.context.rates;
        match (value, target) {
            (Value::Date(date), ConversionTarget::Timezone(name)) => {
                Ok(Value::Date(convert_zone(date, name, offset)?))
            },
            (Value::Date(date), ConversionTarget::Units(terms)) => match terms.as_slice() {
                [UnitTerm { unit, exponent: 1 }] => Ok(Value::Date(convert_zone(date, unit, offset)?)),
                _ => Err(RuntimeError::type_error("Cannot convert a date into units", offset)),
            },
            (Value::Quantity(q), ConversionTarget::Units(terms)) => {
                let dims = Quantity::target_dims(terms, rates, offset)?;
                Ok(Value::Quantity(q.convert_to(&dims, rates, offset)?))
            },
            (Value::Number(n), ConversionTarget::Units(terms)) => {
                Ok(Quantity::from_terms(*n, terms, rates, offset)?.into_value())
            },
            (other, ConversionTarget::Units(_)) => {
                Err(RuntimeError::type_error(format!("Cannot convert {} into units",
                                                     other.type_name()),
                                             offset))
            },
            (other, ConversionTarget::Timezone(_)) => {
                Err(RuntimeError::type_error(format!("Cannot convert {} to a timezone",
                                                     other.type_name()),
                                             offset))
            },
        }
    }

    /// Evaluates an `as TYPE` cast.
    ///
    /// # Errors
    /// `TypeError` when the value has no sensible representation in the
    /// target type.
    pub fn eval_cast(&self, value: &Value, target: TypeName, offset: usize) -> EvalResult<Value> {
        let fail = || {
            RuntimeError::type_error(format!("Cannot convert {} to {target}", value.type_name()),
                                     offset)
        };
        match target {
            TypeName::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::Quantity(q) => Ok(Value::Number(q.value)),
                Value::Bool(b) => Ok(Value::Number(Decimal::from(u8::from(*b)))),
                Value::Date(d) => Ok(Value::Number(d.timestamp())),
                Value::String(s) => parse_decimal(s.trim()).map(Value::Number).ok_or_else(fail),
                _ => Err(fail()),
            },
            TypeName::String => match value {
                Value::String(_) => Ok(value.clone()),
                other => Ok(Value::String(other.to_string())),
            },
            TypeName::Boolean => Ok(Value::Bool(value.truthy())),
            TypeName::Date => match value {
                Value::Date(_) => Ok(value.clone()),
                Value::Number(n) => {
                    let millis = n.checked_mul(Decimal::ONE_THOUSAND).ok_or_else(fail)?;
                    let millis = decimal_to_i64(millis.round(), offset)?;
                    let instant = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(fail)?;
                    Ok(Value::Date(DateValue::new(instant, self.context.timezone, DateKind::DateTime)))
                },
                Value::String(s) => self.parse_date_string(s.trim()).map(Value::Date).ok_or_else(fail),
                _ => Err(fail()),
            },
            TypeName::Array => match value {
                Value::Array(_) => Ok(value.clone()),
                Value::Null => Ok(Value::from(Vec::new())),
                Value::Object(o) => Ok(Value::from(o.borrow().values().cloned().collect::<Vec<_>>())),
                other => Ok(Value::from(vec![other.clone()])),
            },
            TypeName::Quantity | TypeName::Object | TypeName::Function | TypeName::Null => {
                if value.is_type(target) { Ok(value.clone()) } else { Err(fail()) }
            },
        }
    }

    /// Parses a date string in the context's timezone.
    fn parse_date_string(&self, text: &str) -> Option<DateValue> {
        let zone = self.context.timezone;
        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Some(DateValue::new(instant.with_timezone(&Utc), zone, DateKind::DateTime));
        }
        if let Some(wall) = DATETIME_FORMATS.iter()
                                            .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        {
            return zone.instant_of(wall)
                       .map(|instant| DateValue::new(instant, zone, DateKind::DateTime));
        }
        let date = DATE_FORMATS.iter()
                               .find_map(|f| NaiveDate::parse_from_str(text, f).ok())?;
        zone.instant_of(date.and_hms_opt(0, 0, 0)?)
            .map(|instant| DateValue::new(instant, zone, DateKind::Date))
    }
}

/// Shows `date` in the zone called `name`.
fn convert_zone(date: &DateValue, name: &str, offset: usize) -> EvalResult<DateValue> {
    let zone = timezone::parse(name).ok_or_else(|| RuntimeError::InvalidTimezone { name: name.to_string(),
                                                                                    offset })?;
    Ok(date.in_zone(zone, name))
}
