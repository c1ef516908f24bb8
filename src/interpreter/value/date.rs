use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Days, Months, NaiveDateTime, TimeDelta, Timelike, Utc};
use rust_decimal::Decimal;

use crate::{
    ast::CalendarUnit,
    error::RuntimeError,
    interpreter::{evaluator::core::EvalResult, timezone::Zone},
    util::num::decimal_to_i64,
};

/// How much of an instant is meaningful when it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    /// A calendar day at local midnight.
    Date,
    /// A clock time on the evaluation day.
    Time,
    /// A full date and time.
    DateTime,
}

/// An absolute instant, shown in a timezone.
///
/// Equality and ordering look only at the instant, so `12:00 UTC` equals
/// `13:00 CET` on a winter day.
#[derive(Debug, Clone)]
pub struct DateValue {
    /// The absolute point in time.
    pub instant: DateTime<Utc>,
    /// Zone whose wall clock is used for display and calendar arithmetic.
    pub zone:    Zone,
    /// Name the zone was written as, if one was given.
    pub label:   Option<String>,
    pub kind:    DateKind,
}

impl DateValue {
    /// Creates an unlabeled date value.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>, zone: Zone, kind: DateKind) -> Self {
        Self { instant,
               zone,
               label: None,
               kind }
    }

    /// The same instant, shown in another zone.
    #[must_use]
    pub fn in_zone(&self, zone: Zone, label: impl Into<String>) -> Self {
        Self { instant: self.instant,
               zone,
               label: Some(label.into()),
               kind: match self.kind {
                   DateKind::Date => DateKind::DateTime,
                   kind => kind,
               } }
    }

    /// Wall-clock time of this instant in its zone.
    #[must_use]
    pub fn wall(&self) -> NaiveDateTime {
        self.zone.wall_clock(self.instant)
    }

    /// Seconds from `other` to `self`.
    #[must_use]
    pub fn seconds_since(&self, other: &Self) -> Decimal {
        let delta = self.instant - other.instant;
        Decimal::new(delta.num_milliseconds(), 3).normalize()
    }

    /// Unix timestamp in seconds.
    #[must_use]
    pub fn timestamp(&self) -> Decimal {
        Decimal::new(self.instant.timestamp_millis(), 3).normalize()
    }

    /// Shifts this instant by `amount` of a calendar unit.
    ///
    /// Days, weeks, months and years follow the calendar of the value's zone:
    /// the wall-clock time is kept and months clamp to the last valid day
    /// (`31.01.2024 + 1 month` is `29.02.2024`). Hours, minutes and seconds
    /// are fixed durations, as are fractional days and weeks.
    ///
    /// # Errors
    /// - `TypeError` for fractional months or years.
    /// - `UnsupportedDomain` if the result leaves the representable range.
    ///
    /// # Example
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use rust_decimal::Decimal;
    /// use tally::{
    ///     ast::CalendarUnit,
    ///     interpreter::{
    ///         timezone::parse,
    ///         value::date::{DateKind, DateValue},
    ///     },
    /// };
    ///
    /// let zone = parse("UTC").unwrap();
    /// let start = DateValue::new(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
    ///                            zone,
    ///                            DateKind::Date);
    /// let shifted = start.shift(Decimal::ONE, CalendarUnit::Month, 0).unwrap();
    ///
    /// assert_eq!(shifted.to_string(), "29.02.2024");
    /// ```
    pub fn shift(&self, amount: Decimal, unit: CalendarUnit, offset: usize) -> EvalResult<Self> {
        let whole = amount.fract().is_zero();
        match unit {
            CalendarUnit::Day | CalendarUnit::Week if whole => {
                let days = decimal_to_i64(amount, offset)?
                    .checked_mul(if unit == CalendarUnit::Week { 7 } else { 1 })
                    .ok_or_else(|| RuntimeError::domain("Date out of range", offset))?;
                let wall = self.wall();
                let shifted = if days >= 0 {
                    wall.checked_add_days(Days::new(days.unsigned_abs()))
                } else {
                    wall.checked_sub_days(Days::new(days.unsigned_abs()))
                };
                self.at_wall(shifted, self.kind, offset)
            },
            CalendarUnit::Month | CalendarUnit::Year => {
                if !whole {
                    return Err(RuntimeError::type_error(
                        format!("Cannot shift a date by a fractional number of {}s",
                                if unit == CalendarUnit::Year { "year" } else { "month" }),
                        offset,
                    ));
                }
                let months = decimal_to_i64(amount, offset)?
                    .checked_mul(if unit == CalendarUnit::Year { 12 } else { 1 })
                    .ok_or_else(|| RuntimeError::domain("Date out of range", offset))?;
                let months = u32::try_from(months.unsigned_abs())
                    .map_err(|_| RuntimeError::domain("Date out of range", offset))?;
                let wall = self.wall();
                let shifted = if amount.is_sign_negative() {
                    wall.checked_sub_months(Months::new(months))
                } else {
                    wall.checked_add_months(Months::new(months))
                };
                self.at_wall(shifted, self.kind, offset)
            },
            _ => {
                let millis = amount.checked_mul(unit_seconds(unit))
                                   .and_then(|seconds| seconds.checked_mul(Decimal::ONE_THOUSAND))
                                   .ok_or_else(|| RuntimeError::domain("Date out of range", offset))?;
                let millis = decimal_to_i64(millis.round(), offset)?;
                let instant = TimeDelta::try_milliseconds(millis)
                    .and_then(|delta| self.instant.checked_add_signed(delta))
                    .ok_or_else(|| RuntimeError::domain("Date out of range", offset))?;
                let kind = match self.kind {
                    DateKind::Date => DateKind::DateTime,
                    kind => kind,
                };
                Ok(Self { instant,
                          zone: self.zone,
                          label: self.label.clone(),
                          kind })
            },
        }
    }

    fn at_wall(&self, wall: Option<NaiveDateTime>, kind: DateKind, offset: usize) -> EvalResult<Self> {
        let instant = wall.and_then(|wall| self.zone.instant_of(wall))
                          .ok_or_else(|| RuntimeError::domain("Date out of range", offset))?;
        Ok(Self { instant,
                  zone: self.zone,
                  label: self.label.clone(),
                  kind })
    }

    /// Calendar components in the value's zone, used by the date built-ins.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<i64> {
        let wall = self.wall();
        Some(match name {
            "year" => i64::from(wall.year()),
            "month" => i64::from(wall.month()),
            "day" => i64::from(wall.day()),
            "hour" => i64::from(wall.hour()),
            "minute" => i64::from(wall.minute()),
            "weekday" => i64::from(wall.weekday().number_from_monday()),
            _ => return None,
        })
    }
}

/// Length of one fixed-duration unit in seconds.
fn unit_seconds(unit: CalendarUnit) -> Decimal {
    Decimal::from(match unit {
        CalendarUnit::Second => 1,
        CalendarUnit::Minute => 60,
        CalendarUnit::Hour => 3_600,
        CalendarUnit::Day => 86_400,
        CalendarUnit::Week => 604_800,
        CalendarUnit::Month => 2_629_746,
        CalendarUnit::Year => 31_556_952,
    })
}

impl PartialEq for DateValue {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for DateValue {}

impl PartialOrd for DateValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl std::fmt::Display for DateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let wall = self.wall();
        let clock = if wall.second() == 0 { "%H:%M" } else { "%H:%M:%S" };
        match self.kind {
            DateKind::Date => write!(f, "{}", wall.format("%d.%m.%Y"))?,
            DateKind::Time => write!(f, "{}", wall.format(clock))?,
            DateKind::DateTime => write!(f, "{}T{}", wall.format("%d.%m.%Y"), wall.format(clock))?,
        }
        if let Some(label) = &self.label {
            write!(f, " {label}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::interpreter::timezone::parse;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateValue {
        DateValue::new(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap(),
                       parse("UTC").unwrap(),
                       DateKind::DateTime)
    }

    #[test]
    fn leap_years_are_respected() {
        let date = utc(2024, 2, 29, 0, 0);
        let next = date.shift(Decimal::ONE, CalendarUnit::Year, 0).unwrap();
        assert_eq!(next.to_string(), "28.02.2025T00:00");
    }

    #[test]
    fn hours_are_fixed_durations() {
        let date = utc(2024, 3, 1, 23, 30);
        let later = date.shift(Decimal::new(15, 1), CalendarUnit::Hour, 0).unwrap();
        assert_eq!(later.to_string(), "02.03.2024T01:00");
    }

    #[test]
    fn fractional_months_are_rejected() {
        let date = utc(2024, 3, 1, 0, 0);
        assert!(date.shift(Decimal::new(5, 1), CalendarUnit::Month, 3).is_err());
    }

    #[test]
    fn equality_ignores_zone() {
        let a = utc(2024, 1, 1, 12, 0);
        let b = a.in_zone(parse("CET").unwrap(), "CET");
        assert_eq!(a, b);
        assert_eq!(b.to_string(), "01.01.2024T13:00 CET");
    }

    #[test]
    fn difference_in_seconds() {
        let a = utc(2024, 1, 2, 0, 0);
        let b = utc(2024, 1, 1, 0, 0);
        assert_eq!(a.seconds_since(&b), Decimal::from(86_400));
    }
}
