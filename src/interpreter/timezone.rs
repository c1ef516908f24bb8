use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// A resolved timezone.
///
/// Abbreviations such as `EST` resolve to the DST-aware region they are
/// commonly used for, so `EST` in July behaves like `EDT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// A fixed UTC offset (`UTC`, `UTC+5:30`).
    Fixed(FixedOffset),
    /// An IANA region.
    Region(Tz),
    /// The host's local zone.
    Local,
}

const ABBREVIATIONS: &[(&str, Tz)] = &[("EST", Tz::America__New_York),
                                       ("EDT", Tz::America__New_York),
                                       ("ET", Tz::America__New_York),
                                       ("CST", Tz::America__Chicago),
                                       ("CDT", Tz::America__Chicago),
                                       ("CT", Tz::America__Chicago),
                                       ("MST", Tz::America__Denver),
                                       ("MDT", Tz::America__Denver),
                                       ("PST", Tz::America__Los_Angeles),
                                       ("PDT", Tz::America__Los_Angeles),
                                       ("PT", Tz::America__Los_Angeles),
                                       ("AKST", Tz::America__Anchorage),
                                       ("HST", Tz::Pacific__Honolulu),
                                       ("WET", Tz::Europe__Lisbon),
                                       ("BST", Tz::Europe__London),
                                       ("CET", Tz::Europe__Paris),
                                       ("CEST", Tz::Europe__Paris),
                                       ("EET", Tz::Europe__Athens),
                                       ("EEST", Tz::Europe__Athens),
                                       ("MSK", Tz::Europe__Moscow),
                                       ("IST", Tz::Asia__Kolkata),
                                       ("SGT", Tz::Asia__Singapore),
                                       ("HKT", Tz::Asia__Hong_Kong),
                                       ("JST", Tz::Asia__Tokyo),
                                       ("KST", Tz::Asia__Seoul),
                                       ("AWST", Tz::Australia__Perth),
                                       ("ACST", Tz::Australia__Adelaide),
                                       ("AEST", Tz::Australia__Sydney),
                                       ("AEDT", Tz::Australia__Sydney),
                                       ("NZST", Tz::Pacific__Auckland),
                                       ("NZDT", Tz::Pacific__Auckland)];

const CITIES: &[(&str, Tz)] = &[("london", Tz::Europe__London),
                                ("dublin", Tz::Europe__Dublin),
                                ("lisbon", Tz::Europe__Lisbon),
                                ("paris", Tz::Europe__Paris),
                                ("berlin", Tz::Europe__Berlin),
                                ("madrid", Tz::Europe__Madrid),
                                ("rome", Tz::Europe__Rome),
                                ("amsterdam", Tz::Europe__Amsterdam),
                                ("zurich", Tz::Europe__Zurich),
                                ("vienna", Tz::Europe__Vienna),
                                ("prague", Tz::Europe__Prague),
                                ("warsaw", Tz::Europe__Warsaw),
                                ("stockholm", Tz::Europe__Stockholm),
                                ("oslo", Tz::Europe__Oslo),
                                ("helsinki", Tz::Europe__Helsinki),
                                ("athens", Tz::Europe__Athens),
                                ("istanbul", Tz::Europe__Istanbul),
                                ("moscow", Tz::Europe__Moscow),
                                ("cairo", Tz::Africa__Cairo),
                                ("lagos", Tz::Africa__Lagos),
                                ("nairobi", Tz::Africa__Nairobi),
                                ("johannesburg", Tz::Africa__Johannesburg),
                                ("cape town", Tz::Africa__Johannesburg),
                                ("dubai", Tz::Asia__Dubai),
                                ("mumbai", Tz::Asia__Kolkata),
                                ("delhi", Tz::Asia__Kolkata),
                                ("kolkata", Tz::Asia__Kolkata),
                                ("bangkok", Tz::Asia__Bangkok),
                                ("jakarta", Tz::Asia__Jakarta),
                                ("singapore", Tz::Asia__Singapore),
                                ("hong kong", Tz::Asia__Hong_Kong),
                                ("manila", Tz::Asia__Manila),
                                ("beijing", Tz::Asia__Shanghai),
                                ("shanghai", Tz::Asia__Shanghai),
                                ("seoul", Tz::Asia__Seoul),
                                ("tokyo", Tz::Asia__Tokyo),
                                ("perth", Tz::Australia__Perth),
                                ("sydney", Tz::Australia__Sydney),
                                ("melbourne", Tz::Australia__Melbourne),
                                ("auckland", Tz::Pacific__Auckland),
                                ("honolulu", Tz::Pacific__Honolulu),
                                ("anchorage", Tz::America__Anchorage),
                                ("vancouver", Tz::America__Vancouver),
                                ("los angeles", Tz::America__Los_Angeles),
                                ("san francisco", Tz::America__Los_Angeles),
                                ("denver", Tz::America__Denver),
                                ("chicago", Tz::America__Chicago),
                                ("mexico city", Tz::America__Mexico_City),
                                ("toronto", Tz::America__Toronto),
                                ("new york", Tz::America__New_York),
                                ("sao paulo", Tz::America__Sao_Paulo),
                                ("buenos aires", Tz::America__Argentina__Buenos_Aires)];

/// First words that may open a two-word city name.
pub const MULTI_WORD_PREFIXES: &[&str] =
    &["new", "los", "hong", "san", "cape", "sao", "buenos", "mexico"];

/// Resolves a timezone name.
///
/// Accepts `UTC`/`GMT` with an optional `±H[:MM]` offset, the abbreviation
/// table, city names (case-insensitive, spaces or underscores) and IANA
/// `Area/City` identifiers.
///
/// # Example
/// ```
/// use tally::interpreter::timezone::{Zone, parse};
///
/// assert!(matches!(parse("UTC+5:30"), Some(Zone::Fixed(_))));
/// assert!(matches!(parse("new york"), Some(Zone::Region(_))));
/// assert!(matches!(parse("Europe/Berlin"), Some(Zone::Region(_))));
/// assert!(parse("Atlantis").is_none());
/// ```
#[must_use]
pub fn parse(name: &str) -> Option<Zone> {
    let name = name.trim();
    if let Some(offset) = parse_utc_offset(name) {
        return Some(Zone::Fixed(offset));
    }
    if let Some((_, tz)) = ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == name) {
        return Some(Zone::Region(*tz));
    }
    let normalized = name.to_lowercase().replace('_', " ");
    if let Some((_, tz)) = CITIES.iter().find(|(city, _)| *city == normalized) {
        return Some(Zone::Region(*tz));
    }
    if name.contains('/') {
        return name.parse::<Tz>().ok().map(Zone::Region);
    }
    None
}

/// Returns `true` if `first second` names a known multi-word city.
#[must_use]
pub fn is_two_word_city(first: &str, second: &str) -> bool {
    let joined = format!("{} {}", first.to_lowercase(), second.to_lowercase());
    CITIES.iter().any(|(city, _)| *city == joined)
}

fn parse_utc_offset(name: &str) -> Option<FixedOffset> {
    let upper = name.to_uppercase();
    let rest = upper.strip_prefix("UTC").or_else(|| upper.strip_prefix("GMT"))?;
    if rest.is_empty() {
        return FixedOffset::east_opt(0);
    }
    let (sign, digits) = match rest.split_at(1) {
        ("+", digits) => (1, digits),
        ("-", digits) => (-1, digits),
        _ => return None,
    };
    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (digits.parse::<i32>().ok()?, 0),
    };
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl Zone {
    /// Wall-clock time of `instant` in this zone.
    #[must_use]
    pub fn wall_clock(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Fixed(offset) => instant.with_timezone(offset).naive_local(),
            Self::Region(tz) => instant.with_timezone(tz).naive_local(),
            Self::Local => instant.with_timezone(&Local).naive_local(),
        }
    }

    /// The instant at which this zone's clocks show `wall`.
    ///
    /// Ambiguous wall times (DST fall-back) take the earlier instant;
    /// wall times skipped by a DST jump move forward by an hour.
    #[must_use]
    pub fn instant_of(&self, wall: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.earliest(wall).or_else(|| {
                               wall.checked_add_signed(TimeDelta::hours(1))
                                   .and_then(|shifted| self.earliest(shifted))
                           })
    }

    fn earliest(&self, wall: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Fixed(offset) => offset.from_local_datetime(&wall)
                                         .earliest()
                                         .map(|dt| dt.with_timezone(&Utc)),
            Self::Region(tz) => tz.from_local_datetime(&wall)
                                  .earliest()
                                  .map(|dt| dt.with_timezone(&Utc)),
            Self::Local => Local.from_local_datetime(&wall)
                                .earliest()
                                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn utc_offsets() {
        assert_eq!(parse("UTC"), Some(Zone::Fixed(FixedOffset::east_opt(0).unwrap())));
        assert_eq!(parse("GMT-3"), Some(Zone::Fixed(FixedOffset::west_opt(3 * 3600).unwrap())));
        assert!(parse("UTC+15").is_none());
        assert!(parse("UTC*2").is_none());
    }

    #[test]
    fn abbreviations_follow_daylight_saving() {
        let est = parse("EST").unwrap();
        let summer = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
                                                         .and_hms_opt(12, 0, 0)
                                                         .unwrap();
        let instant = est.instant_of(summer).unwrap();
        assert_eq!(instant.naive_utc().time(), chrono::NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }

    #[test]
    fn multi_word_cities() {
        assert!(is_two_word_city("New", "York"));
        assert!(!is_two_word_city("new", "jersey"));
        assert!(parse("hong_kong").is_some());
    }
}
