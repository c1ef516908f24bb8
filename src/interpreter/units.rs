use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::{ast::CalendarUnit, error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Physical category a unit measures. Each category contributes one entry to
/// a quantity's dimension vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Base unit: meter.
    Length,
    /// Base unit: kilogram.
    Mass,
    /// Base unit: second.
    Time,
    /// Base unit: kelvin. Conversions of plain temperatures are affine.
    Temperature,
    /// Base unit: byte.
    Data,
    /// Base unit: square meter.
    Area,
    /// Base unit: liter.
    Volume,
    /// Converted through the host-supplied [`RateTable`].
    Currency,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Length => "length",
            Self::Mass => "mass",
            Self::Time => "time",
            Self::Temperature => "temperature",
            Self::Data => "data",
            Self::Area => "area",
            Self::Volume => "volume",
            Self::Currency => "currency",
        };
        write!(f, "{name}")
    }
}

/// A unit known to the unit table.
#[derive(Debug, PartialEq, Eq)]
pub struct UnitDef {
    /// Canonical short symbol.
    pub symbol:   &'static str,
    /// Every accepted spelling, including the symbol.
    pub names:    &'static [&'static str],
    /// Measured category.
    pub category: Category,
    /// Size relative to the category's base unit, as `(mantissa, scale)`.
    factor:       (i64, u32),
}

impl UnitDef {
    /// Size of this unit relative to its category's base unit.
    #[must_use]
    pub fn factor(&self) -> Decimal {
        Decimal::new(self.factor.0, self.factor.1)
    }

    /// Calendar unit for date arithmetic, if this is one of second, minute,
    /// hour, day, week, month or year.
    #[must_use]
    pub fn calendar_unit(&self) -> Option<CalendarUnit> {
        match self.symbol {
            "s" => Some(CalendarUnit::Second),
            "min" => Some(CalendarUnit::Minute),
            "h" => Some(CalendarUnit::Hour),
            "d" => Some(CalendarUnit::Day),
            "wk" => Some(CalendarUnit::Week),
            "mo" => Some(CalendarUnit::Month),
            "yr" => Some(CalendarUnit::Year),
            _ => None,
        }
    }
}

macro_rules! unit_table {
    ($($category:ident $symbol:literal [$($name:literal),*] = ($mantissa:expr, $scale:expr);)*) => {
        static UNITS: &[UnitDef] = &[
            $(
                UnitDef { symbol:   $symbol,
                          names:    &[$symbol, $($name),*],
                          category: Category::$category,
                          factor:   ($mantissa, $scale) },
            )*
        ];
    };
}

unit_table! {
    Length "nm" ["nanometer", "nanometers", "nanometre", "nanometres"] = (1, 9);
    Length "um" ["µm", "micrometer", "micrometers", "micron", "microns"] = (1, 6);
    Length "mm" ["millimeter", "millimeters", "millimetre", "millimetres"] = (1, 3);
    Length "cm" ["centimeter", "centimeters", "centimetre", "centimetres"] = (1, 2);
    Length "dm" ["decimeter", "decimeters", "decimetre", "decimetres"] = (1, 1);
    Length "m" ["meter", "meters", "metre", "metres"] = (1, 0);
    Length "km" ["kilometer", "kilometers", "kilometre", "kilometres"] = (1000, 0);
    Length "inch" ["inches"] = (254, 4);
    Length "ft" ["foot", "feet"] = (3048, 4);
    Length "yd" ["yard", "yards"] = (9144, 4);
    Length "mi" ["mile", "miles"] = (1_609_344, 3);
    Length "nmi" ["nauticalmile", "nauticalmiles"] = (1852, 0);
    Length "ly" ["lightyear", "lightyears"] = (9_460_730_472_580_800, 0);

    Mass "mg" ["milligram", "milligrams"] = (1, 6);
    Mass "g" ["gram", "grams", "gramme", "grammes"] = (1, 3);
    Mass "kg" ["kilogram", "kilograms", "kilo", "kilos"] = (1, 0);
    Mass "tonne" ["tonnes", "ton", "tons"] = (1000, 0);
    Mass "lb" ["lbs", "pound", "pounds"] = (45_359_237, 8);
    Mass "oz" ["ounce", "ounces"] = (28_349_523_125, 12);
    Mass "st" ["stone", "stones"] = (635_029_318, 8);
    Mass "ct" ["carat", "carats"] = (2, 4);

    Time "ns" ["nanosecond", "nanoseconds"] = (1, 9);
    Time "us" ["µs", "microsecond", "microseconds"] = (1, 6);
    Time "ms" ["millisecond", "milliseconds"] = (1, 3);
    Time "s" ["sec", "secs", "second", "seconds"] = (1, 0);
    Time "min" ["mins", "minute", "minutes"] = (60, 0);
    Time "h" ["hr", "hrs", "hour", "hours"] = (3600, 0);
    Time "d" ["day", "days"] = (86_400, 0);
    Time "wk" ["week", "weeks"] = (604_800, 0);
    Time "mo" ["month", "months"] = (2_629_746, 0);
    Time "yr" ["yrs", "year", "years"] = (31_556_952, 0);

    Temperature "K" ["kelvin", "kelvins"] = (1, 0);
    Temperature "celsius" ["degC", "centigrade"] = (1, 0);
    Temperature "fahrenheit" ["degF"] = (5, 0);

    Data "bit" ["bits"] = (125, 3);
    Data "B" ["byte", "bytes"] = (1, 0);
    Data "kB" ["KB", "kilobyte", "kilobytes"] = (1000, 0);
    Data "MB" ["megabyte", "megabytes"] = (1_000_000, 0);
    Data "GB" ["gigabyte", "gigabytes"] = (1_000_000_000, 0);
    Data "TB" ["terabyte", "terabytes"] = (1_000_000_000_000, 0);
    Data "PB" ["petabyte", "petabytes"] = (1_000_000_000_000_000, 0);
    Data "KiB" ["kibibyte", "kibibytes"] = (1024, 0);
    Data "MiB" ["mebibyte", "mebibytes"] = (1_048_576, 0);
    Data "GiB" ["gibibyte", "gibibytes"] = (1_073_741_824, 0);
    Data "TiB" ["tebibyte", "tebibytes"] = (1_099_511_627_776, 0);

    Area "sqmm" ["mm2"] = (1, 6);
    Area "sqcm" ["cm2"] = (1, 4);
    Area "sqm" ["m2"] = (1, 0);
    Area "sqkm" ["km2"] = (1_000_000, 0);
    Area "ha" ["hectare", "hectares"] = (10_000, 0);
    Area "acre" ["acres"] = (40_468_564_224, 7);
    Area "sqin" ["in2"] = (64_516, 8);
    Area "sqft" ["ft2"] = (9_290_304, 8);
    Area "sqmi" ["mi2"] = (2_589_988_110_336, 6);

    Volume "ml" ["mL", "milliliter", "milliliters", "millilitre", "millilitres"] = (1, 3);
    Volume "cl" ["centiliter", "centiliters", "centilitre", "centilitres"] = (1, 2);
    Volume "dl" ["deciliter", "deciliters", "decilitre", "decilitres"] = (1, 1);
    Volume "l" ["L", "liter", "liters", "litre", "litres"] = (1, 0);
    Volume "m3" ["cbm"] = (1000, 0);
    Volume "gal" ["gallon", "gallons"] = (3_785_411_784, 9);
    Volume "qt" ["quart", "quarts"] = (946_352_946, 9);
    Volume "pt" ["pint", "pints"] = (473_176_473, 9);
    Volume "cup" ["cups"] = (2_365_882_365, 10);
    Volume "floz" [] = (295_735_295_625, 13);
    Volume "tbsp" ["tablespoon", "tablespoons"] = (1_478_676_478_125, 14);
    Volume "tsp" ["teaspoon", "teaspoons"] = (492_892_159_375, 14);
}

/// ISO 4217 codes recognized as currency units.
pub const CURRENCY_CODES: &[&str] = &["USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "NZD", "CNY",
                                      "HKD", "SGD", "INR", "KRW", "SEK", "NOK", "DKK", "PLN", "CZK",
                                      "HUF", "RON", "BGN", "TRY", "RUB", "UAH", "BRL", "MXN", "ARS",
                                      "CLP", "COP", "ZAR", "ILS", "AED", "SAR", "THB", "IDR", "MYR",
                                      "PHP", "VND", "TWD", "ISK", "BTC", "ETH"];

/// Looks up a unit by any of its spellings.
///
/// Exact spellings win; long names (three letters or more) also match
/// case-insensitively, so `Meters` resolves but `MB` and `mb` stay distinct.
///
/// # Example
/// ```
/// use tally::interpreter::units::{Category, lookup};
///
/// assert_eq!(lookup("meters").unwrap().category, Category::Length);
/// assert_eq!(lookup("KiB").unwrap().symbol, "KiB");
/// assert!(lookup("parsec").is_none());
/// ```
#[must_use]
pub fn lookup(name: &str) -> Option<&'static UnitDef> {
    UNITS.iter()
         .find(|def| def.names.contains(&name))
         .or_else(|| {
             if name.chars().count() < 3 {
                 return None;
             }
             let lower = name.to_lowercase();
             UNITS.iter().find(|def| {
                             def.names
                                .iter()
                                .any(|n| n.chars().count() >= 3 && n.to_lowercase() == lower)
                         })
         })
}

/// Returns `true` if `name` is a known currency code.
#[must_use]
pub fn is_currency_code(name: &str) -> bool {
    CURRENCY_CODES.contains(&name)
}

/// Maps a currency symbol to its ISO code.
#[must_use]
pub fn currency_for_symbol(symbol: &str) -> Option<&'static str> {
    match symbol {
        "$" => Some("USD"),
        "€" => Some("EUR"),
        "£" => Some("GBP"),
        "¥" => Some("JPY"),
        _ => None,
    }
}

/// Category and identity of a unit spelling, covering both the unit table and
/// currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// A physical unit from the table.
    Unit(&'static UnitDef),
    /// A currency code.
    Currency(&'static str),
}

impl Resolved {
    /// The category this unit belongs to.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Unit(def) => def.category,
            Self::Currency(_) => Category::Currency,
        }
    }

    /// A stable identity, equal for all spellings of the same unit.
    #[must_use]
    pub const fn canonical(self) -> &'static str {
        match self {
            Self::Unit(def) => def.symbol,
            Self::Currency(code) => code,
        }
    }
}

/// Resolves a unit or currency spelling.
#[must_use]
pub fn resolve(name: &str) -> Option<Resolved> {
    if let Some(def) = lookup(name) {
        return Some(Resolved::Unit(def));
    }
    CURRENCY_CODES.iter()
                  .find(|code| **code == name)
                  .map(|code| Resolved::Currency(code))
}

/// Resolves a unit spelling or fails with a type error naming it.
pub fn resolve_or_err(name: &str, offset: usize) -> EvalResult<Resolved> {
    resolve(name).ok_or_else(|| RuntimeError::type_error(format!("unknown unit '{name}'"), offset))
}

/// Currency exchange rates supplied by the host.
///
/// Each entry maps a currency code to how many units of that currency equal
/// one unit of an arbitrary common base. The core never fetches or refreshes
/// rates; converting through a code without an entry is an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    /// Creates an empty rate table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a rate, builder style.
    #[must_use]
    pub fn with_rate(mut self, code: &str, rate: Decimal) -> Self {
        self.insert(code, rate);
        self
    }

    /// Adds or replaces a rate.
    pub fn insert(&mut self, code: &str, rate: Decimal) {
        self.rates.insert(code.to_uppercase(), rate);
    }

    /// Rate of `code` relative to the base.
    #[must_use]
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    /// Returns `true` if no rates are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Size of one `unit` in its category's base unit.
///
/// Currencies use the inverse of their rate, so that dividing two factors
/// yields the exchange ratio.
pub fn base_factor(unit: Resolved, rates: &RateTable, offset: usize) -> EvalResult<Decimal> {
    match unit {
        Resolved::Unit(def) if def.category == Category::Temperature => Ok(match def.symbol {
            "fahrenheit" => Decimal::from(5) / Decimal::from(9),
            _ => Decimal::ONE,
        }),
        Resolved::Unit(def) => Ok(def.factor()),
        Resolved::Currency(code) => {
            let rate = rates.rate(code)
                            .ok_or_else(|| RuntimeError::MissingExchangeRate { code:
                                                                                   code.to_string(),
                                                                               offset })?;
            if rate.is_zero() {
                return Err(RuntimeError::domain(format!("Exchange rate for '{code}' is zero"),
                                                offset));
            }
            Decimal::ONE.checked_div(rate)
                        .ok_or_else(|| RuntimeError::overflow(offset))
        },
    }
}

/// Ratio that converts a magnitude in `from` into a magnitude in `to`, for
/// one power of the unit. Identical units never consult the rate table.
pub fn ratio(from: Resolved, to: Resolved, rates: &RateTable, offset: usize) -> EvalResult<Decimal> {
    if from.canonical() == to.canonical() {
        return Ok(Decimal::ONE);
    }
    if let (Resolved::Currency(a), Resolved::Currency(b)) = (from, to) {
        let rate_from = rates.rate(a)
                             .ok_or_else(|| RuntimeError::MissingExchangeRate { code:
                                                                                    a.to_string(),
                                                                                offset })?;
        let rate_to = rates.rate(b)
                           .ok_or_else(|| RuntimeError::MissingExchangeRate { code:
                                                                                  b.to_string(),
                                                                              offset })?;
        if rate_from.is_zero() {
            return Err(RuntimeError::domain(format!("Exchange rate for '{a}' is zero"), offset));
        }
        return rate_to.checked_div(rate_from)
                      .ok_or_else(|| RuntimeError::overflow(offset));
    }
    let from_factor = base_factor(from, rates, offset)?;
    let to_factor = base_factor(to, rates, offset)?;
    from_factor.checked_div(to_factor)
               .ok_or_else(|| RuntimeError::overflow(offset))
}

/// Converts a plain temperature reading (not a difference) between scales.
///
/// # Errors
/// `UnsupportedDomain` if the reading is too large to convert.
pub fn convert_temperature(value: Decimal,
                           from: &UnitDef,
                           to: &UnitDef,
                           offset: usize)
                           -> EvalResult<Decimal> {
    let zero_celsius = Decimal::new(27315, 2);
    let (five, nine, freezing) = (Decimal::from(5), Decimal::from(9), Decimal::from(32));
    let kelvin = match from.symbol {
        "celsius" => value.checked_add(zero_celsius),
        "fahrenheit" => value.checked_sub(freezing)
                             .and_then(|v| v.checked_mul(five))
                             .and_then(|v| v.checked_div(nine))
                             .and_then(|v| v.checked_add(zero_celsius)),
        _ => Some(value),
    };
    let converted = kelvin.and_then(|kelvin| match to.symbol {
                              "celsius" => kelvin.checked_sub(zero_celsius),
                              "fahrenheit" => kelvin.checked_sub(zero_celsius)
                                                    .and_then(|v| v.checked_mul(nine))
                                                    .and_then(|v| v.checked_div(five))
                                                    .and_then(|v| v.checked_add(freezing)),
                              _ => Some(kelvin),
                          });
    converted.ok_or_else(|| RuntimeError::overflow(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spellings_share_a_definition() {
        let a = lookup("km").unwrap();
        let b = lookup("kilometres").unwrap();
        assert_eq!(a.symbol, b.symbol);
        assert_eq!(a.factor(), Decimal::from(1000));
        assert_eq!(resolve("km"), resolve("kilometres"));
        assert_ne!(resolve("km"), resolve("m"));
    }

    #[test]
    fn long_names_match_case_insensitively() {
        assert_eq!(lookup("Meters").unwrap().symbol, "m");
        assert!(lookup("M").is_none());
    }

    #[test]
    fn currency_ratio_uses_rates() {
        let rates = RateTable::new().with_rate("USD", Decimal::ONE)
                                    .with_rate("EUR", Decimal::new(5, 1));
        let usd = resolve("USD").unwrap();
        let eur = resolve("EUR").unwrap();
        assert_eq!(ratio(usd, eur, &rates, 0).unwrap(), Decimal::new(5, 1));
        assert_eq!(ratio(eur, usd, &rates, 0).unwrap(), Decimal::from(2));
    }

    #[test]
    fn missing_rate_is_reported() {
        let rates = RateTable::new().with_rate("USD", Decimal::ONE);
        let usd = resolve("USD").unwrap();
        let gbp = resolve("GBP").unwrap();
        assert!(matches!(ratio(usd, gbp, &rates, 3),
                         Err(RuntimeError::MissingExchangeRate { .. })));
        assert_eq!(ratio(gbp, gbp, &rates, 3).unwrap(), Decimal::ONE);
    }

    #[test]
    fn temperature_scales_are_affine() {
        let c = lookup("celsius").unwrap();
        let f = lookup("fahrenheit").unwrap();
        assert_eq!(convert_temperature(Decimal::from(100), c, f, 0).unwrap(), Decimal::from(212));
        assert_eq!(convert_temperature(Decimal::from(32), f, c, 0).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn oversized_readings_overflow() {
        let c = lookup("celsius").unwrap();
        let k = lookup("K").unwrap();
        assert!(matches!(convert_temperature(Decimal::MAX, c, k, 9),
                         Err(RuntimeError::UnsupportedDomain { offset: 9, .. })));
    }
}
