use std::collections::BTreeMap;

use rust_decimal::{Decimal, MathematicalOps};

use crate::{
    ast::UnitTerm,
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        units::{self, Category, RateTable, Resolved},
        value::core::Value,
    },
};

/// The unit a category contributes to a dimension vector, and its power.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Unit spelling as written by the user (`meters`, `km`, `USD`).
    pub unit:     String,
    pub exponent: i32,
}

/// Dimension vector: at most one unit per category, each with a non-zero
/// exponent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dimensions(BTreeMap<Category, Term>);

impl Dimensions {
    /// Returns `true` when no category has a non-zero exponent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates categories and their terms in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&Category, &Term)> {
        self.0.iter()
    }

    /// The single category and term, if the vector has exactly one entry.
    #[must_use]
    pub fn single(&self) -> Option<(Category, &Term)> {
        let mut iter = self.0.iter();
        match (iter.next(), iter.next()) {
            (Some((category, term)), None) => Some((*category, term)),
            _ => None,
        }
    }

    /// Returns `true` if both vectors have the same categories with the same
    /// exponents, regardless of the units used.
    #[must_use]
    pub fn compatible(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
        && self.0
               .iter()
               .all(|(category, term)| {
                   other.0.get(category).is_some_and(|o| o.exponent == term.exponent)
               })
    }

    fn negated(&self) -> Self {
        Self(self.0
                 .iter()
                 .map(|(category, term)| {
                     (*category,
                      Term { unit:     term.unit.clone(),
                             exponent: -term.exponent, })
                 })
                 .collect())
    }
}

impl std::fmt::Display for Dimensions {
    /// Positive powers first, joined by `*`, then `/` and the negative powers:
    /// `km/h`, `m/s^2`, `kg*m`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let power = |term: &Term, exponent: i32| {
            if exponent == 1 {
                term.unit.clone()
            } else {
                format!("{}^{exponent}", term.unit)
            }
        };
        let positive: Vec<String> = self.0
                                        .values()
                                        .filter(|t| t.exponent > 0)
                                        .map(|t| power(t, t.exponent))
                                        .collect();
        let negative: Vec<String> = self.0
                                        .values()
                                        .filter(|t| t.exponent < 0)
                                        .map(|t| power(t, -t.exponent))
                                        .collect();
        match (positive.is_empty(), negative.is_empty()) {
            (_, true) => write!(f, "{}", positive.join("*")),
            (true, false) => {
                let inverse: Vec<String> = self.0
                                               .values()
                                               .map(|t| power(t, t.exponent))
                                               .collect();
                write!(f, "{}", inverse.join("*"))
            },
            (false, false) => write!(f, "{}/{}", positive.join("*"), negative.join("/")),
        }
    }
}

/// A decimal magnitude tagged with a dimension vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    pub value: Decimal,
    pub dims:  Dimensions,
}

impl Quantity {
    /// Builds a quantity from a magnitude and the unit terms scanned from the
    /// source.
    ///
    /// Two terms in the same category are merged into the first one's unit,
    /// so `km*m` becomes `km^2` with the magnitude scaled accordingly.
    ///
    /// # Errors
    /// - `TypeError` for an unknown unit spelling.
    /// - `MissingExchangeRate` when merging currencies without rates.
    pub fn from_terms(value: Decimal,
                      terms: &[UnitTerm],
                      rates: &RateTable,
                      offset: usize)
                      -> EvalResult<Self> {
        let mut quantity = Self { value,
                                  dims: Dimensions::default() };
        for term in terms {
            let resolved = units::resolve_or_err(&term.unit, offset)?;
            quantity.absorb(resolved, &term.unit, term.exponent, rates, offset)?;
        }
        Ok(quantity)
    }

    /// Collapses to a plain number when every exponent has cancelled.
    #[must_use]
    pub fn into_value(self) -> Value {
        if self.dims.is_empty() {
            Value::Number(self.value)
        } else {
            Value::Quantity(self)
        }
    }

    /// Multiplies in one unit power, converting into the unit already present
    /// for that category.
    fn absorb(&mut self,
              resolved: Resolved,
              spelling: &str,
              exponent: i32,
              rates: &RateTable,
              offset: usize)
              -> EvalResult<()> {
        let category = resolved.category();
        match self.dims.0.get_mut(&category) {
            Some(existing) => {
                let target = units::resolve_or_err(&existing.unit, offset)?;
                let ratio = units::ratio(resolved, target, rates, offset)?;
                self.value = checked_mul(self.value, power(ratio, exponent, offset)?, offset)?;
                existing.exponent += exponent;
                if existing.exponent == 0 {
                    self.dims.0.remove(&category);
                }
            },
            None if exponent != 0 => {
                self.dims.0.insert(category,
                                   Term { unit: spelling.to_string(),
                                          exponent });
            },
            None => {},
        }
        Ok(())
    }

    /// Re-expresses this quantity in `target`'s units.
    ///
    /// A plain temperature (kelvin, celsius or fahrenheit to the first power)
    /// converts affinely; every other case scales by the unit ratios.
    ///
    /// # Errors
    /// - `IncompatibleUnits` if the categories or exponents differ.
    /// - `UnsupportedDomain` if the converted magnitude overflows.
    pub fn convert_to(&self, target: &Dimensions, rates: &RateTable, offset: usize) -> EvalResult<Self> {
        if !self.dims.compatible(target) {
            return Err(RuntimeError::IncompatibleUnits { left: self.dims.to_string(),
                                                         right: target.to_string(),
                                                         offset });
        }
        if let (Some((Category::Temperature, from)), Some((_, to))) = (self.dims.single(), target.single())
           && from.exponent == 1
           && let (Some(Resolved::Unit(from_def)), Some(Resolved::Unit(to_def))) =
               (units::resolve(&from.unit), units::resolve(&to.unit))
        {
            let value = units::convert_temperature(self.value, from_def, to_def, offset)?;
            return Ok(Self { value,
                             dims: target.clone() });
        }
        let mut value = self.value;
        for (category, term) in self.dims.iter() {
            let Some(goal) = target.0.get(category) else {
                continue;
            };
            let from = units::resolve_or_err(&term.unit, offset)?;
            let to = units::resolve_or_err(&goal.unit, offset)?;
            let ratio = power(units::ratio(from, to, rates, offset)?, term.exponent, offset)?;
            value = checked_mul(value, ratio, offset)?;
        }
        Ok(Self { value,
                  dims: target.clone() })
    }

    /// Dimension vector described by unit terms, for use as a conversion
    /// target.
    ///
    /// # Errors
    /// `TypeError` for an unknown unit spelling.
    pub fn target_dims(terms: &[UnitTerm], rates: &RateTable, offset: usize) -> EvalResult<Dimensions> {
        Ok(Self::from_terms(Decimal::ONE, terms, rates, offset)?.dims)
    }

    /// Adds `other` after converting it into this quantity's units.
    pub fn add(&self, other: &Self, rates: &RateTable, offset: usize) -> EvalResult<Self> {
        let other = other.linear_convert(&self.dims, rates, offset)?;
        self.plus(other.value, offset)
    }

    /// Subtracts `other` after converting it into this quantity's units.
    pub fn sub(&self, other: &Self, rates: &RateTable, offset: usize) -> EvalResult<Self> {
        let other = other.linear_convert(&self.dims, rates, offset)?;
        self.plus(-other.value, offset)
    }

    /// Remainder of dividing by `other`, in this quantity's units.
    pub fn rem(&self, other: &Self, rates: &RateTable, offset: usize) -> EvalResult<Self> {
        let other = other.linear_convert(&self.dims, rates, offset)?;
        if other.value.is_zero() {
            return Err(RuntimeError::DivisionByZero { offset });
        }
        self.value
            .checked_rem(other.value)
            .map(|value| self.with_value(value))
            .ok_or_else(|| RuntimeError::overflow(offset))
    }

    /// Multiplies two quantities, summing exponents per category.
    pub fn mul(&self, other: &Self, rates: &RateTable, offset: usize) -> EvalResult<Value> {
        let mut product = self.scale(other.value, offset)?;
        for (_, term) in other.dims.iter() {
            let resolved = units::resolve_or_err(&term.unit, offset)?;
            product.absorb(resolved, &term.unit, term.exponent, rates, offset)?;
        }
        Ok(product.into_value())
    }

    /// Divides two quantities, subtracting exponents per category.
    ///
    /// # Errors
    /// `DivisionByZero` if `other` has a zero magnitude.
    pub fn div(&self, other: &Self, rates: &RateTable, offset: usize) -> EvalResult<Value> {
        if other.value.is_zero() {
            return Err(RuntimeError::DivisionByZero { offset });
        }
        let value = Decimal::ONE.checked_div(other.value)
                                .ok_or_else(|| RuntimeError::overflow(offset))?;
        let inverse = Self { value,
                             dims: other.dims.negated() };
        self.mul(&inverse, rates, offset)
    }

    /// Raises to an integer power, scaling every exponent.
    pub fn powi(&self, exponent: i32, offset: usize) -> EvalResult<Value> {
        let value = power(self.value, exponent, offset)?;
        let dims = Dimensions(self.dims
                                  .iter()
                                  .map(|(category, term)| {
                                      (*category,
                                       Term { unit:     term.unit.clone(),
                                              exponent: term.exponent * exponent, })
                                  })
                                  .filter(|(_, term)| term.exponent != 0)
                                  .collect());
        Ok(Self { value, dims }.into_value())
    }

    /// Same magnitude, same units, value replaced.
    #[must_use]
    pub fn with_value(&self, value: Decimal) -> Self {
        Self { value,
               dims: self.dims.clone() }
    }

    /// Scales by a factor.
    pub fn scale(&self, factor: Decimal, offset: usize) -> EvalResult<Self> {
        checked_mul(self.value, factor, offset).map(|value| self.with_value(value))
    }

    /// Moves the magnitude by `delta`, keeping the units.
    pub fn plus(&self, delta: Decimal, offset: usize) -> EvalResult<Self> {
        self.value
            .checked_add(delta)
            .map(|value| self.with_value(value))
            .ok_or_else(|| RuntimeError::overflow(offset))
    }

    /// Conversion that treats temperatures as differences, used by
    /// arithmetic.
    fn linear_convert(&self, target: &Dimensions, rates: &RateTable, offset: usize) -> EvalResult<Self> {
        if !self.dims.compatible(target) {
            return Err(RuntimeError::IncompatibleUnits { left: target.to_string(),
                                                         right: self.dims.to_string(),
                                                         offset });
        }
        let mut value = self.value;
        for (category, term) in self.dims.iter() {
            if let Some(goal) = target.0.get(category) {
                let from = units::resolve_or_err(&term.unit, offset)?;
                let to = units::resolve_or_err(&goal.unit, offset)?;
                let ratio = power(units::ratio(from, to, rates, offset)?, term.exponent, offset)?;
                value = checked_mul(value, ratio, offset)?;
            }
        }
        Ok(Self { value,
                  dims: target.clone() })
    }

    /// Magnitude of this quantity in seconds, if it is a pure duration.
    #[must_use]
    pub fn as_seconds(&self) -> Option<Decimal> {
        let (Category::Time, term) = self.dims.single()? else {
            return None;
        };
        if term.exponent != 1 {
            return None;
        }
        let def = units::lookup(&term.unit)?;
        self.value.checked_mul(def.factor())
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", super::core::format_decimal(self.value), self.dims)
    }
}

fn power(base: Decimal, exponent: i32, offset: usize) -> EvalResult<Decimal> {
    if exponent == 1 {
        return Ok(base);
    }
    base.checked_powi(i64::from(exponent))
        .ok_or_else(|| RuntimeError::overflow(offset))
}

fn checked_mul(a: Decimal, b: Decimal, offset: usize) -> EvalResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| RuntimeError::overflow(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantity(value: i64, terms: &[(&str, i32)]) -> Quantity {
        let terms: Vec<UnitTerm> = terms.iter().map(|(u, e)| UnitTerm::new(*u, *e)).collect();
        Quantity::from_terms(Decimal::from(value), &terms, &RateTable::new(), 0).unwrap()
    }

    #[test]
    fn conversion_keeps_target_spelling() {
        let cm = quantity(100, &[("cm", 1)]);
        let target = Quantity::target_dims(&[UnitTerm::new("meters", 1)], &RateTable::new(), 0).unwrap();
        let meters = cm.convert_to(&target, &RateTable::new(), 0).unwrap();
        assert_eq!(meters.value, Decimal::ONE);
        assert_eq!(meters.to_string(), "1 meters");
    }

    #[test]
    fn division_cancels_to_number() {
        let a = quantity(10, &[("km", 1)]);
        let b = quantity(500, &[("m", 1)]);
        assert_eq!(a.div(&b, &RateTable::new(), 0).unwrap(), Value::Number(Decimal::from(20)));
    }

    #[test]
    fn compound_units_display() {
        assert_eq!(quantity(9, &[("m", 1), ("s", -2)]).to_string(), "9 m/s^2");
        assert_eq!(quantity(3, &[("s", -1)]).dims.to_string(), "s^-1");
    }

    #[test]
    fn mismatched_categories_are_rejected() {
        let a = quantity(1, &[("m", 1)]);
        let b = quantity(1, &[("kg", 1)]);
        assert!(matches!(a.add(&b, &RateTable::new(), 4),
                         Err(RuntimeError::IncompatibleUnits { offset: 4, .. })));
    }

    #[test]
    fn overflow_is_an_error() {
        let rates = RateTable::new();
        let huge = quantity(1, &[("km", 1)]).with_value(Decimal::MAX);
        let target = Quantity::target_dims(&[UnitTerm::new("mm", 1)], &rates, 0).unwrap();
        assert!(matches!(huge.convert_to(&target, &rates, 2),
                         Err(RuntimeError::UnsupportedDomain { offset: 2, .. })));
        assert!(huge.add(&huge, &rates, 2).is_err());
        assert!(huge.plus(Decimal::ONE, 2).is_err());
        assert!(huge.scale(Decimal::TEN, 2).is_err());
    }

    #[test]
    fn same_category_terms_merge() {
        let area = quantity(2, &[("km", 1), ("m", 1)]);
        assert_eq!(area.value, Decimal::new(2, 3));
        assert_eq!(area.dims.to_string(), "km^2");
    }
}
