use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::interpreter::{timezone::Zone, units::RateTable, value::core::Value};

type EnvLookup = Rc<dyn Fn(&str) -> Option<String>>;

/// Everything a host supplies to one evaluation besides the source text and
/// the variable environment.
///
/// There are no globals: the rate table, the clock, the default zone and the
/// host environment lookup all live here.
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use tally::{Context, Environment, Value, evaluate, interpreter::units::RateTable};
///
/// let context = Context::new().with_history(vec![Value::from(2), Value::from(3)])
///                             .with_rates(RateTable::new().with_rate("EUR", Decimal::ONE));
///
/// let total = evaluate("total", &mut Environment::new(), &context).unwrap();
/// assert_eq!(total, Value::from(5));
/// ```
#[derive(Clone)]
pub struct Context {
    /// Prior results of the session, oldest first, read by `total` and
    /// `average`.
    pub history:  Vec<Value>,
    /// Raw external argument returned by `arg()`.
    pub argument: Option<String>,
    /// Currency exchange rates.
    pub rates:    RateTable,
    /// Fixed evaluation instant. `None` reads the system clock.
    pub now:      Option<DateTime<Utc>>,
    /// Zone used for literals without a timezone.
    pub timezone: Zone,
    env_lookup:   EnvLookup,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
         .field("history", &self.history)
         .field("argument", &self.argument)
         .field("rates", &self.rates)
         .field("now", &self.now)
         .field("timezone", &self.timezone)
         .finish_non_exhaustive()
    }
}

impl Context {
    /// A context with empty history, no argument, no rates, the system clock,
    /// the local timezone and the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self { history:    Vec::new(),
               argument:   None,
               rates:      RateTable::new(),
               now:        None,
               timezone:   Zone::Local,
               env_lookup: Rc::new(|name| std::env::var(name).ok()), }
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<Value>) -> Self {
        self.history = history;
        self
    }

    /// Sets the external argument from a piped payload and an explicit flag
    /// value. The first one that is non-empty after trimming wins.
    #[must_use]
    pub fn with_argument(mut self, payload: Option<&str>, flag: Option<&str>) -> Self {
        self.argument = [payload, flag].into_iter()
                                       .flatten()
                                       .map(str::trim)
                                       .find(|s| !s.is_empty())
                                       .map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_rates(mut self, rates: RateTable) -> Self {
        self.rates = rates;
        self
    }

    /// Pins `now`, `today` and time literals to a fixed instant.
    #[must_use]
    pub const fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    #[must_use]
    pub const fn with_timezone(mut self, zone: Zone) -> Self {
        self.timezone = zone;
        self
    }

    /// Replaces the lookup behind `env(name)`.
    #[must_use]
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.env_lookup = Rc::new(lookup);
        self
    }

    /// Resolves a host environment variable.
    #[must_use]
    pub fn env(&self, name: &str) -> Option<String> {
        (self.env_lookup)(name)
    }

    /// The evaluation instant.
    #[must_use]
    pub fn clock(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_prefers_non_empty_payload() {
        let context = Context::new().with_argument(Some("  \n"), Some(" 42 "));
        assert_eq!(context.argument.as_deref(), Some("42"));
        let context = Context::new().with_argument(Some("[1]"), Some("2"));
        assert_eq!(context.argument.as_deref(), Some("[1]"));
    }

    #[test]
    fn env_lookup_is_replaceable() {
        let context = Context::new().with_env_lookup(|name| (name == "HOME").then(|| "/h".into()));
        assert_eq!(context.env("HOME").as_deref(), Some("/h"));
        assert_eq!(context.env("PATH"), None);
    }
}
