use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally::{
    Context, Environment, Value,
    ast::UnitTerm,
    evaluate,
    interpreter::{timezone, units::RateTable, value::quantity::Quantity},
};

const MAX_EXPR_DEPTH: u32 = 4;

/// Units grouped by category; any two units in a group convert into each
/// other.
const CATEGORIES: &[&[&str]] = &[&["mm", "cm", "m", "km", "inch", "ft", "mi"],
                                 &["g", "kg", "lb", "oz", "st"],
                                 &["s", "min", "h", "d", "wk"],
                                 &["B", "kB", "MiB", "bit"],
                                 &["ml", "l", "gal", "cup"],
                                 &["celsius", "fahrenheit", "K"]];

fn context() -> Context {
    Context::new().with_now(Utc.with_ymd_and_hms(2024, 3, 10, 15, 45, 0).unwrap())
                  .with_timezone(timezone::parse("UTC").unwrap())
}

fn decimal() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000, 0u32..=4).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn unit_pair() -> impl Strategy<Value = (&'static str, &'static str)> {
    prop::sample::select(CATEGORIES).prop_flat_map(|group| {
                                        (prop::sample::select(group), prop::sample::select(group))
                                    })
}

fn convert(value: Decimal, from: &str, to: &str) -> Decimal {
    let rates = RateTable::new();
    let quantity = Quantity::from_terms(value, &[UnitTerm::new(from, 1)], &rates, 0).unwrap();
    let target = Quantity::target_dims(&[UnitTerm::new(to, 1)], &rates, 0).unwrap();
    quantity.convert_to(&target, &rates, 0).unwrap().value
}

/// Side-effect free arithmetic over small integers and built-ins.
fn pure_expression() -> impl Strategy<Value = String> {
    let leaf = (1i64..100).prop_map(|n| n.to_string());
    leaf.prop_recursive(MAX_EXPR_DEPTH, 32, 2, |inner| {
            prop_oneof![
                (inner.clone(), prop::sample::select(&["+", "-", "*", "/", "%", "^"][..]), inner.clone())
                    .prop_map(|(l, op, r)| format!("({l} {op} {r})")),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("max({a}, {b})")),
                inner.clone().prop_map(|a| format!("round({a}, 2)")),
                (inner.clone(), inner).prop_map(|(a, b)| format!("map([{a}, {b}], x => x * 2)")),
            ]
        })
}

proptest! {
    #[test]
    fn conversions_round_trip(value in decimal(), (from, to) in unit_pair()) {
        let back = convert(convert(value, from, to), to, from);
        let tolerance = Decimal::new(1, 12) * value.abs().max(Decimal::ONE);
        prop_assert!((back - value).abs() <= tolerance, "{value} {from} -> {to} -> {back}");
    }

    #[test]
    fn adding_across_categories_is_fatal((a, b) in (prop::sample::select(CATEGORIES), prop::sample::select(CATEGORIES))
                                                       .prop_flat_map(|(x, y)| (prop::sample::select(x), prop::sample::select(y)))) {
        let same = CATEGORIES.iter().any(|group| group.contains(&a) && group.contains(&b));
        let result = evaluate(&format!("1 {a} + 1 {b}"), &mut Environment::new(), &context());
        prop_assert_eq!(result.is_ok(), same, "1 {} + 1 {}", a, b);
    }

    #[test]
    fn pure_expressions_are_idempotent(source in pure_expression()) {
        let mut env = Environment::new();
        let context = context();
        let first = evaluate(&source, &mut env, &context).map(|v| v.to_string()).map_err(|e| e.kind());
        let second = evaluate(&source, &mut env, &context).map(|v| v.to_string()).map_err(|e| e.kind());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn average_is_total_over_count(numbers in prop::collection::vec(-10_000i64..10_000, 1..20)) {
        let history: Vec<Value> = numbers.iter().map(|n| Value::from(*n)).collect();
        let count = Decimal::from(history.len());
        let context = context().with_history(history);
        let total = evaluate("total", &mut Environment::new(), &context).unwrap();
        let average = evaluate("average", &mut Environment::new(), &context).unwrap();
        let (Value::Number(total), Value::Number(average)) = (total, average) else {
            panic!("aggregates of numbers must be numbers");
        };
        prop_assert_eq!(average, total / count);
    }
}
