use std::str::FromStr;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tally::{
    Context, Environment, ErrorKind, Value, evaluate,
    interpreter::{timezone, units::RateTable},
};

fn context() -> Context {
    let rates = RateTable::new().with_rate("EUR", Decimal::ONE)
                                .with_rate("USD", Decimal::from_str("1.1").unwrap());
    Context::new().with_now(Utc.with_ymd_and_hms(2024, 3, 10, 15, 45, 0).unwrap())
                  .with_timezone(timezone::parse("UTC").unwrap())
                  .with_rates(rates)
}

fn run(src: &str, context: &Context) -> Value {
    evaluate(src, &mut Environment::new(), context).unwrap_or_else(|e| panic!("'{src}' failed: {e}"))
}

fn assert_eval(src: &str, expected: &str) {
    assert_eq!(run(src, &context()).to_string(), expected, "evaluating '{src}'");
}

fn assert_failure(src: &str, kind: ErrorKind) {
    match evaluate(src, &mut Environment::new(), &context()) {
        Ok(value) => panic!("'{src}' succeeded with {value} but was expected to fail"),
        Err(e) => assert_eq!(e.kind(), kind, "'{src}' failed with {e}"),
    }
}

/// Runs each line against one environment and returns the last result.
fn session(lines: &[&str]) -> Value {
    let mut env = Environment::new();
    let context = context();
    let mut last = Value::Null;
    for line in lines {
        last = evaluate(line, &mut env, &context).unwrap_or_else(|e| panic!("'{line}' failed: {e}"));
    }
    last
}

fn with_history(history: Vec<&str>) -> Context {
    let values = history.into_iter().map(|src| run(src, &context())).collect();
    context().with_history(values)
}

#[test]
fn arithmetic_and_precedence() {
    assert_eval("2 + 3 * 4", "14");
    assert_eval("(2 + 3) * 4", "20");
    assert_eval("2 ^ 3 ^ 2", "512");
    assert_eval("2 ** 10", "1024");
    assert_eval("0.1 + 0.2", "0.3");
    assert_eval("10 / 4", "2.5");
    assert_eval("7 mod 3", "1");
    assert_eval("7 % 3", "1");
    assert_eval("2 ^ -2", "0.25");
    assert_eval("6 & 3", "2");
    assert_eval("1 << 4", "16");
}

#[test]
fn percentages() {
    assert_eval("20% of 150", "30");
    assert_eval("50 + 10%", "55");
    assert_eval("80 - 25%", "60");
    assert_eval("10% + 5%", "0.15");
}

#[test]
fn units_and_conversions() {
    assert_eval("100 cm in meters", "1 meters");
    assert_eval("5 km + 500 m", "5.5 km");
    assert_eval("2 m * 3 m", "6 m^2");
    assert_eval("10 m / 2 s", "5 m/s");
    assert_eval("6 m / 2 m", "3");
    assert_eval("1 km > 999 m", "true");
    assert_eval("10 EUR in USD", "11 USD");
    assert_failure("1 m + 1 kg", ErrorKind::Dimension);
    assert_failure("10 EUR in GBP", ErrorKind::Dimension);
}

#[test]
fn dates_and_times() {
    assert_eval("today + 5 days", "15.03.2024");
    assert_eval("31.01.2024 + 1 month", "29.02.2024");
    assert_eval("today - yesterday", "86400 s");
    assert_eval("01.03.2024 < 02.03.2024", "true");
    assert_eval("year(today)", "2024");
}

#[test]
fn collections() {
    assert_eval("[10, 20, 30][-1]", "30");
    assert_eval("[1, 2, 3].length", "3");
    assert_eval("{a: 1, b: 'x'}.b", "x");
    assert_eval("{a: 1, a: 2}", "{a: 2}");
    assert_eval("{a: 1}.missing", "null");
    assert_eval("[1, 2] + [3]", "[1, 2, 3]");
    assert_failure("[1, 2][5]", ErrorKind::Domain);
}

#[test]
fn strings() {
    assert_eval("'a' + 1", "a1");
    assert_eval("upper('abc')", "ABC");
    assert_eval("len('héllo')", "5");
    assert_eval("`sum: ${1 + 2}`", "sum: 3");
    assert_eval("split('a-b', '-')", r#"["a", "b"]"#);
}

#[test]
fn higher_order_functions() {
    assert_eval("map([1, 2, 3], x => x * x)", "[1, 4, 9]");
    assert_eval("sort([3, 1, 4], (a, b) => a - b)", "[1, 3, 4]");
    assert_eval("sort([3, 1, 4], (a, b) => b - a)", "[4, 3, 1]");
    assert_eval("sort(['b', 'a'])", r#"["a", "b"]"#);
    assert_eval("reduce([1, 2, 3, 4], (acc, x) => acc + x, 0)", "10");
    assert_eval("filter(range(10), x => x % 2 == 0)", "[0, 2, 4, 6, 8]");
    assert_eval("every([2, 4], x => x % 2 == 0)", "true");
    assert_eval("map([4, 9], sqrt)", "[2, 3]");
    assert_failure("sort([1, 2], x => x)", ErrorKind::Type);
    assert_failure("groupBy([1], x => [x])", ErrorKind::Type);
}

#[test]
fn logic_and_types() {
    assert_eval("5 > 3 ? 'yes' : 'no'", "yes");
    assert_eval("0 or 'fallback'", "true");
    assert_eval("not 0", "true");
    assert_eval("5 is number", "true");
    assert_eval("('42' as number) + 1", "43");
    assert_eval("type([])", "array");
}

#[test]
fn mathematical_functions() {
    assert_eval("max(3, 9, 2)", "9");
    assert_eval("min([4, 2, 8])", "2");
    assert_eval("round(2.5)", "3");
    assert_eval("round(3.14159, 2)", "3.14");
    assert_eval("factorial(5)", "120");
    assert_eval("sum(1, 2, 3)", "6");
    assert_eval("average([1, 2])", "1.5");
    assert_eval("log(100)", "2");
}

#[test]
fn errors_are_classified() {
    assert_failure("2 +", ErrorKind::Syntax);
    assert_failure("1 / 0", ErrorKind::Domain);
    assert_failure("unknown + 1", ErrorKind::Lookup);
    assert_failure("nope(1)", ErrorKind::Lookup);
    assert_failure("sqrt()", ErrorKind::Arity);
    assert_failure("'a' - 1", ErrorKind::Type);
    assert_failure("date(2023, 2, 29)", ErrorKind::Type);
}

#[test]
fn variables_and_functions() {
    assert_eq!(session(&["x = 5", "x += 2", "x * 2"]).to_string(), "14");
    assert_eq!(session(&["f(n) = n <= 1 ? 1 : n * f(n - 1)", "f(5)"]).to_string(), "120");
    assert_eq!(session(&["e => e * 2", "double = e => e * 2", "double(4)"]).to_string(), "8");
}

#[test]
fn closures_see_later_bindings() {
    let result = session(&["y = 1", "g = x => x + y", "y = 10", "g(1)"]);
    assert_eq!(result.to_string(), "11");
}

#[test]
fn environment_stores_copies() {
    let result = session(&["a = [1]", "b = a", "push(b, 2)", "a"]);
    assert_eq!(result.to_string(), "[1]");
}

#[test]
fn failed_assignment_keeps_old_binding() {
    let mut env = Environment::new();
    let context = context();
    evaluate("x = 1", &mut env, &context).unwrap();
    assert!(evaluate("x = 1 / 0", &mut env, &context).is_err());
    assert_eq!(evaluate("x", &mut env, &context).unwrap(), Value::from(1));
}

#[test]
fn deep_recursion_runs_on_a_default_stack() {
    let result = session(&["f(n) = n == 0 ? 0 : n + f(n - 1)", "f(1000)"]);
    assert_eq!(result.to_string(), "500500");
    assert_eval(&format!("{}1{}", "(".repeat(2000), ")".repeat(2000)), "1");
}

#[test]
fn runaway_recursion_is_fatal() {
    let mut env = Environment::new();
    let context = context();
    evaluate("spin(n) = spin(n + 1)", &mut env, &context).unwrap();
    let error = evaluate("spin(0)", &mut env, &context).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Domain);
}

#[test]
fn overflow_is_an_error() {
    let max = "79228162514264337593543950335";
    assert_failure(&format!("{max} * 10"), ErrorKind::Domain);
    assert_failure(&format!("{max} m * 10"), ErrorKind::Domain);
    assert_failure(&format!("{max} + 1 m"), ErrorKind::Domain);
    assert_failure(&format!("{max} m + {max} m"), ErrorKind::Domain);
    assert_failure(&format!("{max} km to mm"), ErrorKind::Domain);
    assert_failure(&format!("{max} celsius to fahrenheit"), ErrorKind::Domain);

    let huge = format!("{max} m");
    let history = with_history(vec![huge.as_str(), "1 m"]);
    let error = evaluate("total", &mut Environment::new(), &history).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Domain);
}

#[test]
fn aggregates_read_history() {
    let lengths = with_history(vec!["10 m", "500 cm", "100 mm"]);
    assert_eq!(run("total", &lengths).to_string(), "15.1 m");
    assert_eq!(run("total in cm", &lengths).to_string(), "1510 cm");

    let numbers = with_history(vec!["2", "'skipped'", "3"]);
    assert_eq!(run("total", &numbers), Value::from(5));
    assert_eq!(run("average", &numbers).to_string(), "2.5");

    let err = evaluate("total", &mut Environment::new(), &context()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Domain);
}

#[test]
fn smart_total_shifts_a_single_date() {
    let history = with_history(vec!["31.01.2024", "1 month", "2 days"]);
    assert_eq!(run("total", &history).to_string(), "02.03.2024");
}

#[test]
fn external_argument_and_host_environment() {
    let context = context().with_argument(Some("  "), Some(r#"{"n": 2}"#))
                           .with_env_lookup(|name| (name == "USER").then(|| "ada".to_string()));
    assert_eq!(run("arg().n * 3", &context).to_string(), "6");
    assert_eq!(run("env('USER')", &context).to_string(), "ada");
    assert_eq!(run("env('MISSING')", &context), Value::Null);
}
