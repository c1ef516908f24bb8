use std::io::{IsTerminal, Read};

use clap::Parser;
use rust_decimal::Decimal;
use tally::{
    Context, Environment, evaluate,
    interpreter::{timezone, units::RateTable},
};

/// tally evaluates a single calculator expression: numbers with units,
/// currencies, dates and timezones, lists and functions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// External argument returned by `arg()`. Piped standard input takes
    /// precedence when it is not blank.
    #[arg(short, long)]
    arg: Option<String>,

    /// Exchange rate relative to the base currency, as `CODE=RATE`.
    /// May be repeated.
    #[arg(short, long, value_parser = parse_rate)]
    rate: Vec<(String, Decimal)>,

    /// Timezone for literals without one. Defaults to the system zone.
    #[arg(short, long)]
    timezone: Option<String>,

    expression: String,
}

fn parse_rate(text: &str) -> Result<(String, Decimal), String> {
    let (code, rate) = text.split_once('=')
                           .ok_or_else(|| format!("expected CODE=RATE, found '{text}'"))?;
    let rate = rate.trim()
                   .parse::<Decimal>()
                   .map_err(|e| format!("invalid rate '{rate}': {e}"))?;
    Ok((code.trim().to_uppercase(), rate))
}

fn main() {
    let args = Args::parse();

    let mut payload = String::new();
    let stdin = std::io::stdin();
    if !stdin.is_terminal()
       && let Err(e) = stdin.lock().read_to_string(&mut payload)
    {
        eprintln!("Failed to read standard input: {e}");
        std::process::exit(1);
    }

    let rates = args.rate
                    .iter()
                    .fold(RateTable::new(), |table, (code, rate)| table.with_rate(code, *rate));
    let mut context = Context::new().with_argument(Some(&payload), args.arg.as_deref())
                                    .with_rates(rates);
    if let Some(name) = &args.timezone {
        let Some(zone) = timezone::parse(name) else {
            eprintln!("Unknown timezone '{name}'.");
            std::process::exit(1);
        };
        context = context.with_timezone(zone);
    }

    match evaluate(&args.expression, &mut Environment::new(), &context) {
        Ok(value) => println!("{value}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    }
}
