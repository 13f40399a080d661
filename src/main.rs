//! pricing-risk-engine CLI
//!
//! Price European options and compute historical FX VaR from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Price an option with both methods
//! pricing-risk-engine price --spot 100 --strike 100 --rate-pct 5 --vol 0.2 \
//!     --trade-date 2024-01-01 --expiry-date 2025-01-01
//!
//! # 1-day 99% VaR of a two-currency portfolio, exporting the working sheet
//! pricing-risk-engine var --rates rates.csv --spot CCY1=153084.81 --spot CCY2=95891.51 \
//!     --export VaR.csv
//!
//! # Generate a synthetic rate sheet
//! pricing-risk-engine generate --days 260 --seed 42 --output rates.csv
//! ```

use pricing_risk_engine::core::currency::{CurrencyCode, PortfolioSpots};
use pricing_risk_engine::core::dates::{parse_date, DayCount};
use pricing_risk_engine::pricing::{price, OptionInputs, OptionResult, PricingMode};
use pricing_risk_engine::risk::{PercentileMethod, RateTableSchema, VarCalculator, VarConfig};
use pricing_risk_engine::simulation::rate_history::{generate_rate_history, RateHistoryConfig};
use chrono::NaiveDate;
use log::debug;
use std::fs;
use std::io;
use std::process;

fn print_usage() {
    eprintln!(
        r#"pricing-risk-engine — Black-Scholes pricing and historical FX VaR

USAGE:
    pricing-risk-engine <COMMAND> [OPTIONS]

COMMANDS:
    price       Price a European call and put with Black-Scholes
    var         Compute 1-day historical VaR for an FX portfolio
    generate    Generate a synthetic historical rate sheet (for testing)
    help        Show this message

OPTIONS (price):
    --spot <S>              Spot price of the underlying
    --strike <K>            Strike price
    --rate <R>              Risk-free rate as a decimal (0.05 = 5%)
    --rate-pct <R>          Risk-free rate as a percentage (5 = 5%)
    --vol <V>               Volatility as a decimal (0.2 = 20%)
    --trade-date <DATE>     Trade date, YYYY-MM-DD or DD/MM/YYYY (default: today)
    --expiry-date <DATE>    Expiration date
    --years <T>             Time to expiry in years (instead of dates)
    --mode <MODE>           spot, forward or both (default: both)
    --day-count <DC>        act365 (default) or act360
    --format <FORMAT>       Output format: text (default) or json

OPTIONS (var):
    --rates <FILE>          CSV sheet: date column plus one column per currency
    --spots <FILE>          JSON spots file: {{"spots": {{"CCY1": 153084.81}}}}
    --spot <CCY=VALUE>      Spot exposure for one currency (repeatable)
    --date-column <NAME>    Date column name (requires --currencies)
    --currencies <LIST>     Comma-separated currency columns to track
    --confidence <C>        Confidence level (default: 0.99)
    --percentile <METHOD>   nearest (default), inclusive or exclusive
    --export <FILE>         Write the working sheet (rates, shifts, P&L) as CSV
    --format <FORMAT>       Output format: text (default) or json

OPTIONS (generate):
    --currencies <LIST>     Comma-separated currency codes (default: CCY1,CCY2)
    --days <N>              Number of business days (default: 260)
    --start-date <DATE>     First date (default: 2023-01-02)
    --initial-rate <R>      Starting rate for every currency (default: 1.0)
    --volatility <V>        Daily log-return volatility (default: 0.006)
    --seed <N>              Random seed for reproducible output
    --output <FILE>         Write to file instead of stdout

EXAMPLES:
    pricing-risk-engine price --spot 100 --strike 100 --rate 0.05 --vol 0.2 --years 1
    pricing-risk-engine price --spot 42 --strike 40 --rate-pct 10 --vol 0.2 --expiry-date 2025-06-30 --mode spot
    pricing-risk-engine var --rates rates.csv --spots spots.json --export VaR.csv
    pricing-risk-engine var --rates rates.csv --spot CCY1=153084.81 --spot CCY2=95891.51 --percentile exclusive
    pricing-risk-engine generate --currencies USD,BRL --days 500 --seed 7 --output rates.csv"#
    );
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Value following the flag at `args[*i]`; advances `i`.
fn flag_value(args: &[String], i: &mut usize) -> String {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .cloned()
        .unwrap_or_else(|| fail(format!("{} requires a value", flag)))
}

fn parse_number(flag: &str, text: &str) -> f64 {
    text.parse()
        .unwrap_or_else(|_| fail(format!("{} expects a number, got '{}'", flag, text)))
}

fn parse_date_arg(flag: &str, text: &str) -> NaiveDate {
    parse_date(text).unwrap_or_else(|| {
        fail(format!(
            "{} expects YYYY-MM-DD or DD/MM/YYYY, got '{}'",
            flag, text
        ))
    })
}

fn parse_currencies(text: &str) -> Vec<CurrencyCode> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(CurrencyCode::new)
        .collect()
}

fn parse_format(text: String) -> String {
    if text != "text" && text != "json" {
        fail(format!("--format expects 'text' or 'json', got '{}'", text));
    }
    text
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| fail(format!("cannot serialize output: {}", e)));
    println!("{}", json);
}

fn cmd_price(args: &[String]) {
    let mut spot = None;
    let mut strike = None;
    let mut rate = None;
    let mut vol = None;
    let mut trade_date = None;
    let mut expiry_date = None;
    let mut years = None;
    let mut modes = vec![PricingMode::Spot, PricingMode::Forward];
    let mut day_count = DayCount::default();
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].clone();
        match flag.as_str() {
            "--spot" => spot = Some(parse_number(&flag, &flag_value(args, &mut i))),
            "--strike" => strike = Some(parse_number(&flag, &flag_value(args, &mut i))),
            "--rate" => rate = Some(parse_number(&flag, &flag_value(args, &mut i))),
            "--rate-pct" => rate = Some(parse_number(&flag, &flag_value(args, &mut i)) / 100.0),
            "--vol" => vol = Some(parse_number(&flag, &flag_value(args, &mut i))),
            "--trade-date" => trade_date = Some(parse_date_arg(&flag, &flag_value(args, &mut i))),
            "--expiry-date" => {
                expiry_date = Some(parse_date_arg(&flag, &flag_value(args, &mut i)))
            }
            "--years" => years = Some(parse_number(&flag, &flag_value(args, &mut i))),
            "--mode" => {
                let value = flag_value(args, &mut i);
                modes = if value == "both" {
                    vec![PricingMode::Spot, PricingMode::Forward]
                } else {
                    vec![value.parse().unwrap_or_else(|e: String| fail(e))]
                };
            }
            "--day-count" => {
                day_count = flag_value(args, &mut i)
                    .parse()
                    .unwrap_or_else(|e: String| fail(e));
            }
            "--format" => format = parse_format(flag_value(args, &mut i)),
            _ => fail(format!("Unknown option: {}", flag)),
        }
        i += 1;
    }

    let spot = spot.unwrap_or_else(|| fail("--spot <S> is required"));
    let strike = strike.unwrap_or_else(|| fail("--strike <K> is required"));
    let rate = rate.unwrap_or_else(|| fail("--rate <R> or --rate-pct <R> is required"));
    let vol = vol.unwrap_or_else(|| fail("--vol <V> is required"));

    let results: Vec<OptionResult> = match (years, expiry_date) {
        (Some(_), Some(_)) => fail("use either --years or --expiry-date, not both"),
        (Some(t), None) => modes
            .iter()
            .map(|&mode| price(spot, strike, rate, vol, t, mode).unwrap_or_else(|e| fail(e)))
            .collect(),
        (None, Some(expiry)) => {
            let trade = trade_date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let inputs = OptionInputs::new(spot, strike, rate, vol, trade, expiry)
                .unwrap_or_else(|e| fail(e))
                .with_day_count(day_count);
            debug!(
                "time to expiry {} ({} → {}, {})",
                inputs.time_to_expiry(),
                trade,
                expiry,
                day_count
            );
            modes
                .iter()
                .map(|&mode| inputs.price(mode).unwrap_or_else(|e| fail(e)))
                .collect()
        }
        (None, None) => fail("--expiry-date <DATE> or --years <T> is required"),
    };

    if format == "json" {
        print_json(&results);
    } else {
        for result in &results {
            println!("{}", result);
        }
    }
}

fn cmd_var(args: &[String]) {
    let mut rates_path = None;
    let mut spots = PortfolioSpots::new();
    let mut date_column = None;
    let mut currencies = None;
    let mut config = VarConfig::default();
    let mut export_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].clone();
        match flag.as_str() {
            "--rates" => rates_path = Some(flag_value(args, &mut i)),
            "--spots" => {
                let path = flag_value(args, &mut i);
                let loaded = PortfolioSpots::from_json_file(&path).unwrap_or_else(|e| fail(e));
                for (currency, value) in loaded.iter() {
                    spots
                        .insert(currency.clone(), value)
                        .unwrap_or_else(|e| fail(e));
                }
            }
            "--spot" => {
                let assignment = flag_value(args, &mut i);
                spots
                    .insert_assignment(&assignment)
                    .unwrap_or_else(|e| fail(e));
            }
            "--date-column" => date_column = Some(flag_value(args, &mut i)),
            "--currencies" => currencies = Some(parse_currencies(&flag_value(args, &mut i))),
            "--confidence" => config.confidence = parse_number(&flag, &flag_value(args, &mut i)),
            "--percentile" => {
                config.percentile = flag_value(args, &mut i)
                    .parse::<PercentileMethod>()
                    .unwrap_or_else(|e| fail(e));
            }
            "--export" => export_path = Some(flag_value(args, &mut i)),
            "--format" => format = parse_format(flag_value(args, &mut i)),
            _ => fail(format!("Unknown option: {}", flag)),
        }
        i += 1;
    }

    let path = rates_path.unwrap_or_else(|| fail("--rates <FILE> is required"));
    let schema = match (date_column, currencies) {
        (Some(date_column), Some(currencies)) => Some(RateTableSchema::new(date_column, currencies)),
        (None, Some(currencies)) => Some(RateTableSchema::new("date", currencies)),
        (Some(_), None) => fail("--date-column requires --currencies"),
        (None, None) => None,
    };

    let calculator = VarCalculator::from_csv_path(&path, schema.as_ref(), spots, config)
        .unwrap_or_else(|e| fail(e));
    let result = calculator.compute_one_day_var();

    if let Some(export) = export_path {
        calculator
            .export_working_table(&export)
            .unwrap_or_else(|e| fail(e));
        eprintln!(
            "Exported {} rows to {}",
            calculator.table().len(),
            export
        );
    }

    if format == "json" {
        print_json(&result);
    } else {
        println!(
            "{}-day VaR at {:.1}% confidence: {}",
            result.horizon_days,
            result.confidence * 100.0,
            result.var_amount()
        );
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = RateHistoryConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].clone();
        match flag.as_str() {
            "--currencies" => config.currencies = parse_currencies(&flag_value(args, &mut i)),
            "--days" => {
                config.days = flag_value(args, &mut i)
                    .parse()
                    .unwrap_or_else(|_| fail("--days requires a number"));
            }
            "--seed" => {
                config.seed = Some(
                    flag_value(args, &mut i)
                        .parse()
                        .unwrap_or_else(|_| fail("--seed requires a number")),
                );
            }
            "--start-date" => config.start_date = parse_date_arg(&flag, &flag_value(args, &mut i)),
            "--initial-rate" => {
                config.initial_rate = parse_number(&flag, &flag_value(args, &mut i))
            }
            "--volatility" => {
                config.daily_volatility = parse_number(&flag, &flag_value(args, &mut i))
            }
            "--output" => output_path = Some(flag_value(args, &mut i)),
            _ => fail(format!("Unknown option: {}", flag)),
        }
        i += 1;
    }

    let table = generate_rate_history(&config).unwrap_or_else(|e| fail(e));

    if let Some(path) = output_path {
        let file = fs::File::create(&path)
            .unwrap_or_else(|e| fail(format!("cannot write to '{}': {}", path, e)));
        table
            .write_csv(io::BufWriter::new(file))
            .unwrap_or_else(|e| fail(e));
        eprintln!(
            "Generated {} days across {} currencies → {}",
            table.len(),
            table.currencies().len(),
            path
        );
    } else {
        table.write_csv(io::stdout()).unwrap_or_else(|e| fail(e));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "price" => cmd_price(rest),
        "var" => cmd_var(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
