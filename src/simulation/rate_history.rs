//! Synthetic FX rate histories.
//!
//! Generates geometric random-walk rate sheets for exercising the VaR
//! pipeline when no historical data is at hand.

use crate::core::currency::CurrencyCode;
use crate::risk::error::VarError;
use crate::risk::rate_table::{FxRateTable, RateRow};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Configuration for generating a random rate history.
#[derive(Debug, Clone)]
pub struct RateHistoryConfig {
    /// Currencies to generate, one column each.
    pub currencies: Vec<CurrencyCode>,
    /// Number of business days (rows).
    pub days: usize,
    /// First date; rolled forward to a weekday if needed.
    pub start_date: NaiveDate,
    /// Rate on the first day for every currency.
    pub initial_rate: f64,
    /// Standard deviation of daily log-returns.
    pub daily_volatility: f64,
    /// Fixed seed for reproducible output; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for RateHistoryConfig {
    fn default() -> Self {
        Self {
            currencies: vec![CurrencyCode::new("CCY1"), CurrencyCode::new("CCY2")],
            days: 260,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default(),
            initial_rate: 1.0,
            daily_volatility: 0.006,
            seed: None,
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn next_business_day(mut date: NaiveDate) -> NaiveDate {
    while is_weekend(date) {
        date += Duration::days(1);
    }
    date
}

/// Generate a random rate history.
///
/// # Errors
///
/// [`VarError::InvalidConfig`] for fewer than 2 days, no currencies, or a
/// non-positive initial rate or negative volatility.
pub fn generate_rate_history(config: &RateHistoryConfig) -> Result<FxRateTable, VarError> {
    if config.days < 2 {
        return Err(VarError::InvalidConfig {
            message: format!("at least 2 days are needed, got {}", config.days),
        });
    }
    if !config.initial_rate.is_finite() || config.initial_rate <= 0.0 {
        return Err(VarError::InvalidConfig {
            message: format!("initial rate must be positive, got {}", config.initial_rate),
        });
    }
    let normal = Normal::new(0.0, config.daily_volatility).map_err(|e| VarError::InvalidConfig {
        message: format!("invalid daily volatility {}: {e}", config.daily_volatility),
    })?;
    if config.currencies.is_empty() {
        return Err(VarError::InvalidConfig {
            message: "no currencies to generate".to_string(),
        });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut rates = vec![config.initial_rate; config.currencies.len()];
    let mut date = next_business_day(config.start_date);
    let mut rows = Vec::with_capacity(config.days);

    for i in 0..config.days {
        if i > 0 {
            date = next_business_day(date + Duration::days(1));
            for rate in rates.iter_mut() {
                *rate *= normal.sample(&mut rng).exp();
            }
        }
        rows.push(RateRow::new(date, rates.clone()));
    }

    FxRateTable::new(config.currencies.clone(), rows)
}
