use crate::core::currency::PortfolioSpots;
use crate::risk::error::VarError;
use crate::risk::percentile::{percentile_sorted, PercentileMethod};
use crate::risk::rate_table::{FxRateTable, RateTableSchema};
use crate::risk::working_table::{WorkingRow, WorkingTable};
use log::{debug, info, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Holding period of every scenario, in days.
pub const HORIZON_DAYS: u32 = 1;

/// Settings for a historical VaR run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarConfig {
    /// Confidence level, e.g. 0.99 for a 1st-percentile loss.
    pub confidence: f64,
    pub percentile: PercentileMethod,
}

impl Default for VarConfig {
    fn default() -> Self {
        Self {
            confidence: 0.99,
            percentile: PercentileMethod::NearestRank,
        }
    }
}

impl VarConfig {
    pub fn validate(&self) -> Result<(), VarError> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(VarError::InvalidConfig {
                message: format!("confidence must be in (0, 1), got {}", self.confidence),
            });
        }
        Ok(())
    }

    /// Probability mass in the loss tail (`1 - confidence`).
    pub fn tail_probability(&self) -> f64 {
        1.0 - self.confidence
    }
}

/// Outcome of a historical VaR run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarResult {
    pub confidence: f64,
    pub horizon_days: u32,
    pub method: PercentileMethod,
    /// Number of total-P&L scenarios.
    pub observations: usize,
    /// Signed total P&L at the tail percentile (negative means a loss).
    pub percentile_pnl: f64,
    /// Loss magnitude, `max(0, -percentile_pnl)`.
    pub var: f64,
}

impl VarResult {
    /// VaR rounded to cents for reporting.
    pub fn var_amount(&self) -> Decimal {
        Decimal::from_f64_retain(self.var)
            .unwrap_or(Decimal::ZERO)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl std::fmt::Display for VarResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Historical VaR ===")?;
        writeln!(f, "Confidence:      {:.1}%", self.confidence * 100.0)?;
        writeln!(f, "Horizon:         {} day(s)", self.horizon_days)?;
        writeln!(f, "Percentile:      {}", self.method)?;
        writeln!(f, "Scenarios:       {}", self.observations)?;
        writeln!(f, "Percentile P&L:  {:.2}", self.percentile_pnl)?;
        writeln!(f, "VaR:             {}", self.var_amount())
    }
}

/// Historical-simulation VaR for a multi-currency spot portfolio.
///
/// Every day-over-day move in the rate history is replayed against the
/// current exposures:
///
/// ```text
/// shift[i][c] = rate[i+1][c] / rate[i][c]
/// pnl[i][c]   = spot[c] * shift[i][c] - spot[c]
/// total[i]    = sum over c of pnl[i][c]
/// ```
///
/// The VaR is the loss at the `1 - confidence` percentile of `total`.
/// Construction validates the inputs and builds every intermediate
/// vector, so the queries afterwards cannot fail.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use pricing_risk_engine::core::currency::PortfolioSpots;
/// use pricing_risk_engine::risk::{FxRateTable, RateRow, VarCalculator, VarConfig};
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let table = FxRateTable::new(
///     vec!["USD".into()],
///     vec![
///         RateRow::new(d(1), vec![1.00]),
///         RateRow::new(d(2), vec![1.01]),
///         RateRow::new(d(3), vec![0.98]),
///         RateRow::new(d(4), vec![1.03]),
///     ],
/// )
/// .unwrap();
/// let spots = PortfolioSpots::from_pairs([("USD", 100.0)]).unwrap();
///
/// let calc = VarCalculator::new(table, spots, VarConfig::default()).unwrap();
/// let result = calc.compute_one_day_var();
/// assert_eq!(result.observations, 3);
/// assert!((result.var - 2.970297029702970).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct VarCalculator {
    table: FxRateTable,
    spots: PortfolioSpots,
    config: VarConfig,
    /// Spot exposure per table currency, in table order.
    exposures: Vec<f64>,
    shifts: Vec<Vec<f64>>,
    pnl: Vec<Vec<f64>>,
    total_pnl: Vec<f64>,
}

impl VarCalculator {
    /// Validate the inputs and build shift and P&L vectors.
    ///
    /// # Errors
    ///
    /// - [`VarError::InvalidConfig`] if the confidence is outside `(0, 1)`.
    /// - [`VarError::MissingSpot`] if a tracked currency has no spot.
    /// - [`VarError::InvalidSpot`] if a tracked spot is not positive and finite.
    pub fn new(
        table: FxRateTable,
        spots: PortfolioSpots,
        config: VarConfig,
    ) -> Result<Self, VarError> {
        config.validate()?;

        let mut exposures = Vec::with_capacity(table.currencies().len());
        for currency in table.currencies() {
            let value = spots.get(currency).ok_or_else(|| VarError::MissingSpot {
                currency: currency.clone(),
            })?;
            if !value.is_finite() || value <= 0.0 {
                return Err(VarError::InvalidSpot {
                    currency: currency.clone(),
                    value,
                });
            }
            exposures.push(value);
        }
        for (currency, _) in spots.iter() {
            if table.currency_index(currency).is_none() {
                warn!("ignoring spot for {currency}: not tracked by the rate table");
            }
        }

        let shifts = one_day_shifts(&table);
        let pnl: Vec<Vec<f64>> = shifts
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&exposures)
                    .map(|(shift, spot)| spot * shift - spot)
                    .collect()
            })
            .collect();
        let total_pnl: Vec<f64> = pnl.iter().map(|row| row.iter().sum()).collect();
        debug!(
            "built {} scenarios across {} currencies",
            total_pnl.len(),
            exposures.len()
        );

        Ok(Self {
            table,
            spots,
            config,
            exposures,
            shifts,
            pnl,
            total_pnl,
        })
    }

    /// Load the rate sheet at `path`, then build the calculator.
    pub fn from_csv_path(
        path: impl AsRef<Path>,
        schema: Option<&RateTableSchema>,
        spots: PortfolioSpots,
        config: VarConfig,
    ) -> Result<Self, VarError> {
        let table = FxRateTable::from_csv_path(path, schema)?;
        Self::new(table, spots, config)
    }

    /// 1-day VaR at the configured confidence.
    pub fn compute_one_day_var(&self) -> VarResult {
        let mut sorted = self.total_pnl.clone();
        sorted.sort_by(f64::total_cmp);
        let percentile_pnl = percentile_sorted(
            &sorted,
            self.config.tail_probability(),
            self.config.percentile,
        );
        let result = VarResult {
            confidence: self.config.confidence,
            horizon_days: HORIZON_DAYS,
            method: self.config.percentile,
            observations: sorted.len(),
            percentile_pnl,
            var: (-percentile_pnl).max(0.0),
        };
        info!(
            "{}-day VaR at {:.1}%: {:.2} over {} scenarios",
            HORIZON_DAYS,
            result.confidence * 100.0,
            result.var,
            result.observations
        );
        result
    }

    /// Dated projection of rates, shifts and P&L.
    pub fn working_table(&self) -> WorkingTable {
        let rows = self
            .table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                // Scenario i is the move into row i + 1.
                let scenario = i.checked_sub(1);
                WorkingRow {
                    date: row.date,
                    rates: row.rates.clone(),
                    shifts: scenario.map(|s| self.shifts[s].clone()),
                    pnl: scenario.map(|s| self.pnl[s].clone()),
                    total_pnl: scenario.map(|s| self.total_pnl[s]),
                }
            })
            .collect();
        WorkingTable {
            currencies: self.table.currencies().to_vec(),
            rows,
        }
    }

    /// Write the working table as CSV to `writer`.
    pub fn write_working_table<W: io::Write>(&self, writer: W) -> Result<(), VarError> {
        self.working_table()
            .write_csv(writer)
            .map_err(|e| VarError::Export {
                message: e.to_string(),
            })
    }

    /// Write the working table as a CSV file at `path`.
    pub fn export_working_table(&self, path: impl AsRef<Path>) -> Result<(), VarError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| VarError::Export {
            message: format!("cannot create '{}': {}", path.display(), e),
        })?;
        self.write_working_table(io::BufWriter::new(file))?;
        info!("exported working table to {}", path.display());
        Ok(())
    }

    pub fn table(&self) -> &FxRateTable {
        &self.table
    }

    pub fn spots(&self) -> &PortfolioSpots {
        &self.spots
    }

    pub fn config(&self) -> &VarConfig {
        &self.config
    }

    /// Spot exposures in the table's currency order.
    pub fn exposures(&self) -> &[f64] {
        &self.exposures
    }

    /// Relative 1-day shifts, one row per scenario.
    pub fn shifts(&self) -> &[Vec<f64>] {
        &self.shifts
    }

    /// Per-currency P&L, one row per scenario.
    pub fn pnl(&self) -> &[Vec<f64>] {
        &self.pnl
    }

    /// Total P&L per scenario, in date order.
    pub fn total_pnl(&self) -> &[f64] {
        &self.total_pnl
    }
}

/// Ratio of each rate to the previous day's rate.
fn one_day_shifts(table: &FxRateTable) -> Vec<Vec<f64>> {
    table
        .rows()
        .windows(2)
        .map(|pair| {
            pair[1]
                .rates
                .iter()
                .zip(&pair[0].rates)
                .map(|(next, prev)| next / prev)
                .collect()
        })
        .collect()
}
