use crate::core::currency::CurrencyCode;
use chrono::NaiveDate;
use serde::Serialize;
use std::io;

/// One dated line of the VaR working sheet.
///
/// The oldest date has no preceding rate, so its shift and P&L cells are
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingRow {
    pub date: NaiveDate,
    pub rates: Vec<f64>,
    pub shifts: Option<Vec<f64>>,
    pub pnl: Option<Vec<f64>>,
    pub total_pnl: Option<f64>,
}

/// Rates, 1-day shifts, per-currency P&L and total P&L side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingTable {
    pub currencies: Vec<CurrencyCode>,
    pub rows: Vec<WorkingRow>,
}

impl WorkingTable {
    /// Column headers: `date, rate_<C>.., shift_<C>.., pnl_<C>.., total_pnl`.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["date".to_string()];
        for prefix in ["rate", "shift", "pnl"] {
            headers.extend(self.currencies.iter().map(|c| format!("{prefix}_{c}")));
        }
        headers.push("total_pnl".to_string());
        headers
    }

    /// Total P&L observations in date order, skipping the empty first row.
    pub fn total_pnl_column(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.total_pnl).collect()
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let width = self.currencies.len();
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.headers())?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(3 * width + 2);
            record.push(row.date.format("%Y-%m-%d").to_string());
            record.extend(row.rates.iter().map(f64::to_string));
            for cells in [&row.shifts, &row.pnl] {
                match cells {
                    Some(values) => record.extend(values.iter().map(f64::to_string)),
                    None => record.extend(std::iter::repeat(String::new()).take(width)),
                }
            }
            record.push(row.total_pnl.map(|v| v.to_string()).unwrap_or_default());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
