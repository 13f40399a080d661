use crate::core::currency::CurrencyCode;
use crate::core::dates::parse_date;
use crate::risk::error::VarError;
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Expected layout of a historical rate sheet.
///
/// Naming the columns up front lets a bad sheet fail at load time with a
/// precise message instead of deep inside the calculation. Columns the
/// schema does not mention are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTableSchema {
    pub date_column: String,
    pub currencies: Vec<CurrencyCode>,
}

impl RateTableSchema {
    pub fn new(date_column: impl Into<String>, currencies: Vec<CurrencyCode>) -> Self {
        Self {
            date_column: date_column.into(),
            currencies,
        }
    }

    /// Infer a schema from a header row: first column is the date, every
    /// other column is a tracked currency.
    pub fn infer<'a, I>(headers: I) -> Result<Self, VarError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut headers = headers.into_iter();
        let date_column = headers
            .next()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| VarError::data_load("sheet has no header row"))?;
        let currencies: Vec<CurrencyCode> = headers.map(CurrencyCode::new).collect();
        if currencies.is_empty() {
            return Err(VarError::data_load(
                "sheet has a date column but no currency columns",
            ));
        }
        Ok(Self::new(date_column, currencies))
    }
}

/// One historical observation: a date and one rate per tracked currency,
/// in the table's currency order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRow {
    pub date: NaiveDate,
    pub rates: Vec<f64>,
}

impl RateRow {
    pub fn new(date: NaiveDate, rates: Vec<f64>) -> Self {
        Self { date, rates }
    }
}

/// Historical FX rates, oldest first.
///
/// Guarantees at least two rows, strictly increasing dates, and a
/// positive finite rate for every currency on every row. Deserialized
/// tables go through the same checks as [`FxRateTable::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedRateTable")]
pub struct FxRateTable {
    currencies: Vec<CurrencyCode>,
    rows: Vec<RateRow>,
}

#[derive(Deserialize)]
struct UncheckedRateTable {
    currencies: Vec<CurrencyCode>,
    rows: Vec<RateRow>,
}

impl TryFrom<UncheckedRateTable> for FxRateTable {
    type Error = VarError;

    fn try_from(table: UncheckedRateTable) -> Result<Self, Self::Error> {
        Self::new(table.currencies, table.rows)
    }
}

impl FxRateTable {
    /// Build a table from in-memory rows, enforcing every invariant.
    pub fn new(currencies: Vec<CurrencyCode>, rows: Vec<RateRow>) -> Result<Self, VarError> {
        if currencies.is_empty() {
            return Err(VarError::data_load("no currencies tracked"));
        }
        let mut seen = HashSet::new();
        for currency in &currencies {
            if !seen.insert(currency) {
                return Err(VarError::data_load(format!(
                    "currency column {currency} appears more than once"
                )));
            }
        }
        if rows.len() < 2 {
            return Err(VarError::data_load(format!(
                "at least 2 rows are needed to compute a 1-day shift, got {}",
                rows.len()
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.rates.len() != currencies.len() {
                return Err(VarError::data_load(format!(
                    "row {} ({}) has {} rates, expected {}",
                    i,
                    row.date,
                    row.rates.len(),
                    currencies.len()
                )));
            }
            for (currency, &rate) in currencies.iter().zip(&row.rates) {
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(VarError::data_load(format!(
                        "rate for {currency} on {} must be positive and finite, got {rate}",
                        row.date
                    )));
                }
            }
            if i > 0 && row.date <= rows[i - 1].date {
                return Err(VarError::data_load(format!(
                    "dates must be strictly increasing: {} follows {}",
                    row.date,
                    rows[i - 1].date
                )));
            }
        }
        Ok(Self { currencies, rows })
    }

    /// Load a CSV sheet from disk.
    ///
    /// With no schema, the layout is inferred from the header row.
    pub fn from_csv_path(
        path: impl AsRef<Path>,
        schema: Option<&RateTableSchema>,
    ) -> Result<Self, VarError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            VarError::data_load(format!("cannot open '{}': {}", path.display(), e))
        })?;
        let table = Self::from_csv_reader(file, schema)?;
        info!(
            "loaded {} rate rows for {} currencies from {}",
            table.len(),
            table.currencies.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load a CSV sheet from any reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricing_risk_engine::risk::rate_table::FxRateTable;
    ///
    /// let sheet = "date,USD,BRL\n2024-01-01,1.00,5.00\n2024-01-02,1.01,4.95\n";
    /// let table = FxRateTable::from_csv_reader(sheet.as_bytes(), None).unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.currencies().len(), 2);
    /// ```
    pub fn from_csv_reader<R: io::Read>(
        reader: R,
        schema: Option<&RateTableSchema>,
    ) -> Result<Self, VarError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| VarError::data_load(format!("cannot read header row: {e}")))?
            .clone();

        let inferred;
        let schema = match schema {
            Some(schema) => schema,
            None => {
                inferred = RateTableSchema::infer(headers.iter())?;
                &inferred
            }
        };

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| VarError::data_load(format!("missing column '{name}'")))
        };
        let date_idx = column(schema.date_column.as_str())?;
        let rate_idx = schema
            .currencies
            .iter()
            .map(|c| column(c.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| VarError::data_load(format!("malformed CSV record: {e}")))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if record.iter().all(str::is_empty) {
                debug!("skipping blank row at line {line}");
                continue;
            }

            let cell = |idx: usize, name: &str| {
                record
                    .get(idx)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        VarError::data_load(format!("line {line}: missing value for '{name}'"))
                    })
            };

            let date_text = cell(date_idx, schema.date_column.as_str())?;
            let date = parse_date(date_text).ok_or_else(|| {
                VarError::data_load(format!("line {line}: invalid date '{date_text}'"))
            })?;

            let mut rates = Vec::with_capacity(rate_idx.len());
            for (currency, &idx) in schema.currencies.iter().zip(&rate_idx) {
                let text = cell(idx, currency.as_str())?;
                let rate: f64 = text.parse().map_err(|_| {
                    VarError::data_load(format!(
                        "line {line}: non-numeric rate '{text}' for {currency}"
                    ))
                })?;
                rates.push(rate);
            }
            rows.push(RateRow::new(date, rates));
        }

        Self::new(schema.currencies.clone(), rows)
    }

    /// Write the table back out as a CSV sheet (`date`, one column per currency).
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["date".to_string()];
        header.extend(self.currencies.iter().map(|c| c.to_string()));
        wtr.write_record(&header)?;
        for row in &self.rows {
            let mut record = vec![row.date.format("%Y-%m-%d").to_string()];
            record.extend(row.rates.iter().map(|r| r.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn currencies(&self) -> &[CurrencyCode] {
        &self.currencies
    }

    pub fn rows(&self) -> &[RateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn currency_index(&self, currency: &CurrencyCode) -> Option<usize> {
        self.currencies.iter().position(|c| c == currency)
    }

    /// Full history for one currency.
    pub fn column(&self, currency: &CurrencyCode) -> Option<Vec<f64>> {
        let idx = self.currency_index(currency)?;
        Some(self.rows.iter().map(|r| r.rates[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn load(sheet: &str) -> Result<FxRateTable, VarError> {
        FxRateTable::from_csv_reader(sheet.as_bytes(), None)
    }

    #[test]
    fn test_load_inferred_schema() {
        let table = load("date,CCY1,CCY2\n2024-01-01,1.10,0.85\n2024-01-02,1.12,0.84\n").unwrap();
        assert_eq!(
            table.currencies(),
            &[CurrencyCode::new("CCY1"), CurrencyCode::new("CCY2")]
        );
        assert_eq!(table.dates(), vec![date(2024, 1, 1), date(2024, 1, 2)]);
        assert_eq!(table.column(&CurrencyCode::new("CCY2")), Some(vec![0.85, 0.84]));
    }

    #[test]
    fn test_load_explicit_schema_ignores_extra_columns() {
        let sheet = "\
Date,Portfolio,CCY1,CCY2
01/03/2024,250000,1.10,0.85
04/03/2024,251000,1.12,0.84
05/03/2024,249000,1.11,0.86
";
        let schema = RateTableSchema::new(
            "Date",
            vec![CurrencyCode::new("CCY2"), CurrencyCode::new("CCY1")],
        );
        let table = FxRateTable::from_csv_reader(sheet.as_bytes(), Some(&schema)).unwrap();
        assert_eq!(table.len(), 3);
        // Schema order wins over sheet order.
        assert_eq!(table.rows()[0].rates, vec![0.85, 1.10]);
        assert_eq!(table.rows()[1].date, date(2024, 3, 4));
    }

    #[test]
    fn test_trailing_blank_row_skipped() {
        let table = load("date,USD\n2024-01-01,1.0\n2024-01-02,1.1\n,\n").unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_schema_column() {
        let schema = RateTableSchema::new("date", vec![CurrencyCode::new("JPY")]);
        let err = FxRateTable::from_csv_reader(
            "date,USD\n2024-01-01,1.0\n2024-01-02,1.1\n".as_bytes(),
            Some(&schema),
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing column 'JPY'"));
    }

    #[test]
    fn test_non_numeric_cell() {
        let err = load("date,USD\n2024-01-01,1.0\n2024-01-02,abc\n").unwrap_err();
        assert!(matches!(err, VarError::DataLoad { .. }));
        assert!(err.to_string().contains("non-numeric"));
    }

    #[test]
    fn test_missing_cell() {
        let err = load("date,USD,BRL\n2024-01-01,1.0,5.0\n2024-01-02,1.1\n").unwrap_err();
        assert!(err.to_string().contains("missing value for 'BRL'"));
    }

    #[test]
    fn test_non_increasing_dates() {
        let err = load("date,USD\n2024-01-02,1.0\n2024-01-01,1.1\n").unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));

        let err = load("date,USD\n2024-01-01,1.0\n2024-01-01,1.1\n").unwrap_err();
        assert!(matches!(err, VarError::DataLoad { .. }));
    }

    #[test]
    fn test_invalid_date() {
        let err = load("date,USD\n2024-01-01,1.0\nyesterday,1.1\n").unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }

    #[test]
    fn test_too_few_rows() {
        assert!(load("date,USD\n2024-01-01,1.0\n").is_err());
        assert!(load("date,USD\n").is_err());
    }

    #[test]
    fn test_non_positive_rate() {
        let err = load("date,USD\n2024-01-01,1.0\n2024-01-02,0\n").unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn test_header_without_currencies() {
        assert!(load("date\n2024-01-01\n2024-01-02\n").is_err());
    }

    #[test]
    fn test_duplicate_currency() {
        let rows = vec![
            RateRow::new(date(2024, 1, 1), vec![1.0, 1.0]),
            RateRow::new(date(2024, 1, 2), vec![1.0, 1.0]),
        ];
        let err = FxRateTable::new(vec!["USD".into(), "USD".into()], rows).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_write_csv_reloads() {
        let table = load("date,USD,BRL\n2024-01-01,1.0,5.0\n2024-01-02,1.1,4.9\n").unwrap();
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        let reloaded = FxRateTable::from_csv_reader(buf.as_slice(), None).unwrap();
        assert_eq!(reloaded, table);
    }
}
