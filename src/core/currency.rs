use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// ISO 4217-style currency code.
///
/// Identifies one column of the historical FX-rate sheet and one
/// exposure in the portfolio. Codes are free-form, so sheet headers such
/// as `CCY1` work as well as `USD` or `BRL`.
///
/// # Examples
///
/// ```
/// use pricing_risk_engine::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("USD");
/// let brl = CurrencyCode::new("BRL");
/// assert_ne!(usd, brl);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Errors arising while building a set of portfolio spots.
#[derive(Debug, Error)]
pub enum SpotsError {
    #[error("spot for {currency} must be positive and finite, got {value}")]
    InvalidSpot { currency: CurrencyCode, value: f64 },
    #[error("invalid spot assignment '{0}', expected CCY=VALUE")]
    Malformed(String),
    #[error("failed to read spots file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse spots file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Current spot exposure per currency.
///
/// Each value is the present mark-to-market amount held in that currency.
/// The historical simulation revalues it under every past 1-day move.
///
/// # Examples
///
/// ```
/// use pricing_risk_engine::core::currency::{CurrencyCode, PortfolioSpots};
///
/// let spots = PortfolioSpots::from_pairs([("CCY1", 153084.81), ("CCY2", 95891.51)]).unwrap();
/// assert_eq!(spots.get(&CurrencyCode::new("CCY2")), Some(95891.51));
/// assert_eq!(spots.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioSpots {
    spots: BTreeMap<CurrencyCode, f64>,
}

/// JSON schema for a spots file.
#[derive(Deserialize)]
struct SpotsFile {
    spots: BTreeMap<CurrencyCode, f64>,
}

impl PortfolioSpots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(currency, spot)` pairs, validating every value.
    pub fn from_pairs<C, I>(pairs: I) -> Result<Self, SpotsError>
    where
        C: Into<CurrencyCode>,
        I: IntoIterator<Item = (C, f64)>,
    {
        let mut spots = Self::new();
        for (currency, value) in pairs {
            spots.insert(currency.into(), value)?;
        }
        Ok(spots)
    }

    /// Load spots from a JSON file shaped like `{"spots": {"USD": 1000.0}}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SpotsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SpotsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, SpotsError> {
        let file: SpotsFile = serde_json::from_str(content)?;
        Self::from_pairs(file.spots)
    }

    /// Set the spot for a currency. Replaces any previous value.
    pub fn insert(&mut self, currency: CurrencyCode, value: f64) -> Result<(), SpotsError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(SpotsError::InvalidSpot { currency, value });
        }
        self.spots.insert(currency, value);
        Ok(())
    }

    /// Parse and apply a `CCY=VALUE` assignment.
    pub fn insert_assignment(&mut self, assignment: &str) -> Result<(), SpotsError> {
        let (code, value) = assignment
            .split_once('=')
            .ok_or_else(|| SpotsError::Malformed(assignment.to_string()))?;
        let code = code.trim();
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| SpotsError::Malformed(assignment.to_string()))?;
        if code.is_empty() {
            return Err(SpotsError::Malformed(assignment.to_string()));
        }
        self.insert(CurrencyCode::new(code), value)
    }

    pub fn get(&self, currency: &CurrencyCode) -> Option<f64> {
        self.spots.get(currency).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.spots.iter().map(|(c, v)| (c, *v))
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }
}
