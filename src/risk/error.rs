use crate::core::currency::CurrencyCode;
use thiserror::Error;

/// Errors arising from a historical VaR run.
///
/// Any of these aborts the whole calculation; there is no partial result.
#[derive(Debug, Error)]
pub enum VarError {
    /// The historical rate source is malformed or incomplete.
    #[error("failed to load historical rates: {message}")]
    DataLoad { message: String },
    /// A tracked currency has no portfolio spot.
    #[error("no spot price supplied for tracked currency {currency}")]
    MissingSpot { currency: CurrencyCode },
    #[error("spot for {currency} must be positive and finite, got {value}")]
    InvalidSpot { currency: CurrencyCode, value: f64 },
    #[error("invalid VaR configuration: {message}")]
    InvalidConfig { message: String },
    #[error("failed to export working table: {message}")]
    Export { message: String },
}

impl VarError {
    pub(crate) fn data_load(message: impl Into<String>) -> Self {
        VarError::DataLoad {
            message: message.into(),
        }
    }
}
