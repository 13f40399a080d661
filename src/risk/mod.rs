//! Historical-simulation Value-at-Risk for an FX spot portfolio.

pub mod error;
pub mod historical_var;
pub mod percentile;
pub mod rate_table;
pub mod working_table;

pub use error::VarError;
pub use historical_var::{VarCalculator, VarConfig, VarResult};
pub use percentile::PercentileMethod;
pub use rate_table::{FxRateTable, RateRow, RateTableSchema};
pub use working_table::{WorkingRow, WorkingTable};
