//! # pricing-risk-engine
//!
//! Black-Scholes option pricing and historical FX Value-at-Risk.
//!
//! Two independent calculators:
//!
//! - European call/put prices from the Black-Scholes closed form, written
//!   against either the spot or the forward price.
//! - 1-day historical-simulation VaR at 99% confidence for a spot FX
//!   portfolio, replayed over a historical rate sheet.
//!
//! ## Architecture
//!
//! - **core** — Currency codes, portfolio spots, day counts and dates
//! - **pricing** — Normal distribution and Black-Scholes pricer
//! - **risk** — Rate sheet loading, shift/P&L vectors, percentiles, VaR, export
//! - **simulation** — Synthetic rate histories for tests and benchmarks

pub mod core;
pub mod pricing;
pub mod risk;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::currency::{CurrencyCode, PortfolioSpots};
    pub use crate::core::dates::DayCount;
    pub use crate::pricing::{price, OptionInputs, OptionResult, PricingError, PricingMode};
    pub use crate::risk::{
        FxRateTable, PercentileMethod, RateTableSchema, VarCalculator, VarConfig, VarError,
        VarResult,
    };
}
