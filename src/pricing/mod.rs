//! Closed-form Black-Scholes pricing for European options.

pub mod black_scholes;
pub mod normal;

pub use black_scholes::{price, OptionInputs, OptionResult, PricingError, PricingMode};
