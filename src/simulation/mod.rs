//! Test-data generation for the risk pipeline.

pub mod rate_history;
