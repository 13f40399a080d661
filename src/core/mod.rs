//! Foundational types shared by the pricing and risk modules.

pub mod currency;
pub mod dates;
