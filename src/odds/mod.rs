//! Odds normalization.
//!
//! This module handles:
//! - Price formats (American, decimal)
//! - Conversion to canonical decimal odds and back
//! - Implied probability

pub mod convert;
pub mod types;

pub use convert::{american_to_decimal, decimal_to_american, overround};
pub use types::{format_american, DecimalOdds, OddsFormat, Price};
