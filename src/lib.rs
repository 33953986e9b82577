//! Cross-bookmaker sports betting arbitrage scanner.
//!
//! Bookmakers price the same outcomes independently. When the best available
//! price on every side of a market implies a combined probability below one,
//! staking each side in proportion to its implied probability returns the same
//! amount whichever side wins, and more than was staked:
//!
//! ```text
//! Yankees  +150 @ FanDuel     -> 2.500 -> 1/2.500 = 0.4000
//! Red Sox  -120 @ DraftKings  -> 1.833 -> 1/1.833 = 0.5455
//! ──────────────────────────────────────────────────────
//! Combined implied probability:              0.9455 < 1
//! Margin:                                    5.45%
//! Stakes on 1000 (rounded to 5):             425 / 575
//! ```
//!
//! # Modules
//!
//! - [`odds`]: Price formats and conversions
//! - [`market`]: Events, quotes and batches
//! - [`feed`]: Parsing native and Odds API JSON
//! - [`arbitrage`]: Normalization, grouping, evaluation, staking and scanning
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`metrics`]: Prometheus metrics
//! - [`api`]: HTTP API for health, metrics and scans
//! - [`utils`]: Utility functions

pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod feed;
pub mod market;
pub mod metrics;
pub mod odds;
pub mod utils;

pub use arbitrage::{Opportunity, ScanReport, Scanner};
pub use config::{Config, ScanConfig};
pub use error::{ArbError, Result};
