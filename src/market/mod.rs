//! Market module for sportsbook events and quotes.
//!
//! This module handles:
//! - Event, quote and market types
//! - Quote batches (one snapshot per evaluation pass)
//! - Mock batch builder for testing

pub mod mock;
pub mod types;

pub use mock::MockBatchBuilder;
pub use types::{Bookmaker, Event, MarketKind, Quote, QuoteBatch, Side};
