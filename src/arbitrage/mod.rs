//! Arbitrage module for detecting opportunities across bookmakers.
//!
//! This module handles:
//! - Quote normalization and boundary filters
//! - Grouping quotes into comparable outcome sets
//! - Best-price selection, margin evaluation and stake allocation
//! - Batch scanning and ranking

pub mod calculator;
pub mod detector;
pub mod diagnostic;
pub mod grouper;
pub mod normalize;
pub mod selector;
pub mod stakes;

pub use calculator::{evaluate, Evaluation, Opportunity};
pub use detector::{
    check_group, diagnose_group, merge_reports, rank_opportunities, scan_parallel,
    NoOpportunityDiagnosis, ScanReport, ScanStats, Scanner,
};
pub use diagnostic::{Diagnostic, DropReason};
pub use grouper::{group_quotes, three_way_events, GroupKey, OutcomeGroup};
pub use normalize::{normalize_quotes, PricedQuote};
pub use selector::{select_best, Leg, Legs};
pub use stakes::{allocate, Allocation, Stake};
