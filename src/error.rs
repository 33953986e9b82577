//! Unified error types for the arbitrage scanner.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::market::{MarketKind, Side};

/// Unified error type for the arbitrage scanner.
#[derive(Error, Debug)]
pub enum ArbError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Odds conversion error.
    #[error("odds error: {0}")]
    Odds(#[from] OddsError),

    /// Quote grouping error.
    #[error("grouping error: {0}")]
    Grouping(#[from] GroupingError),

    /// Stake allocation error.
    #[error("stake error: {0}")]
    Stake(#[from] StakeError),

    /// Feed parsing error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// Pipeline-level error.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Price conversion errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OddsError {
    /// American odds of exactly zero have no meaning.
    #[error("american odds cannot be zero")]
    ZeroAmerican,

    /// American odds strictly between -100 and +100 (exclusive of zero).
    #[error("american odds {0} are inside the (-100, +100) dead zone")]
    AmericanOutOfRange(Decimal),

    /// Decimal odds below the 1.0 floor.
    #[error("decimal odds {0} are below 1.0")]
    DecimalBelowOne(Decimal),

    /// Decimal odds of 1.0 have no American representation.
    #[error("decimal odds {0} cannot be expressed as american odds")]
    NoAmericanForm(Decimal),
}

/// Side classification and grouping errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupingError {
    /// The side label maps to no known side of the market.
    #[error("side label {label:?} does not match any side of {market}")]
    AmbiguousSide {
        /// Offending side label.
        label: String,
        /// Market the quote belongs to.
        market: MarketKind,
    },

    /// A line is required for this market but the quote has none.
    #[error("{market} quote {label:?} has no line")]
    MissingLine {
        /// Side label of the quote.
        label: String,
        /// Market the quote belongs to.
        market: MarketKind,
    },

    /// The quote refers to an event missing from the batch.
    #[error("unknown event {0}")]
    UnknownEvent(String),

    /// The group does not have enough sides to evaluate.
    #[error("incomplete group: {sides} populated side(s), need at least 2")]
    IncompleteGroup {
        /// Number of populated sides.
        sides: usize,
    },
}

/// Stake allocation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeError {
    /// Rounding collapsed a stake to zero or below.
    #[error("stake for {side} rounds to {rounded} (raw {raw})")]
    DegenerateStake {
        /// Side whose stake collapsed.
        side: Side,
        /// Unrounded stake.
        raw: Decimal,
        /// Stake after rounding.
        rounded: Decimal,
    },

    /// Rounded stakes no longer cover the total stake on every outcome.
    #[error("rounded stakes leave a guaranteed profit of {guaranteed_profit}")]
    RoundingLoss {
        /// Worst-case payout minus total stake.
        guaranteed_profit: Decimal,
    },

    /// Allocation parameters are out of range.
    #[error("invalid allocation parameter {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: Decimal,
    },

    /// Fewer than two sides were supplied.
    #[error("allocation needs at least 2 sides, got {0}")]
    TooFewSides(usize),
}

impl StakeError {
    /// Whether rounding, not configuration, made the allocation unusable.
    pub fn is_rounding_failure(&self) -> bool {
        matches!(
            self,
            StakeError::DegenerateStake { .. } | StakeError::RoundingLoss { .. }
        )
    }
}

/// Feed parsing and record validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// A record carries both or neither price format.
    #[error("record must carry exactly one of price_american / price_decimal")]
    PriceFormat,

    /// The market key is not recognised.
    #[error("unsupported market key {0:?}")]
    UnsupportedMarket(String),

    /// A required field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Every record in a non-empty feed was rejected.
    #[error("no usable records: all {rejected} record(s) were rejected")]
    NoUsableRecords {
        /// Number of rejected records.
        rejected: usize,
    },
}

/// Pipeline-level errors that abort a whole batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Every quote in a non-empty batch was rejected before grouping.
    #[error("no usable quotes: all {rejected} quote(s) were rejected")]
    NoUsableQuotes {
        /// Number of rejected quotes.
        rejected: usize,
    },

    /// A parallel scan task failed to complete.
    #[error("scan task failed: {0}")]
    TaskFailed(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ArbError>;
