//! Diagnostics for quotes dropped before evaluation.

use std::fmt;

use serde::Serialize;
use strum::AsRefStr;

use crate::error::{FeedError, GroupingError, OddsError};
use crate::market::{MarketKind, Quote};

/// Why a quote or record was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DropReason {
    /// Price could not be converted to decimal odds.
    InvalidOdds {
        /// Conversion failure.
        detail: String,
    },
    /// Side label matched no side of the market.
    AmbiguousSide,
    /// Line required but absent.
    MissingLine,
    /// Quote refers to an event not present in the batch.
    UnknownEvent,
    /// Bookmaker filtered out by the allow-list.
    BookmakerNotAllowed,
    /// Quote older than the configured maximum age.
    Stale {
        /// Age of the quote in seconds.
        age_secs: i64,
    },
    /// Feed record failed validation.
    Malformed {
        /// Validation failure.
        detail: String,
    },
}

impl DropReason {
    /// Whether the drop reflects bad input rather than a configured filter.
    pub fn is_structural(&self) -> bool {
        !matches!(self, DropReason::BookmakerNotAllowed | DropReason::Stale { .. })
    }
}

impl From<&OddsError> for DropReason {
    fn from(err: &OddsError) -> Self {
        DropReason::InvalidOdds {
            detail: err.to_string(),
        }
    }
}

impl From<&GroupingError> for DropReason {
    fn from(err: &GroupingError) -> Self {
        match err {
            GroupingError::MissingLine { .. } => DropReason::MissingLine,
            GroupingError::UnknownEvent(_) => DropReason::UnknownEvent,
            GroupingError::AmbiguousSide { .. } => DropReason::AmbiguousSide,
            GroupingError::IncompleteGroup { .. } => DropReason::Malformed {
                detail: err.to_string(),
            },
        }
    }
}

impl From<&FeedError> for DropReason {
    fn from(err: &FeedError) -> Self {
        DropReason::Malformed {
            detail: err.to_string(),
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::InvalidOdds { detail } => write!(f, "invalid odds ({detail})"),
            DropReason::AmbiguousSide => f.write_str("ambiguous side"),
            DropReason::MissingLine => f.write_str("missing line"),
            DropReason::UnknownEvent => f.write_str("unknown event"),
            DropReason::BookmakerNotAllowed => f.write_str("bookmaker not allowed"),
            DropReason::Stale { age_secs } => write!(f, "stale ({age_secs}s old)"),
            DropReason::Malformed { detail } => write!(f, "malformed ({detail})"),
        }
    }
}

/// A dropped quote, reported alongside opportunities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Event the quote referred to (may be empty for malformed records).
    pub event_id: String,
    /// Market, when known.
    pub market: Option<MarketKind>,
    /// Bookmaker key, when known.
    pub bookmaker: Option<String>,
    /// Side label as published.
    pub side_label: String,
    /// Drop reason.
    pub reason: DropReason,
}

impl Diagnostic {
    /// Diagnostic for a parsed quote.
    pub fn for_quote(quote: &Quote, reason: DropReason) -> Self {
        Self {
            event_id: quote.event_id.clone(),
            market: Some(quote.market.clone()),
            bookmaker: Some(quote.source.key.clone()),
            side_label: quote.side_label.clone(),
            reason,
        }
    }

    /// Diagnostic for a raw feed record that never became a quote.
    pub fn for_record(
        event_id: impl Into<String>,
        bookmaker: Option<String>,
        side_label: impl Into<String>,
        reason: DropReason,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            market: None,
            bookmaker,
            side_label: side_label.into(),
            reason,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event={} market={} book={} side={:?}: {}",
            self.event_id,
            self.market
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            self.bookmaker.as_deref().unwrap_or("N/A"),
            self.side_label,
            self.reason,
        )
    }
}
