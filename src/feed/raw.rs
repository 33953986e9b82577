//! Native quote batch JSON.
//!
//! ```json
//! {
//!   "as_of": "2025-09-18T23:00:00Z",
//!   "events": [{ "id": "ev1", "sport": "baseball_mlb", "home_team": "Yankees", "away_team": "Red Sox" }],
//!   "quotes": [{ "event_id": "ev1", "market": "moneyline", "side": "Yankees",
//!                "price_american": 150, "bookmaker": "fanduel" }]
//! }
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::arbitrage::{Diagnostic, DropReason};
use crate::error::FeedError;
use crate::market::{Bookmaker, Event, MarketKind, Quote, QuoteBatch};
use crate::odds::Price;

/// One quote record as it appears on the wire.
///
/// Every field defaults so that a missing field is reported per record
/// instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuote {
    /// Event identifier.
    #[serde(default)]
    pub event_id: String,
    /// Market key (moneyline, spread, total, player_*; feed aliases accepted).
    #[serde(default)]
    pub market: String,
    /// Side label as published.
    #[serde(default)]
    pub side: String,
    /// Prop participant.
    #[serde(default)]
    pub participant: Option<String>,
    /// Line value.
    #[serde(default)]
    pub line: Option<Decimal>,
    /// American price.
    #[serde(default)]
    pub price_american: Option<Decimal>,
    /// Decimal price.
    #[serde(default)]
    pub price_decimal: Option<Decimal>,
    /// Bookmaker key.
    #[serde(default)]
    pub bookmaker: String,
    /// Bookmaker display title.
    #[serde(default)]
    pub bookmaker_title: Option<String>,
    /// When the bookmaker last updated the price.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub observed_at: Option<OffsetDateTime>,
}

impl RawQuote {
    /// Validate into a [`Quote`].
    pub fn into_quote(self) -> Result<Quote, FeedError> {
        let price = match (self.price_american, self.price_decimal) {
            (Some(american), None) => Price::American(american),
            (None, Some(decimal)) => Price::Decimal(decimal),
            _ => return Err(FeedError::PriceFormat),
        };

        if self.market.trim().is_empty() {
            return Err(FeedError::MissingField("market"));
        }
        let market: MarketKind = self.market.parse()?;

        let source = Bookmaker {
            key: self.bookmaker,
            title: self.bookmaker_title,
        };

        let mut quote = Quote::new(self.event_id, market, self.side, price, source)?;
        quote.line = self.line;
        quote.participant = self.participant.filter(|p| !p.trim().is_empty());
        quote.observed_at = self.observed_at;
        Ok(quote)
    }

    fn diagnostic(&self, err: &FeedError) -> Diagnostic {
        let bookmaker = (!self.bookmaker.trim().is_empty()).then(|| self.bookmaker.clone());
        Diagnostic::for_record(
            self.event_id.clone(),
            bookmaker,
            self.side.clone(),
            DropReason::from(err),
        )
    }
}

/// A native batch document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBatch {
    /// Snapshot time.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub as_of: Option<OffsetDateTime>,
    /// Events referenced by the quotes.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Quote records.
    #[serde(default)]
    pub quotes: Vec<RawQuote>,
}

impl RawBatch {
    /// Validate every record, keeping the good ones.
    ///
    /// Fails only when the document has records and none of them is valid.
    pub fn into_batch(self) -> Result<(QuoteBatch, Vec<Diagnostic>), FeedError> {
        let total = self.quotes.len();
        let mut quotes = Vec::with_capacity(total);
        let mut diagnostics = Vec::new();

        for raw in self.quotes {
            let diagnostic_source = raw.clone();
            match raw.into_quote() {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    warn!(
                        event = %diagnostic_source.event_id,
                        book = %diagnostic_source.bookmaker,
                        error = %e,
                        "Rejecting malformed record"
                    );
                    diagnostics.push(diagnostic_source.diagnostic(&e));
                }
            }
        }

        if total > 0 && quotes.is_empty() {
            return Err(FeedError::NoUsableRecords { rejected: total });
        }

        debug!(
            events = self.events.len(),
            quotes = quotes.len(),
            rejected = diagnostics.len(),
            "Parsed native batch"
        );

        Ok((
            QuoteBatch {
                as_of: self.as_of,
                events: self.events,
                quotes,
            },
            diagnostics,
        ))
    }
}
