//! Mock quote batches for unit testing.
//!
//! This module provides a builder that assembles events and quotes
//! without going through a feed parser.

use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::odds::Price;

use super::types::{Bookmaker, Event, MarketKind, Quote, QuoteBatch};

/// Builder for creating quote batches with common patterns.
#[derive(Debug, Clone, Default)]
pub struct MockBatchBuilder {
    as_of: Option<OffsetDateTime>,
    events: Vec<Event>,
    quotes: Vec<Quote>,
}

impl MockBatchBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot time.
    pub fn as_of(mut self, at: OffsetDateTime) -> Self {
        self.as_of = Some(at);
        self
    }

    /// Add an event.
    pub fn event(mut self, id: &str, sport: &str, home: &str, away: &str) -> Self {
        self.events.push(Event::new(id, sport, home, away));
        self
    }

    /// Add a fully-built quote.
    pub fn quote(mut self, quote: Quote) -> Self {
        self.quotes.push(quote);
        self
    }

    /// Add a moneyline quote in American odds.
    pub fn moneyline(self, event_id: &str, book: &str, team: &str, american: Decimal) -> Self {
        let quote = mock_quote(event_id, MarketKind::Moneyline, team, Price::American(american), book);
        self.quote(quote)
    }

    /// Add a moneyline quote in decimal odds.
    pub fn moneyline_decimal(self, event_id: &str, book: &str, team: &str, decimal: Decimal) -> Self {
        let quote = mock_quote(event_id, MarketKind::Moneyline, team, Price::Decimal(decimal), book);
        self.quote(quote)
    }

    /// Add a spread quote in American odds.
    pub fn spread(
        self,
        event_id: &str,
        book: &str,
        team: &str,
        line: Decimal,
        american: Decimal,
    ) -> Self {
        let quote = mock_quote(event_id, MarketKind::Spread, team, Price::American(american), book)
            .with_line(line);
        self.quote(quote)
    }

    /// Add a game total quote in American odds.
    pub fn total(
        self,
        event_id: &str,
        book: &str,
        label: &str,
        line: Decimal,
        american: Decimal,
    ) -> Self {
        let quote = mock_quote(event_id, MarketKind::Total, label, Price::American(american), book)
            .with_line(line);
        self.quote(quote)
    }

    /// Add a player prop quote in American odds.
    #[allow(clippy::too_many_arguments)]
    pub fn prop(
        self,
        event_id: &str,
        book: &str,
        kind: &str,
        player: &str,
        label: &str,
        line: Decimal,
        american: Decimal,
    ) -> Self {
        let quote = mock_quote(
            event_id,
            MarketKind::PlayerProp(kind.to_string()),
            label,
            Price::American(american),
            book,
        )
        .with_line(line)
        .with_participant(player);
        self.quote(quote)
    }

    /// Build the batch.
    pub fn build(self) -> QuoteBatch {
        QuoteBatch {
            as_of: self.as_of,
            events: self.events,
            quotes: self.quotes,
        }
    }
}

fn mock_quote(event_id: &str, market: MarketKind, label: &str, price: Price, book: &str) -> Quote {
    Quote {
        event_id: event_id.to_string(),
        market,
        side_label: label.to_string(),
        participant: None,
        line: None,
        price,
        source: Bookmaker::new(book),
        observed_at: None,
    }
}
