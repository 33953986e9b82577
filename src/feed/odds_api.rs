//! The Odds API event JSON.
//!
//! Accepts either the list returned by `/v4/sports/{sport}/odds` or the single
//! event returned by `/v4/sports/{sport}/events/{id}/odds`. Prices carry no
//! format marker, so the caller states whether they are American or decimal.

use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::arbitrage::{Diagnostic, DropReason};
use crate::error::FeedError;
use crate::market::{Bookmaker, Event, MarketKind, Quote, QuoteBatch};
use crate::odds::OddsFormat;

/// One event with every bookmaker's markets.
#[derive(Debug, Clone, Deserialize)]
pub struct OddsApiEvent {
    /// Event identifier.
    pub id: String,
    /// Sport key (e.g. "americanfootball_nfl").
    pub sport_key: String,
    /// Scheduled start.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub commence_time: Option<OffsetDateTime>,
    /// Home team.
    pub home_team: String,
    /// Away team.
    pub away_team: String,
    /// Bookmakers quoting this event.
    #[serde(default)]
    pub bookmakers: Vec<OddsApiBookmaker>,
}

/// A bookmaker's markets for one event.
#[derive(Debug, Clone, Deserialize)]
pub struct OddsApiBookmaker {
    /// Bookmaker key.
    pub key: String,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Last update across the bookmaker's markets.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
    /// Markets offered.
    #[serde(default)]
    pub markets: Vec<OddsApiMarket>,
}

/// One market of one bookmaker.
#[derive(Debug, Clone, Deserialize)]
pub struct OddsApiMarket {
    /// Market key (h2h, spreads, totals, player_*).
    pub key: String,
    /// Last update of this market.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
    /// Priced outcomes.
    #[serde(default)]
    pub outcomes: Vec<OddsApiOutcome>,
}

/// One priced outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct OddsApiOutcome {
    /// Team name, "Draw", "Over" or "Under".
    pub name: String,
    /// Price in the requested odds format.
    pub price: Decimal,
    /// Spread, total or prop line.
    #[serde(default)]
    pub point: Option<Decimal>,
    /// Player name for props.
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Many(Vec<OddsApiEvent>),
    One(Box<OddsApiEvent>),
}

/// Parse an Odds API response body into a batch.
pub fn parse_odds_api(
    json: &str,
    format: OddsFormat,
) -> Result<(QuoteBatch, Vec<Diagnostic>), serde_json::Error> {
    let events = match serde_json::from_str::<Payload>(json)? {
        Payload::Many(events) => events,
        Payload::One(event) => vec![*event],
    };
    Ok(events_into_batch(events, format))
}

/// Flatten events into a batch.
///
/// Unsupported market keys and invalid outcomes become diagnostics. The batch
/// snapshot time is the latest update seen in the payload.
pub fn events_into_batch(
    events: Vec<OddsApiEvent>,
    format: OddsFormat,
) -> (QuoteBatch, Vec<Diagnostic>) {
    let mut batch = QuoteBatch::default();
    let mut diagnostics = Vec::new();

    for event in events {
        for book in &event.bookmakers {
            for market in &book.markets {
                let kind: MarketKind = match market.key.parse() {
                    Ok(kind) => kind,
                    Err(e) => {
                        debug!(event = %event.id, book = %book.key, market = %market.key, "Skipping market");
                        diagnostics.push(Diagnostic::for_record(
                            event.id.clone(),
                            Some(book.key.clone()),
                            String::new(),
                            DropReason::from(&e),
                        ));
                        continue;
                    }
                };

                let observed_at = market.last_update.or(book.last_update);
                if let Some(at) = observed_at {
                    batch.as_of = Some(batch.as_of.map_or(at, |current| current.max(at)));
                }

                for outcome in &market.outcomes {
                    match outcome_quote(&event, book, &kind, outcome, format, observed_at) {
                        Ok(quote) => batch.quotes.push(quote),
                        Err(e) => {
                            warn!(event = %event.id, book = %book.key, error = %e, "Rejecting outcome");
                            diagnostics.push(Diagnostic::for_record(
                                event.id.clone(),
                                Some(book.key.clone()),
                                outcome.name.clone(),
                                DropReason::from(&e),
                            ));
                        }
                    }
                }
            }
        }

        batch.events.push(Event {
            id: event.id,
            sport: event.sport_key,
            home_team: event.home_team,
            away_team: event.away_team,
            commence_time: event.commence_time,
        });
    }

    debug!(
        events = batch.events.len(),
        quotes = batch.quotes.len(),
        skipped = diagnostics.len(),
        "Parsed odds-api payload"
    );

    (batch, diagnostics)
}

fn outcome_quote(
    event: &OddsApiEvent,
    book: &OddsApiBookmaker,
    kind: &MarketKind,
    outcome: &OddsApiOutcome,
    format: OddsFormat,
    observed_at: Option<OffsetDateTime>,
) -> Result<Quote, FeedError> {
    let source = Bookmaker {
        key: book.key.clone(),
        title: book.title.clone(),
    };

    let mut quote = Quote::new(
        event.id.clone(),
        kind.clone(),
        outcome.name.clone(),
        format.price(outcome.price),
        source,
    )?;
    quote.line = outcome.point;
    quote.participant = outcome.description.clone().filter(|d| !d.trim().is_empty());
    quote.observed_at = observed_at;
    Ok(quote)
}
