//! Market-related types for sportsbook quotes.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use crate::error::{FeedError, OddsError};
use crate::odds::{DecimalOdds, Price};

/// Kind of betting market.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MarketKind {
    /// Straight winner market (two- or three-way).
    Moneyline,
    /// Point spread / handicap.
    Spread,
    /// Game total over/under.
    Total,
    /// Player proposition, keyed by the prop market name (e.g. `player_pass_yds`).
    PlayerProp(String),
}

impl MarketKind {
    /// Whether quotes in this market must carry a line.
    pub fn requires_line(&self) -> bool {
        !matches!(self, MarketKind::Moneyline)
    }

    /// Whether sides are "over" / "under" rather than teams.
    pub fn is_over_under(&self) -> bool {
        matches!(self, MarketKind::Total | MarketKind::PlayerProp(_))
    }
}

impl FromStr for MarketKind {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "moneyline" | "h2h" => Ok(MarketKind::Moneyline),
            "spread" | "spreads" => Ok(MarketKind::Spread),
            "total" | "totals" => Ok(MarketKind::Total),
            _ if key.starts_with("player_") && key.len() > "player_".len() => {
                Ok(MarketKind::PlayerProp(key))
            }
            _ => Err(FeedError::UnsupportedMarket(s.to_string())),
        }
    }
}

impl TryFrom<String> for MarketKind {
    type Error = FeedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MarketKind> for String {
    fn from(kind: MarketKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketKind::Moneyline => f.write_str("moneyline"),
            MarketKind::Spread => f.write_str("spread"),
            MarketKind::Total => f.write_str("total"),
            MarketKind::PlayerProp(kind) => f.write_str(kind),
        }
    }
}

/// Logical side of a market after classification.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Side {
    /// Home team.
    Home,
    /// Away team.
    Away,
    /// Draw / tie in three-way markets.
    #[strum(to_string = "draw", serialize = "tie")]
    Draw,
    /// Over the line.
    Over,
    /// Under the line.
    Under,
}

/// Sporting event that quotes refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque event identifier.
    pub id: String,
    /// Sport / league key used as a ranking scope (e.g. "baseball_mlb").
    pub sport: String,
    /// Home team name as quoted by bookmakers.
    pub home_team: String,
    /// Away team name as quoted by bookmakers.
    pub away_team: String,
    /// Scheduled start.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub commence_time: Option<OffsetDateTime>,
}

impl Event {
    /// Create an event without a start time.
    pub fn new(
        id: impl Into<String>,
        sport: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sport: sport.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            commence_time: None,
        }
    }

    /// Short "Away @ Home" label.
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }
}

/// Bookmaker that published a quote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bookmaker {
    /// Stable key (e.g. "draftkings").
    pub key: String,
    /// Display title (e.g. "DraftKings").
    #[serde(default)]
    pub title: Option<String>,
}

impl Bookmaker {
    /// Create a bookmaker with only a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: None,
        }
    }

    /// Display name, falling back to the key.
    pub fn name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.key)
    }
}

/// One bookmaker's price for one outcome of one market of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Event this quote belongs to.
    pub event_id: String,
    /// Market type.
    pub market: MarketKind,
    /// Outcome name as published (team name, "Over", "Under", ...).
    pub side_label: String,
    /// Subject of a player prop (player name).
    #[serde(default)]
    pub participant: Option<String>,
    /// Point spread or total value.
    #[serde(default)]
    pub line: Option<Decimal>,
    /// Quoted price.
    pub price: Price,
    /// Quoting bookmaker.
    pub source: Bookmaker,
    /// When the bookmaker last updated this price.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub observed_at: Option<OffsetDateTime>,
}

impl Quote {
    /// Create a validated quote. Identifiers must be non-empty.
    pub fn new(
        event_id: impl Into<String>,
        market: MarketKind,
        side_label: impl Into<String>,
        price: Price,
        source: Bookmaker,
    ) -> Result<Self, FeedError> {
        let event_id = event_id.into();
        let side_label = side_label.into();

        if event_id.trim().is_empty() {
            return Err(FeedError::MissingField("event_id"));
        }
        if side_label.trim().is_empty() {
            return Err(FeedError::MissingField("side"));
        }
        if source.key.trim().is_empty() {
            return Err(FeedError::MissingField("bookmaker"));
        }

        Ok(Self {
            event_id,
            market,
            side_label,
            participant: None,
            line: None,
            price,
            source,
            observed_at: None,
        })
    }

    /// Attach a line.
    pub fn with_line(mut self, line: Decimal) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach a prop participant.
    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = Some(participant.into());
        self
    }

    /// Attach an observation timestamp.
    pub fn with_observed_at(mut self, at: OffsetDateTime) -> Self {
        self.observed_at = Some(at);
        self
    }

    /// Canonical decimal odds of this quote.
    pub fn decimal_odds(&self) -> Result<DecimalOdds, OddsError> {
        self.price.to_decimal()
    }
}

/// A snapshot of events and their quotes, evaluated together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBatch {
    /// Snapshot time, used for staleness checks.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub as_of: Option<OffsetDateTime>,
    /// Events referenced by the quotes.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Quotes in arrival order.
    #[serde(default)]
    pub quotes: Vec<Quote>,
}

impl QuoteBatch {
    /// Look up an event by id.
    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Whether the batch carries no quotes.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Append another batch, keeping the first copy of duplicate events.
    pub fn extend(&mut self, other: QuoteBatch) {
        for event in other.events {
            if self.event(&event.id).is_none() {
                self.events.push(event);
            }
        }
        self.quotes.extend(other.quotes);
        self.as_of = match (self.as_of, other.as_of) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}
