//! Outcome grouping: partition quotes into comparable outcome sets.
//!
//! A group is every quote sharing `(event, market, subject, line class)`.
//! Within a group quotes are split by logical [`Side`].
//!
//! Spread lines are keyed relative to the home team: a home quote keeps its
//! line, an away quote's line is negated. A home -3.5 therefore only meets an
//! away +3.5; a -3.5 / +3.0 pair lands in two different groups and neither is
//! complete.

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::diagnostic::{Diagnostic, DropReason};
use super::normalize::PricedQuote;
use crate::error::GroupingError;
use crate::market::{Event, MarketKind, Quote, Side};

/// Identity of an outcome group; ordering is the tie-break for ranking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    /// Event identifier.
    pub event_id: String,
    /// Market type.
    pub market: MarketKind,
    /// Prop participant (normalized), `None` for team markets.
    pub subject: Option<String>,
    /// Home-relative spread line, total line, or prop line.
    pub line: Option<Decimal>,
}

/// Quotes for one comparable outcome set, split by side.
#[derive(Debug, Clone)]
pub struct OutcomeGroup {
    /// Group identity.
    pub key: GroupKey,
    /// Event the group belongs to.
    pub event: Event,
    /// Whether the market has a draw outcome.
    pub three_way: bool,
    /// Quotes per side, each in first-seen order.
    pub sides: BTreeMap<Side, Vec<PricedQuote>>,
}

impl OutcomeGroup {
    /// Sides that must all be populated for the set to be exhaustive.
    pub fn required_sides(&self) -> SmallVec<[Side; 3]> {
        let mut required: SmallVec<[Side; 3]> = match self.key.market {
            MarketKind::Moneyline | MarketKind::Spread => SmallVec::from_slice(&[Side::Home, Side::Away]),
            MarketKind::Total | MarketKind::PlayerProp(_) => SmallVec::from_slice(&[Side::Over, Side::Under]),
        };
        if self.three_way || self.sides.contains_key(&Side::Draw) {
            required.push(Side::Draw);
        }
        required
    }

    /// Number of sides with at least one quote.
    pub fn populated_sides(&self) -> usize {
        self.sides.values().filter(|q| !q.is_empty()).count()
    }

    /// Check the group can be evaluated.
    pub fn ensure_complete(&self) -> Result<(), GroupingError> {
        let populated = self.populated_sides();
        let complete = populated >= 2
            && self
                .required_sides()
                .iter()
                .all(|side| self.sides.get(side).is_some_and(|q| !q.is_empty()));

        if complete {
            Ok(())
        } else {
            Err(GroupingError::IncompleteGroup { sides: populated })
        }
    }

    /// Total number of quotes in the group.
    pub fn quote_count(&self) -> usize {
        self.sides.values().map(Vec::len).sum()
    }
}

/// Output of [`group_quotes`].
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    /// Evaluable groups in key order.
    pub groups: Vec<OutcomeGroup>,
    /// Groups discarded for lacking sides.
    pub incomplete: usize,
    /// Quotes that could not be classified.
    pub diagnostics: Vec<Diagnostic>,
}

/// Side, subject and line of a classified quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Logical side.
    pub side: Side,
    /// Normalized prop participant.
    pub subject: Option<String>,
    /// Grouping line.
    pub line: Option<Decimal>,
}

/// Map a quote onto a side of its market.
pub fn classify(quote: &Quote, event: &Event) -> Result<Classification, GroupingError> {
    let side = if quote.market.is_over_under() {
        over_under_side(&quote.side_label)
    } else {
        team_side(&quote.side_label, event, quote.market == MarketKind::Moneyline)
    }
    .ok_or_else(|| GroupingError::AmbiguousSide {
        label: quote.side_label.clone(),
        market: quote.market.clone(),
    })?;

    let line = if quote.market.requires_line() {
        let line = required_line(quote)?;
        let keyed = match (&quote.market, side) {
            (MarketKind::Spread, Side::Away) => -line,
            _ => line,
        };
        Some(keyed.normalize())
    } else {
        None
    };

    let subject = match quote.market {
        MarketKind::PlayerProp(_) => prop_subject(quote),
        _ => None,
    };

    Ok(Classification { side, subject, line })
}

/// Events whose moneyline is quoted with a draw anywhere in the batch.
///
/// Computed from the raw quotes so a draw quote removed by a filter still
/// makes the market three-way.
pub fn three_way_events(quotes: &[Quote], events: &[Event]) -> HashSet<String> {
    let events: HashMap<&str, &Event> = events.iter().map(|e| (e.id.as_str(), e)).collect();

    quotes
        .iter()
        .filter(|q| q.market == MarketKind::Moneyline)
        .filter(|q| {
            events
                .get(q.event_id.as_str())
                .and_then(|event| team_side(&q.side_label, event, true))
                == Some(Side::Draw)
        })
        .map(|q| q.event_id.clone())
        .collect()
}

fn required_line(quote: &Quote) -> Result<Decimal, GroupingError> {
    quote.line.ok_or_else(|| GroupingError::MissingLine {
        label: quote.side_label.clone(),
        market: quote.market.clone(),
    })
}

fn team_side(label: &str, event: &Event, allow_draw: bool) -> Option<Side> {
    let label = label.trim();
    let home = label.eq_ignore_ascii_case(event.home_team.trim());
    let away = label.eq_ignore_ascii_case(event.away_team.trim());

    match (home, away) {
        (true, false) => Some(Side::Home),
        (false, true) => Some(Side::Away),
        (true, true) => None,
        (false, false) => {
            let draw = label.eq_ignore_ascii_case("draw") || label.eq_ignore_ascii_case("tie");
            (allow_draw && draw).then_some(Side::Draw)
        }
    }
}

/// Classify an over/under label.
///
/// Whole words win over substrings, so "Grover Under" is an under. A label
/// matching both directions, or neither, is ambiguous.
pub fn over_under_side(label: &str) -> Option<Side> {
    let lower = label.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let word_over = words.contains(&"over");
    let word_under = words.contains(&"under");
    match (word_over, word_under) {
        (true, false) => return Some(Side::Over),
        (false, true) => return Some(Side::Under),
        (true, true) => return None,
        (false, false) => {}
    }

    match (lower.contains("over"), lower.contains("under")) {
        (true, false) => Some(Side::Over),
        (false, true) => Some(Side::Under),
        _ => None,
    }
}

fn prop_subject(quote: &Quote) -> Option<String> {
    let raw = match &quote.participant {
        Some(participant) => participant.clone(),
        None => quote
            .side_label
            .split_whitespace()
            .filter(|w| {
                let w = w.to_lowercase();
                w != "over" && w != "under"
            })
            .collect::<Vec<_>>()
            .join(" "),
    };

    let subject = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    (!subject.is_empty()).then_some(subject)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct BaseKey {
    event_id: String,
    market: MarketKind,
    subject: Option<String>,
}

#[derive(Debug)]
struct LineClass {
    line: Option<Decimal>,
    sides: BTreeMap<Side, Vec<PricedQuote>>,
}

fn same_line(a: Option<Decimal>, b: Option<Decimal>, tolerance: Decimal) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() <= tolerance,
        _ => false,
    }
}

/// Partition priced quotes into outcome groups.
///
/// Quotes whose event is unknown or whose side cannot be classified are
/// dropped with a diagnostic. Groups missing a required side are discarded
/// and counted. Moneylines of events in `three_way` need a draw quote.
pub fn group_quotes(
    quotes: Vec<PricedQuote>,
    events: &[Event],
    three_way: &HashSet<String>,
    line_tolerance: Decimal,
) -> Grouping {
    let events: HashMap<&str, &Event> = events.iter().map(|e| (e.id.as_str(), e)).collect();
    let mut buckets: BTreeMap<BaseKey, Vec<LineClass>> = BTreeMap::new();
    let mut diagnostics = Vec::new();

    for priced in quotes {
        let Some(event) = events.get(priced.quote.event_id.as_str()) else {
            let err = GroupingError::UnknownEvent(priced.quote.event_id.clone());
            warn!(event = %priced.quote.event_id, "Quote for unknown event");
            diagnostics.push(Diagnostic::for_quote(&priced.quote, DropReason::from(&err)));
            continue;
        };

        let class = match classify(&priced.quote, event) {
            Ok(class) => class,
            Err(err) => {
                warn!(
                    event = %priced.quote.event_id,
                    book = %priced.quote.source.key,
                    error = %err,
                    "Dropping unclassifiable quote"
                );
                diagnostics.push(Diagnostic::for_quote(&priced.quote, DropReason::from(&err)));
                continue;
            }
        };

        let base = BaseKey {
            event_id: priced.quote.event_id.clone(),
            market: priced.quote.market.clone(),
            subject: class.subject,
        };
        let classes = buckets.entry(base).or_default();

        let idx = match classes
            .iter()
            .position(|c| same_line(c.line, class.line, line_tolerance))
        {
            Some(idx) => idx,
            None => {
                classes.push(LineClass {
                    line: class.line,
                    sides: BTreeMap::new(),
                });
                classes.len() - 1
            }
        };

        classes[idx].sides.entry(class.side).or_default().push(priced);
    }

    let mut groups = Vec::new();
    let mut incomplete = 0;

    for (base, classes) in buckets {
        let Some(event) = events.get(base.event_id.as_str()) else {
            continue;
        };

        for class in classes {
            let group = OutcomeGroup {
                key: GroupKey {
                    event_id: base.event_id.clone(),
                    market: base.market.clone(),
                    subject: base.subject.clone(),
                    line: class.line,
                },
                event: (*event).clone(),
                three_way: base.market == MarketKind::Moneyline
                    && three_way.contains(&base.event_id),
                sides: class.sides,
            };

            match group.ensure_complete() {
                Ok(()) => groups.push(group),
                Err(err) => {
                    debug!(
                        event = %group.key.event_id,
                        market = %group.key.market,
                        line = ?group.key.line,
                        error = %err,
                        "Skipping incomplete group"
                    );
                    incomplete += 1;
                }
            }
        }
    }

    groups.sort_by(|a, b| a.key.cmp(&b.key));

    Grouping {
        groups,
        incomplete,
        diagnostics,
    }
}
