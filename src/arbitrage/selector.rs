//! Best-price selection per side.

use serde::Serialize;
use smallvec::SmallVec;

use super::grouper::OutcomeGroup;
use crate::market::{Quote, Side};
use crate::odds::DecimalOdds;

/// The best available quote for one side of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leg {
    /// Side this leg covers.
    pub side: Side,
    /// Quote offering the best price.
    pub quote: Quote,
    /// Decimal odds of that quote.
    pub odds: DecimalOdds,
}

impl Leg {
    /// Bookmaker to place this leg with.
    pub fn bookmaker(&self) -> &str {
        self.quote.source.name()
    }
}

/// Legs of one group, one per side.
pub type Legs = SmallVec<[Leg; 3]>;

/// Pick the highest decimal price on every side.
///
/// Sides are independent. Ties keep the first-seen quote.
pub fn select_best(group: &OutcomeGroup) -> Legs {
    group
        .sides
        .iter()
        .filter_map(|(side, quotes)| {
            let mut best = quotes.first()?;
            for candidate in &quotes[1..] {
                if candidate.odds > best.odds {
                    best = candidate;
                }
            }
            Some(Leg {
                side: *side,
                quote: best.quote.clone(),
                odds: best.odds,
            })
        })
        .collect()
}
