//! Margin and stake calculations for arbitrage opportunities.

use rust_decimal::Decimal;
use serde::Serialize;
use smallvec::SmallVec;
use time::OffsetDateTime;

use super::grouper::GroupKey;
use super::selector::{Leg, Legs};
use super::stakes::{allocate, Allocation};
use crate::config::ScanConfig;
use crate::error::StakeError;
use crate::market::{Event, Side};
use crate::odds::DecimalOdds;

/// Combined implied probability and margin of a set of legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    /// Σ 1/d over all legs.
    pub combined_implied_probability: Decimal,
    /// (1 - combined) * 100.
    pub profit_margin_pct: Decimal,
}

/// Detected arbitrage opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Opportunity {
    /// Group the legs were drawn from.
    pub key: GroupKey,
    /// Event being bet on.
    pub event: Event,
    /// Best leg per side.
    pub legs: Legs,
    /// Σ 1/d over the legs, strictly below 1.
    pub combined_implied_probability: Decimal,
    /// Guaranteed margin before stake rounding, in percent.
    pub profit_margin_pct: Decimal,
    /// Rounded stakes; `None` when rounding collapsed a stake.
    pub allocation: Option<Allocation>,
    /// Timestamp when the opportunity was detected.
    #[serde(with = "time::serde::rfc3339")]
    pub detected_at: OffsetDateTime,
}

impl Opportunity {
    /// Sport key of the event.
    pub fn sport(&self) -> &str {
        &self.event.sport
    }

    /// Total amount staked, if an allocation exists.
    pub fn total_stake(&self) -> Option<Decimal> {
        self.allocation.as_ref().map(|a| a.total_stake)
    }

    /// Guaranteed profit after rounding, if an allocation exists.
    pub fn guaranteed_profit(&self) -> Option<Decimal> {
        self.allocation.as_ref().map(|a| a.guaranteed_profit)
    }

    /// Return on the rounded stakes, in percent.
    pub fn roi(&self) -> Option<Decimal> {
        self.allocation.as_ref().map(Allocation::roi)
    }

    /// Leg for a side.
    pub fn leg(&self, side: Side) -> Option<&Leg> {
        self.legs.iter().find(|l| l.side == side)
    }

    /// Number of distinct bookmakers involved.
    pub fn bookmaker_count(&self) -> usize {
        let mut books: SmallVec<[&str; 3]> = self.legs.iter().map(Leg::bookmaker).collect();
        books.sort_unstable();
        books.dedup();
        books.len()
    }
}

/// Sum of implied probabilities.
pub fn combined_implied_probability<'a, I>(odds: I) -> Decimal
where
    I: IntoIterator<Item = &'a DecimalOdds>,
{
    odds.into_iter().map(DecimalOdds::implied_probability).sum()
}

/// Evaluate legs for an arbitrage.
///
/// Returns `None` unless the combined implied probability is strictly below
/// one and the margin reaches `min_margin_pct`.
pub fn evaluate(legs: &[Leg], min_margin_pct: Decimal) -> Option<Evaluation> {
    if legs.len() < 2 {
        return None;
    }

    let combined = combined_implied_probability(legs.iter().map(|l| &l.odds));
    if combined >= Decimal::ONE || combined <= Decimal::ZERO {
        return None;
    }

    let profit_margin_pct = (Decimal::ONE - combined) * Decimal::ONE_HUNDRED;
    if profit_margin_pct < min_margin_pct {
        return None;
    }

    Some(Evaluation {
        combined_implied_probability: combined,
        profit_margin_pct,
    })
}

/// Build an opportunity from evaluated legs, allocating stakes.
///
/// A rounding failure (collapsed stake or rounding loss) is returned as the
/// error so the caller can apply its policy; every other stake error is a
/// configuration problem.
pub fn calculate_opportunity(
    key: &GroupKey,
    event: &Event,
    legs: Legs,
    evaluation: Evaluation,
    config: &ScanConfig,
) -> (Opportunity, Option<StakeError>) {
    let odds: SmallVec<[(Side, DecimalOdds); 3]> = legs.iter().map(|l| (l.side, l.odds)).collect();

    let (allocation, error) = match allocate(config.unit_size, &odds, config.round_to) {
        Ok(allocation) => (Some(allocation), None),
        Err(e) => (None, Some(e)),
    };

    let opportunity = Opportunity {
        key: key.clone(),
        event: event.clone(),
        legs,
        combined_implied_probability: evaluation.combined_implied_probability,
        profit_margin_pct: evaluation.profit_margin_pct,
        allocation,
        detected_at: OffsetDateTime::now_utc(),
    };

    (opportunity, error)
}
