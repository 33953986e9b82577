//! Equal-payout stake allocation.
//!
//! For sides with decimal odds `d_i`, the raw stake on side `i` is
//! `unit * (1/d_i) / Σ(1/d_j)`, which makes `s_i * d_i` identical on every
//! side. Stakes are then rounded to the nearest multiple of the rounding step,
//! halves away from zero. Rounding can break the equal payout, so the
//! guaranteed profit is always taken from the *smallest* payout, and an
//! allocation whose rounded stakes lose money on some outcome is rejected.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use smallvec::SmallVec;

use crate::error::StakeError;
use crate::market::Side;
use crate::odds::DecimalOdds;

/// Stake on one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stake {
    /// Side being staked.
    pub side: Side,
    /// Decimal odds taken.
    pub odds: DecimalOdds,
    /// Amount staked.
    pub stake: Decimal,
    /// Return if this side wins (stake * odds).
    pub payout: Decimal,
}

/// Stakes across every side of an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Per-side stakes, in input order.
    pub stakes: SmallVec<[Stake; 3]>,
    /// Sum of all stakes.
    pub total_stake: Decimal,
    /// Smallest payout across sides.
    pub min_payout: Decimal,
    /// Largest payout across sides.
    pub max_payout: Decimal,
    /// `min_payout - total_stake`.
    pub guaranteed_profit: Decimal,
}

impl Allocation {
    /// Stake placed on a side.
    pub fn stake_for(&self, side: Side) -> Option<Decimal> {
        self.stakes.iter().find(|s| s.side == side).map(|s| s.stake)
    }

    /// Whether every outcome returns at least the total stake.
    pub fn is_guaranteed(&self) -> bool {
        self.guaranteed_profit >= Decimal::ZERO
    }

    /// Guaranteed profit as a percentage of the total stake.
    pub fn roi(&self) -> Decimal {
        if self.total_stake.is_zero() {
            Decimal::ZERO
        } else {
            (self.guaranteed_profit / self.total_stake) * Decimal::ONE_HUNDRED
        }
    }
}

/// Round to the nearest multiple of `step`, halves away from zero.
///
/// Fails when `value / step` does not fit in a `Decimal`.
pub fn round_to_step(value: Decimal, step: Decimal) -> Result<Decimal, StakeError> {
    value
        .checked_div(step)
        .map(|steps| steps.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|steps| steps.checked_mul(step))
        .ok_or(StakeError::InvalidParameter {
            name: "rounding_step",
            value: step,
        })
}

/// Unrounded equal-payout stakes.
pub fn equal_payout_stakes(
    unit: Decimal,
    odds: &[(Side, DecimalOdds)],
) -> Result<SmallVec<[Decimal; 3]>, StakeError> {
    if unit <= Decimal::ZERO {
        return Err(StakeError::InvalidParameter { name: "unit", value: unit });
    }
    if odds.len() < 2 {
        return Err(StakeError::TooFewSides(odds.len()));
    }

    let total_implied: Decimal = odds.iter().map(|(_, d)| d.implied_probability()).sum();

    Ok(odds
        .iter()
        .map(|(_, d)| unit * d.implied_probability() / total_implied)
        .collect())
}

/// Allocate `unit` across sides so every outcome pays (nearly) the same.
///
/// Fails with [`StakeError::DegenerateStake`] if rounding drives any stake to
/// zero, and with [`StakeError::RoundingLoss`] if the rounded stakes no longer
/// return the total stake on every outcome. Nothing is returned in either case.
pub fn allocate(
    unit: Decimal,
    odds: &[(Side, DecimalOdds)],
    rounding_step: Decimal,
) -> Result<Allocation, StakeError> {
    if rounding_step <= Decimal::ZERO {
        return Err(StakeError::InvalidParameter {
            name: "rounding_step",
            value: rounding_step,
        });
    }

    let raw = equal_payout_stakes(unit, odds)?;

    let mut stakes: SmallVec<[Stake; 3]> = SmallVec::with_capacity(odds.len());
    for ((side, d), raw_stake) in odds.iter().zip(raw) {
        let stake = round_to_step(raw_stake, rounding_step)?;
        if stake <= Decimal::ZERO {
            return Err(StakeError::DegenerateStake {
                side: *side,
                raw: raw_stake,
                rounded: stake,
            });
        }
        stakes.push(Stake {
            side: *side,
            odds: *d,
            stake,
            payout: d.payout(stake),
        });
    }

    let total_stake: Decimal = stakes.iter().map(|s| s.stake).sum();
    let min_payout = stakes.iter().map(|s| s.payout).min().unwrap_or_default();
    let max_payout = stakes.iter().map(|s| s.payout).max().unwrap_or_default();

    let guaranteed_profit = min_payout - total_stake;
    if guaranteed_profit < Decimal::ZERO {
        return Err(StakeError::RoundingLoss { guaranteed_profit });
    }

    Ok(Allocation {
        stakes,
        total_stake,
        min_payout,
        max_payout,
        guaranteed_profit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::american_to_decimal;
    use rust_decimal_macros::dec;

    fn odds(value: Decimal) -> DecimalOdds {
        DecimalOdds::new(value).unwrap()
    }

    #[test]
    fn round_to_step_rounds_half_away_from_zero() {
        assert_eq!(round_to_step(dec!(422.5), dec!(5)), Ok(dec!(425)));
        assert_eq!(round_to_step(dec!(427.5), dec!(5)), Ok(dec!(430)));
        assert_eq!(round_to_step(dec!(422.4), dec!(5)), Ok(dec!(420)));
        assert_eq!(round_to_step(dec!(12.345), dec!(0.01)), Ok(dec!(12.35)));
    }

    #[test]
    fn unrounded_stakes_equalize_payout() {
        let home = american_to_decimal(dec!(150)).unwrap();
        let away = american_to_decimal(dec!(-120)).unwrap();

        let raw = equal_payout_stakes(dec!(1000), &[(Side::Home, home), (Side::Away, away)]).unwrap();

        let payout_home = raw[0] * home.value();
        let payout_away = raw[1] * away.value();
        assert!((payout_home - payout_away).abs() < dec!(0.000000001));
        assert!((raw[0] + raw[1] - dec!(1000)).abs() < dec!(0.000000001));
    }

    #[test]
    fn plus_150_minus_120_scenario() {
        let home = american_to_decimal(dec!(150)).unwrap();
        let away = american_to_decimal(dec!(-120)).unwrap();

        let allocation =
            allocate(dec!(1000), &[(Side::Home, home), (Side::Away, away)], dec!(5)).unwrap();

        // Raw stakes are ~423.08 / ~576.92.
        assert_eq!(allocation.stake_for(Side::Home), Some(dec!(425)));
        assert_eq!(allocation.stake_for(Side::Away), Some(dec!(575)));
        assert_eq!(allocation.total_stake, dec!(1000));
        assert_eq!(allocation.max_payout, dec!(1062.5));
        assert!((allocation.min_payout - dec!(1054.1666)).abs() < dec!(0.001));
        assert_eq!(
            allocation.guaranteed_profit,
            allocation.min_payout - allocation.total_stake
        );
        assert!(allocation.guaranteed_profit < allocation.max_payout - allocation.total_stake);
        assert!(allocation.is_guaranteed());
    }

    #[test]
    fn three_way_allocation() {
        let legs = [
            (Side::Home, odds(dec!(3.2))),
            (Side::Draw, odds(dec!(3.6))),
            (Side::Away, odds(dec!(3.4))),
        ];

        let allocation = allocate(dec!(1000), &legs, dec!(1)).unwrap();

        assert_eq!(allocation.stakes.len(), 3);
        assert!(allocation.total_stake <= dec!(1001));
        assert!(allocation.is_guaranteed());
        assert!(allocation.roi() > Decimal::ZERO);
    }

    #[test]
    fn degenerate_stake_is_an_error() {
        let legs = [(Side::Home, odds(dec!(1.01))), (Side::Away, odds(dec!(101)))];

        let result = allocate(dec!(100), &legs, dec!(5));

        assert!(matches!(
            result,
            Err(StakeError::DegenerateStake { side: Side::Away, .. })
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let legs = [(Side::Over, odds(dec!(2.1))), (Side::Under, odds(dec!(2.1)))];

        assert!(matches!(
            allocate(dec!(0), &legs, dec!(5)),
            Err(StakeError::InvalidParameter { name: "unit", .. })
        ));
        assert!(matches!(
            allocate(dec!(100), &legs, dec!(0)),
            Err(StakeError::InvalidParameter { name: "rounding_step", .. })
        ));
        assert_eq!(
            allocate(dec!(100), &legs[..1], dec!(5)),
            Err(StakeError::TooFewSides(1))
        );
    }

    #[test]
    fn tiny_rounding_step_is_rejected_not_overflowed() {
        let legs = [(Side::Over, odds(dec!(2.1))), (Side::Under, odds(dec!(2.1)))];
        let step = dec!(0.0000000000000000000000000001);

        assert!(matches!(
            allocate(dec!(1000), &legs, step),
            Err(StakeError::InvalidParameter { name: "rounding_step", .. })
        ));
    }

    #[test]
    fn rounding_that_loses_money_is_rejected() {
        // Margin is ~0.11%; stakes 665 / 335 pay 997.5 / 1008.35.
        let legs = [(Side::Home, odds(dec!(1.5))), (Side::Away, odds(dec!(3.01)))];

        assert_eq!(
            allocate(dec!(1000), &legs, dec!(5)),
            Err(StakeError::RoundingLoss {
                guaranteed_profit: dec!(-2.5)
            })
        );

        let allocation = allocate(dec!(1000), &legs, dec!(1)).unwrap();
        assert_eq!(allocation.stake_for(Side::Home), Some(dec!(667)));
        assert!(allocation.is_guaranteed());
    }
}
