//! Conversions between American and decimal odds.

use rust_decimal::{Decimal, RoundingStrategy};

use super::types::DecimalOdds;
use crate::error::OddsError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Convert American odds to decimal odds.
///
/// Positive prices pay `price` per 100 staked, negative prices need `|price|`
/// staked to win 100. Both map to `decimal = winnings / stake + 1`.
pub fn american_to_decimal(american: Decimal) -> Result<DecimalOdds, OddsError> {
    if american.is_zero() {
        return Err(OddsError::ZeroAmerican);
    }
    if american.abs() < HUNDRED {
        return Err(OddsError::AmericanOutOfRange(american));
    }

    let decimal = if american > Decimal::ZERO {
        american / HUNDRED + Decimal::ONE
    } else {
        HUNDRED / american.abs() + Decimal::ONE
    };

    DecimalOdds::new(decimal)
}

/// Convert decimal odds back to American odds, rounded to a whole number.
///
/// Decimal odds of 2.0 and above give positive prices, below 2.0 negative.
/// Halves round away from zero.
pub fn decimal_to_american(odds: DecimalOdds) -> Result<Decimal, OddsError> {
    let decimal = odds.value();
    let profit = decimal - Decimal::ONE;
    if profit.is_zero() {
        return Err(OddsError::NoAmericanForm(decimal));
    }

    let american = if decimal >= Decimal::TWO {
        profit * HUNDRED
    } else {
        -(HUNDRED / profit)
    };

    Ok(american.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

/// Combined implied probability (overround) of a set of prices.
pub fn overround<'a, I>(odds: I) -> Decimal
where
    I: IntoIterator<Item = &'a DecimalOdds>,
{
    odds.into_iter().map(DecimalOdds::implied_probability).sum()
}
