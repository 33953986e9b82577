//! Price types for bookmaker quotes.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::convert::{american_to_decimal, decimal_to_american};
use crate::error::OddsError;

/// Quoted price in the format the bookmaker published it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", content = "value", rename_all = "lowercase")]
pub enum Price {
    /// American (moneyline) odds, e.g. `+150` or `-120`.
    American(Decimal),
    /// Decimal (European) odds, e.g. `2.50`.
    Decimal(Decimal),
}

impl Price {
    /// Convert to canonical decimal odds.
    pub fn to_decimal(&self) -> Result<DecimalOdds, OddsError> {
        match *self {
            Price::American(american) => american_to_decimal(american),
            Price::Decimal(decimal) => DecimalOdds::new(decimal),
        }
    }

    /// Price format of this quote.
    pub fn format(&self) -> OddsFormat {
        match self {
            Price::American(_) => OddsFormat::American,
            Price::Decimal(_) => OddsFormat::Decimal,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::American(value) => write!(f, "{}", format_american(*value)),
            Price::Decimal(value) => write!(f, "{}", value.round_dp(2)),
        }
    }
}

/// Odds format selector for feeds that publish a single format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OddsFormat {
    /// American odds.
    #[default]
    American,
    /// Decimal odds.
    Decimal,
}

impl OddsFormat {
    /// Wrap a raw value in this format.
    pub fn price(&self, value: Decimal) -> Price {
        match self {
            OddsFormat::American => Price::American(value),
            OddsFormat::Decimal => Price::Decimal(value),
        }
    }
}

/// Canonical decimal odds, always >= 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DecimalOdds(Decimal);

impl DecimalOdds {
    /// Validate and wrap a decimal odds value.
    pub fn new(value: Decimal) -> Result<Self, OddsError> {
        if value < Decimal::ONE {
            return Err(OddsError::DecimalBelowOne(value));
        }
        Ok(Self(value))
    }

    /// Underlying decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Implied probability (1 / odds).
    pub fn implied_probability(&self) -> Decimal {
        Decimal::ONE / self.0
    }

    /// Payout (stake returned plus winnings) for a stake.
    pub fn payout(&self, stake: Decimal) -> Decimal {
        stake * self.0
    }

    /// American representation, for display.
    pub fn to_american(&self) -> Result<Decimal, OddsError> {
        decimal_to_american(*self)
    }
}

impl TryFrom<Decimal> for DecimalOdds {
    type Error = OddsError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DecimalOdds> for Decimal {
    fn from(odds: DecimalOdds) -> Self {
        odds.0
    }
}

impl fmt::Display for DecimalOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.round_dp(3))
    }
}

/// Format American odds with an explicit `+` for positive prices.
pub fn format_american(odds: Decimal) -> String {
    let whole = odds.normalize();
    if whole > Decimal::ZERO {
        format!("+{}", whole)
    } else {
        whole.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn decimal_odds_rejects_below_one() {
        assert_eq!(
            DecimalOdds::new(dec!(0.95)),
            Err(OddsError::DecimalBelowOne(dec!(0.95)))
        );
        assert!(DecimalOdds::new(dec!(1.0)).is_ok());
    }

    #[test]
    fn implied_probability_is_reciprocal() {
        let odds = DecimalOdds::new(dec!(2.5)).unwrap();
        assert_eq!(odds.implied_probability(), dec!(0.4));
        assert_eq!(odds.payout(dec!(100)), dec!(250.0));
    }

    #[test]
    fn price_dispatches_on_format() {
        assert_eq!(
            Price::American(dec!(150)).to_decimal().unwrap().value(),
            dec!(2.5)
        );
        assert_eq!(
            Price::Decimal(dec!(1.91)).to_decimal().unwrap().value(),
            dec!(1.91)
        );
        assert!(Price::Decimal(dec!(0.5)).to_decimal().is_err());
    }

    #[test]
    fn odds_format_parses_case_insensitively() {
        assert_eq!(OddsFormat::from_str("American").unwrap(), OddsFormat::American);
        assert_eq!(OddsFormat::from_str("decimal").unwrap(), OddsFormat::Decimal);
        assert!(OddsFormat::from_str("fractional").is_err());
    }

    #[test]
    fn american_formatting_adds_plus_sign() {
        assert_eq!(format_american(dec!(150)), "+150");
        assert_eq!(format_american(dec!(-120)), "-120");
        assert_eq!(Price::American(dec!(110)).to_string(), "+110");
    }

    #[test]
    fn decimal_odds_deserialize_validates() {
        let ok: DecimalOdds = serde_json::from_str("\"2.10\"").unwrap();
        assert_eq!(ok.value(), dec!(2.10));
        assert!(serde_json::from_str::<DecimalOdds>("\"0.80\"").is_err());
    }
}
