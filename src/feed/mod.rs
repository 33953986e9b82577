//! Feed module for turning already-fetched odds JSON into quote batches.
//!
//! This module handles:
//! - The native batch format (explicit events and quote records)
//! - The Odds API event format

pub mod odds_api;
pub mod raw;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use odds_api::{events_into_batch, parse_odds_api, OddsApiEvent};
pub use raw::{RawBatch, RawQuote};

use crate::arbitrage::Diagnostic;
use crate::error::Result;
use crate::market::QuoteBatch;
use crate::odds::OddsFormat;

/// Input document layout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum FeedFormat {
    /// `{ as_of, events, quotes }` with explicit price formats.
    #[default]
    Native,
    /// The Odds API event list.
    OddsApi,
}

/// Parse a feed document.
///
/// `odds_format` only applies to formats whose prices carry no marker.
pub fn parse_feed(
    json: &str,
    format: FeedFormat,
    odds_format: OddsFormat,
) -> Result<(QuoteBatch, Vec<Diagnostic>)> {
    match format {
        FeedFormat::Native => {
            let raw: RawBatch = serde_json::from_str(json)?;
            Ok(raw.into_batch()?)
        }
        FeedFormat::OddsApi => Ok(parse_odds_api(json, odds_format)?),
    }
}
