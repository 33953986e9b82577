//! Quote normalization: price conversion and boundary filters.

use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use super::diagnostic::{Diagnostic, DropReason};
use crate::config::ScanConfig;
use crate::market::Quote;
use crate::odds::DecimalOdds;

/// A quote with its canonical decimal odds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedQuote {
    /// Original quote.
    pub quote: Quote,
    /// Canonical decimal odds.
    pub odds: DecimalOdds,
}

/// Result of normalizing a batch of quotes.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Quotes that passed conversion and filters, in input order.
    pub quotes: Vec<PricedQuote>,
    /// Quotes that were dropped.
    pub diagnostics: Vec<Diagnostic>,
}

/// Convert every quote to decimal odds, applying the bookmaker allow-list
/// and staleness filter.
pub fn normalize_quotes(
    quotes: &[Quote],
    as_of: Option<OffsetDateTime>,
    config: &ScanConfig,
) -> Normalized {
    let mut out = Normalized {
        quotes: Vec::with_capacity(quotes.len()),
        diagnostics: Vec::new(),
    };

    for quote in quotes {
        match normalize_quote(quote, as_of, config) {
            Ok(odds) => out.quotes.push(PricedQuote {
                quote: quote.clone(),
                odds,
            }),
            Err(reason) => {
                warn!(
                    event = %quote.event_id,
                    book = %quote.source.key,
                    side = %quote.side_label,
                    reason = %reason,
                    "Dropping quote"
                );
                out.diagnostics.push(Diagnostic::for_quote(quote, reason));
            }
        }
    }

    out
}

fn normalize_quote(
    quote: &Quote,
    as_of: Option<OffsetDateTime>,
    config: &ScanConfig,
) -> Result<DecimalOdds, DropReason> {
    if !config.allows_bookmaker(&quote.source.key) {
        return Err(DropReason::BookmakerNotAllowed);
    }

    if let (Some(max_age), Some(as_of), Some(observed)) =
        (config.max_quote_age, as_of, quote.observed_at)
    {
        let age = as_of - observed;
        if age > max_age {
            return Err(DropReason::Stale {
                age_secs: age.whole_seconds(),
            });
        }
    }

    quote.decimal_odds().map_err(|e| DropReason::from(&e))
}
