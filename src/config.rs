//! Application configuration loaded from environment variables.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::odds::OddsFormat;

/// Smallest accepted stake rounding step.
pub const MIN_ROUND_TO: Decimal = dec!(0.01);

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Stake Allocation ===
    /// Bankroll unit split across the legs of each opportunity.
    #[serde(default = "default_unit_size")]
    pub unit_size: Decimal,

    /// Stakes are rounded to the nearest multiple of this amount.
    #[serde(default = "default_round_to")]
    pub round_to: Decimal,

    /// What to do when rounding collapses a stake: "report" or "suppress".
    #[serde(default = "default_degenerate_stakes")]
    pub degenerate_stakes: String,

    // === Detection ===
    /// Absolute tolerance when matching lines (0 = exact).
    #[serde(default)]
    pub line_tolerance: Decimal,

    /// Minimum profit margin (percent) to report an opportunity.
    #[serde(default)]
    pub min_margin_pct: Decimal,

    /// Bookmaker keys to consider (comma-separated, unset = all).
    #[serde(default)]
    pub allowed_bookmakers: Option<Vec<String>>,

    /// Drop quotes older than this many seconds relative to the snapshot.
    #[serde(default)]
    pub max_quote_age_secs: Option<u64>,

    // === Reporting ===
    /// Opportunities to show per sport.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Price format of odds-api style feeds: "american" or "decimal".
    #[serde(default = "default_odds_format")]
    pub odds_format: String,

    // === Server Configuration ===
    /// HTTP server port for health/metrics/scan endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_unit_size() -> Decimal {
    Decimal::new(1000, 0) // $1000
}

fn default_round_to() -> Decimal {
    Decimal::new(5, 0) // $5
}

fn default_degenerate_stakes() -> String {
    "report".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_odds_format() -> String {
    "american".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unit_size: default_unit_size(),
            round_to: default_round_to(),
            degenerate_stakes: default_degenerate_stakes(),
            line_tolerance: Decimal::ZERO,
            min_margin_pct: Decimal::ZERO,
            allowed_bookmakers: None,
            max_quote_age_secs: None,
            top_n: default_top_n(),
            odds_format: default_odds_format(),
            port: default_port(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.unit_size <= Decimal::ZERO {
            return Err("UNIT_SIZE must be positive".to_string());
        }

        if self.round_to <= Decimal::ZERO {
            return Err("ROUND_TO must be positive".to_string());
        }

        if self.round_to < MIN_ROUND_TO {
            return Err(format!("ROUND_TO must be at least {}", MIN_ROUND_TO));
        }

        if self.round_to > self.unit_size {
            return Err("ROUND_TO must not exceed UNIT_SIZE".to_string());
        }

        if self.line_tolerance < Decimal::ZERO {
            return Err("LINE_TOLERANCE must not be negative".to_string());
        }

        if self.min_margin_pct < Decimal::ZERO || self.min_margin_pct >= Decimal::ONE_HUNDRED {
            return Err("MIN_MARGIN_PCT must be in [0, 100)".to_string());
        }

        if self.top_n == 0 {
            return Err("TOP_N must be at least 1".to_string());
        }

        if matches!(&self.allowed_bookmakers, Some(books) if books.iter().all(|b| b.trim().is_empty()))
        {
            return Err("ALLOWED_BOOKMAKERS is set but empty".to_string());
        }

        self.max_quote_age()?;
        self.degenerate_policy()?;
        self.odds_format()?;

        Ok(())
    }

    /// Parsed degenerate-stake policy.
    pub fn degenerate_policy(&self) -> Result<DegeneratePolicy, String> {
        DegeneratePolicy::from_str(&self.degenerate_stakes)
            .map_err(|_| format!("DEGENERATE_STAKES must be report or suppress, got {:?}", self.degenerate_stakes))
    }

    /// Parsed odds format for odds-api style feeds.
    pub fn odds_format(&self) -> Result<OddsFormat, String> {
        OddsFormat::from_str(&self.odds_format)
            .map_err(|_| format!("ODDS_FORMAT must be american or decimal, got {:?}", self.odds_format))
    }

    /// Staleness limit, `None` when unset.
    pub fn max_quote_age(&self) -> Result<Option<time::Duration>, String> {
        self.max_quote_age_secs
            .map(|secs| {
                i64::try_from(secs)
                    .map(time::Duration::seconds)
                    .map_err(|_| format!("MAX_QUOTE_AGE_SECS is out of range: {}", secs))
            })
            .transpose()
    }

    /// Engine policy derived from this configuration.
    pub fn scan_config(&self) -> Result<ScanConfig, String> {
        self.validate()?;

        Ok(ScanConfig {
            unit_size: self.unit_size,
            round_to: self.round_to,
            line_tolerance: self.line_tolerance,
            min_margin_pct: self.min_margin_pct,
            allowed_bookmakers: self.allowed_bookmakers.as_ref().map(|books| {
                books
                    .iter()
                    .map(|b| b.trim().to_ascii_lowercase())
                    .filter(|b| !b.is_empty())
                    .collect()
            }),
            max_quote_age: self.max_quote_age()?,
            degenerate_stakes: self.degenerate_policy()?,
        })
    }
}

/// Handling of opportunities whose rounded stakes collapse or lose money.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DegeneratePolicy {
    /// Report the opportunity without an allocation.
    #[default]
    Report,
    /// Drop the opportunity.
    Suppress,
}

/// Policy threaded through a single scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Bankroll unit per opportunity.
    pub unit_size: Decimal,
    /// Stake rounding step.
    pub round_to: Decimal,
    /// Line matching tolerance.
    pub line_tolerance: Decimal,
    /// Minimum margin (percent) to report.
    pub min_margin_pct: Decimal,
    /// Lowercased bookmaker keys to keep, `None` keeps all.
    pub allowed_bookmakers: Option<Vec<String>>,
    /// Maximum quote age relative to the batch snapshot time.
    pub max_quote_age: Option<time::Duration>,
    /// Degenerate stake handling.
    pub degenerate_stakes: DegeneratePolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            unit_size: default_unit_size(),
            round_to: default_round_to(),
            line_tolerance: Decimal::ZERO,
            min_margin_pct: Decimal::ZERO,
            allowed_bookmakers: None,
            max_quote_age: None,
            degenerate_stakes: DegeneratePolicy::Report,
        }
    }
}

impl ScanConfig {
    /// Whether quotes from this bookmaker are considered.
    pub fn allows_bookmaker(&self, key: &str) -> bool {
        match &self.allowed_bookmakers {
            Some(books) => books.iter().any(|b| b.eq_ignore_ascii_case(key.trim())),
            None => true,
        }
    }
}
