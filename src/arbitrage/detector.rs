//! Arbitrage opportunity detection over quote batches.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, info, instrument, warn};

use super::calculator::{calculate_opportunity, combined_implied_probability, evaluate, Opportunity};
use super::diagnostic::Diagnostic;
use super::grouper::{group_quotes, three_way_events, OutcomeGroup};
use super::normalize::normalize_quotes;
use super::selector::select_best;
use crate::config::{DegeneratePolicy, ScanConfig};
use crate::error::{ScanError, StakeError};
use crate::market::{QuoteBatch, Side};
use crate::metrics;

/// Counters for one or more scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Quotes received.
    pub quotes_received: usize,
    /// Quotes dropped with a diagnostic.
    pub quotes_dropped: usize,
    /// Complete groups evaluated.
    pub groups_evaluated: usize,
    /// Groups skipped for missing a side.
    pub groups_incomplete: usize,
    /// Opportunities reported.
    pub opportunities: usize,
    /// Opportunities whose rounded stakes collapsed or lost money.
    pub degenerate_allocations: usize,
}

impl AddAssign for ScanStats {
    fn add_assign(&mut self, other: Self) {
        self.quotes_received += other.quotes_received;
        self.quotes_dropped += other.quotes_dropped;
        self.groups_evaluated += other.groups_evaluated;
        self.groups_incomplete += other.groups_incomplete;
        self.opportunities += other.opportunities;
        self.degenerate_allocations += other.degenerate_allocations;
    }
}

/// Ranked opportunities and drop diagnostics for a scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Opportunities, best margin first.
    pub opportunities: Vec<Opportunity>,
    /// Quotes dropped before evaluation.
    pub diagnostics: Vec<Diagnostic>,
    /// Scan counters.
    pub stats: ScanStats,
}

impl ScanReport {
    /// Whether no opportunity was found.
    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }

    /// Best `n` opportunities overall.
    pub fn top(&self, n: usize) -> &[Opportunity] {
        &self.opportunities[..n.min(self.opportunities.len())]
    }

    /// Best `n` opportunities per sport.
    pub fn top_by_sport(&self, n: usize) -> BTreeMap<&str, Vec<&Opportunity>> {
        let mut by_sport: BTreeMap<&str, Vec<&Opportunity>> = BTreeMap::new();
        for opp in &self.opportunities {
            let entry = by_sport.entry(opp.sport()).or_default();
            if entry.len() < n {
                entry.push(opp);
            }
        }
        by_sport
    }

    /// Opportunities for one sport, best first.
    pub fn for_sport<'a>(&'a self, sport: &'a str) -> impl Iterator<Item = &'a Opportunity> + 'a {
        self.opportunities.iter().filter(move |o| o.sport() == sport)
    }
}

/// Sort by margin descending, ties by group key. Stable.
pub fn rank_opportunities(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(|a, b| {
        b.profit_margin_pct
            .cmp(&a.profit_margin_pct)
            .then_with(|| a.key.cmp(&b.key))
    });
}

/// Merge independently produced reports into one ranked report.
///
/// Input order is preserved for fully tied opportunities, so merging the same
/// reports in the same order always yields the same output.
pub fn merge_reports<I>(reports: I) -> ScanReport
where
    I: IntoIterator<Item = ScanReport>,
{
    let mut merged = ScanReport::default();
    for report in reports {
        merged.opportunities.extend(report.opportunities);
        merged.diagnostics.extend(report.diagnostics);
        merged.stats += report.stats;
    }
    rank_opportunities(&mut merged.opportunities);
    merged
}

/// Runs the detection pipeline over quote batches.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner with the given policy.
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Policy in effect.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Normalize, group, evaluate and rank one batch.
    ///
    /// Bad quotes and incomplete groups only shrink the candidate set. The
    /// scan fails only when a non-empty batch has no structurally valid quote.
    #[instrument(skip_all, fields(quotes = batch.quotes.len(), events = batch.events.len()))]
    pub fn scan(&self, batch: &QuoteBatch) -> Result<ScanReport, ScanError> {
        let _timer = metrics::timer_scan();

        let mut stats = ScanStats {
            quotes_received: batch.quotes.len(),
            ..ScanStats::default()
        };
        metrics::inc_quotes_ingested(batch.quotes.len());

        let normalized = normalize_quotes(&batch.quotes, batch.as_of, &self.config);
        for diagnostic in &normalized.diagnostics {
            metrics::inc_quotes_dropped(diagnostic.reason.as_ref());
        }

        if !batch.is_empty()
            && normalized.quotes.is_empty()
            && normalized.diagnostics.iter().all(|d| d.reason.is_structural())
        {
            warn!(
                rejected = normalized.diagnostics.len(),
                "Every quote in batch was rejected"
            );
            return Err(ScanError::NoUsableQuotes {
                rejected: normalized.diagnostics.len(),
            });
        }

        let mut diagnostics = normalized.diagnostics;
        let three_way = three_way_events(&batch.quotes, &batch.events);
        let grouping = group_quotes(
            normalized.quotes,
            &batch.events,
            &three_way,
            self.config.line_tolerance,
        );
        for diagnostic in &grouping.diagnostics {
            metrics::inc_quotes_dropped(diagnostic.reason.as_ref());
        }
        diagnostics.extend(grouping.diagnostics);

        stats.quotes_dropped = diagnostics.len();
        stats.groups_evaluated = grouping.groups.len();
        stats.groups_incomplete = grouping.incomplete;
        metrics::inc_groups_evaluated(grouping.groups.len());
        metrics::inc_groups_incomplete(grouping.incomplete);

        let mut opportunities = Vec::new();
        for group in &grouping.groups {
            match check_group(group, &self.config) {
                Ok(Some(opp)) => {
                    if opp.allocation.is_none() {
                        stats.degenerate_allocations += 1;
                    }
                    opportunities.push(opp);
                }
                Ok(None) => {}
                Err(e) if e.is_rounding_failure() => stats.degenerate_allocations += 1,
                Err(e) => {
                    warn!(
                        event = %group.key.event_id,
                        market = %group.key.market,
                        error = %e,
                        "Stake allocation failed"
                    );
                }
            }
        }

        rank_opportunities(&mut opportunities);
        stats.opportunities = opportunities.len();

        info!(
            opportunities = stats.opportunities,
            groups = stats.groups_evaluated,
            incomplete = stats.groups_incomplete,
            dropped = stats.quotes_dropped,
            "Scan complete"
        );

        Ok(ScanReport {
            opportunities,
            diagnostics,
            stats,
        })
    }
}

/// Scan independent batches on blocking tasks, returning results in input order.
pub async fn scan_parallel(
    scanner: Arc<Scanner>,
    batches: Vec<QuoteBatch>,
) -> Vec<Result<ScanReport, ScanError>> {
    let tasks = batches.into_iter().map(|batch| {
        let scanner = Arc::clone(&scanner);
        tokio::task::spawn_blocking(move || scanner.scan(&batch))
    });

    join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap_or_else(|e| Err(ScanError::TaskFailed(e.to_string()))))
        .collect()
}

/// Check one outcome group for an arbitrage opportunity.
///
/// An allocation that rounding collapses ([`StakeError::DegenerateStake`]) or
/// turns into a loss ([`StakeError::RoundingLoss`]) is not actionable. With
/// [`DegeneratePolicy::Report`] the opportunity is still returned, without
/// stakes. With [`DegeneratePolicy::Suppress`] the error is returned instead.
#[instrument(skip_all, fields(event = %group.key.event_id, market = %group.key.market, line = ?group.key.line))]
pub fn check_group(
    group: &OutcomeGroup,
    config: &ScanConfig,
) -> Result<Option<Opportunity>, StakeError> {
    if let Err(e) = group.ensure_complete() {
        debug!(error = %e, "Group is not exhaustive");
        return Ok(None);
    }

    let legs = select_best(group);

    let Some(evaluation) = evaluate(&legs, config.min_margin_pct) else {
        debug!(
            diagnosis = %diagnose_group(group, config.min_margin_pct),
            "No arbitrage opportunity"
        );
        return Ok(None);
    };

    let (opportunity, error) =
        calculate_opportunity(&group.key, &group.event, legs, evaluation, config);

    match error {
        None => {
            info!(
                matchup = %opportunity.event.matchup(),
                implied = %opportunity.combined_implied_probability,
                margin_pct = %opportunity.profit_margin_pct,
                profit = ?opportunity.guaranteed_profit(),
                "Arbitrage opportunity detected"
            );
            metrics::inc_opportunities_detected(opportunity.sport());
            Ok(Some(opportunity))
        }
        Some(err) if err.is_rounding_failure() => {
            metrics::inc_degenerate_allocations();
            match config.degenerate_stakes {
                DegeneratePolicy::Report => {
                    warn!(
                        margin_pct = %opportunity.profit_margin_pct,
                        error = %err,
                        "Opportunity reported without stakes"
                    );
                    metrics::inc_opportunities_detected(opportunity.sport());
                    Ok(Some(opportunity))
                }
                DegeneratePolicy::Suppress => {
                    warn!(
                        margin_pct = %opportunity.profit_margin_pct,
                        error = %err,
                        "Opportunity suppressed"
                    );
                    Err(err)
                }
            }
        }
        Some(err) => Err(err),
    }
}

/// Get diagnostic information about why a group has no opportunity.
pub fn diagnose_group(group: &OutcomeGroup, min_margin_pct: Decimal) -> NoOpportunityDiagnosis {
    let legs = select_best(group);

    let best_prices = legs
        .iter()
        .map(|leg| BestPrice {
            side: leg.side,
            odds: leg.odds.value(),
            bookmaker: leg.bookmaker().to_string(),
        })
        .collect();

    let missing_sides = group
        .required_sides()
        .into_iter()
        .filter(|side| !legs.iter().any(|l| l.side == *side))
        .collect();

    let combined = (legs.len() >= 2).then(|| combined_implied_probability(legs.iter().map(|l| &l.odds)));

    NoOpportunityDiagnosis {
        best_prices,
        missing_sides,
        combined_implied_probability: combined,
        min_margin_pct,
    }
}

/// Best price seen on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestPrice {
    /// Side.
    pub side: Side,
    /// Decimal odds.
    pub odds: Decimal,
    /// Bookmaker offering them.
    pub bookmaker: String,
}

/// Diagnostic information for debugging.
#[derive(Debug, Clone)]
pub struct NoOpportunityDiagnosis {
    /// Best price per populated side.
    pub best_prices: SmallVec<[BestPrice; 3]>,
    /// Required sides with no quote.
    pub missing_sides: SmallVec<[Side; 3]>,
    /// Sum of implied probabilities of the best prices.
    pub combined_implied_probability: Option<Decimal>,
    /// Minimum margin required.
    pub min_margin_pct: Decimal,
}

impl fmt::Display for NoOpportunityDiagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, price) in self.best_prices.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{}={} ({})", price.side, price.odds, price.bookmaker)?;
        }
        write!(
            f,
            " | implied={} (min margin={}%)",
            self.combined_implied_probability
                .map(|d| d.round_dp(4).to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            self.min_margin_pct,
        )?;
        if !self.missing_sides.is_empty() {
            let missing: Vec<String> = self.missing_sides.iter().map(Side::to_string).collect();
            write!(f, " | missing: {}", missing.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::diagnostic::DropReason;
    use crate::market::MockBatchBuilder;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn scanner() -> Scanner {
        Scanner::new(ScanConfig::default())
    }

    fn arb_batch() -> QuoteBatch {
        MockBatchBuilder::new()
            .event("ev1", "baseball_mlb", "Yankees", "Red Sox")
            .moneyline("ev1", "fanduel", "Yankees", dec!(150))
            .moneyline("ev1", "draftkings", "Yankees", dec!(130))
            .moneyline("ev1", "draftkings", "Red Sox", dec!(-120))
            .moneyline("ev1", "fanduel", "Red Sox", dec!(-150))
            .build()
    }

    #[test]
    fn scan_finds_moneyline_arbitrage() {
        let report = scanner().scan(&arb_batch()).unwrap();

        assert_eq!(report.opportunities.len(), 1);
        let opp = &report.opportunities[0];
        assert_eq!(opp.leg(Side::Home).unwrap().bookmaker(), "fanduel");
        assert_eq!(opp.leg(Side::Away).unwrap().bookmaker(), "draftkings");
        assert!((opp.profit_margin_pct - dec!(5.4545)).abs() < dec!(0.001));

        let allocation = opp.allocation.as_ref().unwrap();
        assert_eq!(allocation.stake_for(Side::Home), Some(dec!(425)));
        assert_eq!(allocation.stake_for(Side::Away), Some(dec!(575)));
        assert!(allocation.guaranteed_profit >= Decimal::ZERO);

        assert_eq!(
            report.stats,
            ScanStats {
                quotes_received: 4,
                quotes_dropped: 0,
                groups_evaluated: 1,
                groups_incomplete: 0,
                opportunities: 1,
                degenerate_allocations: 0,
            }
        );
    }

    #[test]
    fn standard_vig_yields_empty_report() {
        let batch = MockBatchBuilder::new()
            .event("ev1", "basketball_nba", "Lakers", "Celtics")
            .moneyline("ev1", "fanduel", "Lakers", dec!(-110))
            .moneyline("ev1", "draftkings", "Celtics", dec!(-110))
            .build();

        let report = scanner().scan(&batch).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.stats.groups_evaluated, 1);
    }

    #[test]
    fn mismatched_total_lines_never_pair() {
        let batch = MockBatchBuilder::new()
            .event("ev1", "baseball_mlb", "Yankees", "Red Sox")
            .total("ev1", "fanduel", "Over", dec!(8.5), dec!(200))
            .total("ev1", "draftkings", "Under", dec!(9.0), dec!(200))
            .build();

        let report = scanner().scan(&batch).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.stats.groups_incomplete, 2);
    }

    #[test]
    fn mismatched_spread_lines_never_pair() {
        let batch = MockBatchBuilder::new()
            .event("ev1", "americanfootball_nfl", "Chiefs", "Bills")
            .spread("ev1", "fanduel", "Chiefs", dec!(-3.5), dec!(200))
            .spread("ev1", "draftkings", "Bills", dec!(3.0), dec!(200))
            .build();

        let report = scanner().scan(&batch).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.stats.groups_evaluated, 0);
    }

    #[test]
    fn opportunities_ranked_by_margin_then_key() {
        let batch = MockBatchBuilder::new()
            .event("ev2", "basketball_nba", "Lakers", "Celtics")
            .event("ev1", "basketball_nba", "Knicks", "Nets")
            .event("ev3", "basketball_nba", "Bulls", "Heat")
            .moneyline_decimal("ev2", "fanduel", "Lakers", dec!(2.1))
            .moneyline_decimal("ev2", "betmgm", "Celtics", dec!(2.1))
            .moneyline_decimal("ev1", "fanduel", "Knicks", dec!(2.1))
            .moneyline_decimal("ev1", "betmgm", "Nets", dec!(2.1))
            .moneyline_decimal("ev3", "fanduel", "Bulls", dec!(2.3))
            .moneyline_decimal("ev3", "betmgm", "Heat", dec!(2.3))
            .build();

        let report = scanner().scan(&batch).unwrap();

        let order: Vec<&str> = report
            .opportunities
            .iter()
            .map(|o| o.key.event_id.as_str())
            .collect();
        assert_eq!(order, vec!["ev3", "ev1", "ev2"]);
    }

    #[test]
    fn empty_batch_is_not_an_error() {
        let report = scanner().scan(&QuoteBatch::default()).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn batch_with_only_invalid_quotes_aborts() {
        let batch = MockBatchBuilder::new()
            .event("ev1", "baseball_mlb", "Yankees", "Red Sox")
            .moneyline("ev1", "fanduel", "Yankees", dec!(0))
            .moneyline_decimal("ev1", "betmgm", "Red Sox", dec!(0.5))
            .build();

        let result = scanner().scan(&batch);

        assert_eq!(result.unwrap_err(), ScanError::NoUsableQuotes { rejected: 2 });
    }

    #[test]
    fn filtered_out_batch_is_not_an_error() {
        let scanner = Scanner::new(ScanConfig {
            allowed_bookmakers: Some(vec!["pinnacle".to_string()]),
            ..ScanConfig::default()
        });

        let report = scanner.scan(&arb_batch()).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.diagnostics.len(), 4);
        assert!(report
            .diagnostics
            .iter()
            .all(|d| d.reason == DropReason::BookmakerNotAllowed));
    }

    #[test]
    fn partial_bad_quotes_reduce_candidates_only() {
        let mut batch = arb_batch();
        batch.extend(
            MockBatchBuilder::new()
                .moneyline("ev1", "bovada", "Yankees", dec!(0))
                .moneyline("ev9", "bovada", "Nobody", dec!(120))
                .build(),
        );

        let report = scanner().scan(&batch).unwrap();

        assert_eq!(report.opportunities.len(), 1);
        let reasons: Vec<&str> = report.diagnostics.iter().map(|d| d.reason.as_ref()).collect();
        assert_eq!(reasons, vec!["invalid_odds", "unknown_event"]);
    }

    fn degenerate_batch() -> QuoteBatch {
        MockBatchBuilder::new()
            .event("ev1", "tennis_atp", "Alcaraz", "Qualifier")
            .moneyline_decimal("ev1", "fanduel", "Alcaraz", dec!(1.02))
            .moneyline_decimal("ev1", "betmgm", "Qualifier", dec!(101))
            .build()
    }

    #[test]
    fn degenerate_allocation_reported_without_stakes() {
        let scanner = Scanner::new(ScanConfig {
            unit_size: dec!(100),
            ..ScanConfig::default()
        });

        let report = scanner.scan(&degenerate_batch()).unwrap();

        assert_eq!(report.opportunities.len(), 1);
        assert_eq!(report.opportunities[0].allocation, None);
        assert_eq!(report.stats.degenerate_allocations, 1);
    }

    #[test]
    fn degenerate_allocation_suppressed_by_policy() {
        let scanner = Scanner::new(ScanConfig {
            unit_size: dec!(100),
            degenerate_stakes: DegeneratePolicy::Suppress,
            ..ScanConfig::default()
        });

        let report = scanner.scan(&degenerate_batch()).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.stats.degenerate_allocations, 1);
    }

    #[test]
    fn rounding_loss_never_reports_negative_profit() {
        let batch = MockBatchBuilder::new()
            .event("ev1", "tennis_atp", "Sinner", "Zverev")
            .moneyline_decimal("ev1", "fanduel", "Sinner", dec!(1.5))
            .moneyline_decimal("ev1", "betmgm", "Zverev", dec!(3.01))
            .build();

        let report = scanner().scan(&batch).unwrap();

        assert_eq!(report.opportunities.len(), 1);
        assert_eq!(report.opportunities[0].allocation, None);
        assert_eq!(report.stats.degenerate_allocations, 1);

        let suppressing = Scanner::new(ScanConfig {
            degenerate_stakes: DegeneratePolicy::Suppress,
            ..ScanConfig::default()
        });
        assert!(suppressing.scan(&batch).unwrap().is_empty());
    }

    #[test]
    fn filtered_draw_does_not_fake_two_way_arbitrage() {
        let batch = MockBatchBuilder::new()
            .event("ev1", "soccer_epl", "Arsenal", "Chelsea")
            .moneyline_decimal("ev1", "fanduel", "Arsenal", dec!(2.5))
            .moneyline_decimal("ev1", "draftkings", "Chelsea", dec!(3.0))
            .moneyline_decimal("ev1", "bovada", "Draw", dec!(3.4))
            .build();

        let all_books = scanner().scan(&batch).unwrap();
        assert!(all_books.is_empty());
        assert_eq!(all_books.stats.groups_evaluated, 1);

        let scanner = Scanner::new(ScanConfig {
            allowed_bookmakers: Some(vec!["fanduel".to_string(), "draftkings".to_string()]),
            ..ScanConfig::default()
        });
        let report = scanner.scan(&batch).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.stats.groups_evaluated, 0);
        assert_eq!(report.stats.groups_incomplete, 1);
    }

    #[test]
    fn top_by_sport_limits_each_scope() {
        let batch = MockBatchBuilder::new()
            .event("nba1", "basketball_nba", "Lakers", "Celtics")
            .event("nba2", "basketball_nba", "Knicks", "Nets")
            .event("mlb1", "baseball_mlb", "Yankees", "Red Sox")
            .moneyline_decimal("nba1", "fanduel", "Lakers", dec!(2.2))
            .moneyline_decimal("nba1", "betmgm", "Celtics", dec!(2.2))
            .moneyline_decimal("nba2", "fanduel", "Knicks", dec!(2.1))
            .moneyline_decimal("nba2", "betmgm", "Nets", dec!(2.1))
            .moneyline_decimal("mlb1", "fanduel", "Yankees", dec!(2.05))
            .moneyline_decimal("mlb1", "betmgm", "Red Sox", dec!(2.05))
            .build();

        let report = scanner().scan(&batch).unwrap();
        let top = report.top_by_sport(1);

        assert_eq!(top.len(), 2);
        assert_eq!(top["basketball_nba"].len(), 1);
        assert_eq!(top["basketball_nba"][0].key.event_id, "nba1");
        assert_eq!(top["baseball_mlb"][0].key.event_id, "mlb1");
        assert_eq!(report.top(2).len(), 2);
        assert_eq!(report.top(10).len(), 3);
        assert_eq!(report.for_sport("basketball_nba").count(), 2);
    }

    #[test]
    fn merge_reports_is_deterministic() {
        let scanner = scanner();
        let a = scanner.scan(&arb_batch()).unwrap();
        let b = scanner
            .scan(
                &MockBatchBuilder::new()
                    .event("ev0", "baseball_mlb", "Mets", "Braves")
                    .moneyline("ev0", "fanduel", "Mets", dec!(150))
                    .moneyline("ev0", "draftkings", "Braves", dec!(-120))
                    .build(),
            )
            .unwrap();

        let merged = merge_reports(vec![a.clone(), b.clone()]);
        let reversed = merge_reports(vec![b, a]);

        let ids = |r: &ScanReport| -> Vec<String> {
            r.opportunities.iter().map(|o| o.key.event_id.clone()).collect()
        };
        assert_eq!(ids(&merged), vec!["ev0".to_string(), "ev1".to_string()]);
        assert_eq!(ids(&merged), ids(&reversed));
        assert_eq!(merged.stats.quotes_received, 6);
    }

    #[test]
    fn diagnosis_explains_missing_edge() {
        let batch = MockBatchBuilder::new()
            .event("ev1", "basketball_nba", "Lakers", "Celtics")
            .moneyline_decimal("ev1", "fanduel", "Lakers", dec!(1.9))
            .moneyline_decimal("ev1", "betmgm", "Celtics", dec!(1.9))
            .build();
        let normalized = normalize_quotes(&batch.quotes, None, &ScanConfig::default());
        let three_way = three_way_events(&batch.quotes, &batch.events);
        let grouping = group_quotes(normalized.quotes, &batch.events, &three_way, Decimal::ZERO);

        let diagnosis = diagnose_group(&grouping.groups[0], Decimal::ZERO);

        assert!(diagnosis.missing_sides.is_empty());
        assert_eq!(
            diagnosis.to_string(),
            "home=1.9 (fanduel) + away=1.9 (betmgm) | implied=1.0526 (min margin=0%)"
        );
    }

    #[tokio::test]
    async fn scan_parallel_keeps_input_order() {
        let scanner = Arc::new(scanner());
        let invalid = MockBatchBuilder::new()
            .moneyline("ev1", "fanduel", "Yankees", dec!(50))
            .build();

        let results = scan_parallel(scanner, vec![arb_batch(), invalid, QuoteBatch::default()]).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().opportunities.len(), 1);
        assert!(matches!(results[1], Err(ScanError::NoUsableQuotes { rejected: 1 })));
        assert!(results[2].as_ref().unwrap().is_empty());
    }
}
