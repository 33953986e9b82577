//! Integration tests for the sportsbook arbitrage scanner.
//!
//! These tests drive the public pipeline from feed JSON to ranked reports.
//! Run with: cargo test --test integration

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sportsbook_arb::arbitrage::{merge_reports, scan_parallel, DropReason, ScanReport, Scanner};
use sportsbook_arb::config::{Config, ScanConfig};
use sportsbook_arb::feed::{parse_feed, FeedFormat};
use sportsbook_arb::market::{MarketKind, QuoteBatch, Side};
use sportsbook_arb::odds::OddsFormat;

const NATIVE_MLB: &str = include_str!("../fixtures/native_mlb.json");
const ODDS_API_NFL: &str = include_str!("../fixtures/odds_api_nfl.json");

fn native_batch() -> QuoteBatch {
    let (batch, diagnostics) =
        parse_feed(NATIVE_MLB, FeedFormat::Native, OddsFormat::American).unwrap();
    assert!(diagnostics.is_empty());
    batch
}

fn nfl_batch() -> QuoteBatch {
    let (batch, diagnostics) =
        parse_feed(ODDS_API_NFL, FeedFormat::OddsApi, OddsFormat::American).unwrap();
    assert_eq!(diagnostics.len(), 1, "outrights market is skipped");
    batch
}

fn event_ids(report: &ScanReport) -> Vec<&str> {
    report
        .opportunities
        .iter()
        .map(|o| o.key.event_id.as_str())
        .collect()
}

#[test]
fn native_feed_end_to_end() {
    let report = Scanner::new(ScanConfig::default())
        .scan(&native_batch())
        .unwrap();

    assert_eq!(event_ids(&report), vec!["mlb-nyy-bos", "mlb-lad-sf"]);

    let best = &report.opportunities[0];
    assert_eq!(best.leg(Side::Home).unwrap().bookmaker(), "fanduel");
    assert_eq!(best.leg(Side::Away).unwrap().bookmaker(), "bovada");
    assert!((best.profit_margin_pct - dec!(6.5116)).abs() < dec!(0.001));

    let allocation = best.allocation.as_ref().unwrap();
    assert_eq!(allocation.stake_for(Side::Home), Some(dec!(430)));
    assert_eq!(allocation.stake_for(Side::Away), Some(dec!(570)));
    assert_eq!(allocation.max_payout, dec!(1075));
    assert_eq!(
        allocation.guaranteed_profit,
        allocation.min_payout - allocation.total_stake
    );
    assert!((allocation.guaranteed_profit - dec!(65.65)).abs() < dec!(0.01));

    // Over 8.5 and Under 9.0 never pair.
    assert_eq!(report.stats.groups_incomplete, 2);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        report.diagnostics[0].reason,
        DropReason::InvalidOdds { .. }
    ));
}

#[test]
fn allow_list_changes_best_prices() {
    let scanner = Scanner::new(ScanConfig {
        allowed_bookmakers: Some(vec!["fanduel".to_string(), "draftkings".to_string()]),
        ..ScanConfig::default()
    });

    let report = scanner.scan(&native_batch()).unwrap();

    assert_eq!(event_ids(&report), vec!["mlb-nyy-bos"]);
    let opp = &report.opportunities[0];
    assert!((opp.profit_margin_pct - dec!(5.4545)).abs() < dec!(0.001));

    let allocation = opp.allocation.as_ref().unwrap();
    assert_eq!(allocation.stake_for(Side::Home), Some(dec!(425)));
    assert_eq!(allocation.stake_for(Side::Away), Some(dec!(575)));
    assert!(allocation.guaranteed_profit >= Decimal::ZERO);
    assert!(allocation.guaranteed_profit < allocation.max_payout - allocation.total_stake);
}

#[test]
fn stale_quotes_are_dropped_relative_to_snapshot() {
    let scanner = Scanner::new(ScanConfig {
        max_quote_age: Some(time::Duration::minutes(10)),
        ..ScanConfig::default()
    });

    let report = scanner.scan(&native_batch()).unwrap();

    assert_eq!(event_ids(&report), vec!["mlb-nyy-bos"]);
    let reasons: Vec<&DropReason> = report.diagnostics.iter().map(|d| &d.reason).collect();
    assert_eq!(reasons[0], &DropReason::Stale { age_secs: 1800 });
    assert!(matches!(reasons[1], DropReason::InvalidOdds { .. }));
}

#[test]
fn odds_api_feed_end_to_end() {
    let report = Scanner::new(ScanConfig::default())
        .scan(&nfl_batch())
        .unwrap();

    assert_eq!(report.opportunities.len(), 2);
    assert_eq!(report.stats.groups_evaluated, 6);
    assert_eq!(report.stats.groups_incomplete, 0);

    let moneyline = &report.opportunities[0];
    assert_eq!(moneyline.key.market, MarketKind::Moneyline);
    assert_eq!(moneyline.leg(Side::Home).unwrap().bookmaker(), "FanDuel");
    assert_eq!(moneyline.leg(Side::Away).unwrap().bookmaker(), "DraftKings");

    let prop = &report.opportunities[1];
    assert_eq!(
        prop.key.market,
        MarketKind::PlayerProp("player_pass_yds".to_string())
    );
    assert_eq!(prop.key.subject.as_deref(), Some("josh allen"));
    assert_eq!(prop.key.line, Some(dec!(245.5)));
    assert_eq!(prop.leg(Side::Over).unwrap().bookmaker(), "BetMGM");
    assert_eq!(prop.leg(Side::Under).unwrap().bookmaker(), "Caesars");
    assert!((prop.profit_margin_pct - dec!(3.6005)).abs() < dec!(0.001));
}

#[tokio::test]
async fn parallel_scans_merge_deterministically() {
    let scanner = Arc::new(Scanner::new(ScanConfig::default()));

    let first = scan_parallel(Arc::clone(&scanner), vec![native_batch(), nfl_batch()]).await;
    let second = scan_parallel(scanner, vec![nfl_batch(), native_batch()]).await;

    let first = merge_reports(first.into_iter().map(Result::unwrap));
    let second = merge_reports(second.into_iter().map(Result::unwrap));

    assert_eq!(
        event_ids(&first),
        vec!["mlb-nyy-bos", "nfl-kc-buf", "nfl-kc-buf", "mlb-lad-sf"]
    );
    assert_eq!(event_ids(&first), event_ids(&second));

    let top = first.top_by_sport(1);
    assert_eq!(
        top.keys().copied().collect::<Vec<_>>(),
        vec!["americanfootball_nfl", "baseball_mlb"]
    );
    assert_eq!(top["baseball_mlb"][0].key.event_id, "mlb-nyy-bos");
}

#[test]
fn config_from_environment_drives_scan() {
    let config: Config = envy::from_iter(vec![
        ("UNIT_SIZE".to_string(), "100".to_string()),
        ("ROUND_TO".to_string(), "1".to_string()),
        ("MIN_MARGIN_PCT".to_string(), "5".to_string()),
        ("ALLOWED_BOOKMAKERS".to_string(), "FanDuel,bovada".to_string()),
    ])
    .unwrap();

    let scan_config = config.scan_config().unwrap();
    let report = Scanner::new(scan_config).scan(&native_batch()).unwrap();

    assert_eq!(event_ids(&report), vec!["mlb-nyy-bos"]);
    let allocation = report.opportunities[0].allocation.as_ref().unwrap();
    assert_eq!(allocation.total_stake, dec!(100));
    assert_eq!(allocation.stake_for(Side::Home), Some(dec!(43)));
}
