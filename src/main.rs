//! Sportsbook arbitrage scanner entry point.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sportsbook_arb::api::{create_router, AppState};
use sportsbook_arb::arbitrage::{merge_reports, scan_parallel, Opportunity, ScanReport, Scanner};
use sportsbook_arb::config::Config;
use sportsbook_arb::feed::{parse_feed, FeedFormat};
use sportsbook_arb::market::QuoteBatch;
use sportsbook_arb::metrics;
use sportsbook_arb::odds::{format_american, OddsFormat};
use sportsbook_arb::utils::shutdown_signal;

/// Cross-bookmaker sports betting arbitrage scanner.
#[derive(Parser, Debug)]
#[command(name = "sportsbook-arb")]
#[command(about = "Find guaranteed-profit stake splits across sportsbooks")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan odds files for arbitrage opportunities.
    Scan {
        /// Feed files to scan (each is scanned independently).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Input layout.
        #[arg(long, default_value_t = FeedFormat::Native)]
        format: FeedFormat,

        /// Price format of odds-api files (defaults to ODDS_FORMAT).
        #[arg(long)]
        odds_format: Option<OddsFormat>,

        /// Only report this sport key.
        #[arg(long)]
        sport: Option<String>,

        /// Opportunities per sport (defaults to TOP_N).
        #[arg(long)]
        top: Option<usize>,

        /// Bankroll unit per opportunity (defaults to UNIT_SIZE).
        #[arg(long)]
        unit: Option<Decimal>,

        /// Stake rounding step (defaults to ROUND_TO).
        #[arg(long)]
        round_to: Option<Decimal>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Serve the HTTP scan API.
    Serve {
        /// HTTP server port (defaults to PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("sportsbook_arb=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(args.json_logs.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!args.json_logs).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();

    // Handle subcommands
    match args.command {
        Command::CheckConfig => cmd_check_config(),
        Command::Scan {
            files,
            format,
            odds_format,
            sport,
            top,
            unit,
            round_to,
            json,
        } => {
            metrics::init_metrics();
            let overrides = ScanOverrides {
                odds_format,
                top,
                unit,
                round_to,
            };
            cmd_scan(files, format, overrides, sport, json).await
        }
        Command::Serve { port } => cmd_serve(port).await,
    }
}

/// CLI values that take precedence over the environment.
struct ScanOverrides {
    odds_format: Option<OddsFormat>,
    top: Option<usize>,
    unit: Option<Decimal>,
    round_to: Option<Decimal>,
}

fn load_config() -> anyhow::Result<Config> {
    Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration load failed: {}", e)
    })
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SPORTSBOOK ARB - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Unit Size: {}", config.unit_size);
    println!("  Round To: {}", config.round_to);
    println!("  Degenerate Stakes: {}", config.degenerate_stakes);
    println!("  Line Tolerance: {}", config.line_tolerance);
    println!("  Min Margin: {}%", config.min_margin_pct);
    match &config.allowed_bookmakers {
        Some(books) => println!("  Bookmakers: {}", books.join(", ")),
        None => println!("  Bookmakers: all"),
    }
    match config.max_quote_age_secs {
        Some(secs) => println!("  Max Quote Age: {}s", secs),
        None => println!("  Max Quote Age: unlimited"),
    }
    println!("  Top N: {}", config.top_n);
    println!("  Odds Format: {}", config.odds_format);
    println!("  Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Scan feed files and print the best opportunities per sport.
async fn cmd_scan(
    files: Vec<PathBuf>,
    format: FeedFormat,
    overrides: ScanOverrides,
    sport: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(unit) = overrides.unit {
        config.unit_size = unit;
    }
    if let Some(round_to) = overrides.round_to {
        config.round_to = round_to;
    }
    if let Some(top) = overrides.top {
        config.top_n = top;
    }
    if let Some(odds_format) = overrides.odds_format {
        config.odds_format = odds_format.to_string();
    }

    let scan_config = config
        .scan_config()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;
    let odds_format = config.odds_format().map_err(|e| anyhow::anyhow!(e))?;

    // Parse every file up front
    let mut batches: Vec<QuoteBatch> = Vec::with_capacity(files.len());
    let mut feed_diagnostics = Vec::new();
    for path in &files {
        let contents = tokio::fs::read_to_string(path).await?;
        match parse_feed(&contents, format, odds_format) {
            Ok((batch, diagnostics)) => {
                info!(
                    file = %path.display(),
                    events = batch.events.len(),
                    quotes = batch.quotes.len(),
                    "Loaded feed"
                );
                feed_diagnostics.extend(diagnostics);
                batches.push(batch);
            }
            Err(e) => error!(file = %path.display(), error = %e, "Failed to parse feed"),
        }
    }

    if batches.is_empty() {
        return Err(anyhow::anyhow!("No feed file could be parsed"));
    }

    let scanner = Arc::new(Scanner::new(scan_config));
    let results = scan_parallel(scanner, batches).await;

    let mut reports = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => warn!(error = %e, "Batch rejected"),
        }
    }
    if reports.is_empty() {
        return Err(anyhow::anyhow!("Every batch was rejected"));
    }

    let mut report = merge_reports(reports);
    report.stats.quotes_received += feed_diagnostics.len();
    report.stats.quotes_dropped += feed_diagnostics.len();
    feed_diagnostics.append(&mut report.diagnostics);
    report.diagnostics = feed_diagnostics;

    if let Some(sport) = &sport {
        report.opportunities.retain(|o| o.sport() == sport);
        report.stats.opportunities = report.opportunities.len();
    }

    if json {
        print_json(&report, config.top_n)?;
    } else {
        print_report(&report, config.top_n);
    }

    Ok(())
}

fn print_json(report: &ScanReport, top_n: usize) -> anyhow::Result<()> {
    let top: BTreeMap<&str, Vec<&Opportunity>> = report.top_by_sport(top_n);
    let body = serde_json::json!({
        "stats": report.stats,
        "opportunities": top,
        "diagnostics": report.diagnostics,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn print_report(report: &ScanReport, top_n: usize) {
    println!("======================================================================");
    println!("SPORTSBOOK ARB - SCAN RESULTS");
    println!("======================================================================");
    println!(
        "Quotes: {} received, {} dropped | Groups: {} evaluated, {} incomplete",
        report.stats.quotes_received,
        report.stats.quotes_dropped,
        report.stats.groups_evaluated,
        report.stats.groups_incomplete,
    );

    if report.is_empty() {
        println!("----------------------------------------------------------------------");
        println!("No arbitrage opportunities found.");
    }

    for (sport, opportunities) in report.top_by_sport(top_n) {
        println!("----------------------------------------------------------------------");
        println!("{} (top {})", sport, opportunities.len());
        for opp in opportunities {
            print_opportunity(opp);
        }
    }

    if !report.diagnostics.is_empty() {
        println!("----------------------------------------------------------------------");
        println!("Dropped quotes: {}", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            println!("  {}", diagnostic);
        }
    }
    println!("======================================================================");
}

fn print_opportunity(opp: &Opportunity) {
    let line = opp
        .key
        .line
        .map(|l| format!(" {}", l.normalize()))
        .unwrap_or_default();
    let subject = opp
        .key
        .subject
        .as_deref()
        .map(|s| format!(" [{}]", s))
        .unwrap_or_default();

    println!(
        "\n  {} | {}{}{} | margin {}% | implied {}",
        opp.event.matchup(),
        opp.key.market,
        subject,
        line,
        opp.profit_margin_pct.round_dp(2),
        opp.combined_implied_probability.round_dp(4),
    );

    for leg in &opp.legs {
        let american = leg
            .odds
            .to_american()
            .map(format_american)
            .unwrap_or_else(|_| "N/A".to_string());
        let stake = opp
            .allocation
            .as_ref()
            .and_then(|a| a.stakes.iter().find(|s| s.side == leg.side))
            .map(|s| format!("stake {} -> {}", s.stake, s.payout.round_dp(2)))
            .unwrap_or_else(|| "stake N/A".to_string());
        println!(
            "    {:<5} {:<24} {:>6} ({}) @ {:<14} {}",
            leg.side.to_string(),
            leg.quote.side_label,
            american,
            leg.odds,
            leg.bookmaker(),
            stake,
        );
    }

    match &opp.allocation {
        Some(allocation) => println!(
            "    guaranteed profit {} on {} ({}%)",
            allocation.guaranteed_profit.round_dp(2),
            allocation.total_stake,
            allocation.roi().round_dp(2),
        ),
        None => println!("    rounded stakes are not actionable; raise the unit or lower the step"),
    }
}

/// Serve the HTTP scan API until shutdown.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let config = load_config()?;
    let port = port_override.unwrap_or(config.port);

    // Validate configuration
    let scan_config = config.scan_config().map_err(|e| {
        error!("Invalid configuration: {}", e);
        anyhow::anyhow!("Configuration validation failed: {}", e)
    })?;

    info!("Configuration loaded successfully");
    info!("Unit size: {} (rounded to {})", scan_config.unit_size, scan_config.round_to);
    info!("Degenerate stakes: {}", scan_config.degenerate_stakes);

    // Create app state
    let mut app_state = AppState::new(Scanner::new(scan_config), config.top_n);
    match metrics::install_prometheus() {
        Ok(handle) => app_state = app_state.with_prometheus(handle),
        Err(e) => warn!("Prometheus recorder unavailable: {}", e),
    }

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());
    app_state.set_ready(true);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
