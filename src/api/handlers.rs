//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::arbitrage::{Opportunity, ScanReport, ScanStats, Scanner};
use crate::error::ScanError;
use crate::feed::RawBatch;
use crate::metrics::record_http_latency;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether the service accepts scans.
    pub ready: Arc<AtomicBool>,
    /// Scanner holding the engine policy.
    pub scanner: Arc<Scanner>,
    /// Opportunities kept per sport.
    pub top_n: usize,
    /// Running counters.
    pub stats: Arc<RwLock<ServiceStats>>,
    /// Latest top opportunities per sport.
    pub latest: Arc<DashMap<String, Vec<Opportunity>>>,
    /// Prometheus handle, when the recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

/// Counters across all scans served.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceStats {
    /// Scans that produced a report.
    pub scans_completed: u64,
    /// Scans rejected as unusable.
    pub scans_failed: u64,
    /// Accumulated scan counters.
    pub totals: ScanStats,
    /// Completion time of the last successful scan.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_scan_at: Option<OffsetDateTime>,
}

impl AppState {
    /// Create new app state.
    pub fn new(scanner: Scanner, top_n: usize) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            scanner: Arc::new(scanner),
            top_n,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
            latest: Arc::new(DashMap::new()),
            prometheus: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Replace the latest opportunities of every sport in the scanned batch.
    fn publish(&self, sports: &[String], report: &ScanReport) {
        for sport in sports {
            let top: Vec<Opportunity> = report
                .for_sport(sport)
                .take(self.top_n)
                .cloned()
                .collect();
            self.latest.insert(sport.clone(), top);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Scanner::default(), 10)
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether service is ready.
    pub ready: bool,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Sports with published opportunities.
    pub sports: Vec<String>,
    /// Statistics.
    pub stats: ServiceStats,
}

/// Opportunities for one sport.
#[derive(Debug, Serialize)]
pub struct OpportunitiesResponse {
    /// Sport key.
    pub sport: String,
    /// Best opportunities, best margin first.
    pub opportunities: Vec<Opportunity>,
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error.
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let response = ReadyResponse { ready: is_ready };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Prometheus text exposition.
pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Status handler - returns service counters.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.stats.read().await.clone();
    let mut sports: Vec<String> = state.latest.iter().map(|e| e.key().clone()).collect();
    sports.sort();

    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse {
        status,
        sports,
        stats,
    })
}

/// Scan a native batch and publish its opportunities.
pub async fn scan(
    State(state): State<AppState>,
    Json(raw): Json<RawBatch>,
) -> Result<Json<ScanReport>, ApiError> {
    let start = Instant::now();

    let (batch, feed_diagnostics) = match raw.into_batch() {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Rejecting scan request");
            state.stats.write().await.scans_failed += 1;
            return Err(api_error(StatusCode::BAD_REQUEST, e));
        }
    };

    let sports: Vec<String> = batch.events.iter().map(|e| e.sport.clone()).collect();
    let scanner = Arc::clone(&state.scanner);
    let result = tokio::task::spawn_blocking(move || scanner.scan(&batch))
        .await
        .unwrap_or_else(|e| Err(ScanError::TaskFailed(e.to_string())));

    let mut report = match result {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "Scan failed");
            state.stats.write().await.scans_failed += 1;
            let status = match e {
                ScanError::NoUsableQuotes { .. } => StatusCode::BAD_REQUEST,
                ScanError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return Err(api_error(status, e));
        }
    };

    report.stats.quotes_received += feed_diagnostics.len();
    report.stats.quotes_dropped += feed_diagnostics.len();
    let mut diagnostics = feed_diagnostics;
    diagnostics.append(&mut report.diagnostics);
    report.diagnostics = diagnostics;

    state.publish(&sports, &report);
    {
        let mut stats = state.stats.write().await;
        stats.scans_completed += 1;
        stats.totals += report.stats;
        stats.last_scan_at = Some(OffsetDateTime::now_utc());
    }

    info!(
        opportunities = report.opportunities.len(),
        diagnostics = report.diagnostics.len(),
        "Scan request served"
    );
    record_http_latency(start, "/api/v1/scan");

    Ok(Json(report))
}

/// Latest opportunities for one sport.
pub async fn opportunities(
    State(state): State<AppState>,
    Path(sport): Path<String>,
) -> Result<Json<OpportunitiesResponse>, ApiError> {
    let opportunities = state
        .latest
        .get(&sport)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("no scan covered sport {sport:?}")))?;

    Ok(Json(OpportunitiesResponse {
        sport,
        opportunities,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_state_ready_toggle() {
        let state = AppState::default();
        assert!(!state.is_ready());

        state.set_ready(true);
        assert!(state.is_ready());

        state.set_ready(false);
        assert!(!state.is_ready());
    }

    #[test]
    fn publish_replaces_scanned_sports_only() {
        let state = AppState::default();
        state.latest.insert("baseball_mlb".to_string(), Vec::new());

        state.publish(&["basketball_nba".to_string()], &ScanReport::default());

        assert!(state.latest.contains_key("baseball_mlb"));
        assert!(state.latest.get("basketball_nba").unwrap().is_empty());
    }
}
