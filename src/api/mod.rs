//! HTTP API module for health, metrics, and scan endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, ServiceStats};
pub use routes::create_router;
