//! Liveness and ledger store readiness.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;
use walletd_core::ledger::WalletFilter;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `healthy` when the ledger store answers, `unavailable` otherwise.
    pub status: &'static str,
    /// Ledger store state: `up` or `down`.
    pub store: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// GET `/health` - Reports whether the ledger store can serve reads.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION");
    match state.ledger.store().count_wallets(WalletFilter::default()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                store: "up",
                version,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Ledger store readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    store: "down",
                    version,
                }),
            )
        }
    }
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
