//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use std::sync::Arc;

use super::caller_id;
use crate::api::dto::{GlossarySummary, HealthResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once a corpus is installed and the service can translate.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.corpus.is_loaded().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status: every named check, trailing-window error rate and
/// latency, glossary provenance, and session cost so far.
pub async fn full_health(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<HealthResponse>> {
    state.admit(&caller_id(&headers), "health")?;

    let ctx = state.health_context().await;
    let report = state.monitor.check_health(&ctx);

    let glossary = state.corpus.metadata().await.map(GlossarySummary::from);
    let session_cost = state.ledger.snapshot().total_cost;

    Ok(Json(HealthResponse::from_report(
        report,
        state.uptime_seconds(),
        glossary,
        session_cost,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
