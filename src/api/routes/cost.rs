//! Cost & Usage Routes
//!
//! - GET /api/v1/cost - Session token counters and derived costs
//! - GET /api/v1/usage - Usage statistics plus the recent audit log

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use super::caller_id;
use crate::api::dto::{CostResponse, UsageResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// Audit-log entries returned by the usage endpoint
const RECENT_USAGE_LIMIT: usize = 50;

/// GET /api/v1/cost
pub async fn session_cost(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<CostResponse>> {
    state.admit(&caller_id(&headers), "cost")?;

    Ok(Json(CostResponse {
        snapshot: state.ledger.snapshot(),
    }))
}

/// GET /api/v1/usage
pub async fn usage(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<UsageResponse>> {
    state.admit(&caller_id(&headers), "usage")?;

    Ok(Json(UsageResponse {
        stats: state.usage.stats(),
        recent: state.usage.recent(RECENT_USAGE_LIMIT),
    }))
}
