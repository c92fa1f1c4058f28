//! Alert Routes
//!
//! - GET /api/v1/alerts - Recent alerts, newest first
//! - DELETE /api/v1/alerts - Clear the alert log

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use super::caller_id;
use crate::api::dto::{AlertsResponse, ClearAlertsResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// Alerts returned per request
const RECENT_ALERTS_LIMIT: usize = 50;

/// GET /api/v1/alerts
pub async fn recent(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<AlertsResponse>> {
    state.admit(&caller_id(&headers), "alerts")?;

    Ok(Json(AlertsResponse {
        alerts: state.monitor.alerts().recent(RECENT_ALERTS_LIMIT),
    }))
}

/// DELETE /api/v1/alerts
///
/// Clears the log but keeps cooldown state, so a just-alerted condition
/// does not immediately re-fire.
pub async fn clear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<ClearAlertsResponse>> {
    state.admit(&caller_id(&headers), "alerts")?;

    state.monitor.alerts().clear();
    Ok(Json(ClearAlertsResponse { cleared: true }))
}
