//! Glossary Routes
//!
//! - GET /api/v1/glossary - Current corpus provenance
//! - POST /api/v1/glossary/reload - Rebuild the corpus from the configured
//!   CSV

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use super::caller_id;
use crate::api::dto::{GlossaryInfoResponse, GlossarySummary, ReloadResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /api/v1/glossary
pub async fn info(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<GlossaryInfoResponse>> {
    state.admit(&caller_id(&headers), "glossary")?;

    let metadata = state.corpus.metadata().await;
    Ok(Json(GlossaryInfoResponse {
        loaded: metadata.is_some(),
        glossary: metadata.map(GlossarySummary::from),
    }))
}

/// POST /api/v1/glossary/reload
///
/// Re-embeds the configured glossary CSV and installs the result. The
/// previous corpus keeps serving until the rebuild completes.
pub async fn reload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<ReloadResponse>> {
    state.admit(&caller_id(&headers), "glossary")?;

    let path = state
        .glossary_path
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("no glossary path configured".to_string()))?;
    if !path.exists() {
        return Err(ApiError::NotFound(format!(
            "glossary file not found: {}",
            path.display()
        )));
    }

    let entry_count = state
        .corpus
        .rebuild(
            path,
            state.embedder.as_ref(),
            &state.ledger,
            Some(&state.store),
        )
        .await?;

    Ok(Json(ReloadResponse {
        entry_count,
        message: format!("Glossary reloaded with {} entries", entry_count),
    }))
}
