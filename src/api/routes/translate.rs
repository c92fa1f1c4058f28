//! Translation Route
//!
//! - POST /api/v1/translate - Translate text against the loaded glossary

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use super::caller_id;
use crate::api::dto::{TranslateRequest, TranslateResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/translate
pub async fn translate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<TranslateRequest>,
) -> ApiResult<Json<TranslateResponse>> {
    state.admit(&caller_id(&headers), "translate")?;

    let result = state.translator.translate(&request.text).await?;

    Ok(Json(TranslateResponse {
        translated_text: result.translated_text,
        detected_language: result.detected_language,
        tokens_used: result.tokens_used,
        cost_estimate: result.cost_estimate,
    }))
}
