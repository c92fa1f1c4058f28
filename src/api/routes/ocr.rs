//! OCR Translation Route
//!
//! - POST /api/v1/ocr-translate - Extract text from a label image and
//!   translate it

use axum::{extract::State, http::HeaderMap, Json};
use base64::Engine;
use std::sync::Arc;

use super::caller_id;
use crate::api::dto::{OcrRequest, OcrResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /api/v1/ocr-translate
pub async fn ocr_translate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<OcrRequest>,
) -> ApiResult<Json<OcrResponse>> {
    state.admit(&caller_id(&headers), "ocr")?;

    let image_bytes = base64::engine::general_purpose::STANDARD
        .decode(&request.image_base64)
        .map_err(|e| ApiError::InvalidInput(format!("invalid base64 image: {}", e)))?;

    let result = state.translator.translate_image(&image_bytes).await?;

    Ok(Json(OcrResponse {
        extracted_text: result.extracted_text,
        translated_text: result.translated_text,
        detected_language: result.detected_language,
        tokens_used: result.tokens_used,
        cost_estimate: result.cost_estimate,
    }))
}
