//! API Data Transfer Objects
//!
//! Request and response types for the HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::corpus::CorpusMetadata;
use crate::govern::{CostSnapshot, UsageRecord, UsageStats};
use crate::monitor::{Alert, CheckResult, HealthReport, OverallStatus};

// ============================================
// Translation
// ============================================

/// Request body for POST /api/v1/translate
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
}

/// Response for POST /api/v1/translate
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub detected_language: String,
    pub tokens_used: u64,
    pub cost_estimate: f64,
}

/// Request body for POST /api/v1/ocr-translate
///
/// The image travels as base64 inside the JSON body.
#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    pub image_base64: String,
}

/// Response for POST /api/v1/ocr-translate
#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub extracted_text: String,
    pub translated_text: String,
    pub detected_language: String,
    pub tokens_used: u64,
    pub cost_estimate: f64,
}

// ============================================
// Health
// ============================================

/// Response for GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: OverallStatus,
    pub checks: BTreeMap<String, CheckResult>,
    pub error_rate_5m: f64,
    pub avg_latency_5m: f64,
    pub alerts_since_last_check: Vec<String>,
    pub uptime_seconds: u64,
    pub version: String,
    pub glossary: Option<GlossarySummary>,
    pub session_cost: f64,
}

impl HealthResponse {
    pub fn from_report(
        report: HealthReport,
        uptime_seconds: u64,
        glossary: Option<GlossarySummary>,
        session_cost: f64,
    ) -> Self {
        Self {
            status: report.overall_status,
            checks: report.checks,
            error_rate_5m: report.error_rate_5m,
            avg_latency_5m: report.avg_latency_5m,
            alerts_since_last_check: report.alerts_fired,
            uptime_seconds,
            version: env!("CARGO_PKG_VERSION").to_string(),
            glossary,
            session_cost,
        }
    }
}

/// Corpus summary embedded in health and glossary responses
#[derive(Debug, Serialize)]
pub struct GlossarySummary {
    pub entry_count: usize,
    pub source_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<CorpusMetadata> for GlossarySummary {
    fn from(meta: CorpusMetadata) -> Self {
        Self {
            entry_count: meta.entry_count,
            source_name: meta.source_name,
            created_at: meta.created_at,
        }
    }
}

// ============================================
// Glossary
// ============================================

/// Response for GET /api/v1/glossary
#[derive(Debug, Serialize)]
pub struct GlossaryInfoResponse {
    pub loaded: bool,
    pub glossary: Option<GlossarySummary>,
}

/// Response for POST /api/v1/glossary/reload
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub entry_count: usize,
    pub message: String,
}

// ============================================
// Cost & usage
// ============================================

/// Response for GET /api/v1/cost
#[derive(Debug, Serialize)]
pub struct CostResponse {
    #[serde(flatten)]
    pub snapshot: CostSnapshot,
}

/// Response for GET /api/v1/usage
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub stats: UsageStats,
    pub recent: Vec<UsageRecord>,
}

// ============================================
// Alerts
// ============================================

/// Response for GET /api/v1/alerts
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
}

/// Response for DELETE /api/v1/alerts
#[derive(Debug, Serialize)]
pub struct ClearAlertsResponse {
    pub cleared: bool,
}
