//! # LexiBridge
//!
//! Glossary-grounded Arabic/English translation service for food packaging,
//! built around a retrieval-augmented generation pipeline.
//!
//! ## Features
//!
//! - **Grounded translation**: nearest-neighbor glossary retrieval feeds a
//!   fixed prompt template, keeping terminology consistent
//! - **Label OCR**: vision-backend text extraction from packaging photos,
//!   fed into the same translation path
//! - **Request governance**: per-caller sliding-window rate limits on every
//!   endpoint
//! - **Cost accounting**: every backend call metered into a session ledger
//!   and a capped audit log
//! - **Self-observation**: bounded-memory health monitor with deduplicated
//!   alerts
//!
//! ## Modules
//!
//! - [`index`]: in-memory embedding index with nearest-neighbor search
//! - [`corpus`]: glossary loading, embedding, persistence, and atomic swap
//! - [`pipeline`]: the retrieval-augmented translation pipeline
//! - [`govern`]: rate limiting, cost ledger, and usage audit log
//! - [`monitor`]: health checks and alerting
//! - [`backend`]: embedding and generation backend clients
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lexibridge::api::serve;
//! use lexibridge::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default();
//!     let state = lexibridge::bootstrap(config).await?;
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod corpus;
pub mod govern;
pub mod index;
pub mod monitor;
pub mod pipeline;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiError, AppState};
pub use backend::{
    BackendError, Completion, EmbeddingBackend, EmbeddingBatch, GenerationBackend, OpenAiBackend,
    OpenAiConfig,
};
pub use config::{Config, ConfigError};
pub use corpus::{BuildError, CorpusError, CorpusMetadata, CorpusState, CorpusStore, LoadedCorpus};
pub use govern::{
    CostLedger, CostSnapshot, PricingConfig, RateExceeded, RateLimiter, RatePolicy, UsageLog,
    UsageRecord, UsageStats,
};
pub use index::{EmbeddingIndex, IndexError, ReferenceEntry, SearchHit};
pub use monitor::{
    Alert, AlertSink, HealthMonitor, HealthReport, HealthThresholds, NoopProbe, ResourceProbe,
};
pub use pipeline::{PipelineConfig, PipelineError, Translation, Translator};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Assemble the full application state from configuration
///
/// Restores a persisted corpus when one exists; otherwise builds the corpus
/// from the configured glossary CSV if that file is present. A service
/// without a corpus still starts and reports itself degraded.
pub async fn bootstrap(config: Config) -> anyhow::Result<AppState> {
    let config = Arc::new(config);
    let data_dir = PathBuf::from(&config.storage.data_dir);

    let backend = Arc::new(OpenAiBackend::new(config.backend.clone()));
    if !backend.is_configured() {
        tracing::warn!("No API key configured; translation calls will fail until one is set");
    }

    let ledger = Arc::new(CostLedger::new(config.pricing));
    let usage = Arc::new(UsageLog::with_path(
        govern::usage::DEFAULT_USAGE_CAPACITY,
        data_dir.join("usage_log.json"),
    ));

    let alerts = AlertSink::new(config.monitor.alert_cooldown_secs)
        .with_path(data_dir.join("alerts.json"));
    let monitor = Arc::new(HealthMonitor::new(config.monitor.thresholds, alerts));

    let store = Arc::new(CorpusStore::new(&data_dir));
    let corpus = Arc::new(CorpusState::new());
    let glossary_path = config.storage.glossary_path.as_ref().map(PathBuf::from);

    match store.load() {
        Ok(Some((index, metadata))) => {
            tracing::info!(
                entries = metadata.entry_count,
                source = %metadata.source_name,
                "Restored persisted corpus"
            );
            corpus.install(LoadedCorpus { index, metadata }).await;
        }
        Ok(None) => {
            if let Some(path) = glossary_path.as_ref().filter(|p| p.exists()) {
                match corpus
                    .rebuild(path, backend.as_ref(), &ledger, Some(&store))
                    .await
                {
                    Ok(count) => tracing::info!(entries = count, "Built corpus from glossary CSV"),
                    Err(e) => tracing::warn!("Failed to build corpus at startup: {}", e),
                }
            } else {
                tracing::warn!("No corpus available; load a glossary to enable translation");
            }
        }
        Err(e) => tracing::warn!("Failed to restore persisted corpus: {}", e),
    }

    let translator = Arc::new(Translator::new(
        backend.clone(),
        backend.clone(),
        Arc::clone(&corpus),
        Arc::clone(&ledger),
        Arc::clone(&usage),
        config.pipeline.clone(),
    ));

    Ok(AppState {
        config,
        translator,
        corpus,
        embedder: backend.clone(),
        generator: backend,
        limiter: Arc::new(RateLimiter::new()),
        ledger,
        usage,
        monitor,
        probe: Arc::new(NoopProbe),
        store,
        glossary_path,
        start_time: Instant::now(),
    })
}
