//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::backend::{EmbeddingBackend, GenerationBackend};
use crate::config::Config;
use crate::corpus::{CorpusState, CorpusStore};
use crate::govern::{CostLedger, RateExceeded, RateLimiter, UsageLog};
use crate::monitor::{HealthContext, HealthMonitor, ResourceProbe};
use crate::pipeline::Translator;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Full service configuration
    pub config: Arc<Config>,
    /// The retrieval-augmented translation pipeline
    pub translator: Arc<Translator>,
    /// Current corpus handle, shared with the translator
    pub corpus: Arc<CorpusState>,
    /// Embedding backend, needed for glossary rebuilds
    pub embedder: Arc<dyn EmbeddingBackend>,
    /// Generation backend, consulted for readiness checks
    pub generator: Arc<dyn GenerationBackend>,
    /// Sliding-window admission control
    pub limiter: Arc<RateLimiter>,
    /// Session token and cost counters
    pub ledger: Arc<CostLedger>,
    /// Capped per-call usage audit log
    pub usage: Arc<UsageLog>,
    /// Error/latency samples and health checks
    pub monitor: Arc<HealthMonitor>,
    /// Host resource readings for health checks
    pub probe: Arc<dyn ResourceProbe>,
    /// On-disk corpus persistence
    pub store: Arc<CorpusStore>,
    /// Glossary CSV used for reloads, when configured
    pub glossary_path: Option<PathBuf>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Admission check: one sliding window per caller+endpoint pair
    pub fn admit(&self, caller: &str, endpoint: &str) -> Result<(), RateExceeded> {
        let key = format!("{}:{}", caller, endpoint);
        let policy = self.config.limits.policy_for(endpoint);
        self.limiter.check(&key, policy)
    }

    /// Structural facts fed into the health checks
    pub async fn health_context(&self) -> HealthContext {
        HealthContext {
            corpus_loaded: self.corpus.is_loaded().await,
            corpus_entries: self.corpus.entry_count().await,
            backend_configured: self.generator.is_configured(),
            resources: self.probe.readings(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
