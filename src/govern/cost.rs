//! Cost ledger
//!
//! Thread-safe counters for tokens consumed by embedding and generation
//! calls. Each `record_*` takes the lock once so a concurrent snapshot can
//! never observe a call counter incremented without its token counter.
//! Dollar cost is derived from fixed per-million-token rates.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Per-million-token rates for each channel
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_embedding_rate")]
    pub embedding_per_mtok: f64,
    #[serde(default = "default_completion_rate")]
    pub completion_per_mtok: f64,
}

fn default_embedding_rate() -> f64 {
    0.020
}

fn default_completion_rate() -> f64 {
    0.150
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            embedding_per_mtok: default_embedding_rate(),
            completion_per_mtok: default_completion_rate(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    embedding_tokens: u64,
    completion_tokens: u64,
    embedding_calls: u64,
    completion_calls: u64,
}

/// Point-in-time view of the ledger with derived costs
///
/// A pure function of the counters; two snapshots with no intervening
/// `record_*` calls are identical.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSnapshot {
    pub embedding_tokens: u64,
    pub completion_tokens: u64,
    pub embedding_calls: u64,
    pub completion_calls: u64,
    pub embedding_cost: f64,
    pub completion_cost: f64,
    pub total_cost: f64,
}

/// Monotonic token/call counters for the process lifetime
#[derive(Debug)]
pub struct CostLedger {
    counters: Mutex<Counters>,
    pricing: PricingConfig,
}

impl CostLedger {
    pub fn new(pricing: PricingConfig) -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            pricing,
        }
    }

    /// Record one embedding call and its token usage
    pub fn record_embedding(&self, tokens: u64) {
        let mut counters = self.counters.lock().unwrap();
        counters.embedding_tokens += tokens;
        counters.embedding_calls += 1;
    }

    /// Record one completion call and its token usage
    pub fn record_completion(&self, tokens: u64) {
        let mut counters = self.counters.lock().unwrap();
        counters.completion_tokens += tokens;
        counters.completion_calls += 1;
    }

    /// Current counters with derived costs
    pub fn snapshot(&self) -> CostSnapshot {
        let counters = *self.counters.lock().unwrap();

        let embedding_cost = self.embedding_cost(counters.embedding_tokens);
        let completion_cost = self.completion_cost(counters.completion_tokens);

        CostSnapshot {
            embedding_tokens: counters.embedding_tokens,
            completion_tokens: counters.completion_tokens,
            embedding_calls: counters.embedding_calls,
            completion_calls: counters.completion_calls,
            embedding_cost,
            completion_cost,
            total_cost: round6(embedding_cost + completion_cost),
        }
    }

    /// Dollar cost of a single call given its token counts
    pub fn estimate(&self, embedding_tokens: u64, completion_tokens: u64) -> f64 {
        round6(self.embedding_cost(embedding_tokens) + self.completion_cost(completion_tokens))
    }

    fn embedding_cost(&self, tokens: u64) -> f64 {
        round6(tokens as f64 / 1_000_000.0 * self.pricing.embedding_per_mtok)
    }

    fn completion_cost(&self, tokens: u64) -> f64 {
        round6(tokens as f64 / 1_000_000.0 * self.pricing.completion_per_mtok)
    }
}

impl Default for CostLedger {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

/// Round to 6 decimal places (micro-dollar resolution)
pub fn round6(x: f64) -> f64 {
    (x * 1_000_000.0).round() / 1_000_000.0
}
