//! Usage audit log
//!
//! Capped append-only record of every metered call: when it happened, which
//! endpoint, tokens spent, dollar cost, and the running session total.
//! Oldest entries are dropped beyond the cap. Optionally persisted to JSON
//! so the trail survives restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default entry cap for the audit log
pub const DEFAULT_USAGE_CAPACITY: usize = 1000;

/// One metered call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub tokens_used: u64,
    pub cost: f64,
    /// Session total cost at the time this entry was appended
    pub running_total_cost: f64,
}

/// Aggregated view over the buffered records
#[derive(Debug, Clone, Serialize)]
pub struct UsageStats {
    pub total_requests: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub by_endpoint: BTreeMap<String, EndpointUsage>,
}

/// Per-endpoint aggregate
#[derive(Debug, Clone, Default, Serialize)]
pub struct EndpointUsage {
    pub requests: usize,
    pub tokens: u64,
    pub cost: f64,
}

/// Capped in-memory audit log with optional JSON persistence
#[derive(Debug)]
pub struct UsageLog {
    entries: Mutex<VecDeque<UsageRecord>>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl UsageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
            path: None,
        }
    }

    /// Persist to (and reload from) the given JSON file
    pub fn with_path(capacity: usize, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_from_file(&path, capacity);

        Self {
            entries: Mutex::new(entries),
            capacity,
            path: Some(path),
        }
    }

    fn load_from_file(path: &Path, capacity: usize) -> VecDeque<UsageRecord> {
        if !path.exists() {
            return VecDeque::new();
        }

        match std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Vec<UsageRecord>>(&content).ok())
        {
            Some(mut records) => {
                if records.len() > capacity {
                    records.drain(..records.len() - capacity);
                }
                records.into()
            }
            None => {
                tracing::warn!(path = %path.display(), "Could not read usage log, starting fresh");
                VecDeque::new()
            }
        }
    }

    /// Append a record, dropping the oldest beyond the cap
    pub fn record(&self, record: UsageRecord) {
        tracing::info!(
            endpoint = %record.endpoint,
            tokens = record.tokens_used,
            cost = record.cost,
            "API usage recorded"
        );

        let snapshot: Vec<UsageRecord> = {
            let mut entries = self.entries.lock().unwrap();
            entries.push_back(record);
            while entries.len() > self.capacity {
                entries.pop_front();
            }
            entries.iter().cloned().collect()
        };

        if let Some(path) = &self.path {
            if let Err(e) = persist(path, &snapshot) {
                tracing::error!(error = %e, "Failed to persist usage log");
            }
        }
    }

    /// The most recent `limit` records, newest last
    pub fn recent(&self, limit: usize) -> Vec<UsageRecord> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .skip(entries.len().saturating_sub(limit))
            .cloned()
            .collect()
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate the buffered records
    pub fn stats(&self) -> UsageStats {
        let entries = self.entries.lock().unwrap();

        let mut by_endpoint: BTreeMap<String, EndpointUsage> = BTreeMap::new();
        let mut total_tokens = 0u64;
        let mut total_cost = 0.0f64;

        for record in entries.iter() {
            let agg = by_endpoint.entry(record.endpoint.clone()).or_default();
            agg.requests += 1;
            agg.tokens += record.tokens_used;
            agg.cost += record.cost;
            total_tokens += record.tokens_used;
            total_cost += record.cost;
        }

        UsageStats {
            total_requests: entries.len(),
            total_tokens,
            total_cost,
            by_endpoint,
        }
    }
}

fn persist(path: &Path, records: &[UsageRecord]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(records)?;
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(endpoint: &str, tokens: u64, cost: f64) -> UsageRecord {
        UsageRecord {
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            tokens_used: tokens,
            cost,
            running_total_cost: cost,
        }
    }

    #[test]
    fn test_capped_at_capacity() {
        let log = UsageLog::new(3);
        for i in 0..5 {
            log.record(record("/api/v1/translate", i, 0.001));
        }

        assert_eq!(log.len(), 3);
        let recent = log.recent(10);
        assert_eq!(recent[0].tokens_used, 2);
        assert_eq!(recent[2].tokens_used, 4);
    }

    #[test]
    fn test_stats_by_endpoint() {
        let log = UsageLog::new(100);
        log.record(record("/api/v1/translate", 100, 0.001));
        log.record(record("/api/v1/translate", 200, 0.002));
        log.record(record("/api/v1/ocr", 50, 0.0005));

        let stats = log.stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.total_tokens, 350);
        assert_eq!(stats.by_endpoint["/api/v1/translate"].requests, 2);
        assert_eq!(stats.by_endpoint["/api/v1/translate"].tokens, 300);
        assert_eq!(stats.by_endpoint["/api/v1/ocr"].requests, 1);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.json");

        {
            let log = UsageLog::with_path(10, &path);
            log.record(record("/api/v1/translate", 100, 0.001));
            log.record(record("/api/v1/ocr", 50, 0.0005));
        }

        let reloaded = UsageLog::with_path(10, &path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.recent(1)[0].endpoint, "/api/v1/ocr");
    }

    #[test]
    fn test_reload_respects_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.json");

        {
            let log = UsageLog::with_path(10, &path);
            for i in 0..6 {
                log.record(record("/api/v1/translate", i, 0.0));
            }
        }

        let reloaded = UsageLog::with_path(3, &path);
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.recent(1)[0].tokens_used, 5);
    }

    #[test]
    fn test_empty_stats() {
        let log = UsageLog::new(10);
        let stats = log.stats();
        assert_eq!(stats.total_requests, 0);
        assert!(stats.by_endpoint.is_empty());
    }
}
