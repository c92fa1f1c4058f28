//! Alert sink with cooldown-based deduplication
//!
//! The same alert type fires at most once per cooldown interval; repeats
//! inside the interval are suppressed. Fired alerts are logged, appended to
//! a capped in-memory log, and optionally persisted to JSON.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default cap on the retained alert log
pub const DEFAULT_ALERT_CAPACITY: usize = 500;

/// Default suppression interval for a repeated alert type
pub const DEFAULT_COOLDOWN_SECS: u64 = 300;

/// A fired alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub at: DateTime<Utc>,
    pub kind: String,
    pub message: String,
    pub severity: String,
}

#[derive(Debug, Default)]
struct AlertInner {
    /// kind -> last time that kind fired; absence means never fired
    cooldowns: HashMap<String, DateTime<Utc>>,
    log: VecDeque<Alert>,
}

/// Deduplicating alert sink
#[derive(Debug)]
pub struct AlertSink {
    inner: Mutex<AlertInner>,
    cooldown: Duration,
    capacity: usize,
    path: Option<PathBuf>,
}

impl AlertSink {
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            inner: Mutex::new(AlertInner::default()),
            cooldown: Duration::seconds(cooldown_secs as i64),
            capacity: DEFAULT_ALERT_CAPACITY,
            path: None,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Persist the alert log to (and reload it from) the given JSON file
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if path.exists() {
            if let Some(mut alerts) = std::fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<Vec<Alert>>(&content).ok())
            {
                if alerts.len() > self.capacity {
                    alerts.drain(..alerts.len() - self.capacity);
                }
                self.inner.lock().unwrap().log = alerts.into();
            }
        }

        self.path = Some(path);
        self
    }

    /// Raise an alert; returns false if the cooldown suppressed it
    pub fn raise(&self, kind: &str, message: &str) -> bool {
        self.raise_at(kind, message, Utc::now())
    }

    /// Raise at an explicit instant (tests drive the clock through this)
    pub fn raise_at(&self, kind: &str, message: &str, now: DateTime<Utc>) -> bool {
        let snapshot: Vec<Alert> = {
            let mut inner = self.inner.lock().unwrap();

            if let Some(last) = inner.cooldowns.get(kind) {
                if now - *last < self.cooldown {
                    return false;
                }
            }

            inner.cooldowns.insert(kind.to_string(), now);
            inner.log.push_back(Alert {
                at: now,
                kind: kind.to_string(),
                message: message.to_string(),
                severity: "warning".to_string(),
            });
            while inner.log.len() > self.capacity {
                inner.log.pop_front();
            }

            inner.log.iter().cloned().collect()
        };

        tracing::warn!(kind = %kind, "ALERT: {}", message);

        if let Some(path) = &self.path {
            if let Err(e) = persist(path, &snapshot) {
                tracing::error!(error = %e, "Failed to persist alert log");
            }
        }

        true
    }

    /// The most recent `limit` alerts, newest first
    pub fn recent(&self, limit: usize) -> Vec<Alert> {
        let inner = self.inner.lock().unwrap();
        inner.log.iter().rev().take(limit).cloned().collect()
    }

    /// Number of retained alerts
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all retained alerts and the persisted file
    ///
    /// Cooldown timers are kept so clearing the log cannot re-arm spam.
    pub fn clear(&self) {
        self.inner.lock().unwrap().log.clear();

        if let Some(path) = &self.path {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::error!(error = %e, "Failed to remove alert log file");
                }
            }
        }
    }
}

impl Default for AlertSink {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}

fn persist(path: &Path, alerts: &[Alert]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(alerts)?;
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_cooldown_suppresses_repeat() {
        let sink = AlertSink::new(300);

        assert!(sink.raise_at("high_memory", "memory at 90%", at(0)));
        assert!(!sink.raise_at("high_memory", "memory at 91%", at(10)));
        assert_eq!(sink.len(), 1);

        // After the cooldown elapses the same type fires again
        assert!(sink.raise_at("high_memory", "memory at 92%", at(301)));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_distinct_kinds_independent() {
        let sink = AlertSink::new(300);

        assert!(sink.raise_at("high_memory", "m", at(0)));
        assert!(sink.raise_at("high_cpu", "c", at(0)));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_log_capped() {
        let sink = AlertSink::new(0).with_capacity(2);

        sink.raise_at("a", "1", at(0));
        sink.raise_at("b", "2", at(1));
        sink.raise_at("c", "3", at(2));

        assert_eq!(sink.len(), 2);
        let recent = sink.recent(10);
        assert_eq!(recent[0].kind, "c");
        assert_eq!(recent[1].kind, "b");
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");

        {
            let sink = AlertSink::new(0).with_path(&path);
            sink.raise_at("glossary_missing", "corpus not loaded", at(0));
        }

        let reloaded = AlertSink::new(0).with_path(&path);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.recent(1)[0].kind, "glossary_missing");
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.json");

        let sink = AlertSink::new(0).with_path(&path);
        sink.raise_at("a", "1", at(0));
        assert!(path.exists());

        sink.clear();
        assert!(sink.is_empty());
        assert!(!path.exists());
    }
}
