//! Sliding-window rate limiter
//!
//! Keeps an ordered timestamp sequence per key. On every check, timestamps
//! older than the window are trimmed from the front (they are in increasing
//! order, so this is a prefix trim); if the remaining count is at the limit
//! the call is rejected without recording, otherwise the current time is
//! appended and the call admitted. This is a true sliding window, so a burst
//! spanning a window boundary is still throttled.
//!
//! Keys are opaque strings, typically `"{caller}:{endpoint}"`; caller
//! identity resolution is the API layer's policy, not this component's.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use thiserror::Error;

/// Per-endpoint admission policy, supplied per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RatePolicy {
    /// Maximum admitted calls inside the window
    pub limit: usize,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RatePolicy {
    pub fn new(limit: usize, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }
}

impl Default for RatePolicy {
    fn default() -> Self {
        // 100 requests per hour, the general-endpoint budget
        Self::new(100, 3600)
    }
}

/// Admission rejected; the caller should wait before retrying
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rate limit exceeded, retry after {retry_after_secs}s")]
pub struct RateExceeded {
    /// Hint for the caller: the policy's window length
    pub retry_after_secs: u64,
}

/// In-memory sliding-window rate limiter
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check admission for `key` under `policy` at the current time
    pub fn check(&self, key: &str, policy: RatePolicy) -> Result<(), RateExceeded> {
        self.check_at(key, policy, Utc::now())
    }

    /// Check admission at an explicit instant
    ///
    /// Separated from [`check`](Self::check) so tests can drive the clock.
    pub fn check_at(
        &self,
        key: &str,
        policy: RatePolicy,
        now: DateTime<Utc>,
    ) -> Result<(), RateExceeded> {
        let cutoff = now - Duration::seconds(policy.window_secs as i64);

        let mut windows = self.windows.lock().unwrap();
        let window = windows.entry(key.to_string()).or_default();

        while window.front().is_some_and(|ts| *ts < cutoff) {
            window.pop_front();
        }

        if window.len() >= policy.limit {
            return Err(RateExceeded {
                retry_after_secs: policy.window_secs,
            });
        }

        window.push_back(now);
        Ok(())
    }

    /// Number of keys currently holding tracked timestamps
    pub fn active_keys(&self) -> usize {
        self.windows.lock().unwrap().len()
    }

    /// Number of tracked timestamps for a key (0 if never seen)
    pub fn tracked(&self, key: &str) -> usize {
        self.windows
            .lock()
            .unwrap()
            .get(key)
            .map(|w| w.len())
            .unwrap_or(0)
    }
}
