//! Health monitor
//!
//! Ring buffers of recent error and latency samples feed a trailing-window
//! error rate and average latency, and an ordered set of named checks turns
//! those plus structural facts (corpus loaded, backend configured, host
//! resources) into an aggregate verdict. Failing checks raise alerts through
//! the cooldown gate in [`super::alerts`].
//!
//! Both buffers have a fixed capacity, so they approximate a trailing time
//! window: aggregations additionally filter by timestamp, and volume
//! estimates degrade once a buffer wraps faster than the requested window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use super::alerts::AlertSink;

/// Default ring-buffer capacity for error and latency samples
pub const DEFAULT_SAMPLE_CAPACITY: usize = 100;

/// Threshold set for the health checks; configuration, not code
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HealthThresholds {
    #[serde(default = "default_memory_percent")]
    pub memory_percent: f64,
    #[serde(default = "default_disk_percent")]
    pub disk_percent: f64,
    #[serde(default = "default_cpu_percent")]
    pub cpu_percent: f64,
    #[serde(default = "default_error_rate")]
    pub error_rate: f64,
    #[serde(default = "default_latency_secs")]
    pub latency_secs: f64,
}

fn default_memory_percent() -> f64 {
    85.0
}

fn default_disk_percent() -> f64 {
    90.0
}

fn default_cpu_percent() -> f64 {
    90.0
}

fn default_error_rate() -> f64 {
    0.1
}

fn default_latency_secs() -> f64 {
    5.0
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            memory_percent: default_memory_percent(),
            disk_percent: default_disk_percent(),
            cpu_percent: default_cpu_percent(),
            error_rate: default_error_rate(),
            latency_secs: default_latency_secs(),
        }
    }
}

/// Host resource readings supplied by a probe
#[derive(Debug, Clone, Copy)]
pub struct ResourceReadings {
    pub memory_percent: f64,
    pub cpu_percent: f64,
    pub disk_percent: Option<f64>,
}

/// Source of host resource readings
///
/// `None` means the host does not expose them; the corresponding checks
/// report `unknown` without degrading the verdict.
pub trait ResourceProbe: Send + Sync {
    fn readings(&self) -> Option<ResourceReadings>;
}

/// Probe for hosts without resource instrumentation
#[derive(Debug, Default)]
pub struct NoopProbe;

impl ResourceProbe for NoopProbe {
    fn readings(&self) -> Option<ResourceReadings> {
        None
    }
}

/// Status of a single named check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Warning,
    Unhealthy,
    Unknown,
}

/// Result of a single named check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub detail: String,
}

/// Aggregate verdict: healthy unless any check is not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

/// Full health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub overall_status: OverallStatus,
    pub checks: BTreeMap<String, CheckResult>,
    pub error_rate_5m: f64,
    pub avg_latency_5m: f64,
    /// Alert kinds that actually fired (were not suppressed) in this check
    pub alerts_fired: Vec<String>,
    pub at: DateTime<Utc>,
}

/// Structural facts the monitor cannot observe on its own
#[derive(Debug, Clone, Copy)]
pub struct HealthContext {
    pub corpus_loaded: bool,
    pub corpus_entries: usize,
    pub backend_configured: bool,
    pub resources: Option<ResourceReadings>,
}

#[derive(Debug, Clone)]
struct ErrorSample {
    at: DateTime<Utc>,
    kind: String,
    endpoint: String,
}

#[derive(Debug, Clone)]
struct LatencySample {
    at: DateTime<Utc>,
    seconds: f64,
}

#[derive(Debug)]
struct MonitorInner {
    errors: VecDeque<ErrorSample>,
    latencies: VecDeque<LatencySample>,
    /// Client-caused rejections, tallied apart from server error samples
    client_errors: u64,
}

/// Bounded-memory health monitor
#[derive(Debug)]
pub struct HealthMonitor {
    inner: Mutex<MonitorInner>,
    thresholds: HealthThresholds,
    alerts: AlertSink,
    capacity: usize,
}

impl HealthMonitor {
    pub fn new(thresholds: HealthThresholds, alerts: AlertSink) -> Self {
        Self {
            inner: Mutex::new(MonitorInner {
                errors: VecDeque::new(),
                latencies: VecDeque::new(),
                client_errors: 0,
            }),
            thresholds,
            alerts,
            capacity: DEFAULT_SAMPLE_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn thresholds(&self) -> &HealthThresholds {
        &self.thresholds
    }

    pub fn alerts(&self) -> &AlertSink {
        &self.alerts
    }

    /// Record a server-side error sample
    pub fn record_error(&self, kind: &str, endpoint: &str, detail: &str) {
        self.record_error_at(kind, endpoint, detail, Utc::now());
    }

    fn record_error_at(&self, kind: &str, endpoint: &str, detail: &str, now: DateTime<Utc>) {
        tracing::error!(kind = %kind, endpoint = %endpoint, "Error recorded: {}", detail);

        let mut inner = self.inner.lock().unwrap();
        inner.errors.push_back(ErrorSample {
            at: now,
            kind: kind.to_string(),
            endpoint: endpoint.to_string(),
        });
        while inner.errors.len() > self.capacity {
            inner.errors.pop_front();
        }
    }

    /// Tally a client-caused rejection; never enters the error buffer
    pub fn record_client_error(&self) {
        self.inner.lock().unwrap().client_errors += 1;
    }

    pub fn client_errors(&self) -> u64 {
        self.inner.lock().unwrap().client_errors
    }

    /// Record a response-time sample; fires `slow_response` above threshold
    pub fn record_latency(&self, endpoint: &str, seconds: f64) {
        self.record_latency_at(endpoint, seconds, Utc::now());
    }

    fn record_latency_at(&self, endpoint: &str, seconds: f64, now: DateTime<Utc>) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.latencies.push_back(LatencySample { at: now, seconds });
            while inner.latencies.len() > self.capacity {
                inner.latencies.pop_front();
            }
        }

        if seconds > self.thresholds.latency_secs {
            self.alerts.raise_at(
                "slow_response",
                &format!("Slow response on {}: {:.2}s", endpoint, seconds),
                now,
            );
        }
    }

    /// Errors-per-request estimate over the trailing window
    ///
    /// Divides error samples newer than the cutoff by latency samples newer
    /// than the cutoff (latency samples approximate request volume). An
    /// approximation: both buffers are capacity-bounded and may already have
    /// evicted part of the window, so do not treat the result as exact.
    pub fn error_rate(&self, window_mins: i64) -> f64 {
        self.error_rate_at(window_mins, Utc::now())
    }

    fn error_rate_at(&self, window_mins: i64, now: DateTime<Utc>) -> f64 {
        let cutoff = now - Duration::minutes(window_mins);
        let inner = self.inner.lock().unwrap();

        let errors = inner.errors.iter().filter(|e| e.at > cutoff).count();
        let requests = inner.latencies.iter().filter(|l| l.at > cutoff).count();

        if requests == 0 {
            return 0.0;
        }
        errors as f64 / requests as f64
    }

    /// Average response time over the trailing window; 0.0 with no samples
    pub fn avg_latency(&self, window_mins: i64) -> f64 {
        self.avg_latency_at(window_mins, Utc::now())
    }

    fn avg_latency_at(&self, window_mins: i64, now: DateTime<Utc>) -> f64 {
        let cutoff = now - Duration::minutes(window_mins);
        let inner = self.inner.lock().unwrap();

        let recent: Vec<f64> = inner
            .latencies
            .iter()
            .filter(|l| l.at > cutoff)
            .map(|l| l.seconds)
            .collect();

        if recent.is_empty() {
            return 0.0;
        }
        recent.iter().sum::<f64>() / recent.len() as f64
    }

    /// Counts of buffered (error, latency) samples
    pub fn sample_counts(&self) -> (usize, usize) {
        let inner = self.inner.lock().unwrap();
        (inner.errors.len(), inner.latencies.len())
    }

    /// Kinds of the most recent buffered errors, newest first
    pub fn recent_error_kinds(&self, limit: usize) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .errors
            .iter()
            .rev()
            .take(limit)
            .map(|e| format!("{} ({})", e.kind, e.endpoint))
            .collect()
    }

    /// Run the ordered health checks and produce an aggregate verdict
    pub fn check_health(&self, ctx: &HealthContext) -> HealthReport {
        self.check_health_at(ctx, Utc::now())
    }

    /// Check at an explicit instant (tests drive the clock through this)
    pub fn check_health_at(&self, ctx: &HealthContext, now: DateTime<Utc>) -> HealthReport {
        let mut checks = BTreeMap::new();
        let mut degraded = false;
        let mut alerts_fired = Vec::new();

        let mut raise = |fired: &mut Vec<String>, sink: &AlertSink, kind: &str, message: &str| {
            if sink.raise_at(kind, message, now) {
                fired.push(kind.to_string());
            }
        };

        // Structural: corpus loaded
        if ctx.corpus_loaded {
            checks.insert(
                "corpus".to_string(),
                CheckResult {
                    status: CheckStatus::Healthy,
                    detail: format!("loaded with {} entries", ctx.corpus_entries),
                },
            );
        } else {
            degraded = true;
            checks.insert(
                "corpus".to_string(),
                CheckResult {
                    status: CheckStatus::Unhealthy,
                    detail: "glossary not loaded".to_string(),
                },
            );
            raise(
                &mut alerts_fired,
                &self.alerts,
                "corpus_missing",
                "Glossary corpus not loaded",
            );
        }

        // Structural: generation backend
        if ctx.backend_configured {
            checks.insert(
                "backend".to_string(),
                CheckResult {
                    status: CheckStatus::Healthy,
                    detail: "API key configured".to_string(),
                },
            );
        } else {
            degraded = true;
            checks.insert(
                "backend".to_string(),
                CheckResult {
                    status: CheckStatus::Unhealthy,
                    detail: "API key missing".to_string(),
                },
            );
            raise(
                &mut alerts_fired,
                &self.alerts,
                "backend_unconfigured",
                "Generation backend not configured",
            );
        }

        // Host resources, when the probe supplies readings
        match ctx.resources {
            Some(res) => {
                let memory_ok = res.memory_percent < self.thresholds.memory_percent;
                checks.insert(
                    "memory".to_string(),
                    CheckResult {
                        status: if memory_ok {
                            CheckStatus::Healthy
                        } else {
                            CheckStatus::Warning
                        },
                        detail: format!("{:.1}% used", res.memory_percent),
                    },
                );
                if !memory_ok {
                    degraded = true;
                    raise(
                        &mut alerts_fired,
                        &self.alerts,
                        "high_memory",
                        &format!("Memory usage at {:.1}%", res.memory_percent),
                    );
                }

                let cpu_ok = res.cpu_percent < self.thresholds.cpu_percent;
                checks.insert(
                    "cpu".to_string(),
                    CheckResult {
                        status: if cpu_ok {
                            CheckStatus::Healthy
                        } else {
                            CheckStatus::Warning
                        },
                        detail: format!("{:.1}% used", res.cpu_percent),
                    },
                );
                if !cpu_ok {
                    degraded = true;
                    raise(
                        &mut alerts_fired,
                        &self.alerts,
                        "high_cpu",
                        &format!("CPU usage at {:.1}%", res.cpu_percent),
                    );
                }

                if let Some(disk) = res.disk_percent {
                    let disk_ok = disk < self.thresholds.disk_percent;
                    checks.insert(
                        "disk".to_string(),
                        CheckResult {
                            status: if disk_ok {
                                CheckStatus::Healthy
                            } else {
                                CheckStatus::Warning
                            },
                            detail: format!("{:.1}% used", disk),
                        },
                    );
                    if !disk_ok {
                        degraded = true;
                        raise(
                            &mut alerts_fired,
                            &self.alerts,
                            "high_disk",
                            &format!("Disk usage at {:.1}%", disk),
                        );
                    }
                }
            }
            None => {
                checks.insert(
                    "resources".to_string(),
                    CheckResult {
                        status: CheckStatus::Unknown,
                        detail: "host resource readings not available".to_string(),
                    },
                );
            }
        }

        // Error rate
        let error_rate = self.error_rate_at(5, now);
        let error_rate_ok = error_rate < self.thresholds.error_rate;
        checks.insert(
            "error_rate".to_string(),
            CheckResult {
                status: if error_rate_ok {
                    CheckStatus::Healthy
                } else {
                    CheckStatus::Warning
                },
                detail: format!("{:.2}% over 5m", error_rate * 100.0),
            },
        );
        if !error_rate_ok {
            degraded = true;
            raise(
                &mut alerts_fired,
                &self.alerts,
                "high_error_rate",
                &format!("Error rate at {:.2}%", error_rate * 100.0),
            );
        }

        // Average latency; only degrades when samples exist
        let avg_latency = self.avg_latency_at(5, now);
        let latency_ok = avg_latency < self.thresholds.latency_secs;
        checks.insert(
            "latency".to_string(),
            CheckResult {
                status: if latency_ok {
                    CheckStatus::Healthy
                } else {
                    CheckStatus::Warning
                },
                detail: format!("{:.2}s average over 5m", avg_latency),
            },
        );
        if !latency_ok && avg_latency > 0.0 {
            degraded = true;
            raise(
                &mut alerts_fired,
                &self.alerts,
                "slow_response_avg",
                &format!("Average response time at {:.2}s", avg_latency),
            );
        }

        HealthReport {
            overall_status: if degraded {
                OverallStatus::Degraded
            } else {
                OverallStatus::Healthy
            },
            checks,
            error_rate_5m: error_rate,
            avg_latency_5m: avg_latency,
            alerts_fired,
            at: now,
        }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(HealthThresholds::default(), AlertSink::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn healthy_ctx() -> HealthContext {
        HealthContext {
            corpus_loaded: true,
            corpus_entries: 42,
            backend_configured: true,
            resources: None,
        }
    }

    #[test]
    fn test_empty_buffers_report_zero_and_healthy() {
        let monitor = HealthMonitor::default();

        assert_eq!(monitor.error_rate(5), 0.0);
        assert_eq!(monitor.avg_latency(5), 0.0);

        let report = monitor.check_health_at(&healthy_ctx(), at(0));
        assert_eq!(report.overall_status, OverallStatus::Healthy);
        assert!(report.alerts_fired.is_empty());
    }

    #[test]
    fn test_structural_failure_degrades() {
        let monitor = HealthMonitor::default();

        let ctx = HealthContext {
            corpus_loaded: false,
            corpus_entries: 0,
            backend_configured: true,
            resources: None,
        };

        let report = monitor.check_health_at(&ctx, at(0));
        assert_eq!(report.overall_status, OverallStatus::Degraded);
        assert_eq!(report.checks["corpus"].status, CheckStatus::Unhealthy);
        assert_eq!(report.alerts_fired, vec!["corpus_missing".to_string()]);
    }

    #[test]
    fn test_error_rate_window_filtered() {
        let monitor = HealthMonitor::default();

        // Two requests and one error inside the window, one stale error outside
        monitor.record_error_at("backend_error", "/api/v1/translate", "boom", at(0));
        monitor.record_error_at("backend_error", "/api/v1/translate", "boom", at(590));
        monitor.record_latency_at("/api/v1/translate", 0.1, at(580));
        monitor.record_latency_at("/api/v1/translate", 0.2, at(590));

        let rate = monitor.error_rate_at(5, at(600));
        assert!((rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_avg_latency_window_filtered() {
        let monitor = HealthMonitor::default();

        monitor.record_latency_at("/x", 10.0, at(0)); // stale
        monitor.record_latency_at("/x", 1.0, at(580));
        monitor.record_latency_at("/x", 3.0, at(590));

        let avg = monitor.avg_latency_at(5, at(600));
        assert!((avg - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_ring_buffer_eviction() {
        let monitor = HealthMonitor::default().with_capacity(3);

        for i in 0..5 {
            monitor.record_error_at("e", "/x", "d", at(i));
        }
        let (errors, _) = monitor.sample_counts();
        assert_eq!(errors, 3);
    }

    #[test]
    fn test_high_error_rate_degrades_and_alerts() {
        let monitor = HealthMonitor::default();

        monitor.record_latency_at("/x", 0.1, at(0));
        monitor.record_error_at("backend_error", "/x", "boom", at(1));

        let report = monitor.check_health_at(&healthy_ctx(), at(2));
        assert_eq!(report.overall_status, OverallStatus::Degraded);
        assert_eq!(report.checks["error_rate"].status, CheckStatus::Warning);
        assert!(report.alerts_fired.contains(&"high_error_rate".to_string()));
    }

    #[test]
    fn test_alert_cooldown_across_checks() {
        let monitor = HealthMonitor::default();

        let ctx = HealthContext {
            corpus_loaded: false,
            corpus_entries: 0,
            backend_configured: true,
            resources: None,
        };

        let first = monitor.check_health_at(&ctx, at(0));
        assert_eq!(first.alerts_fired, vec!["corpus_missing".to_string()]);

        // Second check inside the cooldown: still degraded, but no new alert
        let second = monitor.check_health_at(&ctx, at(10));
        assert_eq!(second.overall_status, OverallStatus::Degraded);
        assert!(second.alerts_fired.is_empty());

        // Third check after the cooldown fires again
        let third = monitor.check_health_at(&ctx, at(301));
        assert_eq!(third.alerts_fired, vec!["corpus_missing".to_string()]);
    }

    #[test]
    fn test_resource_thresholds() {
        let monitor = HealthMonitor::default();

        let ctx = HealthContext {
            resources: Some(ResourceReadings {
                memory_percent: 92.0,
                cpu_percent: 10.0,
                disk_percent: Some(50.0),
            }),
            ..healthy_ctx()
        };

        let report = monitor.check_health_at(&ctx, at(0));
        assert_eq!(report.overall_status, OverallStatus::Degraded);
        assert_eq!(report.checks["memory"].status, CheckStatus::Warning);
        assert_eq!(report.checks["cpu"].status, CheckStatus::Healthy);
        assert_eq!(report.checks["disk"].status, CheckStatus::Healthy);
    }

    #[test]
    fn test_missing_resources_unknown_not_degraded() {
        let monitor = HealthMonitor::default();

        let report = monitor.check_health_at(&healthy_ctx(), at(0));
        assert_eq!(report.checks["resources"].status, CheckStatus::Unknown);
        assert_eq!(report.overall_status, OverallStatus::Healthy);
    }

    #[test]
    fn test_slow_response_alert_on_record() {
        let monitor = HealthMonitor::default();

        monitor.record_latency_at("/api/v1/translate", 7.5, at(0));
        let alerts = monitor.alerts().recent(10);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, "slow_response");
    }

    #[test]
    fn test_client_errors_tallied_separately() {
        let monitor = HealthMonitor::default();

        monitor.record_client_error();
        monitor.record_client_error();
        monitor.record_latency_at("/x", 0.1, at(0));

        assert_eq!(monitor.client_errors(), 2);
        // Client errors do not inflate the server error rate
        assert_eq!(monitor.error_rate_at(5, at(1)), 0.0);
    }
}
