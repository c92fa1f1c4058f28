//! Health monitoring and alerting
//!
//! Bounded-memory observation of the running service:
//!
//! - [`HealthMonitor`]: ring buffers of recent errors and latencies, a
//!   trailing-window error rate and average latency, and an ordered set of
//!   named health checks producing an aggregate verdict
//! - [`AlertSink`]: deduplicated alerts with a per-type cooldown and a
//!   capped persisted alert log
//! - [`ResourceProbe`]: optional source of host memory/CPU/disk readings;
//!   absent readings are reported as unknown, never as failures

pub mod alerts;
pub mod health;

pub use alerts::{Alert, AlertSink, DEFAULT_ALERT_CAPACITY, DEFAULT_COOLDOWN_SECS};
pub use health::{
    CheckResult, CheckStatus, HealthContext, HealthMonitor, HealthReport, HealthThresholds,
    NoopProbe, OverallStatus, ResourceProbe, ResourceReadings, DEFAULT_SAMPLE_CAPACITY,
};
