//! Request governance
//!
//! Admission control and cost accounting for every entry point:
//!
//! - [`RateLimiter`]: per-key sliding-window admission check
//! - [`CostLedger`]: token counters and dollar-cost derivation
//! - [`UsageLog`]: capped append-only audit trail of metered calls
//!
//! Each component owns its state behind a single lock so unrelated calls
//! never serialize on each other.

pub mod cost;
pub mod rate_limiter;
pub mod usage;

pub use cost::{round6, CostLedger, CostSnapshot, PricingConfig};
pub use rate_limiter::{RateExceeded, RateLimiter, RatePolicy};
pub use usage::{UsageLog, UsageRecord, UsageStats};
