//! Subscription-tier usage limits.

mod decision;
mod guard;

pub use decision::{DenialReason, QuotaDecision};
pub use guard::{QuotaConfig, QuotaGuard, DEFAULT_FREE_SCAN_LIMIT};
