//! Per-plan usage limits.

use crate::core::error::StoreError;
use crate::quota::decision::{DenialReason, QuotaDecision};
use crate::store::{ArcScanStore, Subscription, UserId};

/// Default number of scans a FREE user may record.
pub const DEFAULT_FREE_SCAN_LIMIT: u64 = 10;

/// Configuration for the quota guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaConfig {
    /// Scans a FREE user may record over the account's lifetime.
    pub free_scan_limit: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_scan_limit: DEFAULT_FREE_SCAN_LIMIT,
        }
    }
}

impl QuotaConfig {
    /// Sets the FREE plan allowance.
    pub fn with_free_scan_limit(mut self, limit: u64) -> Self {
        self.free_scan_limit = limit;
        self
    }
}

/// Decides whether a user may submit another scan.
///
/// FREE users are bounded by [`QuotaConfig::free_scan_limit`]; every other
/// plan is unbounded and never costs a count query. Subscription status is
/// not consulted.
///
/// The count is read without any lock, so two concurrent submissions from
/// the same user can both pass at `limit - 1`.
#[derive(Debug, Clone)]
pub struct QuotaGuard {
    store: ArcScanStore,
    config: QuotaConfig,
}

impl QuotaGuard {
    /// Creates a guard over the given store.
    pub fn new(store: ArcScanStore, config: QuotaConfig) -> Self {
        Self { store, config }
    }

    /// Returns the guard's configuration.
    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Evaluates the quota for `user_id` under `subscription`.
    pub async fn check_allowed(
        &self,
        user_id: UserId,
        subscription: Option<&Subscription>,
    ) -> Result<QuotaDecision, StoreError> {
        let Some(subscription) = subscription else {
            return Ok(QuotaDecision::denied(DenialReason::NoSubscription));
        };

        if !subscription.plan.is_free() {
            return Ok(QuotaDecision::Allowed);
        }

        let used = self.store.count_scans(user_id).await?;
        let limit = self.config.free_scan_limit;

        tracing::debug!(user_id = %user_id, used, limit, "Evaluated free tier quota");

        if used >= limit {
            Ok(QuotaDecision::denied(DenialReason::FreeTierLimit { used, limit }))
        } else {
            Ok(QuotaDecision::Allowed)
        }
    }
}
