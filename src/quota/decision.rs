//! Outcomes of a quota check.

use crate::core::error::SubmissionError;

use serde::{Deserialize, Serialize};

/// Why a submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DenialReason {
    /// The user has no subscription record.
    NoSubscription,

    /// A FREE user has used up the free allowance.
    FreeTierLimit {
        /// Scans already recorded.
        used: u64,
        /// The configured allowance.
        limit: u64,
    },
}

impl DenialReason {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSubscription => "no_subscription",
            Self::FreeTierLimit { .. } => "free_tier_limit",
        }
    }
}

impl From<DenialReason> for SubmissionError {
    fn from(reason: DenialReason) -> Self {
        match reason {
            DenialReason::NoSubscription => Self::NoSubscription,
            DenialReason::FreeTierLimit { used, limit } => Self::QuotaExceeded { used, limit },
        }
    }
}

/// The result of evaluating a user's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum QuotaDecision {
    /// The submission may proceed.
    Allowed,

    /// The submission must be refused.
    Denied(DenialReason),
}

impl QuotaDecision {
    /// Creates a denial.
    pub fn denied(reason: DenialReason) -> Self {
        Self::Denied(reason)
    }

    /// Returns true if the submission may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns the denial reason, if denied.
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Allowed => None,
            Self::Denied(reason) => Some(*reason),
        }
    }
}
