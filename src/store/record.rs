//! Persisted record types: users, subscriptions and scans.

use crate::core::{AnalysisResult, EncryptionStatus, Finding, ImageUpload};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Internal identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Creates a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Identifier of a stored scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(pub Uuid);

impl ScanId {
    /// Creates a new random scan ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ScanId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for ScanId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A user known to this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Internal identifier.
    pub id: UserId,

    /// Stable identifier issued by the identity provider.
    pub external_id: String,

    /// Primary email address.
    pub email: String,

    /// Display name, if the provider has one.
    pub name: Option<String>,

    /// When the user was first seen.
    pub created_at: DateTime<Utc>,
}

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Plan {
    /// Free tier, bounded by the free scan limit.
    Free,
    /// Paid individual tier.
    Pro,
    /// Paid organization tier.
    Enterprise,
}

impl Plan {
    /// Database and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Pro => "PRO",
            Self::Enterprise => "ENTERPRISE",
        }
    }

    /// Returns `true` for the free tier.
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(Self::Free),
            "PRO" => Ok(Self::Pro),
            "ENTERPRISE" => Ok(Self::Enterprise),
            other => Err(format!("unknown plan '{}'", other)),
        }
    }
}

/// Billing status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// In good standing.
    Active,
    /// Within a trial period.
    Trialing,
    /// Payment overdue.
    PastDue,
    /// Ended by the user or billing.
    Canceled,
}

impl SubscriptionStatus {
    /// Database and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Trialing => "TRIALING",
            Self::PastDue => "PAST_DUE",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "TRIALING" => Ok(Self::Trialing),
            "PAST_DUE" => Ok(Self::PastDue),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(format!("unknown subscription status '{}'", other)),
        }
    }
}

/// A user's subscription. At most one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Owning user.
    pub user_id: UserId,

    /// Subscription tier.
    pub plan: Plan,

    /// Billing status.
    pub status: SubscriptionStatus,

    /// End of the trial period, if any.
    pub trial_ends_at: Option<DateTime<Utc>>,

    /// End of the current paid period, if any.
    pub current_period_end: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Creates an active subscription on the given plan.
    pub fn new(user_id: UserId, plan: Plan) -> Self {
        Self {
            user_id,
            plan,
            status: SubscriptionStatus::Active,
            trial_ends_at: None,
            current_period_end: None,
        }
    }

    /// The subscription every newly provisioned user starts with.
    pub fn default_trial(user_id: UserId, trial: chrono::Duration) -> Self {
        Self {
            trial_ends_at: Some(Utc::now() + trial),
            ..Self::new(user_id, Plan::Free)
        }
    }

    /// Sets the status.
    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }
}

/// One persisted analysis outcome. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    /// Unique identifier.
    pub id: ScanId,

    /// Owning user.
    pub user_id: UserId,

    /// Original file name of the upload.
    pub file_name: String,

    /// Declared MIME type of the upload.
    pub file_type: String,

    /// Size of the upload in bytes.
    pub file_size: u64,

    /// Sensitive data found by the detector.
    pub sensitive_data: Vec<Finding>,

    /// Encryption status reported by the detector.
    pub encryption_status: EncryptionStatus,

    /// When the scan was recorded.
    pub created_at: DateTime<Utc>,
}

/// The data needed to record a scan; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScan {
    /// Owning user.
    pub user_id: UserId,

    /// Original file name of the upload.
    pub file_name: String,

    /// Declared MIME type of the upload.
    pub file_type: String,

    /// Size of the upload in bytes.
    pub file_size: u64,

    /// Sensitive data found by the detector.
    pub sensitive_data: Vec<Finding>,

    /// Encryption status reported by the detector.
    pub encryption_status: EncryptionStatus,
}

impl NewScan {
    /// Combines the upload's own attributes with the detector's verdict.
    pub fn from_analysis(user_id: UserId, upload: &ImageUpload, result: &AnalysisResult) -> Self {
        Self {
            user_id,
            file_name: upload.file_name().to_string(),
            file_type: upload.content_type().to_string(),
            file_size: upload.size(),
            sensitive_data: result.sensitive_data.clone(),
            encryption_status: result.encryption_status.clone(),
        }
    }

    /// Turns this into a stored scan with a fresh id and the current time.
    pub fn into_scan(self) -> Scan {
        Scan {
            id: ScanId::new(),
            user_id: self.user_id,
            file_name: self.file_name,
            file_type: self.file_type,
            file_size: self.file_size,
            sensitive_data: self.sensitive_data,
            encryption_status: self.encryption_status,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnalysisMetadata, Finding};

    #[test]
    fn test_plan_round_trips_through_str() {
        for plan in [Plan::Free, Plan::Pro, Plan::Enterprise] {
            assert_eq!(plan.as_str().parse::<Plan>().unwrap(), plan);
        }
        assert!("GOLD".parse::<Plan>().is_err());
        assert!(Plan::Free.is_free());
        assert!(!Plan::Pro.is_free());
    }

    #[test]
    fn test_default_trial_subscription() {
        let user = UserId::new();
        let sub = Subscription::default_trial(user, chrono::Duration::days(14));

        assert_eq!(sub.plan, Plan::Free);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        let ends = sub.trial_ends_at.unwrap();
        assert!(ends > Utc::now() + chrono::Duration::days(13));
    }

    #[test]
    fn test_new_scan_takes_file_attributes_from_upload() {
        let upload = ImageUpload::new(vec![0u8; 2048])
            .with_file_name("id-card.jpg")
            .with_content_type("image/jpeg");
        let result = AnalysisResult {
            sensitive_data: vec![Finding::new("ID Number", 0.8, "Image content")],
            encryption_status: EncryptionStatus::suggest("Fernet"),
            metadata: AnalysisMetadata {
                file_type: "image".into(),
                size: 2048,
                last_modified: Utc::now(),
            },
        };

        let scan = NewScan::from_analysis(UserId::new(), &upload, &result).into_scan();

        assert_eq!(scan.file_name, "id-card.jpg");
        assert_eq!(scan.file_type, "image/jpeg");
        assert_eq!(scan.file_size, 2048);
        assert_eq!(scan.sensitive_data, result.sensitive_data);
        assert_eq!(scan.encryption_status, result.encryption_status);
    }

    #[test]
    fn test_scan_id_parse() {
        let id = ScanId::new();
        assert_eq!(id.to_string().parse::<ScanId>().unwrap(), id);
        assert!("not-a-uuid".parse::<ScanId>().is_err());
    }
}
