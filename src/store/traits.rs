//! Scan store trait definition.

use crate::core::error::StoreError;
use crate::identity::ExternalIdentity;
use crate::store::record::{NewScan, Scan, ScanId, Subscription, User, UserId};

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for persistence of users, subscriptions and scans.
///
/// Every method is a short, self-contained operation. Implementations must
/// not hold a connection or lock across calls; the orchestrator never keeps
/// one open while the detector runs.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use vision_shield::store::{NewScan, Scan, ScanId, ScanStore, Subscription, User, UserId};
/// use vision_shield::identity::ExternalIdentity;
/// use vision_shield::core::StoreError;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct MyStore;
///
/// #[async_trait]
/// impl ScanStore for MyStore {
///     async fn get_subscription(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError> {
///         todo!()
///     }
///
///     async fn count_scans(&self, user_id: UserId) -> Result<u64, StoreError> {
///         todo!()
///     }
///
///     // ...
/// }
/// ```
#[async_trait]
pub trait ScanStore: Send + Sync + Debug {
    /// Returns the user's subscription, if one exists.
    async fn get_subscription(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError>;

    /// Counts the scans recorded for a user.
    async fn count_scans(&self, user_id: UserId) -> Result<u64, StoreError>;

    /// Records a scan, assigning its id and creation time.
    async fn create_scan(&self, scan: NewScan) -> Result<Scan, StoreError>;

    /// Lists a user's scans, newest first.
    async fn list_scans(&self, user_id: UserId) -> Result<Vec<Scan>, StoreError>;

    /// Fetches one of the user's scans.
    ///
    /// A scan that exists but belongs to another user is reported as
    /// [`StoreError::NotFound`], indistinguishable from a missing one.
    async fn get_scan(&self, user_id: UserId, scan_id: ScanId) -> Result<Scan, StoreError>;

    /// Returns the user for an external identity, creating it on first sight.
    ///
    /// A newly created user also gets the default FREE subscription with a
    /// trial period of `trial`. Existing users are returned unchanged.
    async fn provision_user(
        &self,
        identity: &ExternalIdentity,
        trial: chrono::Duration,
    ) -> Result<User, StoreError>;
}

/// A shared, dynamically dispatched scan store.
pub type ArcScanStore = Arc<dyn ScanStore>;
