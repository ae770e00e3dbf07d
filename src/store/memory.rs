//! In-memory scan store for tests and local development.

use crate::core::error::StoreError;
use crate::core::EncryptionStatus;
use crate::identity::ExternalIdentity;
use crate::store::record::{NewScan, Scan, ScanId, Subscription, User, UserId};
use crate::store::traits::ScanStore;

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    /// Users keyed by external id.
    users: HashMap<String, User>,
    subscriptions: HashMap<UserId, Subscription>,
    /// Append-only, in insertion order.
    scans: Vec<Scan>,
}

/// A scan store that keeps everything in process memory.
///
/// Nothing survives a restart. Writes can be made to fail on demand with
/// [`InMemoryScanStore::fail_writes`] to exercise storage error paths.
#[derive(Debug, Default)]
pub struct InMemoryScanStore {
    state: RwLock<State>,
    fail_writes: AtomicBool,
}

impl InMemoryScanStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Inserts or replaces a subscription.
    pub async fn put_subscription(&self, subscription: Subscription) {
        self.state
            .write()
            .await
            .subscriptions
            .insert(subscription.user_id, subscription);
    }

    /// Removes a user's subscription, if any.
    pub async fn remove_subscription(&self, user_id: UserId) -> Option<Subscription> {
        self.state.write().await.subscriptions.remove(&user_id)
    }

    /// Records `count` placeholder scans for a user.
    pub async fn seed_scans(&self, user_id: UserId, count: usize) {
        let mut state = self.state.write().await;
        for i in 0..count {
            state.scans.push(
                NewScan {
                    user_id,
                    file_name: format!("seed-{}.png", i),
                    file_type: "image/png".to_string(),
                    file_size: 0,
                    sensitive_data: Vec::new(),
                    encryption_status: EncryptionStatus::unencrypted(),
                }
                .into_scan(),
            );
        }
    }

    /// Looks up a user by external id.
    pub async fn user_by_external_id(&self, external_id: &str) -> Option<User> {
        self.state.read().await.users.get(external_id).cloned()
    }

    /// Total number of scans across all users.
    pub async fn total_scans(&self) -> usize {
        self.state.read().await.scans.len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("writes disabled"));
        }
        Ok(())
    }
}

#[async_trait]
impl ScanStore for InMemoryScanStore {
    async fn get_subscription(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError> {
        Ok(self.state.read().await.subscriptions.get(&user_id).cloned())
    }

    async fn count_scans(&self, user_id: UserId) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        Ok(state.scans.iter().filter(|s| s.user_id == user_id).count() as u64)
    }

    async fn create_scan(&self, scan: NewScan) -> Result<Scan, StoreError> {
        self.check_writable()?;

        let scan = scan.into_scan();
        self.state.write().await.scans.push(scan.clone());

        tracing::debug!(scan_id = %scan.id, user_id = %scan.user_id, "Stored scan in memory");
        Ok(scan)
    }

    async fn list_scans(&self, user_id: UserId) -> Result<Vec<Scan>, StoreError> {
        let state = self.state.read().await;
        // Reverse insertion order first so equal timestamps still come out newest first.
        let mut scans: Vec<Scan> = state
            .scans
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        scans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(scans)
    }

    async fn get_scan(&self, user_id: UserId, scan_id: ScanId) -> Result<Scan, StoreError> {
        let state = self.state.read().await;
        state
            .scans
            .iter()
            .find(|s| s.id == scan_id && s.user_id == user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(scan_id))
    }

    async fn provision_user(
        &self,
        identity: &ExternalIdentity,
        trial: chrono::Duration,
    ) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if let Some(user) = state.users.get(&identity.external_id) {
            return Ok(user.clone());
        }

        self.check_writable()?;

        let user = User {
            id: UserId::new(),
            external_id: identity.external_id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            created_at: Utc::now(),
        };
        state
            .users
            .insert(identity.external_id.clone(), user.clone());
        state
            .subscriptions
            .insert(user.id, Subscription::default_trial(user.id, trial));

        tracing::info!(user_id = %user.id, "Provisioned new user");
        Ok(user)
    }
}
