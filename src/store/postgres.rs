//! PostgreSQL scan store backed by `sqlx`.

use crate::core::error::StoreError;
use crate::core::{EncryptionStatus, Finding};
use crate::identity::ExternalIdentity;
use crate::store::record::{NewScan, Scan, ScanId, Subscription, User, UserId};
use crate::store::traits::ScanStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const SCAN_COLUMNS: &str = "id, user_id, file_name, file_type, file_size, sensitive_data, \
                            encryption_status, created_at";

const USER_COLUMNS: &str = "id, external_id, email, name, created_at";

/// Scan store persisting to PostgreSQL.
///
/// The pool is created by the caller and injected here. Each operation runs
/// a single statement, except provisioning which uses one short transaction.
#[derive(Debug, Clone)]
pub struct PgScanStore {
    pool: PgPool,
}

impl PgScanStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to apply migrations: {}", e);
                StoreError::database(e.to_string())
            })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> StoreError {
    tracing::error!("Database error {}: {}", context, e);
    StoreError::from(e)
}

fn scan_from_row(row: &PgRow) -> Result<Scan, StoreError> {
    let file_size: i64 = row.try_get("file_size")?;
    let Json(sensitive_data): Json<Vec<Finding>> = row.try_get("sensitive_data")?;
    let Json(encryption_status): Json<EncryptionStatus> = row.try_get("encryption_status")?;

    Ok(Scan {
        id: ScanId(row.try_get::<Uuid, _>("id")?),
        user_id: UserId(row.try_get::<Uuid, _>("user_id")?),
        file_name: row.try_get("file_name")?,
        file_type: row.try_get("file_type")?,
        file_size: u64::try_from(file_size)
            .map_err(|_| StoreError::serialization(format!("negative file size {}", file_size)))?,
        sensitive_data,
        encryption_status,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId(row.try_get::<Uuid, _>("id")?),
        external_id: row.try_get("external_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn subscription_from_row(row: &PgRow) -> Result<Subscription, StoreError> {
    let plan: String = row.try_get("plan")?;
    let status: String = row.try_get("status")?;

    Ok(Subscription {
        user_id: UserId(row.try_get::<Uuid, _>("user_id")?),
        plan: plan.parse().map_err(StoreError::serialization)?,
        status: status.parse().map_err(StoreError::serialization)?,
        trial_ends_at: row.try_get("trial_ends_at")?,
        current_period_end: row.try_get("current_period_end")?,
    })
}

#[async_trait]
impl ScanStore for PgScanStore {
    async fn get_subscription(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, plan, status, trial_ends_at, current_period_end
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("fetching subscription", e))?;

        row.as_ref().map(subscription_from_row).transpose()
    }

    async fn count_scans(&self, user_id: UserId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scans WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("counting scans", e))?;

        Ok(count.max(0) as u64)
    }

    async fn create_scan(&self, scan: NewScan) -> Result<Scan, StoreError> {
        let file_size = i64::try_from(scan.file_size)
            .map_err(|_| StoreError::serialization("file size exceeds i64"))?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO scans (id, user_id, file_name, file_type, file_size,
                               sensitive_data, encryption_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            SCAN_COLUMNS
        ))
        .bind(ScanId::new().as_uuid())
        .bind(scan.user_id.as_uuid())
        .bind(&scan.file_name)
        .bind(&scan.file_type)
        .bind(file_size)
        .bind(Json(&scan.sensitive_data))
        .bind(Json(&scan.encryption_status))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("creating scan", e))?;

        scan_from_row(&row)
    }

    async fn list_scans(&self, user_id: UserId) -> Result<Vec<Scan>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM scans WHERE user_id = $1 ORDER BY created_at DESC",
            SCAN_COLUMNS
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("listing scans", e))?;

        rows.iter().map(scan_from_row).collect()
    }

    async fn get_scan(&self, user_id: UserId, scan_id: ScanId) -> Result<Scan, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM scans WHERE id = $1 AND user_id = $2",
            SCAN_COLUMNS
        ))
        .bind(scan_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("fetching scan", e))?;

        match row {
            Some(row) => scan_from_row(&row),
            None => Err(StoreError::not_found(scan_id)),
        }
    }

    async fn provision_user(
        &self,
        identity: &ExternalIdentity,
        trial: chrono::Duration,
    ) -> Result<User, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("starting provisioning transaction", e))?;

        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, external_id, email, name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (external_id) DO NOTHING
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(UserId::new().as_uuid())
        .bind(&identity.external_id)
        .bind(&identity.email)
        .bind(identity.name.as_deref())
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("inserting user", e))?;

        let user = match inserted {
            Some(row) => {
                let user = user_from_row(&row)?;
                let sub = Subscription::default_trial(user.id, trial);

                sqlx::query(
                    r#"
                    INSERT INTO subscriptions (id, user_id, plan, status, trial_ends_at)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (user_id) DO NOTHING
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(user.id.as_uuid())
                .bind(sub.plan.as_str())
                .bind(sub.status.as_str())
                .bind(sub.trial_ends_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("creating default subscription", e))?;

                tracing::info!(user_id = %user.id, "Provisioned new user");
                user
            }
            None => {
                let row = sqlx::query(&format!(
                    "SELECT {} FROM users WHERE external_id = $1",
                    USER_COLUMNS
                ))
                .bind(&identity.external_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| db_error("fetching user", e))?;
                user_from_row(&row)?
            }
        };

        tx.commit()
            .await
            .map_err(|e| db_error("committing provisioning transaction", e))?;

        Ok(user)
    }
}
