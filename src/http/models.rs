//! Response bodies.

use crate::core::{EncryptionStatus, Finding};
use crate::store::{Scan, ScanId};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored scan as returned to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanView {
    /// Scan identifier.
    pub id: ScanId,
    /// Original file name.
    pub file_name: String,
    /// Declared MIME type.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Findings.
    pub sensitive_data: Vec<Finding>,
    /// Encryption status.
    pub encryption_status: EncryptionStatus,
    /// When the scan was recorded.
    pub created_at: DateTime<Utc>,
}

impl From<Scan> for ScanView {
    fn from(scan: Scan) -> Self {
        Self {
            id: scan.id,
            file_name: scan.file_name,
            file_type: scan.file_type,
            file_size: scan.file_size,
            sensitive_data: scan.sensitive_data,
            encryption_status: scan.encryption_status,
            created_at: scan.created_at,
        }
    }
}

/// Liveness check body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves requests.
    pub status: String,
}

impl HealthResponse {
    /// The healthy response.
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}
