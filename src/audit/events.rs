//! Audit event types and emission functions.

use crate::core::{FileHash, Finding};
use crate::store::{Scan, UserId};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Target under which every audit event is emitted.
pub const AUDIT_TARGET: &str = "vision_shield::audit";

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit record of a persisted scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Correlates the events of one submission.
    pub submission_id: String,

    /// Stored scan ID.
    pub scan_id: String,

    /// Owning user.
    pub user_id: String,

    /// Upload digest (BLAKE3).
    pub file_hash_blake3: String,

    /// Declared MIME type.
    pub file_type: String,

    /// Upload size in bytes.
    pub file_size: u64,

    /// What the detector found. Locations are omitted.
    pub findings: Vec<FindingSummary>,

    /// Whether the detector recommended encryption.
    pub encryption_suggested: bool,

    /// Wall time from submission start to persistence.
    pub duration_ms: u64,
}

impl ScanAuditEvent {
    /// Builds the event for a freshly stored scan.
    pub fn new(submission_id: &str, scan: &Scan, file_hash: &FileHash, elapsed: Duration) -> Self {
        Self {
            timestamp: Utc::now(),
            submission_id: submission_id.to_string(),
            scan_id: scan.id.to_string(),
            user_id: scan.user_id.to_string(),
            file_hash_blake3: file_hash.blake3.clone(),
            file_type: scan.file_type.clone(),
            file_size: scan.file_size,
            findings: scan.sensitive_data.iter().map(FindingSummary::from).collect(),
            encryption_suggested: scan.encryption_status.suggested.unwrap_or(false),
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

impl AuditEvent for ScanAuditEvent {
    fn event_type(&self) -> &'static str {
        "scan_recorded"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Summary of a finding for audit logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingSummary {
    /// Kind of sensitive data.
    pub kind: String,
    /// Detector confidence.
    pub confidence: f64,
}

impl From<&Finding> for FindingSummary {
    fn from(f: &Finding) -> Self {
        Self {
            kind: f.kind.clone(),
            confidence: f.confidence,
        }
    }
}

/// Emits an audit event for a submission that passed authentication.
pub fn emit_submission_started(
    submission_id: &str,
    user_id: UserId,
    file_hash: &FileHash,
    file_size: u64,
) {
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "submission_started",
        submission_id = %submission_id,
        user_id = %user_id,
        file_hash_blake3 = %file_hash.blake3,
        file_size,
        "Scan submission started"
    );
}

/// Emits an audit event for a submission refused by the quota guard.
pub fn emit_submission_denied(
    submission_id: &str,
    user_id: UserId,
    file_hash: &FileHash,
    reason: &str,
) {
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "submission_denied",
        submission_id = %submission_id,
        user_id = %user_id,
        file_hash_blake3 = %file_hash.blake3,
        reason = %reason,
        "Scan submission denied"
    );
}

/// Emits an audit event for a submission that ended in an error.
///
/// `user_id` and `file_hash` are absent when the submission failed before
/// they were known.
pub fn emit_submission_aborted(
    submission_id: &str,
    stage: &str,
    reason: &str,
    user_id: Option<UserId>,
    file_hash: Option<&FileHash>,
) {
    tracing::warn!(
        target: AUDIT_TARGET,
        event_type = "submission_aborted",
        submission_id = %submission_id,
        stage = %stage,
        reason = %reason,
        user_id = ?user_id.map(|u| u.to_string()),
        file_hash_blake3 = ?file_hash.map(|h| h.blake3.as_str()),
        "Scan submission aborted"
    );
}

/// Emits an audit event for a persisted scan.
pub fn emit_scan_recorded(event: &ScanAuditEvent) {
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = event.event_type(),
        submission_id = %event.submission_id,
        scan_id = %event.scan_id,
        user_id = %event.user_id,
        file_hash_blake3 = %event.file_hash_blake3,
        file_type = %event.file_type,
        file_size = event.file_size,
        findings = ?event.findings,
        finding_count = event.findings.len(),
        encryption_suggested = event.encryption_suggested,
        duration_ms = event.duration_ms,
        "Scan recorded"
    );
}
