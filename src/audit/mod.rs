//! Structured audit logging of scan submissions.
//!
//! Events are emitted through `tracing` under the `vision_shield::audit`
//! target, so any subscriber can route them to a separate sink. Uploads are
//! identified by their BLAKE3 digest; image contents are never logged.

mod events;

pub use events::{
    emit_scan_recorded, emit_submission_aborted, emit_submission_denied,
    emit_submission_started, AuditEvent, FindingSummary, ScanAuditEvent, AUDIT_TARGET,
};
