//! Error types for the vision-shield library.
//!
//! Each collaborator has its own structured error type. The orchestrator
//! folds them into [`SubmissionError`], the user-facing taxonomy. The
//! library never panics; all failures are returned as `Result` values.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while invoking the external detector.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The detector process could not be started.
    #[error("failed to spawn detector '{program}': {source}")]
    Spawn {
        /// Program that was being launched.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The detector exited with a non-zero status.
    #[error("detector exited with status {code:?}: {stderr}")]
    NonZeroExit {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured diagnostic output: stderr, or stdout when stderr was empty.
        stderr: String,
    },

    /// The detector's output could not be interpreted.
    #[error("malformed detector output: {details}")]
    MalformedOutput {
        /// What was wrong with the output.
        details: String,
    },

    /// The detector did not finish before the deadline.
    #[error("detector timed out after {elapsed:?}")]
    Timeout {
        /// The deadline that was exceeded.
        elapsed: Duration,
    },

    /// An I/O error occurred while talking to the detector.
    #[error("detector I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The detector is misconfigured.
    #[error("detector configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl DetectorError {
    /// Creates a `MalformedOutput` error.
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::MalformedOutput {
            details: details.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout { elapsed }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Short label used in logs and audit events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn",
            Self::NonZeroExit { .. } => "non_zero_exit",
            Self::MalformedOutput { .. } => "malformed_output",
            Self::Timeout { .. } => "timeout",
            Self::Io(_) => "io",
            Self::Configuration { .. } => "configuration",
        }
    }
}

/// Errors raised by a scan store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist (or is not visible to the caller).
    #[error("record not found: {id}")]
    NotFound {
        /// Identifier that was looked up.
        id: String,
    },

    /// The backing database reported an error.
    #[error("database error: {message}")]
    Database {
        /// Error message from the driver.
        message: String,
    },

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },

    /// The store refused the operation.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Why the store is unavailable.
        reason: String,
    },
}

impl StoreError {
    /// Creates a `NotFound` error.
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Creates a `Database` error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Creates a `Serialization` error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates an `Unavailable` error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::not_found("row"),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::unavailable(e.to_string())
            }
            other => Self::database(other.to_string()),
        }
    }
}

/// Errors raised by the identity collaborator.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No credential was presented.
    #[error("no credential provided")]
    MissingCredential,

    /// The credential was rejected (invalid, expired, revoked).
    #[error("invalid credential: {reason}")]
    InvalidCredential {
        /// Why the credential was rejected.
        reason: String,
    },

    /// The identity provider could not be reached or answered unexpectedly.
    #[error("identity provider unavailable: {reason}")]
    Unavailable {
        /// Description of the failure.
        reason: String,
    },
}

impl IdentityError {
    /// Creates an `InvalidCredential` error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidCredential {
            reason: reason.into(),
        }
    }

    /// Creates an `Unavailable` error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Why a scan submission (or history lookup) was aborted.
///
/// Authentication, quota and input errors carry a precise, user-visible
/// reason. Analysis and storage failures keep their detail for logging but
/// are reported to callers as opaque internal failures.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The caller could not be authenticated.
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[source] IdentityError),

    /// The caller has no subscription record.
    #[error("user has no subscription")]
    NoSubscription,

    /// The caller's plan does not permit another scan.
    #[error("quota exceeded: {used} of {limit} scans used")]
    QuotaExceeded {
        /// Scans already recorded for the user.
        used: u64,
        /// Limit for the user's plan.
        limit: u64,
    },

    /// The upload was missing or unusable.
    #[error("bad input: {reason}")]
    BadInput {
        /// What was wrong with the upload.
        reason: String,
    },

    /// The detector failed.
    #[error("analysis failed: {0}")]
    AnalysisFailed(#[source] DetectorError),

    /// The store failed.
    #[error("storage failed: {0}")]
    StorageFailed(#[source] StoreError),

    /// The requested scan does not exist for this user.
    #[error("scan not found")]
    NotFound,
}

impl SubmissionError {
    /// Creates a `BadInput` error.
    pub fn bad_input(reason: impl Into<String>) -> Self {
        Self::BadInput {
            reason: reason.into(),
        }
    }

    /// Stable abort reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::NoSubscription => "no_subscription",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::BadInput { .. } => "bad_input",
            Self::AnalysisFailed(_) => "analysis_failed",
            Self::StorageFailed(_) => "storage_failed",
            Self::NotFound => "not_found",
        }
    }

    /// Returns `true` if the failure is internal (5xx-equivalent).
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::AnalysisFailed(_) | Self::StorageFailed(_))
    }
}

impl From<StoreError> for SubmissionError {
    fn from(e: StoreError) -> Self {
        if e.is_not_found() {
            Self::NotFound
        } else {
            Self::StorageFailed(e)
        }
    }
}

/// Errors raised while assembling the orchestrator.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A required collaborator was not supplied.
    #[error("missing required component: {0}")]
    MissingComponent(&'static str),

    /// A setting is out of range.
    #[error("invalid setting: {message}")]
    InvalidSetting {
        /// What was wrong.
        message: String,
    },
}

/// A specialized `Result` type for detector invocations.
pub type DetectorResult<T> = Result<T, DetectorError>;

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
