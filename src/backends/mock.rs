//! Mock detector for testing.
//!
//! This module provides a configurable in-process detector that can be
//! used in tests to simulate detector outcomes without launching a child
//! process.

use crate::core::{
    AnalysisResult, Detector, DetectorError, DetectorMetadata, DetectorReport, EncryptionStatus,
    Finding,
};

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How the mock should fail, if at all.
#[derive(Debug, Clone)]
enum FailureMode {
    NonZeroExit { code: i32, stderr: String },
    MalformedOutput(String),
}

/// A mock detector for testing purposes.
///
/// # Examples
///
/// ```rust
/// use vision_shield::backends::MockDetector;
/// use vision_shield::core::{EncryptionStatus, Finding};
/// use std::time::Duration;
///
/// // Reports nothing sensitive
/// let detector = MockDetector::new_clean();
///
/// // Reports a finding and suggests encryption
/// let detector = MockDetector::new()
///     .with_finding(Finding::new("Credit Card", 0.91, "Image content"))
///     .with_encryption_status(EncryptionStatus::suggest("Fernet"))
///     .with_latency(Duration::from_millis(20));
/// ```
#[derive(Debug)]
pub struct MockDetector {
    name: String,
    findings: Vec<Finding>,
    encryption_status: EncryptionStatus,
    file_type: String,
    latency: Option<Duration>,
    failure: Option<FailureMode>,
    invocations: AtomicU64,
}

impl MockDetector {
    /// Creates a new mock detector that reports a clean image.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            findings: Vec::new(),
            encryption_status: EncryptionStatus::unencrypted(),
            file_type: "image".to_string(),
            latency: None,
            failure: None,
            invocations: AtomicU64::new(0),
        }
    }

    /// Creates a mock detector that always reports a clean image.
    pub fn new_clean() -> Self {
        Self::new()
    }

    /// Creates a mock detector that always exits with a non-zero status.
    pub fn new_failing(stderr: impl Into<String>) -> Self {
        Self {
            failure: Some(FailureMode::NonZeroExit {
                code: 1,
                stderr: stderr.into(),
            }),
            ..Self::new()
        }
    }

    /// Creates a mock detector whose output cannot be parsed.
    pub fn new_malformed(raw: impl Into<String>) -> Self {
        Self {
            failure: Some(FailureMode::MalformedOutput(raw.into())),
            ..Self::new()
        }
    }

    /// Sets the name of this detector.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a finding to every report.
    pub fn with_finding(mut self, finding: Finding) -> Self {
        self.findings.push(finding);
        self
    }

    /// Sets the reported encryption status.
    pub fn with_encryption_status(mut self, status: EncryptionStatus) -> Self {
        self.encryption_status = status;
        self
    }

    /// Sets the reported file type.
    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = file_type.into();
        self
    }

    /// Sets the simulated analysis latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns the number of analyses requested so far.
    pub fn invocation_count(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for MockDetector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(
        &self,
        payload: &[u8],
        deadline: Duration,
    ) -> Result<AnalysisResult, DetectorError> {
        self.invocations.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            if latency > deadline {
                tokio::time::sleep(deadline).await;
                return Err(DetectorError::timeout(deadline));
            }
            tokio::time::sleep(latency).await;
        }

        match &self.failure {
            Some(FailureMode::NonZeroExit { code, stderr }) => {
                return Err(DetectorError::NonZeroExit {
                    code: Some(*code),
                    stderr: stderr.clone(),
                });
            }
            Some(FailureMode::MalformedOutput(raw)) => {
                // Same parser the process backend uses.
                return DetectorReport::parse(raw.as_bytes()).map(|r| r.into_result(Utc::now()));
            }
            None => {}
        }

        let report = DetectorReport {
            sensitive_data: self.findings.clone(),
            encryption_status: self.encryption_status.clone(),
            metadata: DetectorMetadata {
                file_type: self.file_type.clone(),
                size: payload.len() as u64,
            },
        };

        Ok(report.into_result(Utc::now()))
    }
}
