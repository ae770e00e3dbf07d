//! Core types used throughout the vision-shield library.
//!
//! These are the wire shapes exchanged with the detector process and
//! returned to API callers. Field names follow the detector's camelCase
//! document format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::DetectorError;

/// One detected sensitive-data instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Kind of sensitive data (e.g. "Credit Card", "SSN").
    #[serde(rename = "type")]
    pub kind: String,

    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,

    /// Where in the image the data was found.
    pub location: String,
}

impl Finding {
    /// Creates a new finding.
    pub fn new(kind: impl Into<String>, confidence: f64, location: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            confidence,
            location: location.into(),
        }
    }

    /// Returns `true` if the confidence lies in `[0, 1]`.
    pub fn has_valid_confidence(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }
}

/// Encryption status reported by the detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionStatus {
    /// Whether the content is already encrypted.
    pub is_encrypted: bool,

    /// Cipher label, if encrypted or suggested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_type: Option<String>,

    /// Whether encryption is recommended for this content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested: Option<bool>,
}

impl EncryptionStatus {
    /// Status for plain, unencrypted content with no recommendation.
    pub fn unencrypted() -> Self {
        Self::default()
    }

    /// Status recommending encryption with the given cipher.
    pub fn suggest(cipher: impl Into<String>) -> Self {
        Self {
            is_encrypted: false,
            encryption_type: Some(cipher.into()),
            suggested: Some(true),
        }
    }
}

/// Metadata section of an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// File type as seen by the detector.
    pub file_type: String,

    /// Payload size as seen by the detector.
    pub size: u64,

    /// When the analysis completed. Stamped by the invoker.
    pub last_modified: DateTime<Utc>,
}

/// The complete outcome of one detector invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Sensitive data found in the image.
    pub sensitive_data: Vec<Finding>,

    /// Encryption status of the image.
    pub encryption_status: EncryptionStatus,

    /// File metadata.
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Returns `true` if any sensitive data was found.
    pub fn has_findings(&self) -> bool {
        !self.sensitive_data.is_empty()
    }
}

/// Metadata as emitted by the detector (no timestamp).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorMetadata {
    /// File type as seen by the detector.
    pub file_type: String,

    /// Payload size as seen by the detector.
    pub size: u64,
}

/// The document a detector writes to its output channel.
///
/// Any `lastModified` the detector includes is ignored; the invoker owns
/// that field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorReport {
    /// Sensitive data found in the image.
    pub sensitive_data: Vec<Finding>,

    /// Encryption status of the image.
    pub encryption_status: EncryptionStatus,

    /// File metadata.
    pub metadata: DetectorMetadata,
}

impl DetectorReport {
    /// Parses a detector document.
    pub fn parse(raw: &[u8]) -> Result<Self, DetectorError> {
        let report: Self =
            serde_json::from_slice(raw).map_err(|e| DetectorError::malformed(e.to_string()))?;

        if let Some(bad) = report
            .sensitive_data
            .iter()
            .find(|f| !f.has_valid_confidence())
        {
            return Err(DetectorError::malformed(format!(
                "confidence {} for '{}' is outside [0, 1]",
                bad.confidence, bad.kind
            )));
        }

        Ok(report)
    }

    /// Stamps the report with its analysis time.
    pub fn into_result(self, analyzed_at: DateTime<Utc>) -> AnalysisResult {
        AnalysisResult {
            sensitive_data: self.sensitive_data,
            encryption_status: self.encryption_status,
            metadata: AnalysisMetadata {
                file_type: self.metadata.file_type,
                size: self.metadata.size,
                last_modified: analyzed_at,
            },
        }
    }
}

/// Content digest of an upload, used to correlate audit records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileHash {
    /// BLAKE3 digest, hex encoded.
    pub blake3: String,
}

impl FileHash {
    /// Creates a new `FileHash`.
    pub fn new(blake3: impl Into<String>) -> Self {
        Self {
            blake3: blake3.into(),
        }
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blake3:{}", self.blake3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_JPEG: &str = r#"{
        "sensitiveData": [],
        "encryptionStatus": {"isEncrypted": false},
        "metadata": {"fileType": "image/jpeg", "size": 2048}
    }"#;

    #[test]
    fn test_parse_clean_report() {
        let report = DetectorReport::parse(CLEAN_JPEG.as_bytes()).unwrap();
        assert!(report.sensitive_data.is_empty());
        assert!(!report.encryption_status.is_encrypted);
        assert_eq!(report.metadata.size, 2048);
    }

    #[test]
    fn test_parse_ignores_detector_timestamp_and_nulls() {
        let raw = r#"{
            "sensitiveData": [{"type": "Credit Card", "confidence": 0.93, "location": "Image content"}],
            "encryptionStatus": {"isEncrypted": false, "encryptionType": "Fernet", "suggested": true},
            "metadata": {"fileType": "image", "size": 10, "lastModified": null}
        }"#;
        let report = DetectorReport::parse(raw.as_bytes()).unwrap();
        assert_eq!(report.sensitive_data[0].kind, "Credit Card");
        assert_eq!(report.encryption_status, EncryptionStatus::suggest("Fernet"));

        let raw_null_cipher = r#"{
            "sensitiveData": [],
            "encryptionStatus": {"isEncrypted": false, "encryptionType": null},
            "metadata": {"fileType": "image", "size": 10}
        }"#;
        let report = DetectorReport::parse(raw_null_cipher.as_bytes()).unwrap();
        assert_eq!(report.encryption_status.encryption_type, None);
    }

    #[test]
    fn test_parse_rejects_out_of_range_confidence() {
        let raw = r#"{
            "sensitiveData": [{"type": "SSN", "confidence": 1.7, "location": "top"}],
            "encryptionStatus": {"isEncrypted": false},
            "metadata": {"fileType": "image", "size": 1}
        }"#;
        let err = DetectorReport::parse(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, DetectorError::MalformedOutput { .. }));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = DetectorReport::parse(b"Traceback (most recent call last)").unwrap_err();
        assert!(matches!(err, DetectorError::MalformedOutput { .. }));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let now = Utc::now();
        let result = DetectorReport::parse(CLEAN_JPEG.as_bytes())
            .unwrap()
            .into_result(now);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["sensitiveData"], serde_json::json!([]));
        assert_eq!(json["encryptionStatus"], serde_json::json!({"isEncrypted": false}));
        assert_eq!(json["metadata"]["fileType"], "image/jpeg");
        assert!(json["metadata"]["lastModified"].is_string());
    }
}
