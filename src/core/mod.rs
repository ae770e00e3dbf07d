//! Core types and traits for the vision-shield library.
//!
//! - [`types`] - Analysis documents: `AnalysisResult`, `Finding`, `EncryptionStatus`
//! - [`traits`] - The `Detector` trait
//! - [`error`] - Structured error types
//! - [`input`] - Uploaded image abstraction
//! - [`hasher`] - BLAKE3 upload digests for audit correlation

pub mod error;
pub mod hasher;
pub mod input;
pub mod traits;
pub mod types;

pub use error::{
    BuildError, DetectorError, DetectorResult, IdentityError, StoreError, StoreResult,
    SubmissionError,
};
pub use hasher::FileHasher;
pub use input::ImageUpload;
pub use traits::{ArcDetector, Detector};
pub use types::{
    AnalysisMetadata, AnalysisResult, DetectorMetadata, DetectorReport, EncryptionStatus,
    FileHash, Finding,
};
