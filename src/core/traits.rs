//! Core traits for the vision-shield library.
//!
//! This module defines the `Detector` trait that every analysis backend
//! implements. The orchestrator only ever talks to a detector through it,
//! so the concrete mechanism (child process, local service, RPC) can be
//! swapped without touching the pipeline.

use crate::core::error::DetectorError;
use crate::core::types::AnalysisResult;

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// An out-of-process capability that classifies an image.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync` for use behind an `Arc`.
/// - Each call is independent; implementations keep no per-request state.
/// - `analyze` must return within `deadline`, reporting
///   [`DetectorError::Timeout`] and releasing any spawned resources when it
///   cannot.
/// - The returned result's `metadata.last_modified` is the time the
///   analysis finished, set by the implementation rather than the detector.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use vision_shield::core::{AnalysisResult, Detector, DetectorError};
/// use async_trait::async_trait;
/// use std::time::Duration;
///
/// #[derive(Debug)]
/// struct RemoteDetector {
///     endpoint: String,
/// }
///
/// #[async_trait]
/// impl Detector for RemoteDetector {
///     fn name(&self) -> &str {
///         "remote"
///     }
///
///     async fn analyze(
///         &self,
///         payload: &[u8],
///         deadline: Duration,
///     ) -> Result<AnalysisResult, DetectorError> {
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait Detector: Send + Sync + Debug {
    /// Stable, human-readable name of this detector.
    fn name(&self) -> &str;

    /// Analyzes the given image bytes.
    ///
    /// # Errors
    ///
    /// - `Spawn` - the detector could not be started.
    /// - `NonZeroExit` - the detector reported failure.
    /// - `MalformedOutput` - the detector's document could not be parsed.
    /// - `Timeout` - `deadline` elapsed first.
    async fn analyze(
        &self,
        payload: &[u8],
        deadline: Duration,
    ) -> Result<AnalysisResult, DetectorError>;
}

/// An arc-wrapped detector for shared ownership.
pub type ArcDetector = std::sync::Arc<dyn Detector>;
