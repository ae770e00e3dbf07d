//! Detector backend implementations.
//!
//! This module contains implementations of the `Detector` trait.
//!
//! ## Available Backends
//!
//! - [`process`] - Launches the external detector as a child process
//! - [`mock`] - An in-process mock for testing
//!
//! ## Implementing a Custom Backend
//!
//! To delegate analysis to something other than a child process (a local
//! service, an RPC endpoint), implement the `Detector` trait:
//!
//! ```rust,ignore
//! use vision_shield::core::{AnalysisResult, Detector, DetectorError};
//! use async_trait::async_trait;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! pub struct MyDetector;
//!
//! #[async_trait]
//! impl Detector for MyDetector {
//!     fn name(&self) -> &str {
//!         "my-detector"
//!     }
//!
//!     async fn analyze(
//!         &self,
//!         payload: &[u8],
//!         deadline: Duration,
//!     ) -> Result<AnalysisResult, DetectorError> {
//!         todo!()
//!     }
//! }
//! ```

pub mod mock;
pub mod process;

pub use mock::MockDetector;
pub use process::{ProcessDetector, ProcessDetectorConfig};
