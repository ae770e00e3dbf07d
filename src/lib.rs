//! # vision-shield
//!
//! Authenticated image scanning with subscription-tier quotas.
//!
//! ## Overview
//!
//! A caller uploads an image. vision-shield has it analyzed by an external
//! detector for sensitive content and encryption status, records the
//! outcome, and lets the caller browse their scan history.
//!
//! - Authenticate the caller through a pluggable identity provider
//! - Enforce per-plan usage limits (FREE users get a fixed allowance)
//! - Delegate analysis to an external detector process with a deadline
//! - Persist every successful analysis and serve it back to its owner
//! - Emit structured audit events for every submission
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vision_shield::backends::MockDetector;
//! use vision_shield::identity::{ExternalIdentity, StaticIdentityProvider};
//! use vision_shield::store::InMemoryScanStore;
//! use vision_shield::{ImageUpload, ScanOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let identity = StaticIdentityProvider::new()
//!         .with_token("dev-token", ExternalIdentity::new("user_1", "dev@example.com"));
//!
//!     let orchestrator = ScanOrchestrator::builder()
//!         .with_detector(MockDetector::new_clean())
//!         .with_store(InMemoryScanStore::new())
//!         .with_identity_provider(identity)
//!         .build()?;
//!
//!     let upload = ImageUpload::new(std::fs::read("photo.jpg")?)
//!         .with_file_name("photo.jpg")
//!         .with_content_type("image/jpeg");
//!     let result = orchestrator.submit(Some("dev-token"), Some(upload)).await?;
//!
//!     if !result.has_findings() {
//!         println!("Nothing sensitive found");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `postgres` (default) - `PgScanStore` backed by `sqlx`
//! - `http-identity` (default) - `HttpIdentityProvider` backed by `reqwest`
//!
//! ## Architecture
//!
//! - **Core**: Analysis documents, the `Detector` trait, error types
//! - **Backends**: The process detector and a mock for tests
//! - **Identity**: Token verification and the per-request `AuthContext`
//! - **Quota**: Per-plan submission limits
//! - **Store**: Users, subscriptions and scans
//! - **Manager**: The submission pipeline
//! - **Audit**: Structured audit events
//! - **HTTP**: The axum surface

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod config;
pub mod core;
pub mod http;
pub mod identity;
pub mod logging;
pub mod manager;
pub mod quota;
pub mod store;

// Re-export commonly used types at the crate root
pub use crate::core::{
    AnalysisResult, Detector, DetectorError, EncryptionStatus, Finding, ImageUpload,
    SubmissionError,
};

pub use crate::identity::{AuthContext, IdentityProvider};
pub use crate::manager::{ScanOrchestrator, ScanOrchestratorConfig};
pub use crate::quota::{QuotaDecision, QuotaGuard};
pub use crate::store::{Scan, ScanStore};

/// Prelude module for convenient imports.
///
/// ```rust
/// use vision_shield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        AnalysisResult, Detector, DetectorError, EncryptionStatus, Finding, ImageUpload,
        SubmissionError,
    };
    pub use crate::identity::{AuthContext, ExternalIdentity, IdentityProvider};
    pub use crate::manager::{ScanOrchestrator, ScanOrchestratorConfig};
    pub use crate::quota::{QuotaDecision, QuotaGuard};
    pub use crate::store::{Plan, Scan, ScanId, ScanStore, Subscription, UserId};
}
