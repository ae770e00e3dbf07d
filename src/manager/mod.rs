//! Orchestration of scan submissions.
//!
//! The `ScanOrchestrator` authenticates the caller, enforces the plan quota,
//! delegates analysis to the detector and records the outcome.

mod orchestrator;

pub use orchestrator::{
    ScanOrchestrator, ScanOrchestratorBuilder, ScanOrchestratorConfig, SubmissionStage,
};
