//! The scan submission pipeline.

use crate::audit::{self, ScanAuditEvent};
use crate::core::{
    AnalysisResult, ArcDetector, BuildError, Detector, DetectorError, FileHash, FileHasher,
    IdentityError, ImageUpload, SubmissionError,
};
use crate::identity::{ArcIdentityProvider, AuthContext, IdentityProvider};
use crate::quota::{QuotaConfig, QuotaDecision, QuotaGuard};
use crate::store::{ArcScanStore, NewScan, Scan, ScanId, ScanStore, UserId};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Extra time granted past the analysis deadline before the orchestrator
/// gives up on a detector that ignores it.
const ANALYSIS_GRACE: Duration = Duration::from_secs(2);

/// Configuration for the scan orchestrator.
#[derive(Debug, Clone)]
pub struct ScanOrchestratorConfig {
    /// Deadline handed to the detector for each analysis.
    pub analysis_timeout: Duration,

    /// Trial length given to newly provisioned users.
    pub trial_period: chrono::Duration,

    /// Quota settings.
    pub quota: QuotaConfig,
}

impl Default for ScanOrchestratorConfig {
    fn default() -> Self {
        Self {
            analysis_timeout: Duration::from_secs(60),
            trial_period: chrono::Duration::days(14),
            quota: QuotaConfig::default(),
        }
    }
}

impl ScanOrchestratorConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the analysis deadline.
    pub fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    /// Sets the trial length for new users.
    pub fn with_trial_period(mut self, trial: chrono::Duration) -> Self {
        self.trial_period = trial;
        self
    }

    /// Sets the FREE plan allowance.
    pub fn with_free_scan_limit(mut self, limit: u64) -> Self {
        self.quota.free_scan_limit = limit;
        self
    }
}

/// The stages a submission passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    /// Resolving and provisioning the caller.
    Authenticating,
    /// Checking that an image was supplied.
    ValidatingInput,
    /// Consulting the quota guard.
    QuotaCheck,
    /// Waiting on the detector.
    Analyzing,
    /// Recording the scan.
    Persisting,
    /// Handing the result back.
    Responding,
}

impl SubmissionStage {
    /// Stable stage name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticating => "authenticating",
            Self::ValidatingInput => "validating_input",
            Self::QuotaCheck => "quota_check",
            Self::Analyzing => "analyzing",
            Self::Persisting => "persisting",
            Self::Responding => "responding",
        }
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-submission bookkeeping for logs and audit events.
struct SubmissionTrace {
    id: String,
    stage: SubmissionStage,
    user_id: Option<UserId>,
    file_hash: Option<FileHash>,
    started: Instant,
}

impl SubmissionTrace {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            stage: SubmissionStage::Authenticating,
            user_id: None,
            file_hash: None,
            started: Instant::now(),
        }
    }

    fn enter(&mut self, stage: SubmissionStage) {
        self.stage = stage;
        tracing::debug!(
            submission_id = %self.id,
            user_id = ?self.user_id.map(|u| u.to_string()),
            stage = %stage,
            "Entering submission stage"
        );
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn record_failure(&self, error: &SubmissionError) {
        let reason = error.reason();
        let duration_ms = self.elapsed().as_millis() as u64;

        if error.is_internal() {
            tracing::error!(
                submission_id = %self.id,
                stage = %self.stage,
                reason,
                error = %error,
                duration_ms,
                "Scan submission failed"
            );
        } else {
            tracing::info!(
                submission_id = %self.id,
                stage = %self.stage,
                reason,
                duration_ms,
                "Scan submission refused"
            );
        }

        match (error, self.user_id, &self.file_hash) {
            (
                SubmissionError::NoSubscription | SubmissionError::QuotaExceeded { .. },
                Some(user_id),
                Some(hash),
            ) => audit::emit_submission_denied(&self.id, user_id, hash, reason),
            _ => audit::emit_submission_aborted(
                &self.id,
                self.stage.as_str(),
                reason,
                self.user_id,
                self.file_hash.as_ref(),
            ),
        }
    }
}

/// Builder for creating a `ScanOrchestrator`.
pub struct ScanOrchestratorBuilder {
    detector: Option<ArcDetector>,
    store: Option<ArcScanStore>,
    identity: Option<ArcIdentityProvider>,
    config: ScanOrchestratorConfig,
}

impl ScanOrchestratorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            detector: None,
            store: None,
            identity: None,
            config: ScanOrchestratorConfig::default(),
        }
    }

    /// Sets the detector.
    pub fn with_detector<D: Detector + 'static>(mut self, detector: D) -> Self {
        self.detector = Some(Arc::new(detector));
        self
    }

    /// Sets a detector already wrapped in an Arc.
    pub fn with_arc_detector(mut self, detector: ArcDetector) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Sets the scan store.
    pub fn with_store<S: ScanStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Sets a scan store already wrapped in an Arc.
    pub fn with_arc_store(mut self, store: ArcScanStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the identity provider.
    pub fn with_identity_provider<I: IdentityProvider + 'static>(mut self, provider: I) -> Self {
        self.identity = Some(Arc::new(provider));
        self
    }

    /// Sets an identity provider already wrapped in an Arc.
    pub fn with_arc_identity_provider(mut self, provider: ArcIdentityProvider) -> Self {
        self.identity = Some(provider);
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: ScanOrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Result<ScanOrchestrator, BuildError> {
        let detector = self.detector.ok_or(BuildError::MissingComponent("detector"))?;
        let store = self.store.ok_or(BuildError::MissingComponent("scan store"))?;
        let identity = self
            .identity
            .ok_or(BuildError::MissingComponent("identity provider"))?;

        if self.config.analysis_timeout.is_zero() {
            return Err(BuildError::InvalidSetting {
                message: "analysis timeout must be positive".into(),
            });
        }

        Ok(ScanOrchestrator {
            detector,
            quota: QuotaGuard::new(store.clone(), self.config.quota.clone()),
            store,
            identity,
            config: self.config,
            hasher: FileHasher::new(),
        })
    }
}

impl Default for ScanOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs scan submissions and history lookups for authenticated users.
///
/// A submission moves through [`SubmissionStage`]s in order and stops at the
/// first failure. Nothing is persisted unless the detector succeeded, and
/// the analysis result is only returned once its scan row exists.
#[derive(Debug)]
pub struct ScanOrchestrator {
    detector: ArcDetector,
    store: ArcScanStore,
    identity: ArcIdentityProvider,
    quota: QuotaGuard,
    config: ScanOrchestratorConfig,
    hasher: FileHasher,
}

impl ScanOrchestrator {
    /// Creates a new builder.
    pub fn builder() -> ScanOrchestratorBuilder {
        ScanOrchestratorBuilder::new()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ScanOrchestratorConfig {
        &self.config
    }

    /// Returns the scan store.
    pub fn store(&self) -> &ArcScanStore {
        &self.store
    }

    /// Resolves a bearer token to a provisioned user.
    ///
    /// First-time callers are created along with a FREE subscription.
    pub async fn authenticate(
        &self,
        credential: Option<&str>,
    ) -> Result<AuthContext, SubmissionError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SubmissionError::Unauthenticated(
                IdentityError::MissingCredential,
            ))?;

        let identity = self
            .identity
            .verify(token)
            .await
            .map_err(SubmissionError::Unauthenticated)?;

        let user = self
            .store
            .provision_user(&identity, self.config.trial_period)
            .await
            .map_err(SubmissionError::StorageFailed)?;

        Ok(AuthContext::new(user))
    }

    /// Submits an image for analysis.
    ///
    /// On success the scan has been recorded and its full analysis result is
    /// returned. Every failure carries a reason code; see
    /// [`SubmissionError::reason`].
    pub async fn submit(
        &self,
        credential: Option<&str>,
        upload: Option<ImageUpload>,
    ) -> Result<AnalysisResult, SubmissionError> {
        let auth = self.admit(credential).await?;
        self.submit_authenticated(&auth, upload).await
    }

    /// Authenticates the caller of a submission.
    ///
    /// Unlike [`authenticate`](Self::authenticate), a failure here is logged
    /// and audited as an aborted submission. Callers that must not read the
    /// upload before the caller is known use this followed by
    /// [`submit_authenticated`](Self::submit_authenticated).
    pub async fn admit(&self, credential: Option<&str>) -> Result<AuthContext, SubmissionError> {
        let mut trace = SubmissionTrace::new();
        trace.enter(SubmissionStage::Authenticating);

        let outcome = self.authenticate(credential).await;
        if let Err(e) = &outcome {
            trace.record_failure(e);
        }
        outcome
    }

    /// Submits an image on behalf of an already authenticated caller,
    /// starting at input validation.
    pub async fn submit_authenticated(
        &self,
        auth: &AuthContext,
        upload: Option<ImageUpload>,
    ) -> Result<AnalysisResult, SubmissionError> {
        let mut trace = SubmissionTrace::new();
        trace.user_id = Some(auth.user_id());

        let outcome = self.run_submission(auth, upload, &mut trace).await;
        if let Err(e) = &outcome {
            trace.record_failure(e);
        }
        outcome
    }

    async fn run_submission(
        &self,
        auth: &AuthContext,
        upload: Option<ImageUpload>,
        trace: &mut SubmissionTrace,
    ) -> Result<AnalysisResult, SubmissionError> {
        let user_id = auth.user_id();

        trace.enter(SubmissionStage::ValidatingInput);
        let upload = upload
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SubmissionError::bad_input("no image file provided"))?;
        let file_hash = self.hasher.hash_upload(&upload);
        audit::emit_submission_started(&trace.id, user_id, &file_hash, upload.size());
        trace.file_hash = Some(file_hash.clone());

        trace.enter(SubmissionStage::QuotaCheck);
        let subscription = self
            .store
            .get_subscription(user_id)
            .await
            .map_err(SubmissionError::StorageFailed)?;
        let decision = self
            .quota
            .check_allowed(user_id, subscription.as_ref())
            .await
            .map_err(SubmissionError::StorageFailed)?;
        if let QuotaDecision::Denied(reason) = decision {
            return Err(reason.into());
        }

        trace.enter(SubmissionStage::Analyzing);
        let result = self.analyze(&upload).await.map_err(|e| {
            tracing::warn!(
                submission_id = %trace.id,
                detector = %self.detector.name(),
                kind = e.kind(),
                error = %e,
                "Detector failed"
            );
            SubmissionError::AnalysisFailed(e)
        })?;

        trace.enter(SubmissionStage::Persisting);
        let scan = self
            .store
            .create_scan(NewScan::from_analysis(user_id, &upload, &result))
            .await
            .map_err(SubmissionError::StorageFailed)?;
        audit::emit_scan_recorded(&ScanAuditEvent::new(
            &trace.id,
            &scan,
            &file_hash,
            trace.elapsed(),
        ));

        trace.enter(SubmissionStage::Responding);
        tracing::info!(
            submission_id = %trace.id,
            user_id = %user_id,
            scan_id = %scan.id,
            findings = result.sensitive_data.len(),
            duration_ms = trace.elapsed().as_millis() as u64,
            "Scan submission completed"
        );

        Ok(result)
    }

    async fn analyze(&self, upload: &ImageUpload) -> Result<AnalysisResult, DetectorError> {
        let deadline = self.config.analysis_timeout;

        // Backstop for detectors that ignore the deadline they are given.
        match tokio::time::timeout(
            deadline.saturating_add(ANALYSIS_GRACE),
            self.detector.analyze(upload.bytes(), deadline),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DetectorError::timeout(deadline)),
        }
    }

    /// Lists the caller's scans, newest first.
    pub async fn history(&self, auth: &AuthContext) -> Result<Vec<Scan>, SubmissionError> {
        self.store
            .list_scans(auth.user_id())
            .await
            .map_err(SubmissionError::StorageFailed)
    }

    /// Fetches one of the caller's scans.
    ///
    /// Scans owned by other users are reported as [`SubmissionError::NotFound`].
    pub async fn scan_detail(
        &self,
        auth: &AuthContext,
        scan_id: ScanId,
    ) -> Result<Scan, SubmissionError> {
        self.store
            .get_scan(auth.user_id(), scan_id)
            .await
            .map_err(SubmissionError::from)
    }
}
