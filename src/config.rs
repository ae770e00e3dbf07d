//! Service configuration.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. `config/default.toml`
//! 2. `config/{ENV}.toml`, when the `ENV` variable is set
//! 3. `config/local.toml`
//! 4. Environment variables prefixed `VISION_SHIELD`, with `__` between
//!    path segments (`VISION_SHIELD__SERVER__PORT=8080`)
//!
//! Every file is optional; missing settings fall back to the defaults below.

use crate::backends::ProcessDetectorConfig;
use crate::manager::ScanOrchestratorConfig;
use crate::quota::DEFAULT_FREE_SCAN_LIMIT;

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "VISION_SHIELD";

/// Longest detector deadline accepted, in seconds.
pub const MAX_DETECTOR_TIMEOUT_SECS: u64 = 60 * 60;

/// Longest identity provider timeout accepted, in seconds.
pub const MAX_IDENTITY_TIMEOUT_SECS: u64 = 5 * 60;

/// Longest trial period accepted, in days.
pub const MAX_TRIAL_DAYS: i64 = 10 * 365;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Postgres connection.
    pub database: DatabaseConfig,
    /// Detector process.
    pub detector: DetectorConfig,
    /// Identity provider.
    pub identity: IdentityConfig,
    /// Plan quotas.
    pub quota: QuotaSettings,
    /// First-time user defaults.
    pub provisioning: ProvisioningConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Largest accepted scan request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Database connection settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: String,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/vision_shield".to_string(),
            max_connections: 10,
        }
    }
}

// The URL usually embeds a password.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// External detector process settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Program to launch.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Working directory of the process.
    pub working_dir: Option<PathBuf>,
    /// Deadline for one analysis, in seconds.
    pub timeout_secs: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let process = ProcessDetectorConfig::default();
        Self {
            program: process.program,
            args: process.args,
            working_dir: process.working_dir,
            timeout_secs: 60,
        }
    }
}

impl DetectorConfig {
    /// Analysis deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Settings for the process detector.
    pub fn process_config(&self) -> ProcessDetectorConfig {
        let config = ProcessDetectorConfig::new(&self.program).with_args(&self.args);
        match &self.working_dir {
            Some(dir) => config.with_working_dir(dir),
            None => config,
        }
    }
}

/// Identity provider settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Token verification endpoint.
    pub verify_url: String,
    /// Service key sent to the provider.
    pub api_key: Option<String>,
    /// Request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            verify_url: "http://localhost:4000/verify".to_string(),
            api_key: None,
            timeout_secs: 5,
        }
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("verify_url", &self.verify_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl IdentityConfig {
    /// Settings for the HTTP identity provider.
    #[cfg(feature = "http-identity")]
    pub fn http_config(&self) -> crate::identity::HttpIdentityConfig {
        let config = crate::identity::HttpIdentityConfig::new(&self.verify_url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        match &self.api_key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        }
    }
}

/// Plan quota settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotaSettings {
    /// Scans a FREE user may record.
    pub free_scan_limit: u64,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            free_scan_limit: DEFAULT_FREE_SCAN_LIMIT,
        }
    }
}

/// Settings for first-time users.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Trial length of the default subscription, in days.
    pub trial_days: i64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self { trial_days: 14 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable, multi-line.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// A setting that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid setting {field}: {reason}")]
pub struct ValidationError {
    /// Dotted path of the setting.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: &'static str,
}

impl ValidationError {
    fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// A source could not be read or deserialized.
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    /// A setting is out of range.
    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl Config {
    /// Loads configuration relative to the working directory.
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from(".")
    }

    /// Loads configuration with `config/` resolved under `base`.
    pub fn load_from(base: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let dir = base.as_ref().join("config");
        let file = |name: &str| {
            config::File::from(dir.join(name))
                .format(config::FileFormat::Toml)
                .required(false)
        };

        let mut builder = config::Config::builder().add_source(file("default.toml"));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder.add_source(file(&format!("{}.toml", env)));
        }

        builder = builder
            .add_source(file("local.toml"))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Rejects settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.server.port == 0 {
            return Err(ValidationError::new("server.port", "must be non-zero"));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ValidationError::new(
                "server.max_upload_bytes",
                "must be non-zero",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ValidationError::new(
                "database.max_connections",
                "must be non-zero",
            ));
        }
        if self.detector.program.trim().is_empty() {
            return Err(ValidationError::new("detector.program", "must not be empty"));
        }
        if self.detector.timeout_secs == 0 {
            return Err(ValidationError::new("detector.timeout_secs", "must be non-zero"));
        }
        if self.detector.timeout_secs > MAX_DETECTOR_TIMEOUT_SECS {
            return Err(ValidationError::new(
                "detector.timeout_secs",
                "must be at most 3600",
            ));
        }
        if self.identity.timeout_secs == 0 {
            return Err(ValidationError::new("identity.timeout_secs", "must be non-zero"));
        }
        if self.identity.timeout_secs > MAX_IDENTITY_TIMEOUT_SECS {
            return Err(ValidationError::new(
                "identity.timeout_secs",
                "must be at most 300",
            ));
        }
        if self.quota.free_scan_limit == 0 {
            return Err(ValidationError::new(
                "quota.free_scan_limit",
                "must be non-zero",
            ));
        }
        if self.provisioning.trial_days < 0 {
            return Err(ValidationError::new(
                "provisioning.trial_days",
                "must not be negative",
            ));
        }
        if self.provisioning.trial_days > MAX_TRIAL_DAYS {
            return Err(ValidationError::new(
                "provisioning.trial_days",
                "must be at most 3650",
            ));
        }
        Ok(())
    }

    /// Orchestrator settings derived from this configuration.
    pub fn orchestrator_config(&self) -> ScanOrchestratorConfig {
        ScanOrchestratorConfig::new()
            .with_analysis_timeout(self.detector.timeout())
            .with_trial_period(chrono::Duration::days(self.provisioning.trial_days))
            .with_free_scan_limit(self.quota.free_scan_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();

        config.validate().unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.quota.free_scan_limit, 10);
        assert_eq!(config.provisioning.trial_days, 14);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.port = 0;
        assert_eq!(config.validate().unwrap_err().field, "server.port");

        let mut config = Config::default();
        config.detector.program = "  ".into();
        assert_eq!(config.validate().unwrap_err().field, "detector.program");

        let mut config = Config::default();
        config.detector.timeout_secs = 0;
        assert_eq!(config.validate().unwrap_err().field, "detector.timeout_secs");

        let mut config = Config::default();
        config.quota.free_scan_limit = 0;
        assert_eq!(config.validate().unwrap_err().field, "quota.free_scan_limit");
    }

    #[test]
    fn test_validate_bounds_durations() {
        let mut config = Config::default();
        config.detector.timeout_secs = u64::MAX;
        assert_eq!(config.validate().unwrap_err().field, "detector.timeout_secs");

        config.detector.timeout_secs = MAX_DETECTOR_TIMEOUT_SECS;
        config.validate().unwrap();

        let mut config = Config::default();
        config.identity.timeout_secs = u64::MAX;
        assert_eq!(config.validate().unwrap_err().field, "identity.timeout_secs");

        let mut config = Config::default();
        config.provisioning.trial_days = i64::MAX;
        assert_eq!(config.validate().unwrap_err().field, "provisioning.trial_days");
    }

    #[test]
    fn test_load_from_layers_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config/default.toml"),
            r#"
            [server]
            port = 8080

            [detector]
            program = "/opt/detector/bin/run"
            args = ["--stdin"]
            timeout_secs = 30

            [logging]
            format = "pretty"
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("config/local.toml"),
            r#"
            [server]
            port = 9090
            "#,
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.detector.program, "/opt/detector/bin/run");
        assert_eq!(config.detector.args, vec!["--stdin".to_string()]);
        assert_eq!(config.detector.timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config/default.toml"),
            "[quota]\nfree_scan_limit = 0\n",
        )
        .unwrap();

        let err = Config::load_from(dir.path()).unwrap_err();

        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn test_orchestrator_config_mapping() {
        let mut config = Config::default();
        config.detector.timeout_secs = 12;
        config.quota.free_scan_limit = 3;
        config.provisioning.trial_days = 7;

        let orchestrator = config.orchestrator_config();

        assert_eq!(orchestrator.analysis_timeout, Duration::from_secs(12));
        assert_eq!(orchestrator.quota.free_scan_limit, 3);
        assert_eq!(orchestrator.trial_period, chrono::Duration::days(7));
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let mut config = Config::default();
        config.database.url = "postgres://app:hunter2@db/vision".into();
        config.identity.api_key = Some("sk_live_123".into());

        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("sk_live_123"));
    }
}
