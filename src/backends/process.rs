//! Child-process detector backend.
//!
//! Launches the external detector once per request, streams the image to
//! its standard input and reads one JSON document from its standard output.
//!
//! # Protocol
//!
//! - stdin: raw image bytes, closed after the last byte.
//! - stdout: `{"sensitiveData": [...], "encryptionStatus": {...}, "metadata": {...}}`
//! - exit status zero on success; on failure, diagnostics go to stderr.
//!
//! The write to stdin and the reads of stdout and stderr run concurrently,
//! so a detector that fills its output pipe before consuming all of its
//! input cannot stall the exchange.

use crate::core::{AnalysisResult, Detector, DetectorError, DetectorReport};

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

/// Process detector configuration.
#[derive(Debug, Clone)]
pub struct ProcessDetectorConfig {
    /// Program to launch (looked up on `PATH` when not absolute).
    pub program: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Working directory for the child, if not inherited.
    pub working_dir: Option<PathBuf>,

    /// Maximum number of stderr bytes kept in a failure report.
    pub max_stderr_bytes: usize,
}

impl Default for ProcessDetectorConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["sensitive_data_detector/process.py".to_string()],
            working_dir: None,
            max_stderr_bytes: 8 * 1024,
        }
    }
}

impl ProcessDetectorConfig {
    /// Creates a configuration for the given program with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            ..Self::default()
        }
    }

    /// Sets the program arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Sets how much stderr is retained for error reports.
    pub fn with_max_stderr_bytes(mut self, max: usize) -> Self {
        self.max_stderr_bytes = max;
        self
    }
}

/// Detector implementation that runs one child process per analysis.
///
/// # Example
///
/// ```rust,ignore
/// use vision_shield::backends::ProcessDetector;
/// use vision_shield::backends::process::ProcessDetectorConfig;
///
/// let config = ProcessDetectorConfig::new("python3")
///     .with_args(["clean_package/sensitive_data_detector/process.py"]);
/// let detector = ProcessDetector::new(config)?;
/// ```
#[derive(Debug)]
pub struct ProcessDetector {
    config: ProcessDetectorConfig,
}

impl ProcessDetector {
    /// Creates a new process detector with the given configuration.
    pub fn new(config: ProcessDetectorConfig) -> Result<Self, DetectorError> {
        if config.program.trim().is_empty() {
            return Err(DetectorError::configuration(
                "detector program must not be empty",
            ));
        }

        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProcessDetectorConfig {
        &self.config
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = self.config.working_dir {
            command.current_dir(dir);
        }

        command
    }
}

/// Everything the child produced before it exited.
struct CapturedOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl CapturedOutput {
    /// What the child said about its failure. Detectors that report errors
    /// as a JSON document on stdout leave stderr empty.
    fn failure_detail(&self, max: usize) -> String {
        let stderr = String::from_utf8_lossy(&self.stderr);
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            return truncate_utf8(stderr, max);
        }
        truncate_utf8(String::from_utf8_lossy(&self.stdout).trim(), max)
    }
}

/// Feeds `payload` to the child and collects its output and exit status.
async fn exchange(child: &mut Child, payload: &[u8]) -> Result<CapturedOutput, DetectorError> {
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let write = async move {
        if let Some(mut stdin) = stdin {
            match stdin.write_all(payload).await {
                Ok(()) => {}
                // The detector stopped reading; its exit status tells the story.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!("Detector closed its input before the payload was written");
                }
                Err(e) => return Err(e),
            }
            // Dropping the handle closes the pipe and signals end of input.
            drop(stdin);
        }
        Ok(())
    };

    let (written, stdout, stderr) = tokio::join!(write, drain(stdout), drain(stderr));
    written?;
    let stdout = stdout?;
    let stderr = stderr?;

    let status = child.wait().await?;

    Ok(CapturedOutput {
        status,
        stdout,
        stderr,
    })
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Cuts `text` to at most `max` bytes without splitting a character.
fn truncate_utf8(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[async_trait]
impl Detector for ProcessDetector {
    fn name(&self) -> &str {
        "process"
    }

    async fn analyze(
        &self,
        payload: &[u8],
        deadline: Duration,
    ) -> Result<AnalysisResult, DetectorError> {
        let started = Instant::now();

        let mut child = self
            .command()
            .spawn()
            .map_err(|source| DetectorError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;
        let pid = child.id();

        tracing::debug!(
            pid = ?pid,
            program = %self.config.program,
            payload_bytes = payload.len(),
            "Detector process spawned"
        );

        let outcome = tokio::time::timeout(deadline, exchange(&mut child, payload)).await;
        let output = match outcome {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    pid = ?pid,
                    deadline_ms = deadline.as_millis(),
                    "Detector deadline exceeded, killing process"
                );
                // kill() also reaps the child, so nothing lingers after we return.
                if let Err(e) = child.kill().await {
                    tracing::warn!(pid = ?pid, error = %e, "Failed to kill detector process");
                }
                return Err(DetectorError::timeout(deadline));
            }
        };

        if !output.status.success() {
            return Err(DetectorError::NonZeroExit {
                code: output.status.code(),
                stderr: output.failure_detail(self.config.max_stderr_bytes),
            });
        }

        let report = DetectorReport::parse(&output.stdout)?;

        tracing::debug!(
            pid = ?pid,
            findings = report.sensitive_data.len(),
            duration_ms = started.elapsed().as_millis(),
            "Detector process completed"
        );

        Ok(report.into_result(Utc::now()))
    }
}
