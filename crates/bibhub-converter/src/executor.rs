//! Converter process execution.
//!
//! Runs one converter per hop as a child process: the content goes in on
//! stdin (closed afterwards so the converter sees EOF), the result comes
//! back on stdout, and stderr is kept for diagnostics.
//!
//! A hop completes when the converter exits, not when it closes stdout: the
//! exit status is part of the result. A converter that closes its output
//! and keeps running is therefore ended by the timeout.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bibhub_core::config::converter::{ConverterConfig, ExitStatusPolicy};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ConversionError;
use crate::models::{Hop, HopOutput};

/// Maximum number of stderr characters carried in an error.
const MAX_STDERR_CHARS: usize = 2000;

/// Runs a single hop.
///
/// [`ProcessExecutor`] is the production implementation; tests substitute
/// recorders that never touch the operating system.
#[async_trait]
pub trait ProcessRunner: Send + Sync + std::fmt::Debug + 'static {
    /// Run `hop.program` with `hop.args`, feeding `content` on stdin.
    ///
    /// Returns once the program has exited and both output pipes are drained.
    async fn run(
        &self,
        hop: &Hop,
        content: Bytes,
        cancel: CancellationToken,
    ) -> Result<HopOutput, ConversionError>;
}

impl HopOutput {
    /// Output of a converter that exited with status 0.
    pub fn success(stdout: impl Into<Bytes>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
            duration_ms: 0,
        }
    }
}

/// Tokio-backed converter runner.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    /// Upper bound on a single process.
    timeout: Duration,
    /// Limits converter processes running at the same time.
    limiter: Arc<Semaphore>,
}

impl ProcessExecutor {
    /// Create an executor from the converter configuration.
    pub fn new(config: &ConverterConfig) -> Self {
        Self::with_limits(
            Duration::from_secs(config.timeout_seconds),
            config.max_concurrent_processes,
        )
    }

    /// Create an executor with an explicit timeout and process limit.
    pub fn with_limits(timeout: Duration, max_concurrent_processes: usize) -> Self {
        Self {
            timeout,
            limiter: Arc::new(Semaphore::new(max_concurrent_processes.max(1))),
        }
    }
}

#[async_trait]
impl ProcessRunner for ProcessExecutor {
    async fn run(
        &self,
        hop: &Hop,
        content: Bytes,
        cancel: CancellationToken,
    ) -> Result<HopOutput, ConversionError> {
        let _permit = tokio::select! {
            permit = self.limiter.acquire() => permit.map_err(|_| ConversionError::SemaphoreClosed {
                reason: "process semaphore".to_string(),
            })?,
            _ = cancel.cancelled() => return Err(ConversionError::Cancelled),
        };

        let mut cmd = Command::new(&hop.program);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd.args(&hop.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            program = %hop.program.display(),
            args = ?hop.args,
            input_bytes = content.len(),
            timeout_s = self.timeout.as_secs(),
            "Spawning converter"
        );

        let start = Instant::now();

        let mut child = cmd.spawn().map_err(|source| {
            error!(
                program = %hop.program.display(),
                error = %source,
                "Failed to start converter"
            );
            ConversionError::SpawnFailure {
                program: hop.program.clone(),
                source,
            }
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let program = hop.program.clone();

        // Dropping this future (timeout/cancel) drops the child, which kills it.
        let io = async move {
            let feed = async move {
                if let Some(mut stdin) = stdin {
                    match stdin.write_all(&content).await {
                        Ok(()) => {}
                        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                            debug!(
                                program = %program.display(),
                                "Converter closed stdin before reading all input"
                            );
                        }
                        Err(e) => return Err(e),
                    }
                    // Dropping the handle closes the pipe: the converter sees EOF.
                    drop(stdin);
                }
                Ok::<(), std::io::Error>(())
            };

            let (_, out, err) = tokio::try_join!(feed, read_all(stdout), read_all(stderr))?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((out, err, status))
        };

        tokio::select! {
            result = io => {
                let (out, err, status) = result?;
                let duration_ms = start.elapsed().as_millis() as u64;
                let stderr = String::from_utf8_lossy(&err).into_owned();

                if !stderr.is_empty() {
                    debug!(program = %hop.program.display(), stderr = %stderr, "Converter stderr output");
                }

                info!(
                    program = %hop.program.display(),
                    exit_code = ?status.code(),
                    output_bytes = out.len(),
                    elapsed_ms = duration_ms,
                    "Converter finished"
                );

                Ok(HopOutput {
                    stdout: Bytes::from(out),
                    stderr,
                    exit_code: status.code(),
                    success: status.success(),
                    duration_ms,
                })
            }
            _ = tokio::time::sleep(self.timeout) => {
                error!(
                    program = %hop.program.display(),
                    timeout_s = self.timeout.as_secs(),
                    "Converter timed out, killing"
                );
                Err(ConversionError::Timeout {
                    program: hop.program.clone(),
                    timeout_seconds: self.timeout.as_secs(),
                })
            }
            _ = cancel.cancelled() => {
                info!(program = %hop.program.display(), "Conversion cancelled, killing converter");
                Err(ConversionError::Cancelled)
            }
        }
    }
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Decide whether a finished hop counts as a success.
pub fn apply_exit_policy(
    program: &Path,
    output: HopOutput,
    policy: ExitStatusPolicy,
) -> Result<HopOutput, ConversionError> {
    if output.success {
        return Ok(output);
    }

    let failed = |output: &HopOutput| ConversionError::ProcessFailed {
        program: program.to_path_buf(),
        code: output.exit_code,
        stderr: output.stderr.chars().take(MAX_STDERR_CHARS).collect(),
    };

    match policy {
        ExitStatusPolicy::Strict => Err(failed(&output)),
        ExitStatusPolicy::Lenient if output.stdout.is_empty() => Err(failed(&output)),
        ExitStatusPolicy::Lenient | ExitStatusPolicy::Ignore => {
            warn!(
                program = %program.display(),
                exit_code = ?output.exit_code,
                output_bytes = output.stdout.len(),
                policy = ?policy,
                "Converter exited unsuccessfully, passing output through"
            );
            Ok(output)
        }
    }
}
