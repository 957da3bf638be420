//! Unified error type for the conversion orchestrator.
//!
//! Validation failures (`UnsupportedFormat`) are produced before any
//! converter is started. Everything else comes out of a running hop.

use std::path::PathBuf;

use bibhub_core::error::AppError;
use bibhub_formats::Direction;
use thiserror::Error;

/// Error type for all conversion operations.
#[derive(Debug, Error)]
pub enum ConversionError {
    // --- Validation errors ---
    /// A format code is unknown, or not usable in the requested direction.
    #[error(
        "Unknown or unsupported bibliography {direction} format: `{code}` \
         (see FormatRegistry::{direction}able for the supported list)"
    )]
    UnsupportedFormat {
        /// The rejected code as given by the caller.
        code: String,
        /// Whether it was requested as source (import) or target (export).
        direction: Direction,
    },

    /// The host operating system has no bundled converters.
    #[error("bibutils converters are not available for operating system `{os}`")]
    UnsupportedPlatform {
        /// `std::env::consts::OS` of the host.
        os: String,
    },

    /// Configuration rejected at construction time.
    #[error("Invalid converter configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },

    // --- Process execution errors ---
    /// The converter process could not be started.
    #[error("Failed to start converter {program}: {source}")]
    SpawnFailure {
        /// Program that was being launched.
        program: PathBuf,
        /// OS-level cause (missing binary, permission denied, ...).
        #[source]
        source: std::io::Error,
    },

    /// The converter ran but reported failure through its exit status.
    #[error("Converter {program} exited with code {code:?}: {stderr}")]
    ProcessFailed {
        /// Program that failed.
        program: PathBuf,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured diagnostics (truncated).
        stderr: String,
    },

    /// The converter did not finish within the configured bound.
    #[error("Converter {program} timed out after {timeout_seconds}s")]
    Timeout {
        /// Program that was killed.
        program: PathBuf,
        /// The bound that was exceeded.
        timeout_seconds: u64,
    },

    /// Conversion was cancelled via cancellation token.
    #[error("Conversion was cancelled")]
    Cancelled,

    /// Process semaphore was closed unexpectedly.
    #[error("Internal semaphore error: {reason}")]
    SemaphoreClosed {
        /// Description of which semaphore failed.
        reason: String,
    },

    // --- Generic errors ---
    /// IO error while talking to a running converter.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Whether this failure happened before any converter was started.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::UnsupportedPlatform { .. } | Self::InvalidConfig { .. }
        )
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        match &err {
            ConversionError::UnsupportedFormat { .. } => AppError::validation(err.to_string()),
            ConversionError::UnsupportedPlatform { .. }
            | ConversionError::InvalidConfig { .. } => AppError::configuration(err.to_string()),
            ConversionError::SpawnFailure { .. } | ConversionError::ProcessFailed { .. } => {
                AppError::external_service(err.to_string())
            }
            ConversionError::Timeout { .. } => AppError::timeout(err.to_string()),
            ConversionError::Cancelled => AppError::conflict(err.to_string()),
            _ => AppError::internal(err.to_string()),
        }
    }
}
