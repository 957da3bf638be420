//! External converter configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// How a converter's exit status affects the result of the final hop.
///
/// Hops feeding another hop are always strict: output of a failed first hop
/// is never passed on to the second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatusPolicy {
    /// Any non-zero exit fails the hop, even if stdout carried bytes.
    #[default]
    Strict,
    /// A non-zero exit with non-empty stdout is logged and passed through;
    /// a non-zero exit with empty stdout fails the hop.
    Lenient,
    /// Exit status is only logged; captured stdout is always the result.
    Ignore,
}

/// Configuration for locating and running the bibutils converters.
///
/// With neither `binary_path` nor `suffix` set, the converters are looked up
/// in the bundled `bibutils` directory with the platform suffix (`-linux`,
/// `-osx`, `.exe`). Setting either switches to a custom location whose
/// suffix is exactly `suffix` (empty when unset).
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Directory containing the converter executables.
    pub binary_path: Option<PathBuf>,

    /// Suffix appended to every converter name in a custom location.
    pub suffix: Option<String>,

    /// Upper bound on a single converter invocation.
    #[validate(range(min = 1, max = 3600))]
    pub timeout_seconds: u64,

    /// Limit on converter processes running at the same time.
    #[validate(range(min = 1, max = 64))]
    pub max_concurrent_processes: usize,

    /// Treatment of non-zero converter exit codes.
    pub exit_status_policy: ExitStatusPolicy,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            suffix: None,
            timeout_seconds: default_timeout_seconds(),
            max_concurrent_processes: default_max_concurrent_processes(),
            exit_status_policy: ExitStatusPolicy::default(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_max_concurrent_processes() -> usize {
    8
}
