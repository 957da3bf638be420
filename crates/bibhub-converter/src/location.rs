//! Converter location and program name resolution.

use std::path::{Path, PathBuf};

use bibhub_formats::FormatCode;
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Directory name of the bundled converters.
pub const BUNDLED_DIR: &str = "bibutils";

/// Program run for MODS to MODS conversions.
pub const NORMALIZE_TOOL: &str = "modsclean";

/// Where converter programs are found and how their names end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterLocation {
    /// Directory containing the converter executables.
    pub base_dir: PathBuf,
    /// Suffix appended to every program name.
    pub suffix: String,
}

impl ConverterLocation {
    /// The bundled converters for `platform`.
    ///
    /// The `bibutils` directory is looked up next to the running
    /// executable, falling back to the working directory.
    pub fn platform_default(platform: Platform) -> Self {
        let base_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(BUNDLED_DIR)))
            .unwrap_or_else(|| PathBuf::from(BUNDLED_DIR));

        Self {
            base_dir,
            suffix: platform.binary_suffix().to_string(),
        }
    }

    /// An operator-supplied location. The suffix replaces the platform
    /// suffix entirely; `None` means no suffix at all.
    pub fn custom(base_dir: impl Into<PathBuf>, suffix: Option<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            suffix: suffix.unwrap_or_default(),
        }
    }

    /// Full path of the program converting `source` to `target`.
    pub fn program_for(&self, source: FormatCode, target: FormatCode) -> PathBuf {
        resolve_converter(source, target, self)
    }

    /// The configured base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Resolve the converter program for one hop.
///
/// Routing only ever produces `source == target` for the hub, where the
/// normalize tool re-validates the MODS document.
pub fn resolve_converter(
    source: FormatCode,
    target: FormatCode,
    location: &ConverterLocation,
) -> PathBuf {
    let name = if source == target {
        format!("{NORMALIZE_TOOL}{}", location.suffix)
    } else {
        format!("{}2{}{}", source.code(), target.code(), location.suffix)
    };
    location.base_dir.join(name)
}
