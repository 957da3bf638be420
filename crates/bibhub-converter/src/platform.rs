//! Host platform detection for the bundled converter binaries.

use std::fmt;

use crate::error::ConversionError;

/// Operating systems the bundled bibutils binaries are built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Microsoft Windows.
    Windows,
    /// macOS.
    MacOs,
    /// Linux.
    Linux,
}

impl Platform {
    /// Detect the host platform.
    ///
    /// Any operating system outside the supported set is an error; callers
    /// treat it as fatal at startup.
    pub fn current() -> Result<Self, ConversionError> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS name (as in `std::env::consts::OS`) to a platform.
    pub fn from_os(os: &str) -> Result<Self, ConversionError> {
        match os {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            other => Err(ConversionError::UnsupportedPlatform {
                os: other.to_string(),
            }),
        }
    }

    /// Suffix appended to every bundled converter name.
    pub fn binary_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::MacOs => "-osx",
            Self::Linux => "-linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
        }
    }
}
