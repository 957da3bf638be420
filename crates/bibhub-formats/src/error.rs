//! Registry construction and lookup errors.

use bibhub_core::error::AppError;
use thiserror::Error;

use crate::format::FormatCode;

/// Errors raised while building or querying a [`FormatRegistry`](crate::FormatRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A string did not name any known format.
    #[error("Unknown bibliography format: `{value}`")]
    UnknownFormat {
        /// The unrecognized input.
        value: String,
    },

    /// The hub format is missing from the importable subset.
    #[error("Hub format `{hub}` must be importable")]
    HubNotImportable {
        /// The hub format.
        hub: FormatCode,
    },

    /// The hub format is missing from the exportable subset.
    #[error("Hub format `{hub}` must be exportable")]
    HubNotExportable {
        /// The hub format.
        hub: FormatCode,
    },

    /// A format is missing a piece of static metadata.
    #[error("Format `{code}` has no {field}")]
    MissingMetadata {
        /// The incomplete format.
        code: FormatCode,
        /// Which field is missing or malformed.
        field: &'static str,
    },
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match &err {
            RegistryError::UnknownFormat { .. } => AppError::validation(err.to_string()),
            _ => AppError::configuration(err.to_string()),
        }
    }
}
