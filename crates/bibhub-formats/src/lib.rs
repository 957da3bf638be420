//! # bibhub-formats
//!
//! The format registry: canonical bibliographic format codes, the
//! importable and exportable subsets, the MODS hub, and lookups by human
//! name, MIME type, and file extension.

pub mod error;
pub mod format;
pub mod registry;

pub use error::RegistryError;
pub use format::{Direction, FormatCode};
pub use registry::FormatRegistry;
