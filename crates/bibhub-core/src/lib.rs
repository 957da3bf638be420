//! # bibhub-core
//!
//! Core crate for bibhub. Contains the configuration schemas and the
//! unified error system shared by the registry and converter crates.
//!
//! This crate has **no** internal dependencies on other bibhub crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
