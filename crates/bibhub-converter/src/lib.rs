//! # bibhub-converter
//!
//! Orchestrates bibliography conversions on top of the bibutils converter
//! programs. Each program handles exactly one format pair, so anything not
//! touching MODS is converted in two hops: `source -> xml -> target`.
//!
//! ## Converter lookup
//!
//! Programs are named `<source>2<target>` (or `modsclean` for MODS to MODS)
//! plus a platform suffix, and live in a bundled `bibutils` directory
//! unless an operator points the [`Converter`] somewhere else.

pub mod error;
pub mod executor;
pub mod location;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod platform;

pub use error::ConversionError;
pub use executor::{ProcessExecutor, ProcessRunner};
pub use location::{ConverterLocation, NORMALIZE_TOOL, resolve_converter};
pub use metrics::{ConversionMetrics, MetricsSnapshot};
pub use models::{ConversionOutput, ConversionPlan, ConversionRequest, Hop, HopOutput, HopReport};
pub use orchestrator::{Converter, ToolAvailability};
pub use platform::Platform;
