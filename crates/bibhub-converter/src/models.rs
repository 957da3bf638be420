//! Domain models: conversion requests, resolved plans, and outputs.

use std::path::PathBuf;
use std::sync::Arc;

use bibhub_formats::{Direction, FormatCode};
use bytes::Bytes;
use serde::Serialize;

use crate::error::ConversionError;
use crate::location::ConverterLocation;

/// A request to convert opaque bibliography content.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Format of `content`.
    pub source: FormatCode,
    /// Format to produce.
    pub target: FormatCode,
    /// Bytes handed to the first converter on stdin.
    pub content: Bytes,
    /// Extra arguments for the hop that reads `source`.
    pub source_args: Vec<String>,
    /// Extra arguments for the hop that writes `target`.
    pub target_args: Vec<String>,
}

impl ConversionRequest {
    /// Create a request without extra converter arguments.
    pub fn new(source: FormatCode, target: FormatCode, content: impl Into<Bytes>) -> Self {
        Self {
            source,
            target,
            content: content.into(),
            source_args: Vec::new(),
            target_args: Vec::new(),
        }
    }

    /// Create a request from caller-supplied format strings.
    ///
    /// Accepts canonical codes and symbolic aliases; anything else is an
    /// [`ConversionError::UnsupportedFormat`].
    pub fn parse(source: &str, target: &str, content: impl Into<Bytes>) -> Result<Self, ConversionError> {
        let source = parse_code(source, Direction::Import)?;
        let target = parse_code(target, Direction::Export)?;
        Ok(Self::new(source, target, content))
    }

    /// Set the arguments for the source-side hop.
    pub fn with_source_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the arguments for the target-side hop.
    pub fn with_target_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_args = args.into_iter().map(Into::into).collect();
        self
    }
}

fn parse_code(code: &str, direction: Direction) -> Result<FormatCode, ConversionError> {
    code.parse()
        .map_err(|_| ConversionError::UnsupportedFormat {
            code: code.to_string(),
            direction,
        })
}

/// One converter invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hop {
    /// Format read by the program.
    pub source: FormatCode,
    /// Format written by the program.
    pub target: FormatCode,
    /// Resolved program path.
    pub program: PathBuf,
    /// Extra command-line arguments.
    pub args: Vec<String>,
}

/// A validated conversion: one or two hops against a bound location.
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    /// Hops in execution order.
    pub hops: Vec<Hop>,
    /// Location snapshot the hops were resolved against.
    pub location: Arc<ConverterLocation>,
}

impl ConversionPlan {
    /// Whether the conversion is routed through the hub.
    pub fn is_two_hop(&self) -> bool {
        self.hops.len() == 2
    }

    /// Programs in execution order.
    pub fn programs(&self) -> impl Iterator<Item = &PathBuf> {
        self.hops.iter().map(|h| &h.program)
    }
}

/// What a single hop produced.
#[derive(Debug, Clone)]
pub struct HopOutput {
    /// Everything the converter wrote to stdout.
    pub stdout: Bytes,
    /// Everything the converter wrote to stderr, lossily decoded.
    pub stderr: String,
    /// Exit code, `None` when killed by a signal.
    pub exit_code: Option<i32>,
    /// Whether the process exited with a success status.
    pub success: bool,
    /// Wall-clock duration of the process.
    pub duration_ms: u64,
}

/// Per-hop diagnostics returned with a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct HopReport {
    /// The program that ran.
    pub program: PathBuf,
    /// Exit code, if any.
    pub exit_code: Option<i32>,
    /// Converter diagnostics (bibutils reports record counts here).
    pub stderr: String,
    /// Bytes written to stdout.
    pub output_bytes: usize,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Converted content from the final hop.
    pub content: Bytes,
    /// One report per hop, in execution order.
    pub hops: Vec<HopReport>,
}

impl ConversionOutput {
    /// Converted content as UTF-8, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}
