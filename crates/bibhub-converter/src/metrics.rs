//! Conversion metrics.
//!
//! Lock-free counters for conversions, hops, byte volumes, and the time
//! spent in successful conversions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::error::ConversionError;

/// Conversion metrics collector.
#[derive(Debug, Default)]
pub struct ConversionMetrics {
    conversions_started: AtomicU64,
    conversions_succeeded: AtomicU64,
    conversions_failed: AtomicU64,
    conversions_timed_out: AtomicU64,
    conversions_cancelled: AtomicU64,
    /// Conversions routed through the hub.
    two_hop_conversions: AtomicU64,
    /// Converter processes that ran to completion.
    hops_executed: AtomicU64,
    total_input_bytes: AtomicU64,
    total_output_bytes: AtomicU64,
    /// Summed over successful conversions only.
    total_duration_ms: AtomicU64,
    max_duration_ms: AtomicU64,
}

impl ConversionMetrics {
    /// Create a new empty metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a conversion start.
    pub fn record_started(&self, input_bytes: usize, two_hop: bool) {
        self.conversions_started.fetch_add(1, Ordering::Relaxed);
        self.total_input_bytes
            .fetch_add(input_bytes as u64, Ordering::Relaxed);
        if two_hop {
            self.two_hop_conversions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a converter process that finished (successfully or not).
    pub fn record_hop(&self) {
        self.hops_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful conversion with its duration and output size.
    pub fn record_success(&self, duration: Duration, output_bytes: usize) {
        let ms = duration.as_millis() as u64;
        self.conversions_succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_output_bytes
            .fetch_add(output_bytes as u64, Ordering::Relaxed);
        self.total_duration_ms.fetch_add(ms, Ordering::Relaxed);
        self.max_duration_ms.fetch_max(ms, Ordering::Relaxed);
    }

    /// Record a failed conversion, classified by its error.
    pub fn record_failure(&self, error: &ConversionError) {
        match error {
            ConversionError::Cancelled => {
                self.conversions_cancelled.fetch_add(1, Ordering::Relaxed);
            }
            ConversionError::Timeout { .. } => {
                self.conversions_timed_out.fetch_add(1, Ordering::Relaxed);
                self.conversions_failed.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.conversions_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Read every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let succeeded = self.conversions_succeeded.load(Ordering::Relaxed);
        let total_ms = self.total_duration_ms.load(Ordering::Relaxed);

        MetricsSnapshot {
            conversions_started: self.conversions_started.load(Ordering::Relaxed),
            conversions_succeeded: succeeded,
            conversions_failed: self.conversions_failed.load(Ordering::Relaxed),
            conversions_timed_out: self.conversions_timed_out.load(Ordering::Relaxed),
            conversions_cancelled: self.conversions_cancelled.load(Ordering::Relaxed),
            two_hop_conversions: self.two_hop_conversions.load(Ordering::Relaxed),
            hops_executed: self.hops_executed.load(Ordering::Relaxed),
            total_input_bytes: self.total_input_bytes.load(Ordering::Relaxed),
            total_output_bytes: self.total_output_bytes.load(Ordering::Relaxed),
            mean_duration_ms: total_ms.checked_div(succeeded),
            max_duration_ms: self.max_duration_ms.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub conversions_started: u64,
    pub conversions_succeeded: u64,
    /// Timeouts included, cancellations not.
    pub conversions_failed: u64,
    pub conversions_timed_out: u64,
    pub conversions_cancelled: u64,
    pub two_hop_conversions: u64,
    pub hops_executed: u64,
    pub total_input_bytes: u64,
    pub total_output_bytes: u64,
    /// Mean duration of successful conversions, `None` before the first.
    pub mean_duration_ms: Option<u64>,
    pub max_duration_ms: u64,
}
