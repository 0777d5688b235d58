// Telegate Agent - Ingestion and snapshot facade
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters, updated lock-free by producers
#[derive(Debug, Default)]
pub struct AgentMetrics {
    buffered: AtomicU64,
    unchanged: AtomicU64,
    resent: AtomicU64,
    rejected: AtomicU64,
    evicted: AtomicU64,
    conditions_applied: AtomicU64,
}

impl AgentMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_buffered(&self) {
        self.buffered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unchanged(&self) {
        self.unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resent(&self) {
        self.resent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evicted(&self) {
        self.evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_condition(&self) {
        self.conditions_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            buffered: self.buffered.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            resent: self.resent.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            conditions_applied: self.conditions_applied.load(Ordering::Relaxed),
        }
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        self.snapshot().report()
    }
}

/// Point-in-time copy of [`AgentMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Observations appended to the buffer
    pub buffered: u64,
    /// Observations dropped because their content did not change
    pub unchanged: u64,
    /// Exact resends dropped
    pub resent: u64,
    /// Observations rejected at validation
    pub rejected: u64,
    /// Observations evicted from the buffer window
    pub evicted: u64,
    /// Fault state operations applied
    pub conditions_applied: u64,
}

impl MetricsSnapshot {
    /// Observations submitted (accepted or not)
    pub fn submitted(&self) -> u64 {
        self.buffered + self.unchanged + self.resent + self.rejected
    }

    /// Share of accepted observations that were filtered out, in percent
    pub fn filtered_percent(&self) -> f64 {
        let accepted = self.buffered + self.unchanged + self.resent;
        if accepted == 0 {
            return 0.0;
        }
        (self.unchanged + self.resent) as f64 / accepted as f64 * 100.0
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Telegate Agent Metrics ===\n\n");
        report.push_str(&format!("Submitted: {}\n", self.submitted()));
        report.push_str(&format!("Buffered: {}\n", self.buffered));
        report.push_str(&format!(
            "Filtered: {} unchanged, {} resent ({:.1}%)\n",
            self.unchanged,
            self.resent,
            self.filtered_percent()
        ));
        report.push_str(&format!("Rejected: {}\n", self.rejected));
        report.push_str(&format!("Evicted: {}\n", self.evicted));
        report.push_str(&format!(
            "Fault state operations: {}\n",
            self.conditions_applied
        ));

        report
    }
}
