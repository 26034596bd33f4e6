//! Intake counters.
//!
//! Plain atomics, read through [`IntakeMetrics::snapshot`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registration intake metrics
#[derive(Debug, Default)]
pub struct IntakeMetrics {
    // Request counters
    pub requests_total: AtomicU64,
    pub structural_rejected: AtomicU64,
    pub validation_rejected: AtomicU64,
    pub accepted: AtomicU64,

    // Handoff outcomes
    pub acked: AtomicU64,
    pub nacked: AtomicU64,
    pub aborted: AtomicU64,

    // Registrations waiting for ack/nack (queued or delivered)
    pub pending: AtomicU64,
}

/// Point-in-time copy of [`IntakeMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub structural_rejected: u64,
    pub validation_rejected: u64,
    pub accepted: u64,
    pub acked: u64,
    pub nacked: u64,
    pub aborted: u64,
    pub pending: u64,
}

impl IntakeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_structural_rejection(&self) {
        self.structural_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_rejection(&self) {
        self.validation_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Registration parsed and about to be queued
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_acked(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
        self.pending.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_nacked(&self) {
        self.nacked.fetch_add(1, Ordering::Relaxed);
        self.pending.fetch_sub(1, Ordering::Relaxed);
    }

    /// Handoff ended without ack/nack (shutdown, timeout, dropped handle,
    /// client disconnect)
    pub fn record_aborted(&self) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
        self.pending.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            structural_rejected: self.structural_rejected.load(Ordering::Relaxed),
            validation_rejected: self.validation_rejected.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            acked: self.acked.load(Ordering::Relaxed),
            nacked: self.nacked.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
        }
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or_default()
    }
}
