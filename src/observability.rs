//! Observability stubs (dispatch-outcome counters)

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::DispatchError;

/// Metrics handle for recording dispatch outcomes
#[derive(Debug, Default)]
pub struct Metrics {
    dispatched: AtomicU64,
    no_match: AtomicU64,
    method_not_allowed: AtomicU64,
    not_acceptable: AtomicU64,
    unsupported_media: AtomicU64,
    bad_request: AtomicU64,
    server_error: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "dispatched", "Metric incremented");
    }

    pub fn failed(&self, error: &DispatchError) {
        let counter = match error {
            DispatchError::NoMatchingRoute { .. } => {
                self.no_match.fetch_add(1, Ordering::Relaxed);
                "no_match"
            }
            DispatchError::MethodNotAllowed { .. } => {
                self.method_not_allowed.fetch_add(1, Ordering::Relaxed);
                "method_not_allowed"
            }
            DispatchError::NotAcceptable { .. } => {
                self.not_acceptable.fetch_add(1, Ordering::Relaxed);
                "not_acceptable"
            }
            DispatchError::UnsupportedMediaType { .. } => {
                self.unsupported_media.fetch_add(1, Ordering::Relaxed);
                "unsupported_media"
            }
            DispatchError::UnreadableBody(_) | DispatchError::MissingInput { .. } => {
                self.bad_request.fetch_add(1, Ordering::Relaxed);
                "bad_request"
            }
            _ => {
                self.server_error.fetch_add(1, Ordering::Relaxed);
                "server_error"
            }
        };
        tracing::debug!(counter, "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            no_match: self.no_match.load(Ordering::Relaxed),
            method_not_allowed: self.method_not_allowed.load(Ordering::Relaxed),
            not_acceptable: self.not_acceptable.load(Ordering::Relaxed),
            unsupported_media: self.unsupported_media.load(Ordering::Relaxed),
            bad_request: self.bad_request.load(Ordering::Relaxed),
            server_error: self.server_error.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub dispatched: u64,
    pub no_match: u64,
    pub method_not_allowed: u64,
    pub not_acceptable: u64,
    pub unsupported_media: u64,
    pub bad_request: u64,
    pub server_error: u64,
}
