use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::MessageObserver;
use crate::error::{ErrorKind, ServiceError};
use crate::ids::CorrelationId;
use crate::server::{Request, Response};

/// Lock-free request counters.
///
/// Tracks totals, latency, outcomes by class, and authentication failures.
/// Counters use relaxed atomics; readings are eventually consistent.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    request_count: AtomicUsize,
    success_count: AtomicUsize,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,
    auth_failures: AtomicUsize,
    total_latency_ns: AtomicU64,
    started: DashMap<CorrelationId, Instant>,
}

impl MetricsObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.success_count.load(Ordering::Relaxed)
    }

    /// Failures classified with a 4xx status.
    #[must_use]
    pub fn client_errors(&self) -> usize {
        self.client_errors.load(Ordering::Relaxed)
    }

    /// Failures classified with a 5xx status.
    #[must_use]
    pub fn server_errors(&self) -> usize {
        self.server_errors.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn auth_failures(&self) -> usize {
        self.auth_failures.load(Ordering::Relaxed)
    }

    /// Mean time from receipt to completion. Zero before the first request.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }
}

impl MessageObserver for MetricsObserver {
    fn on_received(&self, request: &Request, _response: &Response) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.started.insert(request.correlation_id(), Instant::now());
    }

    fn on_success(&self, _request: &Request, _response: &Response) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    fn on_exception(&self, _request: &Request, _response: &Response, error: &ServiceError) {
        if error.kind() == ErrorKind::Unauthorized {
            self.auth_failures.fetch_add(1, Ordering::Relaxed);
        }
        if error.kind().is_server_error() {
            self.server_errors.fetch_add(1, Ordering::Relaxed);
        } else {
            self.client_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn on_complete(&self, request: &Request, _response: &Response) {
        if let Some((_, started)) = self.started.remove(&request.correlation_id()) {
            self.total_latency_ns
                .fetch_add(started.elapsed().as_nanos() as u64, Ordering::Relaxed);
        }
    }
}
