use dashmap::DashMap;
use std::time::Instant;
use tracing::{info, warn};

use super::MessageObserver;
use crate::error::ServiceError;
use crate::ids::CorrelationId;
use crate::server::{Request, Response};

/// Emits one structured line per completed exchange.
///
/// Start times are kept per correlation id in a concurrent map, so one
/// observer can serve every worker thread.
#[derive(Debug, Default)]
pub struct LoggingObserver {
    timers: DashMap<CorrelationId, Instant>,
}

impl LoggingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exchanges received but not yet complete.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.timers.len()
    }
}

impl MessageObserver for LoggingObserver {
    fn on_received(&self, request: &Request, _response: &Response) {
        self.timers.insert(request.correlation_id(), Instant::now());
    }

    fn on_exception(&self, request: &Request, _response: &Response, error: &ServiceError) {
        warn!(
            correlation_id = %request.correlation_id(),
            method = %request.method(),
            url = %request.url(),
            error_id = %error.id(),
            error = %error,
            "Request raised an error"
        );
    }

    fn on_complete(&self, request: &Request, response: &Response) {
        let elapsed_ms = self
            .timers
            .remove(&request.correlation_id())
            .map(|(_, started)| started.elapsed().as_millis() as u64);
        info!(
            correlation_id = %request.correlation_id(),
            method = %request.method(),
            url = %request.url(),
            status = response.status(),
            elapsed_ms = elapsed_ms,
            "Request handled"
        );
    }
}
