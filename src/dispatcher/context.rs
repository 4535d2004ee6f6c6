use std::fmt;
use std::time::Instant;

use crate::router::Action;
use crate::server::{Request, Response};

/// Where an exchange is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Received,
    RouteResolved,
    PreProcessed,
    Invoked,
    PostProcessed,
    Serialized,
    Written,
    Complete,
    Failed,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Received => "received",
            Phase::RouteResolved => "route_resolved",
            Phase::PreProcessed => "pre_processed",
            Phase::Invoked => "invoked",
            Phase::PostProcessed => "post_processed",
            Phase::Serialized => "serialized",
            Phase::Written => "written",
            Phase::Complete => "complete",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one in-flight exchange owns.
///
/// Created when a request arrives and dropped once the response is written.
/// Never shared between requests.
#[derive(Debug)]
pub struct MessageContext {
    pub request: Request,
    pub response: Response,
    pub action: Option<Action>,
    phase: Phase,
    started: Instant,
    pub(crate) finally_ran: bool,
}

impl MessageContext {
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: Response::new(),
            action: None,
            phase: Phase::Received,
            started: Instant::now(),
            finally_ran: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn advance(&mut self, phase: Phase) {
        tracing::trace!(
            correlation_id = %self.request.correlation_id(),
            from = %self.phase,
            to = %phase,
            "Pipeline phase"
        );
        self.phase = phase;
    }

    /// Time since the request was received.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    #[must_use]
    pub fn into_parts(self) -> (Request, Response) {
        (self.request, self.response)
    }
}
