use serde_json::Value;

use crate::server::{Request, Response};

/// What a handler returns: an optional body value, or a failure for the
/// pipeline to classify.
pub type HandlerResult = anyhow::Result<Option<Value>>;

/// Application code bound to a route.
///
/// A handler may return the body or set it on the response directly. When it
/// does both, the body it set wins.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &mut Request, response: &mut Response) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync,
{
    fn handle(&self, request: &mut Request, response: &mut Response) -> HandlerResult {
        self(request, response)
    }
}
