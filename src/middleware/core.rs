use crate::error::ServiceError;
use crate::server::{Request, Response};

/// Runs after routing and before the handler. An error aborts the exchange.
pub trait Preprocessor: Send + Sync {
    fn process(&self, request: &mut Request) -> anyhow::Result<()>;
}

impl<F> Preprocessor for F
where
    F: Fn(&mut Request) -> anyhow::Result<()> + Send + Sync,
{
    fn process(&self, request: &mut Request) -> anyhow::Result<()> {
        self(request)
    }
}

/// Runs after the handler. Also used for the finally chain, which runs on
/// failures too.
pub trait Postprocessor: Send + Sync {
    fn process(&self, request: &Request, response: &mut Response) -> anyhow::Result<()>;
}

impl<F> Postprocessor for F
where
    F: Fn(&Request, &mut Response) -> anyhow::Result<()> + Send + Sync,
{
    fn process(&self, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        self(request, response)
    }
}

/// Lifecycle notifications. Every exchange gets `on_received`, then
/// `on_success` or `on_exception`, then `on_complete`.
pub trait MessageObserver: Send + Sync {
    fn on_received(&self, _request: &Request, _response: &Response) {}

    fn on_success(&self, _request: &Request, _response: &Response) {}

    fn on_exception(&self, _request: &Request, _response: &Response, _error: &ServiceError) {}

    fn on_complete(&self, _request: &Request, _response: &Response) {}
}
