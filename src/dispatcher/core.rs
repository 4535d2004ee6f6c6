use http::header::CONTENT_TYPE;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::conformance::{enforce, is_content_allowed};
use super::context::{MessageContext, Phase};
use crate::config::ServerConfig;
use crate::content::TEXT_PLAIN;
use crate::error::{classify, ExceptionMapper, ServiceError};
use crate::ids::CORRELATION_ID_HEADER;
use crate::middleware::{MessageObserver, Postprocessor, Preprocessor};
use crate::router::{RouteBuilder, RouteError, RouteTable, ServerMetadata};
use crate::serialization::{ProviderError, SerializationProvider};
use crate::server::{Request, Response, ResponseWriter};

/// What the transport should do with the connection after an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    KeepAlive,
    /// Writing the error response failed. The connection is unusable.
    Close,
}

/// Assembles a [`Pipeline`]. Everything registered here is frozen by
/// [`PipelineBuilder::build`].
pub struct PipelineBuilder {
    config: ServerConfig,
    routes: RouteTable,
    provider: Option<SerializationProvider>,
    preprocessors: Vec<Arc<dyn Preprocessor>>,
    postprocessors: Vec<Arc<dyn Postprocessor>>,
    finally_processors: Vec<Arc<dyn Postprocessor>>,
    observers: Vec<Arc<dyn MessageObserver>>,
    exception_mapper: ExceptionMapper,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            routes: RouteTable::new(),
            provider: None,
            preprocessors: Vec::new(),
            postprocessors: Vec::new(),
            finally_processors: Vec::new(),
            observers: Vec::new(),
            exception_mapper: ExceptionMapper::new(),
        }
    }

    /// Replace the route table wholesale.
    #[must_use]
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Add a route. The configured base URL applies unless the builder sets
    /// its own.
    pub fn route(mut self, builder: RouteBuilder) -> Result<Self, RouteError> {
        self.routes
            .add(builder.default_base_url(&self.config.base_url))?;
        Ok(self)
    }

    /// Serialization registry. Defaults to JSON plus YAML.
    #[must_use]
    pub fn provider(mut self, provider: SerializationProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn preprocessor(mut self, processor: impl Preprocessor + 'static) -> Self {
        self.preprocessors.push(Arc::new(processor));
        self
    }

    #[must_use]
    pub fn preprocessor_fn<F>(self, f: F) -> Self
    where
        F: Fn(&mut Request) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.preprocessor(f)
    }

    #[must_use]
    pub fn postprocessor(mut self, processor: impl Postprocessor + 'static) -> Self {
        self.postprocessors.push(Arc::new(processor));
        self
    }

    #[must_use]
    pub fn postprocessor_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.postprocessor(f)
    }

    /// Register a processor that runs on success and failure alike.
    #[must_use]
    pub fn finally(mut self, processor: impl Postprocessor + 'static) -> Self {
        self.finally_processors.push(Arc::new(processor));
        self
    }

    #[must_use]
    pub fn finally_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.finally(f)
    }

    #[must_use]
    pub fn observer(mut self, observer: impl MessageObserver + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    #[must_use]
    pub fn shared_observer(mut self, observer: Arc<dyn MessageObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Translate application error type `E` into a [`ServiceError`].
    #[must_use]
    pub fn map_exception<E, F>(mut self, f: F) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&E) -> ServiceError + Send + Sync + 'static,
    {
        self.exception_mapper.map::<E, F>(f);
        self
    }

    pub fn build(self) -> Result<Pipeline, ProviderError> {
        let mut provider = self.provider.unwrap_or_else(SerializationProvider::with_defaults);
        if provider.is_empty() {
            return Err(ProviderError::Empty);
        }
        provider.set_default_format(&self.config.default_format)?;

        self.routes.log_summary();
        info!(
            name = %self.config.name,
            formats = ?provider.supported_formats(),
            default_format = %self.config.default_format,
            preprocessors = self.preprocessors.len(),
            postprocessors = self.postprocessors.len(),
            finally_processors = self.finally_processors.len(),
            observers = self.observers.len(),
            enforce_http_spec = self.config.enforce_http_spec,
            "Request pipeline ready"
        );

        Ok(Pipeline {
            config: self.config,
            routes: Arc::new(self.routes),
            provider: Arc::new(provider),
            preprocessors: self.preprocessors,
            postprocessors: self.postprocessors,
            finally_processors: self.finally_processors,
            observers: self.observers,
            exception_mapper: self.exception_mapper,
        })
    }
}

/// The per-request state machine.
///
/// Immutable once built and safe to drive from many threads at once; all
/// per-request state lives in the [`MessageContext`] each call creates.
pub struct Pipeline {
    config: ServerConfig,
    routes: Arc<RouteTable>,
    provider: Arc<SerializationProvider>,
    preprocessors: Vec<Arc<dyn Preprocessor>>,
    postprocessors: Vec<Arc<dyn Postprocessor>>,
    finally_processors: Vec<Arc<dyn Postprocessor>>,
    observers: Vec<Arc<dyn MessageObserver>>,
    exception_mapper: ExceptionMapper,
}

impl Pipeline {
    #[must_use]
    pub fn builder(config: ServerConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn provider(&self) -> &SerializationProvider {
        &self.provider
    }

    /// Run one exchange and write its response through `writer`.
    pub fn process(&self, request: Request, writer: &mut dyn ResponseWriter) -> Disposition {
        self.run(request, writer).1
    }

    /// Run one exchange without a transport and hand back the final response.
    #[must_use]
    pub fn handle(&self, request: Request) -> Response {
        let (ctx, _) = self.run(request, &mut Discard);
        ctx.into_parts().1
    }

    fn run(&self, request: Request, writer: &mut dyn ResponseWriter) -> (MessageContext, Disposition) {
        let mut ctx = MessageContext::new(request);
        ctx.request.bind_provider(Arc::clone(&self.provider));
        ctx.response
            .set_header(CORRELATION_ID_HEADER, ctx.request.correlation_id().to_string());

        debug!(
            correlation_id = %ctx.request.correlation_id(),
            method = %ctx.request.method(),
            url = %ctx.request.url(),
            "Request received"
        );
        for observer in &self.observers {
            observer.on_received(&ctx.request, &ctx.response);
        }

        let disposition = match self.handle_message(&mut ctx, writer) {
            Ok(()) => {
                for observer in &self.observers {
                    observer.on_success(&ctx.request, &ctx.response);
                }
                Disposition::KeepAlive
            }
            Err(err) => self.handle_failure(&mut ctx, err, writer),
        };

        for observer in &self.observers {
            observer.on_complete(&ctx.request, &ctx.response);
        }
        ctx.advance(Phase::Complete);
        debug!(
            correlation_id = %ctx.request.correlation_id(),
            status = ctx.response.status(),
            elapsed_ms = ctx.elapsed().as_millis() as u64,
            "Request complete"
        );
        (ctx, disposition)
    }

    fn handle_message(
        &self,
        ctx: &mut MessageContext,
        writer: &mut dyn ResponseWriter,
    ) -> anyhow::Result<()> {
        let body_len = ctx.request.body().len();
        if body_len > self.config.max_body_bytes {
            return Err(ServiceError::bad_request(format!(
                "Request body of {body_len} bytes exceeds the limit of {} bytes",
                self.config.max_body_bytes
            ))
            .into());
        }

        let action = self.routes.resolve_request(&ctx.request)?;
        let route = Arc::clone(action.route());
        ctx.request.apply_match(Arc::clone(&route), action.url_match().clone());
        ctx.action = Some(action);
        ctx.advance(Phase::RouteResolved);

        self.negotiate_response(ctx, false)?;

        for processor in &self.preprocessors {
            guarded("Preprocessor", || processor.process(&mut ctx.request))?;
        }
        ctx.request.reset_body();
        ctx.advance(Phase::PreProcessed);

        let result = guarded("Handler", || route.invoke(&mut ctx.request, &mut ctx.response))?;
        if let Some(value) = result {
            if ctx.response.body().is_empty() {
                ctx.response.set_body(value);
            }
        }
        ctx.advance(Phase::Invoked);

        for processor in &self.postprocessors {
            guarded("Postprocessor", || processor.process(&ctx.request, &mut ctx.response))?;
        }
        ctx.advance(Phase::PostProcessed);

        self.serialize(ctx, false)?;
        ctx.advance(Phase::Serialized);

        if self.config.enforce_http_spec {
            enforce(&ctx.response)?;
        }

        self.run_finally(ctx);
        writer.write(&ctx.request, &ctx.response)?;
        ctx.advance(Phase::Written);
        Ok(())
    }

    fn handle_failure(
        &self,
        ctx: &mut MessageContext,
        err: anyhow::Error,
        writer: &mut dyn ResponseWriter,
    ) -> Disposition {
        let failed_in = ctx.phase();
        let error = classify(err, &self.exception_mapper);
        if error.kind().is_server_error() {
            error!(
                correlation_id = %ctx.request.correlation_id(),
                phase = %failed_in,
                status = error.status(),
                error_id = %error.id(),
                error = %error,
                "Request failed"
            );
        } else {
            warn!(
                correlation_id = %ctx.request.correlation_id(),
                phase = %failed_in,
                status = error.status(),
                error = %error,
                "Request rejected"
            );
        }
        ctx.advance(Phase::Failed);

        ctx.response.set_status(error.status());
        error.augment_response(&mut ctx.response);
        ctx.response.set_error(error);
        if let Some(error) = ctx.response.error() {
            for observer in &self.observers {
                observer.on_exception(&ctx.request, &ctx.response, error);
            }
        }

        // An error body is always produced, whatever the handler had set.
        ctx.response.clear_body();
        ctx.response.remove_header(CONTENT_TYPE.as_str());
        ctx.response.set_serialized(true);
        if let Err(second) = self.serialize(ctx, true) {
            error!(
                correlation_id = %ctx.request.correlation_id(),
                error = %second,
                "Error response serialization failed, falling back to plain text"
            );
            let message = ctx
                .response
                .error()
                .map(|e| e.message().to_string())
                .unwrap_or_default();
            ctx.response.set_output(message.into_bytes());
            ctx.response.set_content_type(TEXT_PLAIN);
        }

        self.run_finally(ctx);
        match writer.write(&ctx.request, &ctx.response) {
            Ok(()) => {
                ctx.advance(Phase::Written);
                Disposition::KeepAlive
            }
            Err(write_err) => {
                error!(
                    correlation_id = %ctx.request.correlation_id(),
                    error = %write_err,
                    "Failed to write error response, closing connection"
                );
                Disposition::Close
            }
        }
    }

    /// Transport-level failure for an exchange that cannot complete, such as
    /// a broken body read or an idle timeout. Observers are notified and the
    /// connection is always closed; nothing is written.
    pub fn connection_error(&self, request: Request, cause: anyhow::Error) -> Disposition {
        let mut ctx = MessageContext::new(request);
        let error = classify(cause, &self.exception_mapper);
        warn!(
            correlation_id = %ctx.request.correlation_id(),
            error = %error,
            "Connection error, closing"
        );
        ctx.response.set_status(error.status());
        for observer in &self.observers {
            observer.on_exception(&ctx.request, &ctx.response, &error);
        }
        ctx.response.set_error(error);
        ctx.advance(Phase::Failed);
        for observer in &self.observers {
            observer.on_complete(&ctx.request, &ctx.response);
        }
        Disposition::Close
    }

    /// Negotiated settings are computed once per exchange. `force` recomputes
    /// them and never fails on a negotiation miss.
    fn negotiate_response(&self, ctx: &mut MessageContext, force: bool) -> Result<(), ServiceError> {
        if !force && ctx.response.serialization_settings().is_some() {
            return Ok(());
        }
        let settings = self
            .provider
            .resolve_response(&ctx.request, &ctx.response, force)?;
        ctx.response.set_serialization_settings(settings);
        Ok(())
    }

    fn serialize(&self, ctx: &mut MessageContext, force: bool) -> Result<(), ServiceError> {
        self.negotiate_response(ctx, force)?;
        if !is_content_allowed(ctx.response.status()) {
            return Ok(());
        }

        let Some(settings) = ctx.response.serialization_settings().cloned() else {
            return Ok(());
        };
        if ctx.response.is_serialized() {
            if let Some(bytes) = settings.serialize(&ctx.response)? {
                ctx.response.set_output(bytes);
            }
            if ctx.response.has_body() && ctx.response.content_type().is_none() {
                ctx.response.set_content_type(settings.media_type());
            }
        } else if ctx.response.has_body() && ctx.response.content_type().is_none() {
            ctx.response.set_content_type(TEXT_PLAIN);
        }
        Ok(())
    }

    /// Run every finally processor once. A failing or panicking processor is
    /// logged and does not stop the rest.
    fn run_finally(&self, ctx: &mut MessageContext) {
        if ctx.finally_ran {
            return;
        }
        ctx.finally_ran = true;
        for processor in &self.finally_processors {
            if let Err(err) =
                guarded("Finally processor", || processor.process(&ctx.request, &mut ctx.response))
            {
                error!(
                    correlation_id = %ctx.request.correlation_id(),
                    error = %err,
                    "Finally processor failed"
                );
            }
        }
    }

    /// Routes plus server identity and formats, for diagnostics.
    #[must_use]
    pub fn metadata(&self) -> ServerMetadata {
        ServerMetadata {
            name: self.config.name.clone(),
            port: self.config.port,
            supported_formats: self.provider.supported_formats(),
            default_format: self
                .provider
                .default_format()
                .unwrap_or(&self.config.default_format)
                .to_string(),
            routes: self.routes.metadata(),
        }
    }
}

/// Run one user-supplied step, turning a panic into an error so it takes the
/// failure branch instead of unwinding out of the pipeline.
fn guarded<T>(step: &str, f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|panic| {
        let message = panic_message(panic.as_ref());
        error!(step, panic_message = %message, "Pipeline step panicked");
        Err(anyhow::anyhow!("{step} panicked: {message}"))
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

struct Discard;

impl ResponseWriter for Discard {
    fn write(&mut self, _request: &Request, _response: &Response) -> io::Result<()> {
        Ok(())
    }
}
