//! Standard endpoints and components.

use crate::catalog::Component;
use stencil_core::{BoxError, DynEndpoint, Endpoint, EndpointUri, Envelope};
use std::{future::Future, sync::Arc};

/// An endpoint that logs every envelope it receives and passes it on unchanged.
pub struct LogEndpoint {
    name: String,
}

impl LogEndpoint {
    /// Creates a log endpoint reporting under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Endpoint for LogEndpoint {
    async fn process(&self, envelope: Envelope) -> Result<Envelope, BoxError> {
        tracing::info!(endpoint = %self.name, body = envelope.body(), "received message");
        Ok(envelope)
    }
}

/// Creates a [`LogEndpoint`] per `log:` URI, named after the URI path.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogComponent;

impl Component for LogComponent {
    fn create_endpoint(&self, uri: &EndpointUri) -> Result<Arc<dyn DynEndpoint>, BoxError> {
        Ok(Arc::new(LogEndpoint::new(uri.path())))
    }
}

/// An endpoint backed by an async closure.
pub struct FnEndpoint<F>(F);

/// Wraps `f` as an [`Endpoint`].
pub fn endpoint_fn<F, Fut>(f: F) -> FnEndpoint<F>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Envelope, BoxError>> + Send,
{
    FnEndpoint(f)
}

impl<F, Fut> Endpoint for FnEndpoint<F>
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Envelope, BoxError>> + Send,
{
    fn process(&self, envelope: Envelope) -> impl Future<Output = Result<Envelope, BoxError>> + Send {
        (self.0)(envelope)
    }
}
