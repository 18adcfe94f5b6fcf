//! # Endpoints
//!
//! An endpoint is a concrete destination a message can be forwarded to. It
//! receives an owned [`Envelope`] and returns the envelope it leaves behind,
//! which becomes the input of the next stage in an endpoint instance.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Endpoint`] uses native `async fn` for zero-cost static dispatch. Catalogs
//! and instances store endpoints behind [`DynEndpoint`], which every
//! `Endpoint` implements automatically.

use crate::{envelope::Envelope, error::BoxError};
use std::{future::Future, pin::Pin, sync::Arc};

/// A runnable destination.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `Endpoint`",
    label = "missing `Endpoint` implementation",
    note = "Endpoints must implement `process` to receive an `Envelope`."
)]
pub trait Endpoint: Send + Sync + 'static {
    /// Processes one message and returns the envelope handed to the next stage.
    fn process(
        &self,
        envelope: Envelope,
    ) -> impl Future<Output = Result<Envelope, BoxError>> + Send;
}

/// Dynamic object-safe version of [`Endpoint`].
pub trait DynEndpoint: Send + Sync + 'static {
    /// Processes one message (dynamic dispatch version).
    fn process_dyn<'a>(
        &'a self,
        envelope: Envelope,
    ) -> Pin<Box<dyn Future<Output = Result<Envelope, BoxError>> + Send + 'a>>;
}

// Blanket implementation: Any type implementing Endpoint implements DynEndpoint automatically.
impl<T: Endpoint> DynEndpoint for T {
    fn process_dyn<'a>(
        &'a self,
        envelope: Envelope,
    ) -> Pin<Box<dyn Future<Output = Result<Envelope, BoxError>> + Send + 'a>> {
        Box::pin(self.process(envelope))
    }
}

// Allow shared trait objects to be used where Endpoint is expected.
impl Endpoint for Arc<dyn DynEndpoint> {
    async fn process(&self, envelope: Envelope) -> Result<Envelope, BoxError> {
        (**self).process_dyn(envelope).await
    }
}
