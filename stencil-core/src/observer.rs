//! Observers of endpoint creation and lookup.
//!
//! Observers are invoked synchronously by the registry: a `Created` event is
//! delivered before the new instance becomes visible to other callers, so an
//! observer that takes its time holds back every caller waiting on that key
//! (and only that key).

use crate::{error::BoxError, instance::EndpointInstance, key::EndpointKey};
use std::{future::Future, pin::Pin, sync::Arc};

/// Why an event was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointEventKind {
    /// A new instance was built and is about to be published.
    Created,
    /// An already-published instance was returned to a caller.
    Resolved,
}

/// An instance together with the reason it is being reported.
#[derive(Debug, Clone)]
pub struct EndpointEvent {
    kind: EndpointEventKind,
    instance: Arc<EndpointInstance>,
}

impl EndpointEvent {
    /// An event for a newly built instance.
    pub fn created(instance: Arc<EndpointInstance>) -> Self {
        Self {
            kind: EndpointEventKind::Created,
            instance,
        }
    }

    /// An event for an instance returned from the registry.
    pub fn resolved(instance: Arc<EndpointInstance>) -> Self {
        Self {
            kind: EndpointEventKind::Resolved,
            instance,
        }
    }

    /// Why the event was published.
    pub fn kind(&self) -> EndpointEventKind {
        self.kind
    }

    /// Returns `true` for [`EndpointEventKind::Created`].
    pub fn is_created(&self) -> bool {
        self.kind == EndpointEventKind::Created
    }

    /// The key of the reported instance.
    pub fn key(&self) -> &EndpointKey {
        self.instance.key()
    }

    /// The reported instance.
    pub fn instance(&self) -> &Arc<EndpointInstance> {
        &self.instance
    }
}

/// Receives endpoint events.
///
/// Returning an error from a `Created` event aborts that creation; the key is
/// left unpublished and the next caller retries.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `Observer`",
    label = "missing `Observer` implementation",
    note = "Observers must implement `on_event` to receive `EndpointEvent`s."
)]
pub trait Observer: Send + Sync + 'static {
    /// Called for every published event.
    fn on_event(
        &self,
        event: &EndpointEvent,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Dynamic object-safe version of [`Observer`].
pub trait DynObserver: Send + Sync + 'static {
    /// Called for every published event (dynamic dispatch version).
    fn on_event_dyn<'a>(
        &'a self,
        event: &'a EndpointEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;
}

impl<T: Observer> DynObserver for T {
    fn on_event_dyn<'a>(
        &'a self,
        event: &'a EndpointEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>> {
        Box::pin(self.on_event(event))
    }
}
