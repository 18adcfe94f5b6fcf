//! Fan-out of endpoint events to observers.
//!
//! The subscriber list is copy-on-write: `subscribe` and `unsubscribe` swap in
//! a new list atomically, and `publish` iterates an immutable snapshot loaded
//! when it starts. A publish therefore never observes a half-updated list, and
//! any number of publishes for different keys run side by side.

use arc_swap::ArcSwap;
use stencil_core::{BoxError, DynObserver, EndpointEvent, Observer};
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Handle returned by [`CallbackHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    observer: Arc<dyn DynObserver>,
}

/// Ordered, concurrency-safe list of observers.
#[derive(Default)]
pub struct CallbackHub {
    subscribers: ArcSwap<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl CallbackHub {
    /// Creates a hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer; it receives every event published from now on.
    pub fn subscribe<O: Observer>(&self, observer: O) -> SubscriptionId {
        self.subscribe_dyn(Arc::new(observer))
    }

    /// Appends a shared observer.
    pub fn subscribe_dyn(&self, observer: Arc<dyn DynObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let subscriber = Subscriber { id, observer };
        self.subscribers.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(subscriber.clone());
            next
        });
        id
    }

    /// Removes an observer. Returns `false` if it was not subscribed.
    ///
    /// A publish already in progress still delivers to it.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let previous = self.subscribers.rcu(|current| {
            current
                .iter()
                .filter(|s| s.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|s| s.id == id)
    }

    /// Delivers `event` to every observer subscribed when the call starts, in
    /// subscription order. Stops at the first observer error and returns it.
    pub async fn publish(&self, event: &EndpointEvent) -> Result<(), BoxError> {
        let snapshot = self.subscribers.load_full();
        for subscriber in snapshot.iter() {
            subscriber.observer.on_event_dyn(event).await?;
        }
        Ok(())
    }

    /// Number of current subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.load().len()
    }

    /// Returns `true` if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An observer built from a closure taking an owned event.
pub struct FnObserver<F>(F);

/// Wraps `f` as an [`Observer`].
///
/// ```rust,ignore
/// hub.subscribe(observer_fn(|event: EndpointEvent| async move {
///     tracing::info!(key = %event.key(), "endpoint event");
///     Ok(())
/// }));
/// ```
pub fn observer_fn<F, Fut>(f: F) -> FnObserver<F>
where
    F: Fn(EndpointEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    FnObserver(f)
}

impl<F, Fut> Observer for FnObserver<F>
where
    F: Fn(EndpointEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    fn on_event(&self, event: &EndpointEvent) -> impl Future<Output = Result<(), BoxError>> + Send {
        (self.0)(event.clone())
    }
}
