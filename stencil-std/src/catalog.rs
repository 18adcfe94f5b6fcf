//! Endpoint lookup by URI.
//!
//! Fixed endpoints are registered under their full URI. Everything else is
//! created on first use by the [`Component`] registered for the URI's scheme
//! and cached, so each URI maps to exactly one endpoint object.
//!
//! Component code never runs under a map lock. A URI's first caller inserts
//! an empty slot, leaves the map and creates while holding that slot's own
//! mutex. Later callers for the same URI wait on that mutex; callers for other
//! URIs are not affected.

use dashmap::DashMap;
use parking_lot::Mutex;
use stencil_core::{BoxError, DynEndpoint, Endpoint, EndpointUri, Result, StencilError};
use std::sync::{Arc, OnceLock};

/// Creates endpoints for one URI scheme.
pub trait Component: Send + Sync + 'static {
    /// Builds the endpoint addressed by `uri`.
    fn create_endpoint(&self, uri: &EndpointUri) -> Result<Arc<dyn DynEndpoint>, BoxError>;
}

#[derive(Default)]
struct Slot {
    endpoint: OnceLock<Arc<dyn DynEndpoint>>,
    creating: Mutex<()>,
}

/// Concurrency-safe map from endpoint URI to endpoint.
#[derive(Default)]
pub struct EndpointCatalog {
    endpoints: DashMap<String, Arc<dyn DynEndpoint>>,
    created: DashMap<String, Arc<Slot>>,
    components: DashMap<String, Arc<dyn Component>>,
}

impl EndpointCatalog {
    /// Creates a catalog with no endpoints and no components.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fixed endpoint under `uri`, replacing any previous one.
    pub fn register_endpoint<E: Endpoint>(&self, uri: &str, endpoint: E) -> Result<()> {
        self.register_endpoint_dyn(uri, Arc::new(endpoint))
    }

    /// Registers an already type-erased fixed endpoint under `uri`.
    pub fn register_endpoint_dyn(&self, uri: &str, endpoint: Arc<dyn DynEndpoint>) -> Result<()> {
        let uri = EndpointUri::parse(uri)?;
        self.endpoints.insert(uri.as_str().to_string(), endpoint);
        Ok(())
    }

    /// Registers the component responsible for `scheme`.
    pub fn register_component<C: Component>(&self, scheme: &str, component: C) {
        self.components
            .insert(scheme.to_string(), Arc::new(component));
    }

    /// Returns `true` if a component is registered for `scheme`.
    pub fn has_component(&self, scheme: &str) -> bool {
        self.components.contains_key(scheme)
    }

    /// Returns the endpoint for `uri`, creating it through its component on
    /// first use.
    ///
    /// Concurrent first calls for one URI run the component once. A failed
    /// creation caches nothing.
    pub fn resolve(&self, uri: &EndpointUri) -> Result<Arc<dyn DynEndpoint>> {
        if let Some(endpoint) = self.endpoints.get(uri.as_str()) {
            return Ok(Arc::clone(endpoint.value()));
        }
        if let Some(endpoint) = self
            .created
            .get(uri.as_str())
            .and_then(|slot| slot.endpoint.get().cloned())
        {
            return Ok(endpoint);
        }

        let component = uri
            .scheme()
            .and_then(|scheme| self.components.get(scheme))
            .map(|component| Arc::clone(component.value()))
            .ok_or_else(|| StencilError::UnknownComponent(uri.to_string()))?;

        let slot = Arc::clone(
            self.created
                .entry(uri.as_str().to_string())
                .or_default()
                .value(),
        );
        let result = create_in(&slot, component.as_ref(), uri);
        drop(slot);

        if result.is_err() {
            // Only the map holds a slot at count one, so nobody waits on it.
            self.created.remove_if(uri.as_str(), |_, slot| {
                Arc::strong_count(slot) == 1 && slot.endpoint.get().is_none()
            });
        }
        result
    }

    /// Number of endpoints currently known, fixed and created.
    pub fn len(&self) -> usize {
        let created = self
            .created
            .iter()
            .filter(|slot| slot.value().endpoint.get().is_some())
            .count();
        self.endpoints.len() + created
    }

    /// Returns `true` if no endpoint is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn create_in(
    slot: &Slot,
    component: &dyn Component,
    uri: &EndpointUri,
) -> Result<Arc<dyn DynEndpoint>> {
    let _creating = slot.creating.lock();
    if let Some(endpoint) = slot.endpoint.get() {
        return Ok(Arc::clone(endpoint));
    }

    let endpoint = component
        .create_endpoint(uri)
        .map_err(|source| StencilError::Component {
            uri: uri.to_string(),
            source,
        })?;
    tracing::debug!(uri = %uri, "endpoint created by component");
    Ok(Arc::clone(slot.endpoint.get_or_init(|| endpoint)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockComponent, MockEndpoint};
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            mpsc,
        },
        thread,
        time::Duration,
    };
    use stencil_core::Envelope;

    #[test]
    fn fixed_endpoints_take_precedence() {
        let catalog = EndpointCatalog::new();
        let fixed = MockEndpoint::new("mock:some");
        let mocks = MockComponent::new();
        catalog.register_endpoint("mock:some", fixed.clone()).unwrap();
        catalog.register_component("mock", mocks.clone());

        catalog
            .resolve(&EndpointUri::parse("mock:some").unwrap())
            .unwrap();
        assert!(mocks.uris().is_empty());
    }

    #[tokio::test]
    async fn component_endpoints_are_created_once_per_uri() {
        let catalog = EndpointCatalog::new();
        let mocks = MockComponent::new();
        catalog.register_component("mock", mocks.clone());

        let uri = EndpointUri::parse("mock:other").unwrap();
        let first = catalog.resolve(&uri).unwrap();
        let second = catalog.resolve(&uri).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.len(), 1);

        first.process_dyn(Envelope::new("hello")).await.unwrap();
        assert_eq!(mocks.endpoint("mock:other").received_bodies(), vec!["hello"]);
    }

    #[test]
    fn unknown_scheme_is_reported() {
        let catalog = EndpointCatalog::new();
        let err = catalog
            .resolve(&EndpointUri::parse("jms:queue").unwrap())
            .err()
            .unwrap();
        assert!(matches!(err, StencilError::UnknownComponent(uri) if uri == "jms:queue"));
        assert!(catalog.created.is_empty());
    }

    #[test]
    fn component_failure_is_wrapped() {
        struct Broken;
        impl Component for Broken {
            fn create_endpoint(&self, _uri: &EndpointUri) -> Result<Arc<dyn DynEndpoint>, BoxError> {
                Err("no connection".into())
            }
        }

        let catalog = EndpointCatalog::new();
        catalog.register_component("broken", Broken);
        let err = catalog
            .resolve(&EndpointUri::parse("broken:x").unwrap())
            .err()
            .unwrap();
        assert!(matches!(err, StencilError::Component { ref uri, .. } if uri == "broken:x"));
        assert!(catalog.is_empty());
        assert!(catalog.created.is_empty());
    }

    /// Holds creation of `gated:slow` until released; everything else is
    /// created at once.
    struct Gated {
        calls: Arc<AtomicUsize>,
        started: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Component for Gated {
        fn create_endpoint(&self, uri: &EndpointUri) -> Result<Arc<dyn DynEndpoint>, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if uri.path() == "slow" {
                self.started.lock().send(())?;
                self.release.lock().recv()?;
            }
            Ok(Arc::new(MockEndpoint::new(uri.as_str())))
        }
    }

    struct GatedCatalog {
        catalog: Arc<EndpointCatalog>,
        calls: Arc<AtomicUsize>,
        started: mpsc::Receiver<()>,
        release: mpsc::Sender<()>,
    }

    fn gated_catalog() -> GatedCatalog {
        let (started_tx, started) = mpsc::channel();
        let (release, release_rx) = mpsc::channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = Arc::new(EndpointCatalog::new());
        catalog.register_component(
            "gated",
            Gated {
                calls: Arc::clone(&calls),
                started: Mutex::new(started_tx),
                release: Mutex::new(release_rx),
            },
        );
        GatedCatalog {
            catalog,
            calls,
            started,
            release,
        }
    }

    fn resolve_on_thread(
        catalog: &Arc<EndpointCatalog>,
        uri: &str,
    ) -> thread::JoinHandle<Result<Arc<dyn DynEndpoint>>> {
        let catalog = Arc::clone(catalog);
        let uri = EndpointUri::parse(uri).unwrap();
        thread::spawn(move || catalog.resolve(&uri))
    }

    #[test]
    fn slow_component_does_not_block_other_uris() {
        let fx = gated_catalog();
        let slow = resolve_on_thread(&fx.catalog, "gated:slow");
        fx.started.recv_timeout(Duration::from_secs(5)).unwrap();

        let (done_tx, done) = mpsc::channel();
        let catalog = Arc::clone(&fx.catalog);
        thread::spawn(move || {
            for i in 0..64 {
                let uri = EndpointUri::parse(&format!("gated:fast{i}")).unwrap();
                catalog.resolve(&uri).unwrap();
            }
            done_tx.send(()).unwrap();
        });

        assert!(
            done.recv_timeout(Duration::from_secs(5)).is_ok(),
            "other URIs must resolve while one creation is in progress"
        );
        assert_eq!(fx.catalog.len(), 64);

        fx.release.send(()).unwrap();
        slow.join().unwrap().unwrap();
        assert_eq!(fx.catalog.len(), 65);
        assert_eq!(fx.calls.load(Ordering::SeqCst), 65);
    }

    #[test]
    fn concurrent_first_calls_share_one_creation() {
        let fx = gated_catalog();
        let first = resolve_on_thread(&fx.catalog, "gated:slow");
        fx.started.recv_timeout(Duration::from_secs(5)).unwrap();

        let waiters: Vec<_> = (0..4)
            .map(|_| resolve_on_thread(&fx.catalog, "gated:slow"))
            .collect();
        thread::sleep(Duration::from_millis(20));
        assert!(waiters.iter().all(|waiter| !waiter.is_finished()));

        fx.release.send(()).unwrap();
        let first = first.join().unwrap().unwrap();
        for waiter in waiters {
            assert!(Arc::ptr_eq(&first, &waiter.join().unwrap().unwrap()));
        }
        assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.catalog.len(), 1);
    }
}
