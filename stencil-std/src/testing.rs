//! Testing utilities for Stencil.
//!
//! - [`MockEndpoint`]: records what it receives and checks expected counts
//! - [`MockComponent`]: hands out one shared [`MockEndpoint`] per `mock:` URI
//! - [`RecordingObserver`]: records every endpoint event
//! - [`CountingObserver`]: counts created and resolved events

use crate::catalog::Component;
use dashmap::DashMap;
use parking_lot::Mutex;
use stencil_core::{
    BoxError, DynEndpoint, Endpoint, EndpointEvent, EndpointInstance, EndpointKey, EndpointUri,
    Envelope, Observer,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use thiserror::Error;
use tokio::sync::Notify;

// ============================================================================
// Mock Endpoint
// ============================================================================

/// Returned by [`MockEndpoint::assert_is_satisfied`] when expectations fail.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{uri}: expected {expected} messages but received {received}")]
pub struct MockAssertionError {
    /// URI of the mock.
    pub uri: String,
    /// Expected message count.
    pub expected: usize,
    /// Messages actually received when the check gave up.
    pub received: usize,
}

struct MockState {
    uri: String,
    received: Mutex<Vec<Envelope>>,
    expected: Mutex<Option<usize>>,
    arrived: Notify,
}

/// An endpoint that records every envelope it receives.
///
/// Clones share state, so a test can keep a handle while the engine owns another.
///
/// # Example
///
/// ```rust,ignore
/// let other = mocks.endpoint("mock:other");
/// other.expected_message_count(2);
/// // ... drive traffic ...
/// other.assert_is_satisfied(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct MockEndpoint {
    state: Arc<MockState>,
}

impl MockEndpoint {
    /// Creates a mock with no expectation.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            state: Arc::new(MockState {
                uri: uri.into(),
                received: Mutex::new(Vec::new()),
                expected: Mutex::new(None),
                arrived: Notify::new(),
            }),
        }
    }

    /// The URI this mock stands for.
    pub fn uri(&self) -> &str {
        &self.state.uri
    }

    /// Sets how many messages the mock must receive to be satisfied.
    pub fn expected_message_count(&self, count: usize) {
        *self.state.expected.lock() = Some(count);
    }

    /// Number of messages received so far.
    pub fn received_count(&self) -> usize {
        self.state.received.lock().len()
    }

    /// Every envelope received, in arrival order.
    pub fn received(&self) -> Vec<Envelope> {
        self.state.received.lock().clone()
    }

    /// Bodies of every envelope received, in arrival order.
    pub fn received_bodies(&self) -> Vec<String> {
        self.state
            .received
            .lock()
            .iter()
            .map(|e| e.body().to_string())
            .collect()
    }

    /// Clears received messages and expectations.
    pub fn reset(&self) {
        self.state.received.lock().clear();
        *self.state.expected.lock() = None;
    }

    /// Waits up to `timeout` for the expected count to arrive, then checks the
    /// count is exact. Without an expectation this succeeds immediately.
    pub async fn assert_is_satisfied(&self, timeout: Duration) -> Result<(), MockAssertionError> {
        let Some(expected) = *self.state.expected.lock() else {
            return Ok(());
        };

        let wait = async {
            loop {
                let arrived = self.state.arrived.notified();
                if self.received_count() >= expected {
                    break;
                }
                arrived.await;
            }
        };
        // A timeout falls through to the exact-count check below.
        let _ = tokio::time::timeout(timeout, wait).await;

        let received = self.received_count();
        if received == expected {
            Ok(())
        } else {
            Err(MockAssertionError {
                uri: self.state.uri.clone(),
                expected,
                received,
            })
        }
    }
}

impl Endpoint for MockEndpoint {
    async fn process(&self, envelope: Envelope) -> Result<Envelope, BoxError> {
        self.state.received.lock().push(envelope.clone());
        self.state.arrived.notify_waiters();
        Ok(envelope)
    }
}

// ============================================================================
// Mock Component
// ============================================================================

/// Component for the `mock` scheme.
///
/// [`endpoint`](MockComponent::endpoint) and the engine return the same
/// [`MockEndpoint`] for a URI, whichever asks first.
#[derive(Clone, Default)]
pub struct MockComponent {
    mocks: Arc<DashMap<String, MockEndpoint>>,
}

impl MockComponent {
    /// Creates a component with no mocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mock for `uri`, creating it if needed.
    pub fn endpoint(&self, uri: &str) -> MockEndpoint {
        self.mocks
            .entry(uri.to_string())
            .or_insert_with(|| MockEndpoint::new(uri))
            .clone()
    }

    /// URIs of every mock handed out so far, sorted.
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.mocks.iter().map(|m| m.key().clone()).collect();
        uris.sort();
        uris
    }
}

impl Component for MockComponent {
    fn create_endpoint(&self, uri: &EndpointUri) -> Result<Arc<dyn DynEndpoint>, BoxError> {
        Ok(Arc::new(self.endpoint(uri.as_str())))
    }
}

// ============================================================================
// Observers
// ============================================================================

/// An observer that records every event it receives.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<EndpointEvent>>>,
}

impl RecordingObserver {
    /// Creates an observer with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received, in arrival order.
    pub fn events(&self) -> Vec<EndpointEvent> {
        self.events.lock().clone()
    }

    /// Number of events received.
    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    /// Keys of the `Created` events, in arrival order.
    pub fn created_keys(&self) -> Vec<EndpointKey> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.is_created())
            .map(|e| e.key().clone())
            .collect()
    }
}

impl Observer for RecordingObserver {
    async fn on_event(&self, event: &EndpointEvent) -> Result<(), BoxError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// An observer that counts events by kind.
#[derive(Clone, Default)]
pub struct CountingObserver {
    created: Arc<AtomicUsize>,
    resolved: Arc<AtomicUsize>,
}

impl CountingObserver {
    /// Creates an observer with both counts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `Created` events.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of `Resolved` events.
    pub fn resolved(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }
}

impl Observer for CountingObserver {
    async fn on_event(&self, event: &EndpointEvent) -> Result<(), BoxError> {
        let counter = if event.is_created() {
            &self.created
        } else {
            &self.resolved
        };
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An instance with no stages, for exercising observers and registries.
pub fn instance(template: &str, parameter: &str) -> Arc<EndpointInstance> {
    Arc::new(EndpointInstance::new(
        0,
        EndpointKey::new(template, parameter),
        Vec::new(),
    ))
}
