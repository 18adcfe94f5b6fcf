#![allow(dead_code)]

use stencil::{
    BoxError, DispatcherConfig, Engine, EndpointEvent, InterceptRule, Observer, RouteTemplate,
    testing::MockComponent,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Notify;

pub const DIRECTIVE: &str = "kamelet:template?dynamicParameter=${body}";

// ============================================================================
// Engine Fixture
// ============================================================================

pub struct Harness {
    pub engine: Engine,
    pub mocks: MockComponent,
}

/// Template `template` sends to `mock:some`; a rule diverts those sends to
/// `mock:other` and skips the original.
pub fn intercepted_engine() -> Harness {
    let mocks = MockComponent::new();
    let engine = Engine::builder()
        .component("mock", mocks.clone())
        .intercept(
            InterceptRule::send_to("mock:some")
                .skip_original()
                .to("mock:other")
                .unwrap(),
        )
        .build()
        .unwrap();
    engine
        .define(RouteTemplate::builder("template").to("mock:some").build().unwrap())
        .unwrap();
    Harness { engine, mocks }
}

pub fn two_consumers() -> DispatcherConfig {
    DispatcherConfig::default().with_consumers(2)
}

// ============================================================================
// Observers
// ============================================================================

/// Holds the first creation for `template` until [`release`](Self::release)
/// is called. Later creations pass straight through.
#[derive(Clone)]
pub struct HoldFirstCreation {
    template: String,
    armed: Arc<AtomicBool>,
    entered: Arc<Notify>,
    released: Arc<Notify>,
}

impl HoldFirstCreation {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            armed: Arc::new(AtomicBool::new(true)),
            entered: Arc::new(Notify::new()),
            released: Arc::new(Notify::new()),
        }
    }

    /// Resolves once the held creation has reached the observer.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

impl Observer for HoldFirstCreation {
    async fn on_event(&self, event: &EndpointEvent) -> Result<(), BoxError> {
        if event.key().template() == self.template && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.released.notified().await;
        }
        Ok(())
    }
}
