#![allow(dead_code)]

use stencil_core::DynamicDirective;
use stencil_std::{
    CallbackHub, DynamicRoute, EndpointCatalog, EndpointRegistry, RouteInstantiator,
    TemplateStore, testing::MockComponent,
};
use std::sync::Arc;

/// Every shared component, wired the way an engine wires them.
pub struct Parts {
    pub templates: Arc<TemplateStore>,
    pub catalog: Arc<EndpointCatalog>,
    pub hub: Arc<CallbackHub>,
    pub registry: Arc<EndpointRegistry>,
    pub instantiator: Arc<RouteInstantiator>,
    pub mocks: MockComponent,
}

impl Parts {
    pub fn new() -> Self {
        let catalog = Arc::new(EndpointCatalog::new());
        let mocks = MockComponent::new();
        catalog.register_component("mock", mocks.clone());
        let hub = Arc::new(CallbackHub::new());
        Self {
            templates: Arc::new(TemplateStore::new()),
            registry: Arc::new(EndpointRegistry::new(Arc::clone(&hub))),
            instantiator: Arc::new(RouteInstantiator::new(Arc::clone(&catalog))),
            catalog,
            hub,
            mocks,
        }
    }

    pub fn route(&self, directive: &str) -> DynamicRoute {
        DynamicRoute::new(
            DynamicDirective::parse(directive).unwrap(),
            Arc::clone(&self.templates),
            Arc::clone(&self.registry),
            Arc::clone(&self.instantiator),
        )
    }
}
