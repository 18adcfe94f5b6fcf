//! The engine: one place that owns and wires every shared component.

use stencil_core::{
    BoxError, DynamicDirective, Endpoint, EndpointEvent, Observer, Result, StencilError,
};
use stencil_std::{
    CallbackHub, Component, DispatcherConfig, Dispatcher, DynamicRoute, EndpointCatalog,
    EndpointRegistry, InterceptRule, RouteInstantiator, RouteTemplate, Stage, SubscriptionId,
    TemplateStore, endpoints::LogComponent,
};
use std::sync::Arc;

/// Builder for [`Engine`].
///
/// The `log` component is always available.
pub struct EngineBuilder {
    catalog: EndpointCatalog,
    rules: Vec<InterceptRule>,
    error: Option<StencilError>,
}

impl EngineBuilder {
    fn new() -> Self {
        let catalog = EndpointCatalog::new();
        catalog.register_component("log", LogComponent);
        Self {
            catalog,
            rules: Vec::new(),
            error: None,
        }
    }

    /// Registers the component creating endpoints for `scheme`.
    pub fn component<C: Component>(self, scheme: &str, component: C) -> Self {
        self.catalog.register_component(scheme, component);
        self
    }

    /// Registers a fixed endpoint. An invalid URI is reported by
    /// [`build`](Self::build).
    pub fn endpoint<E: Endpoint>(mut self, uri: &str, endpoint: E) -> Self {
        if let Err(err) = self.catalog.register_endpoint(uri, endpoint) {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
        self
    }

    /// Adds a send interception rule applied to every instance the engine
    /// builds.
    pub fn intercept(mut self, rule: InterceptRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Builds the engine, or returns the first error recorded by the builder.
    pub fn build(self) -> Result<Engine> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.assemble()),
        }
    }

    fn assemble(self) -> Engine {
        let catalog = Arc::new(self.catalog);
        let instantiator = self
            .rules
            .into_iter()
            .fold(RouteInstantiator::new(Arc::clone(&catalog)), |inst, rule| {
                inst.with_rule(rule)
            });
        let hub = Arc::new(CallbackHub::new());

        Engine {
            templates: Arc::new(TemplateStore::new()),
            registry: Arc::new(EndpointRegistry::new(Arc::clone(&hub))),
            instantiator: Arc::new(instantiator),
            catalog,
            hub,
        }
    }
}

/// Owns the template store, endpoint catalog, callback hub and registry, and
/// hands out routes and dispatchers sharing them.
///
/// # Example
///
/// ```rust,ignore
/// let mocks = MockComponent::new();
/// let engine = Engine::builder()
///     .component("mock", mocks.clone())
///     .intercept(InterceptRule::send_to("mock:some").skip_original().to("mock:other")?)
///     .build()?;
///
/// engine.define(RouteTemplate::builder("template").to("mock:some").build()?)?;
/// let dispatcher = engine.dispatcher(
///     "kamelet:template?dynamicParameter=${body}",
///     DispatcherConfig::default().with_consumers(2),
/// )?;
/// dispatcher.submit_and_wait(Envelope::new("hello")).await?;
/// ```
pub struct Engine {
    templates: Arc<TemplateStore>,
    catalog: Arc<EndpointCatalog>,
    hub: Arc<CallbackHub>,
    registry: Arc<EndpointRegistry>,
    instantiator: Arc<RouteInstantiator>,
}

impl Engine {
    /// Starts a builder with the `log` component registered.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Registers a template built from `stages`.
    pub fn define_template(
        &self,
        name: &str,
        stages: impl IntoIterator<Item = Stage>,
    ) -> Result<Arc<RouteTemplate>> {
        self.define(RouteTemplate::new(name, stages)?)
    }

    /// Registers `template`. Fails if its name is already defined.
    pub fn define(&self, template: RouteTemplate) -> Result<Arc<RouteTemplate>> {
        self.templates.register(template)
    }

    /// Calls `observer` once for every newly published instance.
    ///
    /// Lookups of existing instances are not reported; use
    /// [`subscribe`](Self::subscribe) to see those too.
    pub fn on_endpoint_created<O: Observer>(&self, observer: O) -> SubscriptionId {
        self.hub.subscribe(CreatedOnly(observer))
    }

    /// Subscribes `observer` to every endpoint event.
    pub fn subscribe<O: Observer>(&self, observer: O) -> SubscriptionId {
        self.hub.subscribe(observer)
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Creates a route resolving `directive` per message.
    pub fn dynamic_route(&self, directive: &str) -> Result<DynamicRoute> {
        let directive = DynamicDirective::parse(directive)?;
        tracing::debug!(%directive, "dynamic route created");
        Ok(DynamicRoute::new(
            directive,
            Arc::clone(&self.templates),
            Arc::clone(&self.registry),
            Arc::clone(&self.instantiator),
        ))
    }

    /// Starts a dispatcher feeding a new route for `directive`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatcher(&self, directive: &str, config: DispatcherConfig) -> Result<Dispatcher> {
        let route = self.dynamic_route(directive)?;
        Dispatcher::start(Arc::new(route), config)
    }

    /// The template store.
    pub fn templates(&self) -> &Arc<TemplateStore> {
        &self.templates
    }

    /// The endpoint catalog.
    pub fn catalog(&self) -> &Arc<EndpointCatalog> {
        &self.catalog
    }

    /// The callback hub.
    pub fn hub(&self) -> &Arc<CallbackHub> {
        &self.hub
    }

    /// The endpoint registry.
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::new().assemble()
    }
}

struct CreatedOnly<O>(O);

impl<O: Observer> Observer for CreatedOnly<O> {
    async fn on_event(&self, event: &EndpointEvent) -> Result<(), BoxError> {
        if event.is_created() {
            self.0.on_event(event).await
        } else {
            Ok(())
        }
    }
}
