//! Per-message resolution of a dynamic directive.

use crate::{
    instantiator::RouteInstantiator, registry::EndpointRegistry, resolver::EndpointKeyResolver,
    template::TemplateStore,
};
use stencil_core::{DynamicDirective, EndpointInstance, EndpointKey, Envelope, Result};
use std::sync::Arc;

/// A pipeline stage whose destination is computed per message.
///
/// Each message is resolved to an [`EndpointKey`] by evaluating the
/// directive's expression. The registry then returns the instance for that
/// key, expanding the named template on first use.
#[derive(Clone)]
pub struct DynamicRoute {
    directive: DynamicDirective,
    templates: Arc<TemplateStore>,
    registry: Arc<EndpointRegistry>,
    instantiator: Arc<RouteInstantiator>,
    resolver: EndpointKeyResolver,
}

impl DynamicRoute {
    /// Creates a route sharing the given store, registry and instantiator.
    pub fn new(
        directive: DynamicDirective,
        templates: Arc<TemplateStore>,
        registry: Arc<EndpointRegistry>,
        instantiator: Arc<RouteInstantiator>,
    ) -> Self {
        Self {
            directive,
            templates,
            registry,
            instantiator,
            resolver: EndpointKeyResolver,
        }
    }

    /// The directive evaluated per message.
    pub fn directive(&self) -> &DynamicDirective {
        &self.directive
    }

    /// The registry instances are published to.
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// The key `envelope` resolves to, without creating anything.
    pub fn key_for(&self, envelope: &Envelope) -> Result<EndpointKey> {
        self.resolver.resolve_directive(&self.directive, envelope)
    }

    /// Returns the instance `envelope` is routed to, creating it on first use.
    ///
    /// Expression failures are returned as is. Template lookup and expansion
    /// failures happen inside the creation and come back wrapped in
    /// [`StencilError::EndpointCreation`](stencil_core::StencilError::EndpointCreation).
    pub async fn resolve(&self, envelope: &Envelope) -> Result<Arc<EndpointInstance>> {
        let key = self.key_for(envelope)?;
        self.registry
            .get_or_create(&key, || async {
                let template = self.templates.lookup(key.template())?;
                self.instantiator.instantiate(&template, key.parameter())
            })
            .await
    }

    /// Resolves `envelope` and delivers it through the instance's stages.
    pub async fn dispatch(&self, envelope: Envelope) -> Result<Envelope> {
        let instance = self.resolve(&envelope).await?;
        instance.deliver(envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::EndpointCatalog,
        hub::CallbackHub,
        template::RouteTemplate,
        testing::{CountingObserver, MockComponent},
    };
    use stencil_core::StencilError;

    struct Fixture {
        route: DynamicRoute,
        templates: Arc<TemplateStore>,
        mocks: MockComponent,
        counter: CountingObserver,
    }

    fn fixture(directive: &str) -> Fixture {
        let catalog = Arc::new(EndpointCatalog::new());
        let mocks = MockComponent::new();
        catalog.register_component("mock", mocks.clone());

        let hub = Arc::new(CallbackHub::new());
        let counter = CountingObserver::new();
        hub.subscribe(counter.clone());

        let templates = Arc::new(TemplateStore::new());
        templates
            .register(
                RouteTemplate::builder("template")
                    .to_templated("mock:{{dynamicParameter}}")
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let route = DynamicRoute::new(
            DynamicDirective::parse(directive).unwrap(),
            Arc::clone(&templates),
            Arc::new(EndpointRegistry::new(hub)),
            Arc::new(RouteInstantiator::new(catalog)),
        );
        Fixture {
            route,
            templates,
            mocks,
            counter,
        }
    }

    #[tokio::test]
    async fn dispatch_routes_by_body() {
        let fx = fixture("template:template?dynamicParameter=${body}");

        fx.route.dispatch(Envelope::new("a")).await.unwrap();
        fx.route.dispatch(Envelope::new("b")).await.unwrap();
        fx.route.dispatch(Envelope::new("a")).await.unwrap();

        assert_eq!(fx.mocks.endpoint("mock:a").received_bodies(), vec!["a", "a"]);
        assert_eq!(fx.mocks.endpoint("mock:b").received_bodies(), vec!["b"]);
        assert_eq!(fx.route.registry().creations(), 2);
        assert_eq!(fx.counter.created(), 2);
        assert_eq!(fx.counter.resolved(), 1);
    }

    #[tokio::test]
    async fn expression_errors_are_not_wrapped() {
        let fx = fixture("template:template?dynamicParameter=${header.tenant}");
        let err = fx.route.dispatch(Envelope::new("a")).await.unwrap_err();
        assert!(matches!(err, StencilError::ParameterEvaluation { .. }));
        assert!(fx.route.registry().is_empty());
    }

    #[tokio::test]
    async fn unknown_template_fails_creation_and_can_be_retried() {
        let fx = fixture("template:later?dynamicParameter=${body}");

        let err = fx.route.dispatch(Envelope::new("a")).await.unwrap_err();
        assert!(matches!(
            err.creation_cause(),
            Some(StencilError::UnknownTemplate(name)) if name == "later"
        ));

        fx.templates
            .register(RouteTemplate::builder("later").to("mock:late").build().unwrap())
            .unwrap();
        fx.route.dispatch(Envelope::new("a")).await.unwrap();
        assert_eq!(fx.mocks.endpoint("mock:late").received_count(), 1);
    }

    #[tokio::test]
    async fn key_for_does_not_create() {
        let fx = fixture("template:template?dynamicParameter=${body}");
        let key = fx.route.key_for(&Envelope::new("a")).unwrap();
        assert_eq!(key, EndpointKey::new("template", "a"));
        assert!(!fx.route.registry().contains(&key));
    }
}
