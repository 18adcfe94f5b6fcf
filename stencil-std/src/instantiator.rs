//! Expansion of templates into runnable endpoint instances.

use crate::{
    catalog::EndpointCatalog,
    interception::{self, InterceptRule},
    template::{self, RouteTemplate, Stage},
};
use stencil_core::{EndpointInstance, EndpointKey, EndpointUri, Result, RouteStage, StencilError};
use std::{
    borrow::Cow,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Builds [`EndpointInstance`]s from templates.
///
/// The instantiator never registers what it builds; publishing is the
/// registry's job.
pub struct RouteInstantiator {
    catalog: Arc<EndpointCatalog>,
    rules: Vec<InterceptRule>,
    next_id: AtomicU64,
}

impl RouteInstantiator {
    /// Creates an instantiator resolving endpoints through `catalog`.
    pub fn new(catalog: Arc<EndpointCatalog>) -> Self {
        Self {
            catalog,
            rules: Vec::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Adds an interception rule applied to every instance built afterwards.
    pub fn with_rule(mut self, rule: InterceptRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Interception rules, in the order they were added.
    pub fn rules(&self) -> &[InterceptRule] {
        &self.rules
    }

    /// The catalog stage URIs are resolved through.
    pub fn catalog(&self) -> &Arc<EndpointCatalog> {
        &self.catalog
    }

    /// Expands every stage of `template` with `parameter`, applies
    /// interception rules and binds each resulting URI to its endpoint.
    pub fn instantiate(
        &self,
        template: &RouteTemplate,
        parameter: &str,
    ) -> Result<EndpointInstance> {
        let key = EndpointKey::new(template.name(), parameter);

        let mut stages = Vec::with_capacity(template.stages().len());
        for stage in template.stages() {
            let uri = match stage {
                Stage::Endpoint(uri) => Cow::Borrowed(uri),
                Stage::Templated(pattern) => {
                    let expanded = template::expand(template.name(), pattern, parameter)?;
                    let uri = EndpointUri::parse(&expanded).map_err(|e| {
                        StencilError::TemplateExpansion {
                            template: template.name().to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                    Cow::Owned(uri)
                }
            };

            for target in interception::apply(&self.rules, &uri) {
                let endpoint = self.catalog.resolve(target)?;
                stages.push(RouteStage::new(target.clone(), endpoint));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%key, id, stages = stages.len(), "route instantiated");
        Ok(EndpointInstance::new(id, key, stages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockComponent;

    fn instantiator() -> (RouteInstantiator, MockComponent) {
        let catalog = Arc::new(EndpointCatalog::new());
        let mocks = MockComponent::new();
        catalog.register_component("mock", mocks.clone());
        (RouteInstantiator::new(catalog), mocks)
    }

    fn stage_uris(instance: &EndpointInstance) -> Vec<&str> {
        instance.stages().iter().map(|s| s.uri().as_str()).collect()
    }

    #[test]
    fn expands_templated_stages_per_parameter() {
        let (instantiator, _) = instantiator();
        let template = RouteTemplate::builder("fanout")
            .to("mock:some")
            .to_templated("mock:tenant-{{dynamicParameter}}")
            .build()
            .unwrap();

        let a = instantiator.instantiate(&template, "a").unwrap();
        let b = instantiator.instantiate(&template, "b").unwrap();

        assert_eq!(a.key(), &EndpointKey::new("fanout", "a"));
        assert_eq!(stage_uris(&a), vec!["mock:some", "mock:tenant-a"]);
        assert_eq!(stage_uris(&b), vec!["mock:some", "mock:tenant-b"]);
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn interception_redirects_and_skips_original() {
        let catalog = Arc::new(EndpointCatalog::new());
        let mocks = MockComponent::new();
        catalog.register_component("mock", mocks.clone());
        let instantiator = RouteInstantiator::new(catalog).with_rule(
            InterceptRule::send_to("mock:some")
                .skip_original()
                .to("mock:other")
                .unwrap(),
        );
        let template = RouteTemplate::builder("template")
            .to("mock:some")
            .build()
            .unwrap();

        let instance = instantiator.instantiate(&template, "x").unwrap();
        assert_eq!(stage_uris(&instance), vec!["mock:other"]);

        instance
            .deliver(stencil_core::Envelope::new("hello"))
            .await
            .unwrap();
        assert_eq!(mocks.endpoint("mock:other").received_count(), 1);
        assert_eq!(mocks.endpoint("mock:some").received_count(), 0);
    }

    #[test]
    fn unresolved_placeholder_fails_expansion() {
        let (instantiator, _) = instantiator();
        let template = RouteTemplate::builder("template")
            .to_templated("mock:{{tenant}}")
            .build()
            .unwrap();
        assert!(matches!(
            instantiator.instantiate(&template, "a"),
            Err(StencilError::TemplateExpansion { .. })
        ));
    }

    #[test]
    fn expansion_producing_bad_uri_fails_expansion() {
        let (instantiator, _) = instantiator();
        let template = RouteTemplate::builder("template")
            .to_templated("{{dynamicParameter}}")
            .build()
            .unwrap();
        assert!(matches!(
            instantiator.instantiate(&template, ""),
            Err(StencilError::TemplateExpansion { .. })
        ));
    }

    #[test]
    fn unknown_component_fails() {
        let (instantiator, _) = instantiator();
        let template = RouteTemplate::builder("template")
            .to("jms:orders")
            .build()
            .unwrap();
        assert!(matches!(
            instantiator.instantiate(&template, "a"),
            Err(StencilError::UnknownComponent(_))
        ));
    }
}
