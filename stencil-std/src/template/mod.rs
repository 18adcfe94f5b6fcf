//! Route templates and the store that holds them.

pub mod store;

pub use store::TemplateStore;

use stencil_core::{DYNAMIC_PARAMETER, EndpointUri, Result, StencilError};
use std::sync::Arc;

/// Alias accepted for `{{dynamicParameter}}` inside templated stages.
const PARAM_ALIAS: &str = "param";

/// One step of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// A fixed endpoint URI, identical for every instance.
    Endpoint(EndpointUri),
    /// A URI pattern containing `{{dynamicParameter}}` placeholders, expanded
    /// once per instance.
    Templated(String),
}

impl Stage {
    /// A static stage. Fails if `uri` does not parse.
    pub fn endpoint(uri: &str) -> Result<Self> {
        Ok(Stage::Endpoint(EndpointUri::parse(uri)?))
    }

    /// A templated stage. The pattern is checked when the template is expanded.
    pub fn templated(pattern: impl Into<String>) -> Self {
        Stage::Templated(pattern.into())
    }
}

/// A named, immutable, parameterised pipeline blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    name: Arc<str>,
    stages: Arc<[Stage]>,
}

impl RouteTemplate {
    /// Creates a template. The name must be non-empty and at least one stage given.
    pub fn new(name: impl Into<Arc<str>>, stages: impl IntoIterator<Item = Stage>) -> Result<Self> {
        let name = name.into();
        let stages: Arc<[Stage]> = stages.into_iter().collect();
        if name.trim().is_empty() {
            return Err(StencilError::InvalidTemplate {
                name: name.to_string(),
                reason: "name is empty".into(),
            });
        }
        if stages.is_empty() {
            return Err(StencilError::InvalidTemplate {
                name: name.to_string(),
                reason: "template has no stages".into(),
            });
        }
        Ok(Self { name, stages })
    }

    /// Starts a builder for a template with the given name.
    pub fn builder(name: impl Into<Arc<str>>) -> RouteTemplateBuilder {
        RouteTemplateBuilder {
            name: name.into(),
            stages: Vec::new(),
            error: None,
        }
    }

    /// The template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stages, in order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

/// Builder for constructing a [`RouteTemplate`].
///
/// Parse errors are deferred to [`build`](RouteTemplateBuilder::build).
pub struct RouteTemplateBuilder {
    name: Arc<str>,
    stages: Vec<Stage>,
    error: Option<StencilError>,
}

impl RouteTemplateBuilder {
    /// Append a static endpoint stage.
    pub fn to(mut self, uri: &str) -> Self {
        match Stage::endpoint(uri) {
            Ok(stage) => self.stages.push(stage),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
        self
    }

    /// Append a templated stage.
    pub fn to_templated(mut self, pattern: impl Into<String>) -> Self {
        self.stages.push(Stage::templated(pattern));
        self
    }

    /// Build the template.
    pub fn build(self) -> Result<RouteTemplate> {
        if let Some(err) = self.error {
            return Err(err);
        }
        RouteTemplate::new(self.name, self.stages)
    }
}

/// Replaces every `{{dynamicParameter}}` (or `{{param}}`) in `pattern` with `value`.
pub(crate) fn expand(template: &str, pattern: &str, value: &str) -> Result<String> {
    let fail = |reason: String| StencilError::TemplateExpansion {
        template: template.to_string(),
        reason,
    };

    let mut out = String::with_capacity(pattern.len() + value.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(fail(format!("unterminated placeholder in `{pattern}`")));
        };
        let name = after[..end].trim();
        if name != DYNAMIC_PARAMETER && name != PARAM_ALIAS {
            return Err(fail(format!("unresolved placeholder `{{{{{name}}}}}`")));
        }
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
