//! Named template storage.
//!
//! Reads load an immutable snapshot through [`ArcSwap`] and never block.
//! Writers (startup registration, hot reload) are serialised by a mutex and
//! publish a fresh copy of the map with a single atomic pointer swap.

use super::RouteTemplate;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use stencil_core::{Result, StencilError};
use std::{collections::HashMap, sync::Arc};

type TemplateMap = HashMap<Arc<str>, Arc<RouteTemplate>>;

/// Holds named route templates.
#[derive(Default)]
pub struct TemplateStore {
    templates: ArcSwap<TemplateMap>,
    writer: Mutex<()>,
}

impl TemplateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template. Fails with [`StencilError::DuplicateTemplate`] if
    /// the name is taken.
    pub fn register(&self, template: RouteTemplate) -> Result<Arc<RouteTemplate>> {
        let _guard = self.writer.lock();
        let current = self.templates.load();
        if current.contains_key(template.name()) {
            return Err(StencilError::DuplicateTemplate(template.name().to_string()));
        }

        let template = Arc::new(template);
        let mut next = TemplateMap::clone(&current);
        next.insert(Arc::from(template.name()), Arc::clone(&template));
        self.templates.store(Arc::new(next));
        tracing::debug!(template = template.name(), "template registered");
        Ok(template)
    }

    /// Installs `template`, replacing any template with the same name.
    ///
    /// Returns the replaced template. Instances already built from it keep
    /// running unchanged; only future instantiations see the new definition.
    pub fn replace(&self, template: RouteTemplate) -> Option<Arc<RouteTemplate>> {
        let _guard = self.writer.lock();
        let template = Arc::new(template);
        let mut next = TemplateMap::clone(&self.templates.load());
        let previous = next.insert(Arc::from(template.name()), Arc::clone(&template));
        self.templates.store(Arc::new(next));
        tracing::debug!(
            template = template.name(),
            replaced = previous.is_some(),
            "template reloaded"
        );
        previous
    }

    /// Looks a template up by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<RouteTemplate>> {
        self.templates
            .load()
            .get(name)
            .cloned()
            .ok_or_else(|| StencilError::UnknownTemplate(name.to_string()))
    }

    /// Returns `true` if a template named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.templates.load().contains_key(name)
    }

    /// Names of all registered templates, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .load()
            .keys()
            .map(|name| name.to_string())
            .collect();
        names.sort();
        names
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.load().len()
    }

    /// Returns `true` if no template is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
