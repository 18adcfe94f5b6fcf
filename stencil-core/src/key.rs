//! Identity of a dynamic endpoint.

use crate::directive::DYNAMIC_PARAMETER;
use std::{fmt, sync::Arc};

/// A template name paired with one resolved parameter value.
///
/// Two keys are equal iff both components are equal. Cloning is cheap; both
/// parts are reference counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey {
    template: Arc<str>,
    parameter: Arc<str>,
}

impl EndpointKey {
    /// Creates a key from a template name and a resolved parameter value.
    pub fn new(template: impl Into<Arc<str>>, parameter: impl Into<Arc<str>>) -> Self {
        Self {
            template: template.into(),
            parameter: parameter.into(),
        }
    }

    /// The template name.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The resolved parameter value.
    pub fn parameter(&self) -> &str {
        &self.parameter
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}?{}={}",
            self.template, DYNAMIC_PARAMETER, self.parameter
        )
    }
}
