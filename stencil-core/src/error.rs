//! Error types for Stencil.
//!
//! Every fallible operation in the engine reports a [`StencilError`]. Failures
//! raised by user code (endpoints, observers, components) travel as a
//! [`BoxError`] source so the original cause stays inspectable.

use std::time::Duration;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout Stencil.
pub type Result<T, E = StencilError> = std::result::Result<T, E>;

/// Top-level error type for all Stencil operations.
#[derive(Error, Debug)]
pub enum StencilError {
    /// No template is registered under the given name.
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    /// A template with the same name is already registered.
    #[error("template already defined: {0}")]
    DuplicateTemplate(String),

    /// The template definition itself is malformed.
    #[error("invalid template `{name}`: {reason}")]
    InvalidTemplate {
        /// Name of the offending template.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An endpoint URI could not be parsed.
    #[error(transparent)]
    InvalidUri(#[from] UriError),

    /// A dynamic-destination directive could not be parsed.
    #[error("invalid dynamic directive `{directive}`: {reason}")]
    InvalidDirective {
        /// The raw directive text.
        directive: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A parameter expression could not be parsed or evaluated against a message.
    #[error("cannot evaluate parameter expression `{expression}`: {reason}")]
    ParameterEvaluation {
        /// The raw expression text.
        expression: String,
        /// Why evaluation failed.
        reason: String,
    },

    /// A templated stage could not be expanded with the parameter value.
    #[error("cannot expand template `{template}`: {reason}")]
    TemplateExpansion {
        /// Name of the template being expanded.
        template: String,
        /// Why expansion failed.
        reason: String,
    },

    /// No component is registered for the scheme of an endpoint URI.
    #[error("no component registered for endpoint `{0}`")]
    UnknownComponent(String),

    /// A component failed to create an endpoint.
    #[error("component failed to create endpoint `{uri}`")]
    Component {
        /// The endpoint URI being created.
        uri: String,
        /// The component's error.
        #[source]
        source: BoxError,
    },

    /// Creating the endpoint instance for a key failed. The key stays unpublished.
    #[error("failed to create endpoint for {key}")]
    EndpointCreation {
        /// Display form of the endpoint key.
        key: String,
        /// The underlying cause.
        #[source]
        source: BoxError,
    },

    /// A stage of an endpoint instance rejected a message.
    #[error("delivery to `{uri}` failed")]
    Delivery {
        /// URI of the failing stage.
        uri: String,
        /// The endpoint's error.
        #[source]
        source: BoxError,
    },

    /// A synchronous submission did not complete in time.
    #[error("dispatch timed out after {0:?}")]
    DispatchTimeout(Duration),

    /// Dispatching a message panicked. The consumer that ran it keeps going.
    #[error("dispatch panicked: {0}")]
    DispatchPanic(String),

    /// The dispatcher no longer accepts messages.
    #[error("dispatcher has been shut down")]
    Shutdown,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Registry bookkeeping is inconsistent.
    #[error("registry corrupted: {0}")]
    RegistryCorruption(String),
}

impl StencilError {
    /// Returns the [`StencilError`] that caused an `EndpointCreation` failure,
    /// if the cause was itself a Stencil error.
    pub fn creation_cause(&self) -> Option<&StencilError> {
        match self {
            StencilError::EndpointCreation { source, .. } => source.downcast_ref(),
            _ => None,
        }
    }
}

/// Errors that can occur while parsing an endpoint URI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// The URI is empty or whitespace.
    #[error("endpoint uri is empty")]
    Empty,

    /// The scheme contains characters outside `[A-Za-z0-9+.-]`.
    #[error("invalid scheme in endpoint uri `{0}`")]
    InvalidScheme(String),

    /// Nothing follows the scheme.
    #[error("endpoint uri `{0}` has no path")]
    EmptyPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_cause_unwraps_nested_stencil_error() {
        let err = StencilError::EndpointCreation {
            key: "greeting?dynamicParameter=a".into(),
            source: Box::new(StencilError::UnknownTemplate("greeting".into())),
        };
        assert!(matches!(
            err.creation_cause(),
            Some(StencilError::UnknownTemplate(name)) if name == "greeting"
        ));
    }

    #[test]
    fn creation_cause_ignores_foreign_sources() {
        let err = StencilError::EndpointCreation {
            key: "k".into(),
            source: "boom".into(),
        };
        assert!(err.creation_cause().is_none());
        assert!(StencilError::Shutdown.creation_cause().is_none());
    }
}
