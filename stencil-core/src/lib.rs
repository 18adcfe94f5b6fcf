//! # stencil-core
//!
//! Core traits and value types for the Stencil dynamic endpoint engine.
//!
//! This crate has minimal dependencies and is meant to be imported by
//! components, endpoints and observers that plug into the engine without
//! needing the concurrent machinery in `stencil-std`.
//!
//! # Vocabulary
//!
//! - A **template** names a parameterised pipeline of endpoint URIs.
//! - A [`DynamicDirective`] (`template:name?dynamicParameter=${body}`) selects a
//!   template and a [`ParameterExpression`] evaluated per [`Envelope`].
//! - The template name and the evaluated value form an [`EndpointKey`].
//! - Expanding a template for one key yields an [`EndpointInstance`]: a fixed
//!   sequence of [`Endpoint`]s.
//! - [`Observer`]s receive an [`EndpointEvent`] whenever an instance is created
//!   or looked up.
//!
//! # Error Types
//!
//! - [`StencilError`] - Top-level error type
//! - [`UriError`] - Endpoint URI parse errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod directive;
mod endpoint;
mod envelope;
mod error;
mod expression;
mod instance;
mod key;
mod observer;
mod uri;

// Re-exports
pub use directive::{DYNAMIC_PARAMETER, DynamicDirective};
pub use endpoint::{DynEndpoint, Endpoint};
pub use envelope::Envelope;
pub use error::{BoxError, Result, StencilError, UriError};
pub use expression::ParameterExpression;
pub use instance::{EndpointInstance, RouteStage};
pub use key::EndpointKey;
pub use observer::{DynObserver, EndpointEvent, EndpointEventKind, Observer};
pub use uri::EndpointUri;
