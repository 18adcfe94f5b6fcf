//! # stencil - Dynamic Endpoints from Route Templates
//!
//! `stencil` routes each message to an endpoint computed from the message
//! itself. A directive such as `kamelet:template?dynamicParameter=${body}`
//! names a route template and an expression; every distinct value of the
//! expression gets its own instance of the template, created on first use
//! and reused afterwards.
//!
//! Creation is at most once per key even when many consumers hit the same
//! key at the same moment. Callers arriving mid-creation wait for the first
//! creator and receive the same instance, and creations for different keys
//! never block each other.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stencil::prelude::*;
//! use stencil::testing::MockComponent;
//!
//! let mocks = MockComponent::new();
//! let engine = Engine::builder().component("mock", mocks.clone()).build()?;
//! engine.define(
//!     RouteTemplate::builder("greeting")
//!         .to_templated("mock:{{dynamicParameter}}")
//!         .build()?,
//! )?;
//!
//! let dispatcher = engine.dispatcher(
//!     "kamelet:greeting?dynamicParameter=${header.lang}",
//!     DispatcherConfig::default().with_consumers(4),
//! )?;
//! dispatcher
//!     .submit_and_wait(Envelope::new("hello").with_header("lang", "en"))
//!     .await?;
//! assert_eq!(mocks.endpoint("mock:en").received_count(), 1);
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod engine;

pub use engine::{Engine, EngineBuilder};

pub use stencil_core::{
    // Errors
    BoxError,
    // Traits
    DynEndpoint,
    DynObserver,
    // Values
    DynamicDirective,
    Endpoint,
    EndpointEvent,
    EndpointEventKind,
    EndpointInstance,
    EndpointKey,
    EndpointUri,
    Envelope,
    Observer,
    ParameterExpression,
    Result,
    RouteStage,
    StencilError,
    UriError,
};

pub use stencil_std::{
    CallbackHub, Component, Dispatcher, DispatcherConfig, DynamicRoute, EndpointCatalog,
    EndpointKeyResolver, EndpointRegistry, InterceptRule, RouteInstantiator, RouteTemplate, Stage,
    SubscriptionId, TemplateStore,
};

/// Standard endpoints and components.
pub mod endpoints {
    pub use stencil_std::endpoints::{FnEndpoint, LogComponent, LogEndpoint, endpoint_fn};
    pub use stencil_std::hub::{FnObserver, observer_fn};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use stencil_std::testing::*;
}

/// Prelude module - common imports for Stencil.
///
/// # Usage
///
/// ```rust,ignore
/// use stencil::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        DispatcherConfig,
        // Core traits
        Endpoint,
        EndpointEvent,
        // Engine
        Engine,
        Envelope,
        InterceptRule,
        Observer,
        RouteTemplate,
        Stage,
        StencilError,
        endpoints::{endpoint_fn, observer_fn},
    };
}
