//! # stencil-std
//!
//! Standard implementations for the Stencil dynamic endpoint engine.
//!
//! This crate provides:
//! - **Templates**: [`RouteTemplate`], [`TemplateStore`]
//! - **Resolution**: [`EndpointKeyResolver`], [`DynamicRoute`]
//! - **Creation**: [`EndpointRegistry`], [`RouteInstantiator`], [`EndpointCatalog`]
//! - **Notification**: [`CallbackHub`]
//! - **Dispatch**: [`Dispatcher`], [`DispatcherConfig`]
//! - **Standard endpoints**: Log, Fn
//! - **Testing**: mock endpoints and recording observers

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use stencil_core;

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod endpoints;
pub mod hub;
pub mod instantiator;
pub mod interception;
pub mod registry;
pub mod resolver;
pub mod route;
pub mod template;
pub mod testing;

pub use catalog::{Component, EndpointCatalog};
pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use hub::{CallbackHub, SubscriptionId};
pub use instantiator::RouteInstantiator;
pub use interception::InterceptRule;
pub use registry::EndpointRegistry;
pub use resolver::EndpointKeyResolver;
pub use route::DynamicRoute;
pub use template::{RouteTemplate, Stage, TemplateStore};
