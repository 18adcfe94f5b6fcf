//! Live endpoint instances produced by expanding a template.

use crate::{
    endpoint::{DynEndpoint, Endpoint},
    envelope::Envelope,
    error::{BoxError, Result, StencilError},
    key::EndpointKey,
    uri::EndpointUri,
};
use std::{fmt, sync::Arc};

/// One step of an instance's pipeline.
#[derive(Clone)]
pub struct RouteStage {
    uri: EndpointUri,
    endpoint: Arc<dyn DynEndpoint>,
}

impl RouteStage {
    /// Binds `endpoint` to the URI it was resolved from.
    pub fn new(uri: EndpointUri, endpoint: Arc<dyn DynEndpoint>) -> Self {
        Self { uri, endpoint }
    }

    /// The URI this stage delivers to.
    pub fn uri(&self) -> &EndpointUri {
        &self.uri
    }

    /// The endpoint this stage delivers to.
    pub fn endpoint(&self) -> &Arc<dyn DynEndpoint> {
        &self.endpoint
    }
}

impl fmt::Debug for RouteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteStage").field("uri", &self.uri).finish()
    }
}

/// A runnable pipeline bound to one [`EndpointKey`].
///
/// Instances are immutable once built; registries publish them behind an
/// `Arc` and any number of dispatches may deliver through one concurrently.
#[derive(Debug)]
pub struct EndpointInstance {
    id: u64,
    key: EndpointKey,
    stages: Vec<RouteStage>,
}

impl EndpointInstance {
    /// Creates an instance for `key` running `stages` in order.
    pub fn new(id: u64, key: EndpointKey, stages: Vec<RouteStage>) -> Self {
        Self { id, key, stages }
    }

    /// Sequence number assigned by the instantiator that built this instance.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The key this instance was built for.
    pub fn key(&self) -> &EndpointKey {
        &self.key
    }

    /// The stages, in delivery order.
    pub fn stages(&self) -> &[RouteStage] {
        &self.stages
    }

    /// Runs the envelope through every stage in order.
    ///
    /// The first failing stage aborts delivery with [`StencilError::Delivery`].
    pub async fn deliver(&self, envelope: Envelope) -> Result<Envelope> {
        let mut envelope = envelope;
        for stage in &self.stages {
            envelope = stage.endpoint.process_dyn(envelope).await.map_err(|source| {
                StencilError::Delivery {
                    uri: stage.uri.to_string(),
                    source,
                }
            })?;
        }
        Ok(envelope)
    }
}

impl Endpoint for EndpointInstance {
    async fn process(&self, envelope: Envelope) -> Result<Envelope, BoxError> {
        self.deliver(envelope).await.map_err(BoxError::from)
    }
}
