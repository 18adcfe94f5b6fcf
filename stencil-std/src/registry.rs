//! The endpoint registry.
//!
//! Maps each [`EndpointKey`] to the single [`EndpointInstance`] published for
//! it. Every key owns a slot (`Arc<OnceCell<_>>`) inserted atomically into a
//! sharded [`DashMap`]; inserting the empty slot is the creation claim. The
//! slot then serialises creation for its key only:
//!
//! - at most one create function runs for a key at any time, and at most one
//!   instance is ever published for it;
//! - callers arriving while a creation is in flight wait on the slot and
//!   receive the published instance;
//! - a failed creation leaves the slot empty, and the next waiter (or caller)
//!   runs its own create function;
//! - an empty slot is removed from the map once no caller holds it, so
//!   failed keys do not accumulate;
//! - creations for different keys never contend beyond the brief shard lock
//!   taken to find or insert their slot.
//!
//! No map guard is held across an `.await`.

use crate::hub::CallbackHub;
use dashmap::DashMap;
use stencil_core::{
    EndpointEvent, EndpointInstance, EndpointKey, Result, StencilError,
};
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<EndpointInstance>>>;

/// Concurrency-safe map from endpoint key to published instance.
pub struct EndpointRegistry {
    slots: DashMap<EndpointKey, Slot>,
    hub: Arc<CallbackHub>,
    creations: AtomicUsize,
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new(Arc::new(CallbackHub::new()))
    }
}

impl EndpointRegistry {
    /// Creates a registry publishing its events to `hub`.
    pub fn new(hub: Arc<CallbackHub>) -> Self {
        Self {
            slots: DashMap::new(),
            hub,
            creations: AtomicUsize::new(0),
        }
    }

    /// The hub creation and lookup events are published to.
    pub fn hub(&self) -> &Arc<CallbackHub> {
        &self.hub
    }

    /// Returns the instance published for `key`, running `create` to build it
    /// if there is none.
    ///
    /// On a miss, `create` runs while this caller holds the key's claim. The
    /// built instance is reported to the hub as `Created` before it becomes
    /// visible, so callers waiting on the same key resume only after every
    /// observer has returned. An error from `create` or from an observer is
    /// returned as [`StencilError::EndpointCreation`] and the key stays
    /// unpublished. On a hit, a `Resolved` event is published instead.
    ///
    /// Dropping the returned future mid-creation releases the claim; the next
    /// waiter then creates. Callers that must not abandon a claim should run
    /// this on a task they do not cancel.
    pub async fn get_or_create<F, Fut>(
        &self,
        key: &EndpointKey,
        create: F,
    ) -> Result<Arc<EndpointInstance>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<EndpointInstance>>,
    {
        // Declared before `slot` so it runs after this caller's clone is gone.
        let mut vacate = Vacate {
            slots: &self.slots,
            key,
            armed: true,
        };
        let slot = self.slot(key);
        let created = AtomicBool::new(false);

        let instance = slot
            .get_or_try_init(|| async {
                tracing::debug!(%key, "creating endpoint");
                let instance = create().await.map_err(|err| creation_error(key, err))?;
                if instance.key() != key {
                    return Err(StencilError::RegistryCorruption(format!(
                        "instance built for {} was offered for {key}",
                        instance.key()
                    )));
                }

                let instance = Arc::new(instance);
                self.hub
                    .publish(&EndpointEvent::created(Arc::clone(&instance)))
                    .await
                    .map_err(|source| StencilError::EndpointCreation {
                        key: key.to_string(),
                        source,
                    })?;

                created.store(true, Ordering::Release);
                self.creations.fetch_add(1, Ordering::AcqRel);
                tracing::debug!(%key, id = instance.id(), "endpoint published");
                Ok(instance)
            })
            .await?;
        let instance = Arc::clone(instance);
        vacate.armed = false;

        if !created.load(Ordering::Acquire) {
            if let Err(error) = self
                .hub
                .publish(&EndpointEvent::resolved(Arc::clone(&instance)))
                .await
            {
                tracing::warn!(%key, %error, "observer failed on endpoint lookup");
            }
        }

        Ok(instance)
    }

    /// Returns the published instance for `key`, without creating one.
    pub fn get(&self, key: &EndpointKey) -> Option<Arc<EndpointInstance>> {
        self.slots
            .get(key)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// Returns `true` if an instance is published for `key`.
    pub fn contains(&self, key: &EndpointKey) -> bool {
        self.get(key).is_some()
    }

    /// Keys with a published instance.
    pub fn keys(&self) -> Vec<EndpointKey> {
        self.slots
            .iter()
            .filter(|slot| slot.value().initialized())
            .map(|slot| slot.key().clone())
            .collect()
    }

    /// Number of published instances.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().initialized())
            .count()
    }

    /// Returns `true` if nothing is published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of create functions that completed and were published.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::Acquire)
    }

    fn slot(&self, key: &EndpointKey) -> Slot {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(key.clone()).or_default().value())
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// Removes a key's slot when the last caller holding it leaves before an
/// instance was published.
struct Vacate<'a> {
    slots: &'a DashMap<EndpointKey, Slot>,
    key: &'a EndpointKey,
    armed: bool,
}

impl Drop for Vacate<'_> {
    fn drop(&mut self) {
        if self.armed {
            // Holders clone the slot under the shard lock, so a count of one
            // here means nobody can still be waiting on it.
            self.slots.remove_if(self.key, |_, slot| {
                !slot.initialized() && Arc::strong_count(slot) == 1
            });
        }
    }
}

fn creation_error(key: &EndpointKey, err: StencilError) -> StencilError {
    match err {
        err @ StencilError::EndpointCreation { .. } => err,
        err => StencilError::EndpointCreation {
            key: key.to_string(),
            source: Box::new(err),
        },
    }
}
