//! Queue-backed message dispatch.
//!
//! A [`Dispatcher`] owns one bounded queue and a fixed pool of consumer
//! tasks sharing its receiving end. Each consumer pulls one message at a
//! time and runs it through a [`DynamicRoute`], so messages pulled by one
//! consumer are processed in the order it pulled them. Nothing orders
//! messages across consumers.
//!
//! Synchronous submissions carry a oneshot reply channel. A caller that
//! times out only drops its end of that channel: the consumer still finishes
//! the dispatch, including any endpoint creation it claimed.
//!
//! A panic raised while dispatching is caught and reported for that message
//! as [`StencilError::DispatchPanic`]; the consumer moves on to the next one.

use crate::{config::DispatcherConfig, route::DynamicRoute};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use stencil_core::{Envelope, Result, StencilError};
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

type Reply = oneshot::Sender<Result<Envelope>>;

struct Job {
    envelope: Envelope,
    reply: Option<Reply>,
}

type Queue = Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>;

/// Producer/consumer front end of a [`DynamicRoute`].
pub struct Dispatcher {
    route: Arc<DynamicRoute>,
    config: DispatcherConfig,
    sender: RwLock<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Validates `config` and spawns its consumers onto the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(route: Arc<DynamicRoute>, config: DispatcherConfig) -> Result<Self> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let queue: Queue = Arc::new(tokio::sync::Mutex::new(receiver));
        let workers = (0..config.consumers)
            .map(|index| tokio::spawn(consume(index, Arc::clone(&route), Arc::clone(&queue))))
            .collect();

        tracing::info!(
            directive = %route.directive(),
            consumers = config.consumers,
            queue_capacity = config.queue_capacity,
            "dispatcher started"
        );
        Ok(Self {
            route,
            config,
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
        })
    }

    /// The route every message is dispatched through.
    pub fn route(&self) -> &Arc<DynamicRoute> {
        &self.route
    }

    /// The configuration the dispatcher was started with.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Returns `false` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_running(&self) -> bool {
        self.sender.read().is_some()
    }

    /// Enqueues `envelope` and returns once it is queued.
    ///
    /// Waits for room when the queue is full. Dispatch failures are logged,
    /// never returned here.
    pub async fn submit(&self, envelope: Envelope) -> Result<()> {
        self.enqueue(Job {
            envelope,
            reply: None,
        })
        .await
    }

    /// Enqueues `envelope` and waits, up to the configured request timeout,
    /// for its dispatch to finish.
    pub async fn submit_and_wait(&self, envelope: Envelope) -> Result<Envelope> {
        self.submit_and_wait_timeout(envelope, self.config.request_timeout())
            .await
    }

    /// Like [`submit_and_wait`](Self::submit_and_wait) with an explicit
    /// deadline covering both enqueueing and dispatch.
    ///
    /// On [`StencilError::DispatchTimeout`] the message may still be
    /// delivered later.
    pub async fn submit_and_wait_timeout(
        &self,
        envelope: Envelope,
        timeout: Duration,
    ) -> Result<Envelope> {
        let (reply, response) = oneshot::channel();
        let exchange = async {
            self.enqueue(Job {
                envelope,
                reply: Some(reply),
            })
            .await?;
            // The consumer dropped the reply without answering; it stopped.
            response.await.map_err(|_| StencilError::Shutdown)?
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| StencilError::DispatchTimeout(timeout))?
    }

    /// Stops accepting messages, lets the consumers drain the queue and waits
    /// for them to exit. Later calls return immediately.
    pub async fn shutdown(&self) {
        if self.sender.write().take().is_none() {
            return;
        }

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(error) = worker.await {
                tracing::error!(%error, "consumer task failed");
            }
        }
        tracing::info!(directive = %self.route.directive(), "dispatcher stopped");
    }

    async fn enqueue(&self, job: Job) -> Result<()> {
        let sender = self.sender.read().clone().ok_or(StencilError::Shutdown)?;
        sender.send(job).await.map_err(|_| StencilError::Shutdown)
    }
}

async fn consume(index: usize, route: Arc<DynamicRoute>, queue: Queue) {
    tracing::debug!(consumer = index, "consumer started");
    loop {
        let job = queue.lock().await.recv().await;
        let Some(Job { envelope, reply }) = job else {
            break;
        };

        let result = AssertUnwindSafe(route.dispatch(envelope))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::error!(consumer = index, panic = %message, "dispatch panicked");
                Err(StencilError::DispatchPanic(message))
            });
        match reply {
            Some(reply) => {
                if reply.send(result).is_err() {
                    tracing::debug!(consumer = index, "caller stopped waiting for reply");
                }
            }
            None => {
                if let Err(error) = result {
                    tracing::error!(consumer = index, %error, "dispatch failed");
                }
            }
        }
    }
    tracing::debug!(consumer = index, "consumer stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
