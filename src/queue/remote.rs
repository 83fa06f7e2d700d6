//! Queue backed by a network service.
//!
//! [`RemoteQueue`] adapts any [`RemoteBackend`] to the [`Queue`] contract.
//! Receives are batched: one backend call may return several messages, which
//! are then handed out locally one at a time. A batch is deleted from the
//! backend in the background as soon as it has been buffered, so a crash
//! before local delivery can redeliver it elsewhere; callers must tolerate
//! duplicates.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::message::Message;
use super::Queue;
use crate::config;
use crate::error::{Error, Result};
use crate::wire::Client;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// First wait after an empty batch; doubles per empty batch up to the cap.
pub const EMPTY_POLL_BACKOFF: Duration = Duration::from_millis(10);
pub const MAX_EMPTY_POLL_BACKOFF: Duration = Duration::from_secs(1);

/// One message handed out by a backend, with the handle needed to delete it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub receipt: String,
    pub body: Message,
}

/// The operations a remote store must offer.
#[async_trait]
pub trait RemoteBackend: Send + Sync + 'static {
    async fn send(&self, body: &Message) -> Result<()>;

    /// Returns up to `max` messages. An empty batch means nothing arrived
    /// within the backend's own wait period; the queue backs off before
    /// asking again.
    async fn receive_batch(&self, max: usize) -> Result<Vec<Delivery>>;

    async fn delete_batch(&self, receipts: Vec<String>) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub queue_url: String,
    pub batch_size: usize,
}

impl RemoteConfig {
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Reads `TUBEQ_QUEUE_URL` (required) and `TUBEQ_REMOTE_BATCH`.
    pub fn from_env() -> Result<Self> {
        let queue_url = std::env::var("TUBEQ_QUEUE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .ok_or(Error::ConfigurationMissing("TUBEQ_QUEUE_URL"))?;
        let batch_size = config::parse_env("TUBEQ_REMOTE_BATCH", DEFAULT_BATCH_SIZE)?;
        Ok(Self {
            queue_url,
            batch_size: batch_size.max(1),
        })
    }
}

pub struct RemoteQueue<B: RemoteBackend> {
    backend: Arc<B>,
    batch_size: usize,
    pending: Mutex<VecDeque<Message>>,
    buffered: AtomicUsize,
}

impl<B: RemoteBackend> RemoteQueue<B> {
    pub fn new(backend: B, batch_size: usize) -> Self {
        Self {
            backend: Arc::new(backend),
            batch_size: batch_size.max(1),
            pending: Mutex::new(VecDeque::new()),
            buffered: AtomicUsize::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn delete_in_background(&self, receipts: Vec<String>) {
        let backend = self.backend.clone();
        tokio::spawn(async move {
            let count = receipts.len();
            if let Err(e) = backend.delete_batch(receipts).await {
                tracing::warn!("failed to delete {} delivered message(s): {}", count, e);
            }
        });
    }
}

#[async_trait]
impl<B: RemoteBackend> Queue for RemoteQueue<B> {
    async fn enqueue(&self, messages: Vec<Message>) -> Result<()> {
        for message in messages.iter().filter(|m| !m.is_empty()) {
            self.backend.send(message).await?;
        }
        Ok(())
    }

    async fn dequeue(&self) -> Result<Message> {
        // holding the lock across the refill keeps consumers in arrival order
        let mut pending = self.pending.lock().await;
        let mut backoff = EMPTY_POLL_BACKOFF;
        loop {
            if let Some(message) = pending.pop_front() {
                self.buffered.fetch_sub(1, Ordering::SeqCst);
                return Ok(message);
            }

            let batch = self.backend.receive_batch(self.batch_size).await?;
            if batch.is_empty() {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_EMPTY_POLL_BACKOFF);
                continue;
            }
            tracing::debug!("received batch of {} message(s)", batch.len());

            let mut receipts = Vec::with_capacity(batch.len());
            for delivery in batch {
                receipts.push(delivery.receipt);
                pending.push_back(delivery.body);
            }
            self.buffered.fetch_add(receipts.len(), Ordering::SeqCst);
            self.delete_in_background(receipts);
        }
    }

    fn size(&self) -> usize {
        self.buffered.load(Ordering::SeqCst)
    }
}

/// Relays to an upstream tubeq broker over the wire protocol.
///
/// Publishing and receiving use separate connections so that a receive
/// waiting on an empty upstream does not hold up sends.
pub struct BrokerBackend {
    publisher: Mutex<Client>,
    consumer: Mutex<Client>,
    received: AtomicU64,
}

impl BrokerBackend {
    pub async fn connect(addr: &str) -> Result<Self> {
        let publisher = Client::connect(addr).await.map_err(unavailable)?;
        let consumer = Client::connect(addr).await.map_err(unavailable)?;
        tracing::info!("relaying to upstream broker at {}", addr);
        Ok(Self {
            publisher: Mutex::new(publisher),
            consumer: Mutex::new(consumer),
            received: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl RemoteBackend for BrokerBackend {
    async fn send(&self, body: &Message) -> Result<()> {
        self.publisher
            .lock()
            .await
            .publish(body.as_bytes())
            .await
            .map_err(unavailable)
    }

    async fn receive_batch(&self, _max: usize) -> Result<Vec<Delivery>> {
        // the upstream protocol hands out one message per request
        let body = self
            .consumer
            .lock()
            .await
            .receive()
            .await
            .map_err(unavailable)?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        let id = self.received.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Delivery {
            receipt: id.to_string(),
            body,
        }])
    }

    async fn delete_batch(&self, _receipts: Vec<String>) -> Result<()> {
        // the upstream drops a message as soon as it replies with it
        Ok(())
    }
}

fn unavailable(e: Error) -> Error {
    match e {
        Error::BackendUnavailable(_) => e,
        other => Error::BackendUnavailable(other.to_string()),
    }
}
