// Queue engines

pub mod channel;
pub mod memory;
pub mod message;
pub mod remote;

use async_trait::async_trait;

use crate::error::Result;

pub use channel::ChannelQueue;
pub use memory::{MemoryQueue, QueueStats};
pub use message::Message;
pub use remote::{BrokerBackend, Delivery, RemoteBackend, RemoteConfig, RemoteQueue};

/// A FIFO of opaque messages shared between producers and consumers.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Appends `messages` in order.
    async fn enqueue(&self, messages: Vec<Message>) -> Result<()>;

    /// Removes the oldest message, waiting until one is available.
    async fn dequeue(&self) -> Result<Message>;

    /// Number of messages currently held. Never waits.
    fn size(&self) -> usize;
}
