use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use super::message::Message;
use super::Queue;
use crate::error::{Error, Result};

/// Bounded in-process queue. Producers wait while it is full.
///
/// A batch is sent while holding the producer lock, so it stays contiguous
/// even when it has to wait for consumers to free up slots.
pub struct ChannelQueue {
    tx: mpsc::Sender<Message>,
    rx: Mutex<mpsc::Receiver<Message>>,
    producer: Mutex<()>,
}

impl ChannelQueue {
    /// Creates a queue holding at most `capacity` messages (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
            producer: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

#[async_trait]
impl Queue for ChannelQueue {
    async fn enqueue(&self, messages: Vec<Message>) -> Result<()> {
        let _producer = self.producer.lock().await;
        for message in messages {
            self.tx.send(message).await.map_err(|_| Error::QueueClosed)?;
        }
        Ok(())
    }

    async fn dequeue(&self) -> Result<Message> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(Error::QueueClosed)
    }

    fn size(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}
