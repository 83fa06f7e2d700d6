use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::message::Message;
use super::Queue;
use crate::error::{Error, Result};
use crate::wire::codec;

/// In-process queue storing `[len][payload]` records in one growable buffer.
pub struct MemoryQueue {
    records: Mutex<Records>,
    notify: Notify,
    stats: QueueStats,
}

struct Records {
    buf: BytesMut,
    size: usize,
}

pub struct QueueStats {
    enqueued_total: AtomicU64,
    dequeued_total: AtomicU64,
}

impl QueueStats {
    pub fn new() -> Self {
        Self {
            enqueued_total: AtomicU64::new(0),
            dequeued_total: AtomicU64::new(0),
        }
    }

    pub fn enqueued_total(&self) -> u64 {
        self.enqueued_total.load(Ordering::SeqCst)
    }

    pub fn dequeued_total(&self) -> u64 {
        self.dequeued_total.load(Ordering::SeqCst)
    }
}

impl Default for QueueStats {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::with_records(BytesMut::new(), 0)
    }

    /// Adopts a buffer that already holds encoded records.
    ///
    /// Fails with `CorruptFrame` if the buffer ends in a partial record.
    pub fn from_buffer(buf: BytesMut) -> Result<Self> {
        let mut scan = buf.clone();
        let mut size = 0;
        while codec::take_frame(&mut scan)?.is_some() {
            size += 1;
        }
        Ok(Self::with_records(buf, size))
    }

    fn with_records(buf: BytesMut, size: usize) -> Self {
        Self {
            records: Mutex::new(Records { buf, size }),
            notify: Notify::new(),
            stats: QueueStats::new(),
        }
    }

    /// Takes the oldest message if there is one, without waiting.
    pub fn try_dequeue(&self) -> Result<Option<Message>> {
        let mut records = self.records.lock();
        if records.size == 0 {
            return Ok(None);
        }
        // size > 0 guarantees a record, so None here is treated like a short read
        let message = codec::take_frame(&mut records.buf)?.ok_or(Error::CorruptFrame {
            declared: codec::PREFIX_LEN,
            available: 0,
        })?;
        records.size -= 1;
        let remaining = records.size;
        drop(records);

        self.stats.dequeued_total.fetch_add(1, Ordering::SeqCst);
        if remaining > 0 {
            // pass the wakeup on; several enqueues may have collapsed into one permit
            self.notify.notify_one();
        }
        Ok(Some(message))
    }

    /// Bytes currently held in the backing buffer.
    pub fn buffered_len(&self) -> usize {
        self.records.lock().buf.len()
    }

    /// Copy of the backing buffer.
    pub fn snapshot(&self) -> Bytes {
        Bytes::copy_from_slice(&self.records.lock().buf)
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn enqueue(&self, messages: Vec<Message>) -> Result<()> {
        let count = messages.len();
        let mut batch = BytesMut::new();
        for message in &messages {
            codec::put_frame(&mut batch, message.as_bytes())?;
        }
        {
            let mut records = self.records.lock();
            records.buf.unsplit(batch);
            records.size += count;
        }

        self.stats
            .enqueued_total
            .fetch_add(count as u64, Ordering::SeqCst);
        for _ in 0..count {
            self.notify.notify_one();
        }
        tracing::debug!("enqueued {} message(s)", count);
        Ok(())
    }

    async fn dequeue(&self) -> Result<Message> {
        loop {
            if let Some(message) = self.try_dequeue()? {
                return Ok(message);
            }
            // A notify_one with no waiter leaves a permit, so an enqueue that
            // lands between the check above and this await is not lost.
            self.notify.notified().await;
        }
    }

    fn size(&self) -> usize {
        self.records.lock().size
    }
}
