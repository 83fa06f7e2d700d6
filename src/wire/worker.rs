use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::codec;
use crate::error::Result;
use crate::queue::Queue;

/// Control word that asks for the next message.
pub const RECEIVE: u32 = 0;

/// Serves the protocol on one connection.
///
/// Each exchange starts with a 4-byte control word `N`. `N == 0` requests the
/// next message, which is written back as a frame once the queue yields one.
/// `N > 0` announces an `N`-byte payload to publish. Because zero is taken,
/// an empty message cannot be published through this protocol.
pub struct Worker<S> {
    stream: S,
    queue: Arc<dyn Queue>,
}

impl<S> Worker<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, queue: Arc<dyn Queue>) -> Self {
        Self { stream, queue }
    }

    /// Handles exchanges until the peer disconnects or an error occurs.
    pub async fn run(&mut self) -> Result<()> {
        while self.step().await? {}
        tracing::debug!("Connection closed by client");
        Ok(())
    }

    /// Handles one exchange. Returns `false` on a clean disconnect.
    pub async fn step(&mut self) -> Result<bool> {
        let Some(word) = codec::read_control_word(&mut self.stream).await? else {
            return Ok(false);
        };

        match word {
            RECEIVE => self.reply().await?,
            len => self.publish(len as usize).await?,
        }
        Ok(true)
    }

    async fn publish(&mut self, len: usize) -> Result<()> {
        let message = codec::read_payload(&mut self.stream, len).await?;
        tracing::debug!("publish: {} bytes", len);
        self.queue.enqueue(vec![message]).await
    }

    async fn reply(&mut self) -> Result<()> {
        let message = self.queue.dequeue().await?;
        tracing::debug!("receive: replying with {} bytes", message.len());
        let frame = codec::encode(message.as_bytes())?;
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
