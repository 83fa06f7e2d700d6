use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use super::codec;
use super::worker::RECEIVE;
use crate::error::Result;
use crate::queue::Message;

/// Consumer/producer side of the wire protocol.
pub struct Client<S = TcpStream> {
    stream: S,
}

impl Client<TcpStream> {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Sends `payload` as one frame. No reply is expected.
    ///
    /// An empty payload encodes to a zero control word, which the server
    /// reads as a receive request rather than a publish.
    pub async fn publish(&mut self, payload: impl AsRef<[u8]>) -> Result<()> {
        let payload = payload.as_ref();
        if payload.is_empty() {
            tracing::warn!("publishing an empty message; the server will treat it as a receive");
        }
        let frame = codec::encode(payload)?;
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Requests the next message and waits for the reply.
    ///
    /// A zero-length reply comes back as an empty message.
    pub async fn receive(&mut self) -> Result<Message> {
        self.stream.write_all(&RECEIVE.to_be_bytes()).await?;
        self.stream.flush().await?;
        codec::decode(&mut self.stream).await
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
