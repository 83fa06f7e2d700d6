use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

use super::worker::Worker;
use crate::error::{Error, Result};
use crate::queue::Queue;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7878,
        }
    }
}

/// Source of incoming connections for a [`Server`].
#[async_trait]
pub trait Listener: Send + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn accept(&mut self) -> std::io::Result<(Self::Stream, SocketAddr)>;
}

#[async_trait]
impl Listener for TcpListener {
    type Stream = TcpStream;

    async fn accept(&mut self) -> std::io::Result<(TcpStream, SocketAddr)> {
        let (socket, peer_addr) = TcpListener::accept(self).await?;
        if let Err(e) = socket.set_nodelay(true) {
            tracing::debug!("set_nodelay failed for {}: {}", peer_addr, e);
        }
        Ok((socket, peer_addr))
    }
}

/// Connection front end. Every connection gets its own worker task, all
/// sharing the one queue the server was built with.
pub struct Server<L = TcpListener> {
    listener: L,
    queue: Arc<dyn Queue>,
}

impl Server<TcpListener> {
    pub async fn bind(config: &ServerConfig, queue: Arc<dyn Queue>) -> Result<Self> {
        let addr = config.addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("tubeq listening on {}", listener.local_addr()?);
        Ok(Self::new(listener, queue))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Binds and serves until accepting fails.
    pub async fn run(config: &ServerConfig, queue: Arc<dyn Queue>) -> Result<()> {
        Self::bind(config, queue).await?.serve().await
    }
}

impl<L: Listener> Server<L> {
    pub fn new(listener: L, queue: Arc<dyn Queue>) -> Self {
        Self { listener, queue }
    }

    /// Accepts connections until `accept` fails, which is reported as
    /// [`Error::ServerClosed`]. Connections already accepted keep running.
    pub async fn serve(mut self) -> Result<()> {
        loop {
            let (socket, peer_addr) = self.listener.accept().await.map_err(|e| {
                tracing::error!("accept failed: {}", e);
                Error::ServerClosed(e)
            })?;
            tracing::info!("New connection from {}", peer_addr);

            let queue = self.queue.clone();
            tokio::spawn(async move {
                handle_connection(socket, peer_addr, queue).await;
            });
        }
    }
}

async fn handle_connection<S>(socket: S, peer_addr: SocketAddr, queue: Arc<dyn Queue>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut worker = Worker::new(socket, queue);
    match worker.run().await {
        Ok(()) => tracing::info!("{} disconnected", peer_addr),
        Err(e) => tracing::error!("Connection error from {}: {}", peer_addr, e),
    }
}
