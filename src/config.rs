//! Environment-driven startup configuration.

use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::queue::{BrokerBackend, ChannelQueue, MemoryQueue, Queue, RemoteConfig, RemoteQueue};
use crate::wire::ServerConfig;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Which queue engine backs the server.
#[derive(Debug, Clone)]
pub enum Backend {
    Memory,
    Channel { capacity: usize },
    Remote(RemoteConfig),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: Backend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: std::env::var("TUBEQ_HOST").unwrap_or(defaults.host),
            port: parse_env("TUBEQ_PORT", defaults.port)?,
        };

        let kind = std::env::var("TUBEQ_BACKEND").unwrap_or_else(|_| "memory".to_string());
        let backend = match kind.to_ascii_lowercase().as_str() {
            "memory" => Backend::Memory,
            "channel" => Backend::Channel {
                capacity: parse_env("TUBEQ_CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY)?,
            },
            "remote" => Backend::Remote(RemoteConfig::from_env()?),
            _ => {
                return Err(Error::InvalidConfiguration {
                    key: "TUBEQ_BACKEND",
                    value: kind,
                })
            }
        };

        Ok(Self { server, backend })
    }

    /// Constructs the configured queue engine.
    pub async fn build_queue(&self) -> Result<Arc<dyn Queue>> {
        let queue: Arc<dyn Queue> = match &self.backend {
            Backend::Memory => Arc::new(MemoryQueue::new()),
            Backend::Channel { capacity } => Arc::new(ChannelQueue::new(*capacity)),
            Backend::Remote(remote) => {
                let backend = BrokerBackend::connect(&remote.queue_url).await?;
                Arc::new(RemoteQueue::new(backend, remote.batch_size))
            }
        };
        tracing::info!("using {:?} backend", self.backend);
        Ok(queue)
    }
}

/// Parses `key` from the environment, falling back to `default` when unset.
pub(crate) fn parse_env<T: FromStr>(key: &'static str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| Error::InvalidConfiguration { key, value }),
        Err(_) => Ok(default),
    }
}
