// tubeq - minimal length-prefixed message queue broker
//
// This library provides the queue engines and the wire protocol.
// Binary entry points are src/main.rs and src/bin/receive.rs

pub mod config;
pub mod error;
pub mod queue;
pub mod wire;

pub use config::{Backend, Config};
pub use error::{Error, Result};
pub use queue::{ChannelQueue, MemoryQueue, Message, Queue, QueueStats, RemoteQueue};
pub use wire::{Client, Server, ServerConfig, Worker};
