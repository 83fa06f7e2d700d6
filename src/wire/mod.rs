// Wire protocol: framing, per-connection worker, TCP server and client

pub mod client;
pub mod codec;
pub mod server;
pub mod worker;

pub use client::Client;
pub use server::{Listener, Server, ServerConfig};
pub use worker::Worker;
