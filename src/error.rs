//! Error types shared by the queue engines and the wire protocol.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on a connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream closed before a whole frame was read.
    #[error("stream closed mid-frame")]
    TruncatedFrame,

    /// A buffered record declares more bytes than the buffer holds.
    #[error("corrupt frame: declared {declared} bytes, {available} available")]
    CorruptFrame { declared: usize, available: usize },

    /// Payload does not fit in a 4-byte length prefix.
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// A remote backend call failed.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A required configuration value is absent.
    #[error("missing required configuration: {0}")]
    ConfigurationMissing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidConfiguration { key: &'static str, value: String },

    #[error("queue closed")]
    QueueClosed,

    /// The accept loop stopped.
    #[error("server closed: {0}")]
    ServerClosed(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
