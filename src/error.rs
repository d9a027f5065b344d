// Error types for the directory client and the metrics stream

use thiserror::Error;

/// Directory fetch failure. The caller shows "no data" plus the diagnostic; there is no retry.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network response was not ok: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Invalid directory payload: {0}")]
    Decode(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Request failed: {0}")]
    Request(String),
}

/// A single stream message that could not be decoded as a batch of snapshots.
#[derive(Error, Debug)]
#[error("Error parsing metrics message: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Transport-level failure; resolves the connection to DISCONNECTED.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("connection died")]
    ConnectionDied,

    #[error("close handshake timed out after {0} ms")]
    CloseTimeout(u64),
}
