// Typed errors for the channel, message decoding and device discovery

use thiserror::Error;

/// Failure to open a telemetry channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid backend base url: {0}")]
    InvalidBaseUrl(String),
    /// The server refused the WebSocket upgrade.
    #[error("HTTP {status}: traffic channel upgrade rejected")]
    Rejected { status: u16 },
    #[error("traffic channel connection failed: {0}")]
    Connect(String),
    #[error("traffic channel did not open within {0} ms")]
    Timeout(u64),
}

impl ChannelError {
    /// HTTP status of a rejected upgrade, if that is what happened.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status } => Some(*status),
            _ => None,
        }
    }
}

/// An inbound notification that could not be applied.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown message type {0:?}")]
    UnknownType(String),
    #[error("invalid data for {kind:?}: {source}")]
    InvalidData {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Device discovery request failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("device request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("device request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}
