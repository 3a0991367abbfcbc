use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("WebSocket connection error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Connection timeout after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Access token unavailable: {0}")]
    CredentialUnavailable(String),

    #[error("Malformed frame: {reason}")]
    MalformedFrame { reason: String },

    #[error("Unknown WebSocket message type: {0}")]
    UnknownFrameType(String),

    #[error("Unexpected {kind} frame on {channel} channel")]
    UnexpectedFrame { kind: String, channel: String },

    #[error("Server reported an error: {0}")]
    ServerError(String),

    #[error("Unauthorized WebSocket closure")]
    Unauthorized,

    #[error("Max reconnect attempts reached ({attempts})")]
    MaxReconnectsExceeded { attempts: u32 },

    #[error("Channel is not connected")]
    NotConnected,

    #[error("Channel task has stopped")]
    ChannelStopped,

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Metrics server error: {0}")]
    MetricsError(String),
}

impl ChannelError {
    /// Terminal failures end the channel; everything else is recovered locally.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChannelError::Unauthorized | ChannelError::MaxReconnectsExceeded { .. }
        )
    }
}

pub type Result<T, E = ChannelError> = std::result::Result<T, E>;
