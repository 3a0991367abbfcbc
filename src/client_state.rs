/// file: src/client_state.rs
/// description: connection state machine and the status snapshot a channel publishes to its view
use std::fmt;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Authenticating,
    Subscribed,
    Closing,
}

impl ConnectionState {
    /// A handle in one of these states must not be replaced by `open()`.
    pub fn is_open_equivalent(self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting
                | ConnectionState::Authenticating
                | ConnectionState::Subscribed
        )
    }

    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Closed, Connecting)
                | (Connecting, Authenticating)
                | (Connecting, Subscribed)
                | (Authenticating, Subscribed)
                | (Connecting | Authenticating | Subscribed, Closing)
                | (Connecting | Authenticating | Subscribed | Closing, Closed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Closed => "CLOSED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Authenticating => "AUTHENTICATING",
            ConnectionState::Subscribed => "SUBSCRIBED",
            ConnectionState::Closing => "CLOSING",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a channel gave up. Once set, the channel stays closed until it is
/// explicitly reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalFailure {
    Unauthorized,
    RetriesExhausted { attempts: u32 },
}

impl fmt::Display for TerminalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalFailure::Unauthorized => write!(f, "authentication rejected"),
            TerminalFailure::RetriesExhausted { attempts } => {
                write!(f, "offline after {} reconnect attempts", attempts)
            }
        }
    }
}

/// Snapshot published on every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStatus {
    pub channel: String,
    pub state: ConnectionState,
    pub retry_count: u32,
    pub connection_id: Option<String>,
    pub terminal: Option<TerminalFailure>,
    pub frames_received: u64,
    pub last_message_time: Option<Instant>,
}

impl ChannelStatus {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            state: ConnectionState::Closed,
            retry_count: 0,
            connection_id: None,
            terminal: None,
            frames_received: 0,
            last_message_time: None,
        }
    }

    /// Usable means the handshake completed and data frames are honored.
    pub fn is_usable(&self) -> bool {
        self.state == ConnectionState::Subscribed
    }

    pub fn is_offline(&self) -> bool {
        self.terminal.is_some()
    }

    pub fn reset_connection(&mut self) {
        self.connection_id = Some(uuid::Uuid::new_v4().to_string());
        self.retry_count = 0;
        self.terminal = None;
    }

    pub fn record_message(&mut self) {
        self.frames_received += 1;
        self.last_message_time = Some(Instant::now());
    }

    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Closed;
        self.connection_id = None;
    }
}
