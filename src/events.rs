/// file: src/events.rs
/// description: ordered event queue feeding a single channel's event loop
use crate::{error::ChannelError, intent::SubscriptionIntent};
use std::fmt;
use tokio::sync::mpsc;

/// Tags every connection handle a channel creates. Events carrying a handle id
/// that is no longer current come from a released handle and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Closed { reason: String },
    Error(String),
}

impl TransportEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::Opened => "opened",
            TransportEvent::Message(_) => "message",
            TransportEvent::Closed { .. } => "closed",
            TransportEvent::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCommand {
    Open,
    SetIntent(SubscriptionIntent),
    Shutdown,
}

#[derive(Debug)]
pub enum ChannelEvent {
    Command(ChannelCommand),
    Transport {
        handle: HandleId,
        event: TransportEvent,
    },
    Credential {
        handle: HandleId,
        result: Result<String, ChannelError>,
    },
    RetryDue(TimerId),
}

// Unbounded so transports, timers and command callers can post without awaiting.
// Producers are bounded in practice: one live socket and at most one timer.
pub type EventSender = mpsc::UnboundedSender<ChannelEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ChannelEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Posting side given to a transport for one handle.
#[derive(Debug, Clone)]
pub struct TransportEvents {
    handle: HandleId,
    sender: EventSender,
}

impl TransportEvents {
    pub fn new(handle: HandleId, sender: EventSender) -> Self {
        Self { handle, sender }
    }

    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn opened(&self) -> bool {
        self.post(TransportEvent::Opened)
    }

    pub fn message(&self, text: impl Into<String>) -> bool {
        self.post(TransportEvent::Message(text.into()))
    }

    pub fn closed(&self, reason: impl Into<String>) -> bool {
        self.post(TransportEvent::Closed {
            reason: reason.into(),
        })
    }

    pub fn error(&self, error: impl fmt::Display) -> bool {
        self.post(TransportEvent::Error(error.to_string()))
    }

    /// Returns false once the owning channel has stopped.
    pub fn post(&self, event: TransportEvent) -> bool {
        self.sender
            .send(ChannelEvent::Transport {
                handle: self.handle,
                event,
            })
            .is_ok()
    }
}
