/// file: src/sink.rs
/// description: structured failure reports forwarded to an error-telemetry collaborator
use crate::{client_state::ConnectionState, error::ChannelError, monitoring};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::error;

pub const MAX_REPORTED_PAYLOAD_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    AuthRequest,
    MessageParse,
    UnknownMessage,
    ServerError,
    AlertsToast,
    WsError,
    WsClose,
    WsReconnectFail,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::AuthRequest => "AUTH_REQUEST",
            EventType::MessageParse => "MESSAGE_PARSE",
            EventType::UnknownMessage => "UNKNOWN_MESSAGE",
            EventType::ServerError => "SERVER_ERROR",
            EventType::AlertsToast => "ALERTS_TOAST",
            EventType::WsError => "WS_ERROR",
            EventType::WsClose => "WS_CLOSE",
            EventType::WsReconnectFail => "WS_RECONNECT_FAIL",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    pub channel: String,
    pub endpoint: String,
    pub state: ConnectionState,
    pub is_usable: bool,
    pub event_type: EventType,
    pub message_data: Option<String>,
    pub reason: Option<String>,
    pub retry_count: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorContext {
    pub fn new(
        channel: impl Into<String>,
        endpoint: impl Into<String>,
        state: ConnectionState,
        event_type: EventType,
    ) -> Self {
        Self {
            channel: channel.into(),
            endpoint: endpoint.into(),
            state,
            is_usable: state == ConnectionState::Subscribed,
            event_type,
            message_data: None,
            reason: None,
            retry_count: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message_data(mut self, raw: &str) -> Self {
        self.message_data = Some(truncate_payload(raw));
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }
}

/// Cuts a raw payload down to `MAX_REPORTED_PAYLOAD_CHARS` characters.
pub fn truncate_payload(raw: &str) -> String {
    match raw.char_indices().nth(MAX_REPORTED_PAYLOAD_CHARS) {
        Some((cut, _)) => raw[..cut].to_string(),
        None => raw.to_string(),
    }
}

/// Receives every failure a channel captures. Implementations must not block.
pub trait ErrorSink: Send + Sync {
    fn capture(&self, error: &ChannelError, context: ErrorContext);
}

/// Default sink: one structured `tracing` event plus an error counter per report.
#[derive(Debug, Default, Clone)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn capture(&self, err: &ChannelError, context: ErrorContext) {
        monitoring::record_channel_error(&context.channel, context.event_type);

        error!(
            channel = %context.channel,
            endpoint = %context.endpoint,
            state = %context.state,
            is_usable = context.is_usable,
            event_type = %context.event_type,
            message_data = context.message_data.as_deref().unwrap_or_default(),
            reason = context.reason.as_deref().unwrap_or_default(),
            retry_count = context.retry_count,
            timestamp = %context.timestamp.to_rfc3339(),
            "channel failure captured: {}",
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_truncated_on_char_boundary() {
        let raw = "é".repeat(600);
        let truncated = truncate_payload(&raw);
        assert_eq!(truncated.chars().count(), MAX_REPORTED_PAYLOAD_CHARS);

        assert_eq!(truncate_payload("short"), "short");
    }

    #[test]
    fn context_records_usability_from_state() {
        let ctx = ErrorContext::new(
            "homepage",
            "ws://localhost/homepage",
            ConnectionState::Subscribed,
            EventType::MessageParse,
        )
        .with_message_data("{not json")
        .with_retry_count(2);

        assert!(ctx.is_usable);
        assert_eq!(ctx.message_data.as_deref(), Some("{not json"));
        assert_eq!(ctx.retry_count, Some(2));
        assert_eq!(ctx.event_type.to_string(), "MESSAGE_PARSE");
    }
}
