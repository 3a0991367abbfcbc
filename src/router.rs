/// file: src/router.rs
/// description: inbound frame parsing and type-tag dispatch
use crate::{client_state::TerminalFailure, error::ChannelError, sink::EventType};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    AuthSuccess,
    CryptoData,
    MarketData,
    Alerts,
    Error,
}

impl FrameKind {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "AUTH_SUCCESS" => Some(FrameKind::AuthSuccess),
            "CRYPTO_DATA" => Some(FrameKind::CryptoData),
            "MARKET_DATA" => Some(FrameKind::MarketData),
            "ALERTS" => Some(FrameKind::Alerts),
            "ERROR" => Some(FrameKind::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::AuthSuccess => "AUTH_SUCCESS",
            FrameKind::CryptoData => "CRYPTO_DATA",
            FrameKind::MarketData => "MARKET_DATA",
            FrameKind::Alerts => "ALERTS",
            FrameKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed frame: its tag plus the remaining top-level fields.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub kind: FrameKind,
    pub body: Map<String, Value>,
}

impl InboundFrame {
    /// Decodes one top-level field of the frame body.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T, ChannelError> {
        let value = self
            .body
            .get(name)
            .cloned()
            .ok_or_else(|| ChannelError::MalformedFrame {
                reason: format!("{} frame is missing `{}`", self.kind, name),
            })?;
        serde_json::from_value(value).map_err(|e| ChannelError::MalformedFrame {
            reason: format!("{} frame has invalid `{}`: {}", self.kind, name, e),
        })
    }
}

pub fn parse_frame(text: &str) -> Result<InboundFrame, ChannelError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ChannelError::MalformedFrame {
        reason: e.to_string(),
    })?;

    let Value::Object(mut body) = value else {
        return Err(ChannelError::MalformedFrame {
            reason: "frame is not a JSON object".into(),
        });
    };

    let tag = match body.remove("type") {
        Some(Value::String(tag)) => tag,
        Some(other) => return Err(ChannelError::UnknownFrameType(other.to_string())),
        None => return Err(ChannelError::UnknownFrameType("<missing>".into())),
    };

    let kind = FrameKind::parse(&tag).ok_or(ChannelError::UnknownFrameType(tag))?;
    Ok(InboundFrame { kind, body })
}

/// What the event loop should do with a successfully parsed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Handshake,
    Feed(InboundFrame),
    ServerError(String),
}

pub fn route(frame: InboundFrame) -> Dispatch {
    match frame.kind {
        FrameKind::AuthSuccess => Dispatch::Handshake,
        FrameKind::Error => {
            let message = frame
                .body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified server error")
                .to_string();
            Dispatch::ServerError(message)
        }
        _ => Dispatch::Feed(frame),
    }
}

/// Telemetry classification of a routing failure.
pub fn event_type_for(error: &ChannelError) -> EventType {
    match error {
        ChannelError::MalformedFrame { .. } | ChannelError::SerdeError(_) => {
            EventType::MessageParse
        }
        ChannelError::ServerError(_) => EventType::ServerError,
        ChannelError::Notification(_) => EventType::AlertsToast,
        _ => EventType::UnknownMessage,
    }
}

/// Per-feed view-state updates and side effects. Called from the channel's
/// event loop only, so implementations never run concurrently with themselves.
pub trait FrameHandler: Send + 'static {
    fn handle(&mut self, frame: InboundFrame) -> Result<(), ChannelError>;

    fn on_terminal(&mut self, _failure: TerminalFailure) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_tags_are_routed() {
        let frame = parse_frame(r#"{"type":"AUTH_SUCCESS"}"#).unwrap();
        assert_eq!(route(frame), Dispatch::Handshake);

        let frame = parse_frame(r#"{"type":"MARKET_DATA","data":{"totalCoins":5}}"#).unwrap();
        assert_eq!(frame.kind, FrameKind::MarketData);
        assert!(matches!(route(frame), Dispatch::Feed(_)));
    }

    #[test]
    fn server_error_frames_carry_message() {
        let frame = parse_frame(r#"{"type":"ERROR","message":"Invalid subscription request"}"#)
            .unwrap();
        assert_eq!(
            route(frame),
            Dispatch::ServerError("Invalid subscription request".into())
        );
    }

    #[test]
    fn unparsable_and_unknown_frames_are_errors() {
        let err = parse_frame("{not json").unwrap_err();
        assert!(matches!(err, ChannelError::MalformedFrame { .. }));
        assert_eq!(event_type_for(&err), EventType::MessageParse);

        let err = parse_frame("[1,2,3]").unwrap_err();
        assert!(matches!(err, ChannelError::MalformedFrame { .. }));

        let err = parse_frame(r#"{"type":"PRICE_TICK"}"#).unwrap_err();
        assert!(matches!(err, ChannelError::UnknownFrameType(ref t) if t == "PRICE_TICK"));
        assert_eq!(event_type_for(&err), EventType::UnknownMessage);

        let err = parse_frame(r#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, ChannelError::UnknownFrameType(_)));
    }

    #[test]
    fn field_reports_missing_payload() {
        let frame = parse_frame(r#"{"type":"CRYPTO_DATA"}"#).unwrap();
        let err = frame.field::<Value>("cryptoData").unwrap_err();
        assert!(matches!(err, ChannelError::MalformedFrame { .. }));
    }
}
