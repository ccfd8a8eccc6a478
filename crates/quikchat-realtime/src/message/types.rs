//! Inbound WebSocket message type definitions.
//!
//! Every frame is an envelope `{ "type": string, "payload": object }`.
//! Outbound frames are serialized [`Event`](quikchat_core::events::Event)s.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quikchat_core::error::AppError;
use quikchat_core::types::EventId;

/// Inbound type tag for a chat message.
pub const MESSAGE_SENT: &str = "message_sent";
/// Inbound type tag for a delivery confirmation.
pub const EVENT_ACK: &str = "event_ack";

/// Raw `{type, payload}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEnvelope {
    /// Frame type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific body.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Body of an inbound `message_sent` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    /// Message text; trimmed before validation.
    pub content: String,
    /// A user ID or a group ID.
    pub recipient_id: Uuid,
}

/// Body of an inbound `event_ack` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAck {
    /// The delivered event.
    pub event_id: EventId,
}

/// Messages sent by the client to the server.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// Send a chat message to a user or group.
    MessageSent(SendMessage),
    /// Confirm receipt of an event.
    EventAck(EventAck),
    /// A well-formed envelope with a type this server does not handle.
    Unknown {
        /// The unrecognized type tag.
        kind: String,
    },
}

impl InboundMessage {
    /// Parse a raw text frame.
    ///
    /// Invalid JSON, a missing `type`, or a body that does not match a known
    /// type is an error; an unrecognized type is [`InboundMessage::Unknown`].
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let envelope: InboundEnvelope = serde_json::from_str(raw)?;
        Ok(match envelope.kind.as_str() {
            MESSAGE_SENT => Self::MessageSent(serde_json::from_value(envelope.payload)?),
            EVENT_ACK => Self::EventAck(serde_json::from_value(envelope.payload)?),
            _ => Self::Unknown {
                kind: envelope.kind,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_sent() {
        let to = Uuid::new_v4();
        let raw = format!(r#"{{"type":"message_sent","payload":{{"content":"hi","recipientId":"{to}"}}}}"#);
        match InboundMessage::parse(&raw).unwrap() {
            InboundMessage::MessageSent(msg) => {
                assert_eq!(msg.content, "hi");
                assert_eq!(msg.recipient_id, to);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_type() {
        let parsed = InboundMessage::parse(r#"{"type":"typing","payload":{}}"#).unwrap();
        assert!(matches!(parsed, InboundMessage::Unknown { kind } if kind == "typing"));
    }

    #[test]
    fn test_parse_rejects_bad_body() {
        assert!(InboundMessage::parse(r#"{"type":"message_sent","payload":{"content":1}}"#).is_err());
        assert!(InboundMessage::parse("not json").is_err());
        assert!(InboundMessage::parse(r#"{"payload":{}}"#).is_err());
    }
}
