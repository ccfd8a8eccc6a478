//! Inbound frame routing.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use quikchat_core::events::{ChatMessage, Event, EventPayload, MessageAck};
use quikchat_core::types::{EventId, MessageId, UserId};

use crate::connection::ClientHandle;
use crate::message::{InboundMessage, SendMessage};

use super::Hub;

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A chat message was fanned out and acknowledged to the sender.
    Sent {
        /// Shared ID of the message across recipients.
        message_id: MessageId,
        /// Recipients whose event was stored.
        stored: usize,
        /// Recipients whose event could not be stored.
        failed: Vec<UserId>,
    },
    /// A delivery confirmation was applied.
    Acknowledged {
        /// The confirmed event.
        event_id: EventId,
        /// Whether anything was still stored for it.
        removed: bool,
    },
    /// The frame was dropped.
    Rejected(RejectReason),
    /// The frame type is not handled here.
    Ignored,
}

/// Why a frame was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not a valid envelope, or the body does not match its type.
    Malformed,
    /// Content empty after trimming, or too long.
    InvalidContent,
    /// The target could not be resolved.
    UnresolvedRecipient,
    /// The sender does not belong to the target group.
    NotGroupMember,
    /// Storage refused the acknowledgement.
    StorageUnavailable,
}

impl Hub {
    /// Handle one inbound text frame from `sender`.
    ///
    /// Never fails the connection: bad input is logged and dropped.
    pub async fn dispatch(&self, sender: &ClientHandle, raw: &str) -> DispatchOutcome {
        self.metrics.frame_received();

        let message = match InboundMessage::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                debug!(conn_id = %sender.id, error = %e, "Dropping malformed frame");
                return self.reject(RejectReason::Malformed);
            }
        };

        match message {
            InboundMessage::MessageSent(msg) => self.send_message(sender, msg).await,
            InboundMessage::EventAck(ack) => {
                match self.events.acknowledge(sender.user_id, ack.event_id).await {
                    Ok(removed) => DispatchOutcome::Acknowledged {
                        event_id: ack.event_id,
                        removed,
                    },
                    Err(e) => {
                        warn!(event_id = %ack.event_id, error = %e, "Acknowledgement failed");
                        self.reject(RejectReason::StorageUnavailable)
                    }
                }
            }
            InboundMessage::Unknown { kind } => {
                debug!(conn_id = %sender.id, frame_type = %kind, "Ignoring unknown frame type");
                DispatchOutcome::Ignored
            }
        }
    }

    fn reject(&self, reason: RejectReason) -> DispatchOutcome {
        self.metrics.frame_rejected();
        DispatchOutcome::Rejected(reason)
    }

    /// Persist one event per resolved recipient, deliver each, then ack the
    /// sender.
    async fn send_message(&self, sender: &ClientHandle, msg: SendMessage) -> DispatchOutcome {
        let content = msg.content.trim();
        let length = content.chars().count();
        if length == 0 || length > self.max_content_length {
            debug!(
                conn_id = %sender.id,
                length = length,
                max = self.max_content_length,
                "Dropping message with invalid content length"
            );
            return self.reject(RejectReason::InvalidContent);
        }

        let recipient = match self.groups.resolve(msg.recipient_id).await {
            Ok(recipient) => recipient,
            Err(e) => {
                warn!(
                    conn_id = %sender.id,
                    target = %msg.recipient_id,
                    error = %e,
                    "Failed to resolve message target"
                );
                return self.reject(RejectReason::UnresolvedRecipient);
            }
        };

        if !recipient.accepts_from(sender.user_id) {
            warn!(
                conn_id = %sender.id,
                user_id = %sender.user_id,
                target = %msg.recipient_id,
                "Dropping message to a group the sender is not a member of"
            );
            return self.reject(RejectReason::NotGroupMember);
        }

        let message_id = MessageId::new();
        let timestamp = Utc::now();
        let recipients = recipient.fan_out(sender.user_id);
        let mut failed = Vec::new();

        for user in &recipients {
            let event = Event::new(
                *user,
                Some(sender.user_id),
                EventPayload::MessageSent(ChatMessage {
                    id: message_id,
                    content: content.to_string(),
                    sender_id: sender.user_id,
                    recipient_id: msg.recipient_id,
                    timestamp,
                }),
            );

            match self.events.store(&event).await {
                Ok(location) => self.metrics.event_stored(location),
                Err(e) => {
                    error!(
                        event_id = %event.id,
                        user_id = %user,
                        error = %e,
                        "Failed to store message event, skipping recipient"
                    );
                    failed.push(*user);
                    continue;
                }
            }
            self.deliver(&event).await;
        }

        let ack = Event::new(
            sender.user_id,
            None,
            EventPayload::MessageAck(MessageAck {
                message_id,
                failed_recipients: failed.clone(),
            }),
        );
        self.deliver(&ack).await;

        info!(
            conn_id = %sender.id,
            message_id = %message_id,
            recipients = recipients.len(),
            failed = failed.len(),
            "Message dispatched"
        );

        DispatchOutcome::Sent {
            message_id,
            stored: recipients.len() - failed.len(),
            failed,
        }
    }
}
