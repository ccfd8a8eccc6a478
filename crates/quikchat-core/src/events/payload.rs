//! Typed event payloads.
//!
//! [`EventPayload`] is adjacently tagged, so each variant serializes as
//! `{"type": "<tag>", "payload": {...}}` and the payload schema is fixed
//! per type at compile time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kind::EventKind;
use crate::error::AppError;
use crate::result::AppResult;
use crate::types::{GroupId, MessageId, UserId, UserProfile};

/// One variant per [`EventKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EventPayload {
    /// A chat message.
    MessageSent(ChatMessage),
    /// Sender-side acknowledgement.
    MessageAck(MessageAck),
    /// Profile of the user who sent the request.
    FriendRequestReceived(UserProfile),
    /// Profile of the user who accepted.
    FriendRequestAccepted(UserProfile),
    /// Username of the user who rejected.
    FriendRequestRejected(UsernameNotice),
    /// Username of the user who unfriended.
    Unfriended(UsernameNotice),
    /// Group membership notice.
    AddedToGroup(GroupNotice),
    /// Group membership notice.
    RemovedFromGroup(GroupNotice),
    /// Group membership notice.
    UserJoinedGroup(GroupNotice),
    /// Group membership notice.
    UserLeftGroup(GroupNotice),
}

/// Body of a `message_sent` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message ID, shared by every recipient's copy.
    pub id: MessageId,
    /// Trimmed content.
    pub content: String,
    /// Author.
    pub sender_id: UserId,
    /// Conversation target as addressed by the sender: a user or a group.
    pub recipient_id: Uuid,
    /// When the hub accepted the message.
    pub timestamp: DateTime<Utc>,
}

/// Body of a `message_ack` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAck {
    /// The acknowledged message.
    pub message_id: MessageId,
    /// Recipients whose copy could not be stored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_recipients: Vec<UserId>,
}

/// Body carrying only the acting user's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameNotice {
    /// Username of the acting user.
    pub username: String,
}

/// Body of the group membership notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNotice {
    /// Affected group.
    pub group_id: GroupId,
    /// Group display name at the time of the change.
    pub group_name: String,
    /// Member who joined or left; absent when the recipient is the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Member who added the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adder_id: Option<UserId>,
    /// Member who removed the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remover_id: Option<UserId>,
}

impl EventPayload {
    /// The type tag for this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessageSent(_) => EventKind::MessageSent,
            Self::MessageAck(_) => EventKind::MessageAck,
            Self::FriendRequestReceived(_) => EventKind::FriendRequestReceived,
            Self::FriendRequestAccepted(_) => EventKind::FriendRequestAccepted,
            Self::FriendRequestRejected(_) => EventKind::FriendRequestRejected,
            Self::Unfriended(_) => EventKind::Unfriended,
            Self::AddedToGroup(_) => EventKind::AddedToGroup,
            Self::RemovedFromGroup(_) => EventKind::RemovedFromGroup,
            Self::UserJoinedGroup(_) => EventKind::UserJoinedGroup,
            Self::UserLeftGroup(_) => EventKind::UserLeftGroup,
        }
    }

    /// The untagged body, as stored in the `payload` column.
    pub fn body(&self) -> AppResult<serde_json::Value> {
        let mut tagged = serde_json::to_value(self)?;
        tagged
            .get_mut("payload")
            .map(serde_json::Value::take)
            .ok_or_else(|| AppError::serialization("Tagged payload has no body"))
    }

    /// Reassemble a payload from its stored tag and body.
    pub fn from_parts(kind: &str, body: serde_json::Value) -> AppResult<Self> {
        let kind: EventKind = kind.parse()?;
        let tagged = serde_json::json!({ "type": kind.as_str(), "payload": body });
        Ok(serde_json::from_value(tagged)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_strips_tag() {
        let payload = EventPayload::Unfriended(UsernameNotice {
            username: "alice".to_string(),
        });
        let body = payload.body().expect("body");
        assert_eq!(body, serde_json::json!({ "username": "alice" }));
        let rebuilt = EventPayload::from_parts("unfriended", body).expect("rebuild");
        assert_eq!(rebuilt, payload);
    }

    #[test]
    fn test_group_notice_skips_absent_actors() {
        let notice = GroupNotice {
            group_id: GroupId::new(),
            group_name: "Rustaceans".to_string(),
            user_id: None,
            adder_id: None,
            remover_id: Some(UserId::new()),
        };
        let body = EventPayload::RemovedFromGroup(notice).body().expect("body");
        assert!(body.get("userId").is_none());
        assert!(body.get("adderId").is_none());
        assert!(body.get("removerId").is_some());
        assert_eq!(body["groupName"], "Rustaceans");
    }

    #[test]
    fn test_friend_request_carries_profile() {
        let profile = UserProfile {
            id: UserId::new(),
            username: "bob".to_string(),
            profile_pic_url: "/uploads/bob.png".to_string(),
        };
        let body = EventPayload::FriendRequestReceived(profile)
            .body()
            .expect("body");
        assert_eq!(body["username"], "bob");
        assert_eq!(body["profilePicUrl"], "/uploads/bob.png");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = EventPayload::from_parts("nope", serde_json::json!({})).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
    }
}
