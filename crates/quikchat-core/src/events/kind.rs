//! Event type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Every event type the delivery core knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A chat message, one per recipient.
    MessageSent,
    /// Confirmation to the sender that a message was processed.
    MessageAck,
    /// Someone sent the recipient a friend request.
    FriendRequestReceived,
    /// The recipient's friend request was accepted.
    FriendRequestAccepted,
    /// The recipient's friend request was rejected.
    FriendRequestRejected,
    /// The recipient was removed from someone's friends.
    Unfriended,
    /// The recipient was added to a group.
    AddedToGroup,
    /// The recipient was removed from a group.
    RemovedFromGroup,
    /// Another user joined one of the recipient's groups.
    UserJoinedGroup,
    /// Another user left one of the recipient's groups.
    UserLeftGroup,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 10] = [
        Self::MessageSent,
        Self::MessageAck,
        Self::FriendRequestReceived,
        Self::FriendRequestAccepted,
        Self::FriendRequestRejected,
        Self::Unfriended,
        Self::AddedToGroup,
        Self::RemovedFromGroup,
        Self::UserJoinedGroup,
        Self::UserLeftGroup,
    ];

    /// The wire and storage tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageSent => "message_sent",
            Self::MessageAck => "message_ack",
            Self::FriendRequestReceived => "friend_request_received",
            Self::FriendRequestAccepted => "friend_request_accepted",
            Self::FriendRequestRejected => "friend_request_rejected",
            Self::Unfriended => "unfriended",
            Self::AddedToGroup => "added_to_group",
            Self::RemovedFromGroup => "removed_from_group",
            Self::UserJoinedGroup => "user_joined_group",
            Self::UserLeftGroup => "user_left_group",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown event type: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_match_serde() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<EventKind>().expect("parse"), kind);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!("typing_started".parse::<EventKind>().is_err());
    }
}
