//! Conversation addressing.

use serde::{Deserialize, Serialize};

use super::id::{GroupId, UserId};

/// Group projection used for membership notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Group ID.
    pub id: GroupId,
    /// Unique handle.
    pub handle: String,
    /// Display name.
    pub name: String,
    /// Owner of the group.
    pub owner_id: UserId,
}

/// A resolved conversation target.
///
/// A raw target ID names a group when the group directory knows it and a
/// user otherwise, so resolution is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Direct message to one user.
    User(UserId),
    /// Group message; `members` is the current member list.
    Group {
        /// The group.
        group: GroupSummary,
        /// Current members, including the sender if they belong.
        members: Vec<UserId>,
    },
}

impl Recipient {
    /// Whether `sender` may post here. Groups only take messages from
    /// their members.
    pub fn accepts_from(&self, sender: UserId) -> bool {
        match self {
            Self::User(_) => true,
            Self::Group { members, .. } => members.contains(&sender),
        }
    }

    /// Users that should receive an event, excluding `sender`.
    ///
    /// Group membership is deduplicated while keeping directory order. A
    /// direct message to oneself has no recipients.
    pub fn fan_out(&self, sender: UserId) -> Vec<UserId> {
        match self {
            Self::User(id) if *id == sender => Vec::new(),
            Self::User(id) => vec![*id],
            Self::Group { members, .. } => {
                let mut seen = std::collections::HashSet::with_capacity(members.len());
                members
                    .iter()
                    .copied()
                    .filter(|m| *m != sender && seen.insert(*m))
                    .collect()
            }
        }
    }
}
