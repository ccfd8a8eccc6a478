//! Friend and group notification jobs.

use quikchat_core::types::{GroupId, UserId};

/// A domain action whose participants should hear about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// `from` sent `to` a friend request.
    FriendRequestReceived { from: UserId, to: UserId },
    /// `by` accepted the request `requester` sent.
    FriendRequestAccepted { by: UserId, requester: UserId },
    /// `by` rejected the request `requester` sent.
    FriendRequestRejected { by: UserId, requester: UserId },
    /// `by` removed `friend` from their friends.
    Unfriended { by: UserId, friend: UserId },
    /// `adder` added `member` to `group`.
    AddedToGroup {
        group: GroupId,
        member: UserId,
        adder: UserId,
    },
    /// `remover` removed `member` from `group`.
    RemovedFromGroup {
        group: GroupId,
        member: UserId,
        remover: UserId,
    },
    /// `user` joined `group` on their own.
    UserJoinedGroup { group: GroupId, user: UserId },
    /// `user` left `group` on their own.
    UserLeftGroup { group: GroupId, user: UserId },
}
