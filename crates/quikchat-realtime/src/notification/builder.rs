//! Turns notification jobs into per-recipient events.

use std::sync::Arc;

use quikchat_core::error::AppError;
use quikchat_core::events::{Event, EventPayload, GroupNotice, UsernameNotice};
use quikchat_core::result::AppResult;
use quikchat_core::traits::{GroupDirectory, UserDirectory};
use quikchat_core::types::{GroupId, GroupSummary, UserId, UserProfile};

use super::types::Notification;

/// Resolves the names and member lists a notification needs.
#[derive(Clone)]
pub struct NotificationBuilder {
    users: Arc<dyn UserDirectory>,
    groups: Arc<dyn GroupDirectory>,
}

impl NotificationBuilder {
    /// Creates a builder over the user and group directories.
    pub fn new(users: Arc<dyn UserDirectory>, groups: Arc<dyn GroupDirectory>) -> Self {
        Self { users, groups }
    }

    /// One event per recipient of `notification`.
    pub async fn build(&self, notification: &Notification) -> AppResult<Vec<Event>> {
        match *notification {
            Notification::FriendRequestReceived { from, to } => {
                let profile = self.profile(from).await?;
                Ok(vec![Event::new(
                    to,
                    Some(from),
                    EventPayload::FriendRequestReceived(profile),
                )])
            }
            Notification::FriendRequestAccepted { by, requester } => {
                let profile = self.profile(by).await?;
                Ok(vec![Event::new(
                    requester,
                    Some(by),
                    EventPayload::FriendRequestAccepted(profile),
                )])
            }
            Notification::FriendRequestRejected { by, requester } => {
                let username = self.profile(by).await?.username;
                Ok(vec![Event::new(
                    requester,
                    Some(by),
                    EventPayload::FriendRequestRejected(UsernameNotice { username }),
                )])
            }
            Notification::Unfriended { by, friend } => {
                let username = self.profile(by).await?.username;
                Ok(vec![Event::new(
                    friend,
                    Some(by),
                    EventPayload::Unfriended(UsernameNotice { username }),
                )])
            }
            Notification::AddedToGroup {
                group,
                member,
                adder,
            } => {
                let summary = self.group(group).await?;
                let mut events = vec![Event::new(
                    member,
                    Some(adder),
                    EventPayload::AddedToGroup(GroupNotice {
                        adder_id: Some(adder),
                        ..notice(&summary)
                    }),
                )];
                let joined = GroupNotice {
                    user_id: Some(member),
                    adder_id: Some(adder),
                    ..notice(&summary)
                };
                events.extend(
                    self.to_members(group, member, || EventPayload::UserJoinedGroup(joined.clone()))
                        .await?,
                );
                Ok(events)
            }
            Notification::RemovedFromGroup {
                group,
                member,
                remover,
            } => {
                let summary = self.group(group).await?;
                let mut events = vec![Event::new(
                    member,
                    Some(remover),
                    EventPayload::RemovedFromGroup(GroupNotice {
                        remover_id: Some(remover),
                        ..notice(&summary)
                    }),
                )];
                let left = GroupNotice {
                    user_id: Some(member),
                    remover_id: Some(remover),
                    ..notice(&summary)
                };
                events.extend(
                    self.to_members(group, member, || EventPayload::UserLeftGroup(left.clone()))
                        .await?,
                );
                Ok(events)
            }
            Notification::UserJoinedGroup { group, user } => {
                let joined = GroupNotice {
                    user_id: Some(user),
                    ..notice(&self.group(group).await?)
                };
                self.to_members(group, user, || EventPayload::UserJoinedGroup(joined.clone()))
                    .await
            }
            Notification::UserLeftGroup { group, user } => {
                let left = GroupNotice {
                    user_id: Some(user),
                    ..notice(&self.group(group).await?)
                };
                self.to_members(group, user, || EventPayload::UserLeftGroup(left.clone()))
                    .await
            }
        }
    }

    async fn profile(&self, id: UserId) -> AppResult<UserProfile> {
        self.users
            .find_profile(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn group(&self, id: GroupId) -> AppResult<GroupSummary> {
        self.groups
            .find_group(id.into_uuid())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Group {id} not found")))
    }

    /// One event per current member other than `subject`.
    async fn to_members(
        &self,
        group: GroupId,
        subject: UserId,
        payload: impl Fn() -> EventPayload,
    ) -> AppResult<Vec<Event>> {
        let members = self.groups.list_member_ids(group).await?;
        Ok(members
            .into_iter()
            .filter(|m| *m != subject)
            .map(|m| Event::new(m, None, payload()))
            .collect())
    }
}

fn notice(group: &GroupSummary) -> GroupNotice {
    GroupNotice {
        group_id: group.id,
        group_name: group.name.clone(),
        user_id: None,
        adder_id: None,
        remover_id: None,
    }
}
