//! Read-only views of the user and group collaborators.

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;
use crate::types::{GroupId, GroupSummary, Recipient, UserId, UserProfile};

/// Profile lookups used for payload enrichment.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Profile projection by ID.
    async fn find_profile(&self, id: UserId) -> AppResult<Option<UserProfile>>;

    /// Profile projection by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserProfile>>;
}

/// Group lookups used for recipient resolution and membership notices.
#[async_trait]
pub trait GroupDirectory: Send + Sync + 'static {
    /// The group with this ID, if the ID names a group.
    async fn find_group(&self, id: Uuid) -> AppResult<Option<GroupSummary>>;

    /// Current member IDs of a group.
    async fn list_member_ids(&self, group_id: GroupId) -> AppResult<Vec<UserId>>;

    /// Resolve a conversation target.
    ///
    /// An ID that names a group expands to that group's members; any other
    /// ID is taken to be a user.
    async fn resolve(&self, target: Uuid) -> AppResult<Recipient> {
        match self.find_group(target).await? {
            Some(group) => {
                let members = self.list_member_ids(group.id).await?;
                Ok(Recipient::Group { group, members })
            }
            None => Ok(Recipient::User(UserId::from_uuid(target))),
        }
    }
}
