//! Read-only user and group lookups over the account service's tables.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use quikchat_core::error::{AppError, ErrorKind};
use quikchat_core::result::AppResult;
use quikchat_core::traits::{GroupDirectory, UserDirectory};
use quikchat_core::types::{GroupId, GroupSummary, UserId, UserProfile};

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    username: String,
    profile_pic_url: Option<String>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            profile_pic_url: row.profile_pic_url.unwrap_or_default(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    handle: String,
    name: String,
    owner_id: Uuid,
}

impl From<GroupRow> for GroupSummary {
    fn from(row: GroupRow) -> Self {
        Self {
            id: GroupId::from_uuid(row.id),
            handle: row.handle,
            name: row.name,
            owner_id: UserId::from_uuid(row.owner_id),
        }
    }
}

/// [`UserDirectory`] over the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new user directory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_profile(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, username, profile_pic_url FROM users WHERE id = $1",
        )
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))?;
        Ok(row.map(UserProfile::from))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, username, profile_pic_url FROM users WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
        })?;
        Ok(row.map(UserProfile::from))
    }
}

/// [`GroupDirectory`] over the `groups` and `group_members` tables.
#[derive(Debug, Clone)]
pub struct PgGroupDirectory {
    pool: PgPool,
}

impl PgGroupDirectory {
    /// Create a new group directory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupDirectory for PgGroupDirectory {
    async fn find_group(&self, id: Uuid) -> AppResult<Option<GroupSummary>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, handle, name, owner_id FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find group", e))?;
        Ok(row.map(GroupSummary::from))
    }

    async fn list_member_ids(&self, group_id: GroupId) -> AppResult<Vec<UserId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM group_members WHERE group_id = $1 ORDER BY joined_at ASC",
        )
        .bind(group_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list group members", e)
        })?;
        Ok(ids.into_iter().map(UserId::from_uuid).collect())
    }
}
