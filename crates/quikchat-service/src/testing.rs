//! In-memory collaborators for tests.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for downstream crates' dev-dependencies. Every fake can be told to fail
//! so storage outages can be exercised without a database. Tests that need
//! a working buffer use the production [`MemoryEventBuffer`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use quikchat_core::error::AppError;
use quikchat_core::events::{self, Event};
use quikchat_core::result::AppResult;
use quikchat_core::traits::{
    Authenticator, DurableEventStore, EventBuffer, GroupDirectory, UserDirectory,
};
use quikchat_core::types::{
    AuthenticatedUser, EventId, GroupId, GroupSummary, UserId, UserProfile,
};

pub use quikchat_cache::memory::MemoryEventBuffer;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Durable store backed by a `Vec`, with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    rows: Mutex<Vec<Event>>,
    failing: Mutex<HashSet<EventId>>,
    unavailable: AtomicBool,
}

impl InMemoryEventStore {
    /// Make every call fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make inserts of these IDs fail until cleared.
    pub fn fail_ids(&self, ids: impl IntoIterator<Item = EventId>) {
        lock(&self.failing).extend(ids);
    }

    /// Let all inserts succeed again.
    pub fn clear_failures(&self) {
        lock(&self.failing).clear();
    }

    /// Number of stored rows.
    pub fn count(&self) -> usize {
        lock(&self.rows).len()
    }

    /// Whether a row with this ID exists.
    pub fn contains(&self, id: EventId) -> bool {
        lock(&self.rows).iter().any(|e| e.id == id)
    }

    /// Snapshot of all rows.
    pub fn all(&self) -> Vec<Event> {
        lock(&self.rows).clone()
    }

    fn check(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::database("event store unavailable"));
        }
        Ok(())
    }

    fn insert_one(&self, event: &Event) -> bool {
        if lock(&self.failing).contains(&event.id) {
            return false;
        }
        let mut rows = lock(&self.rows);
        if !rows.iter().any(|e| e.id == event.id) {
            rows.push(event.clone());
        }
        true
    }
}

#[async_trait]
impl DurableEventStore for InMemoryEventStore {
    async fn insert(&self, event: &Event) -> AppResult<()> {
        self.check()?;
        if self.insert_one(event) {
            Ok(())
        } else {
            Err(AppError::database(format!("insert of {} failed", event.id)))
        }
    }

    async fn insert_batch(&self, events: &[Event]) -> AppResult<Vec<EventId>> {
        self.check()?;
        Ok(events
            .iter()
            .filter(|e| self.insert_one(e))
            .map(|e| e.id)
            .collect())
    }

    async fn fetch_after(
        &self,
        recipient: UserId,
        cursor: Option<DateTime<Utc>>,
        limit: usize,
    ) -> AppResult<Vec<Event>> {
        self.check()?;
        let mut out: Vec<Event> = lock(&self.rows)
            .iter()
            .filter(|e| e.recipient_id == recipient)
            .filter(|e| cursor.is_none_or(|c| e.created_at > c))
            .cloned()
            .collect();
        events::sort_and_dedup(&mut out);
        out.truncate(limit);
        Ok(out)
    }

    async fn delete(&self, recipient: UserId, id: EventId) -> AppResult<bool> {
        self.check()?;
        let mut rows = lock(&self.rows);
        let before = rows.len();
        rows.retain(|e| !(e.id == id && e.recipient_id == recipient));
        Ok(rows.len() < before)
    }

    async fn delete_batch(&self, ids: &[EventId]) -> AppResult<u64> {
        self.check()?;
        let mut rows = lock(&self.rows);
        let before = rows.len();
        rows.retain(|e| !ids.contains(&e.id));
        Ok((before - rows.len()) as u64)
    }
}

/// Buffer whose backend is down.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBuffer;

impl UnavailableBuffer {
    fn down<T>() -> AppResult<T> {
        Err(AppError::cache("buffer unavailable"))
    }
}

#[async_trait]
impl EventBuffer for UnavailableBuffer {
    async fn append(&self, _event: &Event) -> AppResult<()> {
        Self::down()
    }

    async fn read_for_user(&self, _user: UserId) -> AppResult<Vec<Event>> {
        Self::down()
    }

    async fn clear_for_user(&self, _user: UserId) -> AppResult<u64> {
        Self::down()
    }

    async fn remove_for_user(&self, _user: UserId, _id: EventId) -> AppResult<bool> {
        Self::down()
    }

    async fn peek_batch(&self, _limit: usize) -> AppResult<Vec<Event>> {
        Self::down()
    }

    async fn remove(&self, _events: &[Event]) -> AppResult<u64> {
        Self::down()
    }

    async fn len(&self) -> AppResult<u64> {
        Self::down()
    }

    async fn ping(&self) -> AppResult<bool> {
        Ok(false)
    }
}

/// User directory over a fixed set of profiles.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<UserId, UserProfile>>,
}

impl InMemoryUserDirectory {
    /// Add a user and return their profile.
    pub fn add(&self, username: &str) -> UserProfile {
        let profile = UserProfile {
            id: UserId::new(),
            username: username.to_string(),
            profile_pic_url: String::new(),
        };
        lock(&self.users).insert(profile.id, profile.clone());
        profile
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_profile(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        Ok(lock(&self.users).get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserProfile>> {
        Ok(lock(&self.users)
            .values()
            .find(|p| p.username.eq_ignore_ascii_case(username))
            .cloned())
    }
}

/// Group directory over a fixed set of groups.
#[derive(Debug, Default)]
pub struct InMemoryGroupDirectory {
    groups: Mutex<HashMap<GroupId, (GroupSummary, Vec<UserId>)>>,
}

impl InMemoryGroupDirectory {
    /// Add a group owned by the first member and return its summary.
    pub fn add(&self, name: &str, members: &[UserId]) -> GroupSummary {
        let summary = GroupSummary {
            id: GroupId::new(),
            handle: name.to_lowercase(),
            name: name.to_string(),
            owner_id: members.first().copied().unwrap_or_default(),
        };
        lock(&self.groups).insert(summary.id, (summary.clone(), members.to_vec()));
        summary
    }
}

#[async_trait]
impl GroupDirectory for InMemoryGroupDirectory {
    async fn find_group(&self, id: Uuid) -> AppResult<Option<GroupSummary>> {
        Ok(lock(&self.groups)
            .get(&GroupId::from_uuid(id))
            .map(|(g, _)| g.clone()))
    }

    async fn list_member_ids(&self, group_id: GroupId) -> AppResult<Vec<UserId>> {
        Ok(lock(&self.groups)
            .get(&group_id)
            .map(|(_, m)| m.clone())
            .unwrap_or_default())
    }
}

/// Authenticator that accepts a fixed set of tokens.
#[derive(Debug, Default)]
pub struct StaticAuthenticator {
    tokens: Mutex<HashMap<String, AuthenticatedUser>>,
}

impl StaticAuthenticator {
    /// Accept `token` as `user`.
    pub fn allow(&self, token: &str, user: UserId, username: &str) {
        lock(&self.tokens).insert(
            token.to_string(),
            AuthenticatedUser {
                user_id: user,
                username: Some(username.to_string()),
            },
        );
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        lock(&self.tokens)
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::authentication("Invalid token"))
    }
}
