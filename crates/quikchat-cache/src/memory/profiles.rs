//! moka-backed cache in front of a [`UserDirectory`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use quikchat_core::config::cache::ProfileCacheConfig;
use quikchat_core::result::AppResult;
use quikchat_core::traits::UserDirectory;
use quikchat_core::types::{UserId, UserProfile};

/// Caches profile projections by user ID. Misses are not cached.
#[derive(Clone)]
pub struct CachedUserDirectory {
    inner: Arc<dyn UserDirectory>,
    profiles: Cache<UserId, UserProfile>,
}

impl CachedUserDirectory {
    /// Wrap `inner` with a bounded, TTL'd cache.
    pub fn new(inner: Arc<dyn UserDirectory>, config: &ProfileCacheConfig) -> Self {
        let profiles = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.time_to_live_seconds))
            .build();
        Self { inner, profiles }
    }

    /// Forget a cached profile, e.g. after a rename.
    pub async fn invalidate(&self, id: UserId) {
        self.profiles.invalidate(&id).await;
    }
}

#[async_trait]
impl UserDirectory for CachedUserDirectory {
    async fn find_profile(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        if let Some(hit) = self.profiles.get(&id).await {
            return Ok(Some(hit));
        }
        let found = self.inner.find_profile(id).await?;
        if let Some(profile) = &found {
            self.profiles.insert(id, profile.clone()).await;
        }
        Ok(found)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserProfile>> {
        let found = self.inner.find_by_username(username).await?;
        if let Some(profile) = &found {
            self.profiles.insert(profile.id, profile.clone()).await;
        }
        Ok(found)
    }
}
