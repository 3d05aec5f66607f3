//! In-memory profile store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use rolodex_shared::types::UserId;

use crate::error::Result;
use crate::models::{Profile, ProfilePatch};
use crate::traits::ProfileStore;

/// Profiles kept in a process-local map. Contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<RwLock<HashMap<UserId, Profile>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a stored profile.
    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, user: &UserId) -> Result<Profile> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(user).cloned().unwrap_or_default())
    }

    async fn put(&self, user: &UserId, patch: ProfilePatch) -> Result<Profile> {
        let mut profiles = self.profiles.write().await;
        let mut profile = profiles.get(user).cloned().unwrap_or_default();
        profile.apply(patch)?;
        profiles.insert(user.clone(), profile.clone());
        Ok(profile)
    }
}
