//! SQLite-backed [`ProfileStore`].
//!
//! `rusqlite` is synchronous, so every call is moved onto the blocking
//! thread pool and serialized through a mutex around the single connection.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rolodex_shared::types::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Profile, ProfilePatch};
use crate::traits::ProfileStore;

#[derive(Clone)]
pub struct SqliteProfileStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteProfileStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Database::new()?))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| StoreError::Worker("database mutex poisoned".into()))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))?
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn get(&self, user: &UserId) -> Result<Profile> {
        let user = user.clone();
        self.with_db(move |db| Ok(db.get_profile(&user)?.unwrap_or_default()))
            .await
    }

    async fn put(&self, user: &UserId, patch: ProfilePatch) -> Result<Profile> {
        let user = user.clone();
        self.with_db(move |db| db.merge_profile(&user, patch)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_profiles_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.db");
        let user = UserId::parse("carol").unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        {
            let store = SqliteProfileStore::open_at(&path).unwrap();
            let mut record = rolodex_shared::quota::QuotaRecord::default();
            record.record_view("c1", today);
            store.put(&user, ProfilePatch::daily(&record)).await.unwrap();
        }

        let store = SqliteProfileStore::open_at(&path).unwrap();
        let profile = store.get(&user).await.unwrap();
        assert_eq!(profile.quota.daily_views, 1);
        assert!(profile.quota.is_viewed("c1"));
    }

    #[tokio::test]
    async fn test_concurrent_puts_are_serialized() {
        let store = SqliteProfileStore::new(Database::open_in_memory().unwrap());
        let user = UserId::parse("dave").unwrap();

        let mut tasks = Vec::new();
        for n in 0..16u32 {
            let store = store.clone();
            let user = user.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .put(
                        &user,
                        ProfilePatch {
                            daily_views: Some(n),
                            ..Default::default()
                        },
                    )
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let profile = store.get(&user).await.unwrap();
        assert!(profile.quota.daily_views < 16);
    }
}
