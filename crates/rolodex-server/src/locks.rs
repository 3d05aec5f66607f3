//! Per-user serialization of read-modify-write sequences against the
//! profile store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use rolodex_shared::types::UserId;

#[derive(Clone, Default)]
pub struct UserLocks {
    locks: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user`'s profile. Held until the guard
    /// is dropped.
    pub async fn acquire(&self, user: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(user.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop entries nobody holds or waits on.
    pub async fn purge_idle(&self) {
        let mut locks = self.locks.lock().await;
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before - locks.len();
        if removed > 0 {
            debug!(removed, "Purged idle user locks");
        }
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_user_is_exclusive() {
        let locks = UserLocks::new();
        let user = UserId::parse("u1").unwrap();

        let guard = locks.acquire(&user).await;
        let waiter = {
            let locks = locks.clone();
            let user = user.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&user).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_keeps_held_locks() {
        let locks = UserLocks::new();
        let held = UserId::parse("held").unwrap();
        let idle = UserId::parse("idle").unwrap();

        let _guard = locks.acquire(&held).await;
        drop(locks.acquire(&idle).await);

        locks.purge_idle().await;
        assert_eq!(locks.len().await, 1);
    }
}
