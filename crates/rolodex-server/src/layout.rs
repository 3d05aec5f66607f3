//! Per-user dashboard layout preferences.

use std::sync::Arc;

use rolodex_shared::clock::Clock;
use rolodex_shared::protocol::{LayoutSettings, LayoutSettingsPatch};
use rolodex_shared::types::UserId;
use rolodex_store::{ProfilePatch, ProfileStore};

use crate::error::ServerError;
use crate::locks::UserLocks;

#[derive(Clone)]
pub struct LayoutService {
    store: Arc<dyn ProfileStore>,
    clock: Arc<dyn Clock>,
    locks: UserLocks,
}

impl LayoutService {
    pub fn new(store: Arc<dyn ProfileStore>, clock: Arc<dyn Clock>, locks: UserLocks) -> Self {
        Self {
            store,
            clock,
            locks,
        }
    }

    /// Stored settings, or the defaults if the user never saved any.
    pub async fn get(&self, user: &UserId) -> Result<LayoutSettings, ServerError> {
        let profile = self.store.get(user).await?;
        Ok(profile.layout.unwrap_or_default())
    }

    pub async fn update(
        &self,
        user: &UserId,
        patch: LayoutSettingsPatch,
    ) -> Result<LayoutSettings, ServerError> {
        let _guard = self.locks.acquire(user).await;
        let merged = self.get(user).await?.merge(patch);

        let stored = self
            .store
            .put(user, ProfilePatch::layout(merged).stamped(self.clock.now()))
            .await?;
        Ok(stored.layout.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolodex_shared::clock::SystemClock;
    use rolodex_store::MemoryProfileStore;

    #[tokio::test]
    async fn test_defaults_then_partial_update() {
        let service = LayoutService::new(
            Arc::new(MemoryProfileStore::new()),
            Arc::new(SystemClock),
            UserLocks::new(),
        );
        let user = UserId::parse("u1").unwrap();

        assert_eq!(service.get(&user).await.unwrap(), LayoutSettings::default());

        let updated = service
            .update(
                &user,
                LayoutSettingsPatch {
                    variant: Some("floating".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.variant, "floating");
        assert_eq!(updated.collapsible, "offcanvas");

        let updated = service
            .update(
                &user,
                LayoutSettingsPatch {
                    sidebar_open: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.variant, "floating");
        assert!(!updated.sidebar_open);
    }
}
