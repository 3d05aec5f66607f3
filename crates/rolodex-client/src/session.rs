//! Signed-in session lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use rolodex_shared::clock::{Clock, SystemClock};
use rolodex_shared::quota::QuotaRecord;
use rolodex_shared::types::UserId;

use crate::api::{HttpProfileApi, ProfileApi};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::gate::RevealGate;
use crate::reconciler::QuotaReconciler;
use crate::store::QuotaStore;

/// How long sign-out waits for analytics ticks still in flight.
const SIGN_OUT_GRACE: Duration = Duration::from_secs(2);

pub struct Session {
    user_id: UserId,
    store: Arc<QuotaStore>,
    reconciler: QuotaReconciler,
    gate: RevealGate,
}

impl Session {
    /// Start a session against the HTTP API described by `config`.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let api = HttpProfileApi::new(config)?;
        Self::start(Arc::new(api), Arc::new(SystemClock), config).await
    }

    /// Load the authoritative record and seed the local cache with it.
    pub async fn start(
        api: Arc<dyn ProfileApi>,
        clock: Arc<dyn Clock>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let store = Arc::new(match &config.cache_path {
            Some(path) => QuotaStore::with_cache_file(clock, path),
            None => QuotaStore::new(clock),
        });
        let reconciler = QuotaReconciler::new(api);

        let record = reconciler.load_from_remote().await?;
        info!(
            user = %config.user_id,
            daily_views = record.daily_views,
            daily_limit = ?reconciler.daily_limit(),
            "Session started"
        );
        store.apply_server_snapshot(record);

        let gate = RevealGate::new(Arc::clone(&store), reconciler.clone());
        Ok(Self {
            user_id: config.user_id.clone(),
            store,
            reconciler,
            gate,
        })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn gate(&self) -> &RevealGate {
        &self.gate
    }

    pub fn store(&self) -> &QuotaStore {
        &self.store
    }

    /// Re-read the authoritative record, replacing the local cache.
    pub async fn refresh(&self) -> Result<QuotaRecord> {
        let record = self.reconciler.load_from_remote().await?;
        self.store.apply_server_snapshot(record.clone());
        Ok(record)
    }

    /// End the session: give pending analytics ticks a moment to land,
    /// then drop the local cache and its on-device copy.
    pub async fn sign_out(self) {
        if tokio::time::timeout(SIGN_OUT_GRACE, self.gate.settle())
            .await
            .is_err()
        {
            debug!("Abandoning weekly ticks still in flight");
        }
        self.store.discard();
        info!(user = %self.user_id, "Signed out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use chrono::NaiveDate;
    use rolodex_shared::clock::ManualClock;

    use crate::error::ClientError;
    use crate::gate::RevealOutcome;
    use crate::testing::FakeProfileApi;

    fn monday() -> ManualClock {
        ManualClock::at_date(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
    }

    fn config() -> ClientConfig {
        ClientConfig::new("http://unused", UserId::parse("u1").unwrap())
    }

    #[tokio::test]
    async fn test_start_adopts_remote_record() {
        let clock = monday();
        let api = Arc::new(FakeProfileApi::new(clock.clone(), 50));
        api.reveal_elsewhere("a");
        api.reveal_elsewhere("b");

        let session = Session::start(api.clone(), Arc::new(clock), &config())
            .await
            .unwrap();

        assert!(session.store().is_active());
        assert_eq!(session.store().read(), api.record());
        assert_eq!(session.gate().remaining(), 48);
    }

    #[tokio::test]
    async fn test_start_takes_limit_from_server() {
        let clock = monday();
        let api = Arc::new(FakeProfileApi::new(clock.clone(), 3));
        api.reveal_elsewhere("a");

        let session = Session::start(api, Arc::new(clock), &config())
            .await
            .unwrap();
        assert_eq!(session.gate().limit(), 3);
        assert_eq!(session.gate().remaining(), 2);
    }

    #[tokio::test]
    async fn test_load_then_snapshot_round_trips() {
        let clock = monday();
        let api = Arc::new(FakeProfileApi::new(clock.clone(), 50));
        let session = Session::start(api.clone(), Arc::new(clock.clone()), &config())
            .await
            .unwrap();
        session.gate().request_reveal("c1").await.unwrap();
        session.gate().settle().await;

        clock.advance_days(1);
        api.reveal_elsewhere("c9");

        let loaded = session.reconciler.load_from_remote().await.unwrap();
        session.store().apply_server_snapshot(loaded.clone());
        assert_eq!(session.store().read(), loaded);
        assert_eq!(loaded.week_history.len(), 1);

        assert_eq!(session.refresh().await.unwrap(), loaded);
    }

    #[tokio::test]
    async fn test_start_fails_when_signed_out_upstream() {
        let clock = monday();
        let api = Arc::new(FakeProfileApi::new(clock.clone(), 50));
        api.signed_out.store(true, Ordering::SeqCst);

        let result = Session::start(api, Arc::new(clock), &config()).await;
        assert!(matches!(result, Err(ClientError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_sign_out_discards_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota.json");
        let clock = monday();
        let api = Arc::new(FakeProfileApi::new(clock.clone(), 50));

        let session = Session::start(
            api.clone(),
            Arc::new(clock),
            &config().with_cache_path(&path),
        )
        .await
        .unwrap();
        let gate = session.gate().clone();

        assert_eq!(
            gate.request_reveal("c1").await.unwrap(),
            RevealOutcome::Revealed { remaining: 49 }
        );
        assert!(path.exists());

        session.sign_out().await;
        assert!(!path.exists());
        assert_eq!(api.week_calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            gate.request_reveal("c2").await,
            Err(ClientError::Unauthenticated)
        ));
        // The server keeps the authoritative record.
        assert_eq!(api.record().daily_views, 1);
    }
}
