//! Server side of the reveal quota.
//!
//! This is the only place that enforces the daily limit. Every operation
//! re-reads the authoritative profile, applies the day-rollover policy and
//! writes back under a per-user lock, so concurrent sessions of one user
//! can never push the stored count past the limit.

use std::sync::Arc;

use tracing::{debug, info};

use rolodex_shared::clock::Clock;
use rolodex_shared::protocol::{TrackViewResponse, ViewStatus};
use rolodex_shared::quota::{record_week_tick, QuotaRecord, WeekBucket};
use rolodex_shared::rollover::Rollover;
use rolodex_shared::types::UserId;
use rolodex_store::{ProfilePatch, ProfileStore};

use crate::error::ServerError;
use crate::locks::UserLocks;

/// Result of `POST /track-view` that is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// The id was newly counted.
    Revealed(QuotaRecord),
    /// The id had already been counted today; nothing changed.
    AlreadyViewed(QuotaRecord),
}

impl TrackOutcome {
    pub fn into_response(self, limit: u32) -> TrackViewResponse {
        match self {
            TrackOutcome::Revealed(record) => TrackViewResponse::from_record(&record, limit, false),
            TrackOutcome::AlreadyViewed(record) => {
                TrackViewResponse::from_record(&record, limit, true)
            }
        }
    }
}

#[derive(Clone)]
pub struct QuotaService {
    store: Arc<dyn ProfileStore>,
    clock: Arc<dyn Clock>,
    locks: UserLocks,
    limit: u32,
}

impl QuotaService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        clock: Arc<dyn Clock>,
        locks: UserLocks,
        limit: u32,
    ) -> Self {
        Self {
            store,
            clock,
            locks,
            limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    /// Load the user's record rolled over to today. A stale record is reset
    /// in the store before it is returned.
    pub async fn current(&self, user: &UserId) -> Result<QuotaRecord, ServerError> {
        let _guard = self.locks.acquire(user).await;
        self.load_rolled_over(user).await
    }

    pub async fn view_status(&self, user: &UserId) -> Result<ViewStatus, ServerError> {
        let record = self.current(user).await?;
        Ok(ViewStatus::from_record(&record, self.limit, self.today()))
    }

    /// Count a reveal of `contact_id`, re-validating the limit against the
    /// stored count.
    pub async fn track_view(
        &self,
        user: &UserId,
        contact_id: &str,
    ) -> Result<TrackOutcome, ServerError> {
        let _guard = self.locks.acquire(user).await;
        let mut record = self.load_rolled_over(user).await?;

        if record.is_viewed(contact_id) {
            debug!(user = %user, contact = %contact_id, "Contact already viewed today");
            return Ok(TrackOutcome::AlreadyViewed(record));
        }

        if record.has_exceeded(self.limit) {
            info!(user = %user, contact = %contact_id, limit = self.limit, "Daily limit reached");
            return Err(ServerError::LimitExceeded {
                record: Box::new(record),
                limit: self.limit,
            });
        }

        let today = self.clock.today();
        record.record_view(contact_id, today);
        let stored = self
            .store
            .put(user, ProfilePatch::daily(&record).stamped(self.clock.now()))
            .await?;

        info!(
            user = %user,
            contact = %contact_id,
            daily_views = stored.quota.daily_views,
            "Contact revealed"
        );
        Ok(TrackOutcome::Revealed(stored.quota))
    }

    /// Add one view to today's bucket of the weekly histogram. Independent
    /// of the daily limit.
    pub async fn week_tick(&self, user: &UserId) -> Result<Vec<WeekBucket>, ServerError> {
        let _guard = self.locks.acquire(user).await;
        let profile = self.store.get(user).await?;

        let now = self.clock.now();
        let mut history = profile.quota.week_history;
        record_week_tick(&mut history, now);

        let stored = self
            .store
            .put(user, ProfilePatch::week_history(history).stamped(now))
            .await?;
        Ok(stored.quota.week_history)
    }

    /// Zero the user's daily counters regardless of date.
    pub async fn reset(&self, user: &UserId) -> Result<QuotaRecord, ServerError> {
        let _guard = self.locks.acquire(user).await;
        let mut record = self.store.get(user).await?.quota;
        record.reset(self.clock.today());

        let stored = self
            .store
            .put(user, ProfilePatch::daily(&record).stamped(self.clock.now()))
            .await?;

        info!(user = %user, "Daily views reset");
        Ok(stored.quota)
    }

    /// Caller must hold the user's lock.
    async fn load_rolled_over(&self, user: &UserId) -> Result<QuotaRecord, ServerError> {
        let mut record = self.store.get(user).await?.quota;
        let today = self.clock.today();

        match record.roll_over(today) {
            Rollover::Current => Ok(record),
            action => {
                let stored = self
                    .store
                    .put(user, ProfilePatch::daily(&record).stamped(self.clock.now()))
                    .await?;
                debug!(user = %user, ?action, %today, "Quota rolled over");
                Ok(stored.quota)
            }
        }
    }
}
