//! Bridge between the local [`QuotaStore`](crate::store::QuotaStore) and
//! the authoritative profile on the server.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rolodex_shared::quota::{QuotaRecord, WeekBucket};

use crate::api::ProfileApi;
use crate::error::ApiError;

/// Result of a successful `track-view` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Server counters after the call; weekly history not included.
    pub record: QuotaRecord,
    /// The server had already counted this id today.
    pub already_viewed: bool,
}

#[derive(Clone)]
pub struct QuotaReconciler {
    api: Arc<dyn ProfileApi>,
    /// Last limit reported by the server; 0 until the first answer.
    daily_limit: Arc<AtomicU32>,
}

impl QuotaReconciler {
    pub fn new(api: Arc<dyn ProfileApi>) -> Self {
        Self {
            api,
            daily_limit: Arc::new(AtomicU32::new(0)),
        }
    }

    /// The daily limit the server enforces, as of its latest answer.
    pub fn daily_limit(&self) -> Option<u32> {
        match self.daily_limit.load(Ordering::Acquire) {
            0 => None,
            limit => Some(limit),
        }
    }

    fn observe_limit(&self, limit: u32) {
        self.daily_limit.store(limit, Ordering::Release);
    }

    /// Fetch the authoritative record. The server applies and persists any
    /// pending day rollover before answering.
    pub async fn load_from_remote(&self) -> Result<QuotaRecord, ApiError> {
        let status = self.api.view_status().await?;
        self.observe_limit(status.daily_limit);
        Ok(status.into_record())
    }

    /// Have the server re-validate the limit and count `contact_id`.
    ///
    /// A refusal comes back as [`ApiError::LimitExceeded`] carrying the
    /// server's counters.
    pub async fn commit_increment(&self, contact_id: &str) -> Result<Commit, ApiError> {
        let resp = match self.api.track_view(contact_id).await {
            Ok(resp) => resp,
            Err(e) => {
                if let ApiError::LimitExceeded { daily_limit, .. } = &e {
                    self.observe_limit(*daily_limit);
                }
                return Err(e);
            }
        };
        self.observe_limit(resp.daily_limit);
        let already_viewed = resp.already_viewed;
        Ok(Commit {
            record: resp.into_record(),
            already_viewed,
        })
    }

    /// Count one tick in today's weekly bucket. Independent of the daily
    /// limit and of any reveal in flight.
    pub async fn commit_weekly_tick(&self) -> Result<Vec<WeekBucket>, ApiError> {
        self.api.week_views().await
    }
}
