//! Profile model and the merge rule for partial updates.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use rolodex_shared::protocol::LayoutSettings;
use rolodex_shared::quota::{QuotaRecord, WeekBucket};

use crate::error::{Result, StoreError};

/// Everything the store keeps for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub quota: QuotaRecord,
    /// `None` until the user saves a preference.
    pub layout: Option<LayoutSettings>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub daily_views: Option<u32>,
    pub last_reset_date: Option<NaiveDate>,
    pub viewed_ids: Option<BTreeSet<String>>,
    pub week_history: Option<Vec<WeekBucket>>,
    pub layout: Option<LayoutSettings>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ProfilePatch {
    /// Patch writing the daily counters of `record`. The weekly history is
    /// not included so that daily commits and weekly ticks never overwrite
    /// each other.
    pub fn daily(record: &QuotaRecord) -> Self {
        Self {
            daily_views: Some(record.daily_views),
            last_reset_date: record.last_reset_date,
            viewed_ids: Some(record.viewed_ids.clone()),
            ..Default::default()
        }
    }

    pub fn week_history(history: Vec<WeekBucket>) -> Self {
        Self {
            week_history: Some(history),
            ..Default::default()
        }
    }

    pub fn layout(settings: LayoutSettings) -> Self {
        Self {
            layout: Some(settings),
            ..Default::default()
        }
    }

    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = Some(at);
        self
    }
}

impl Profile {
    /// Merge `patch` into this profile.
    ///
    /// Fails with [`StoreError::StaleWrite`] and leaves the profile
    /// untouched if the patch carries a reset date older than the stored
    /// one.
    pub fn apply(&mut self, patch: ProfilePatch) -> Result<()> {
        if let (Some(attempted), Some(stored)) =
            (patch.last_reset_date, self.quota.last_reset_date)
        {
            if attempted < stored {
                return Err(StoreError::StaleWrite { stored, attempted });
            }
        }

        if let Some(views) = patch.daily_views {
            self.quota.daily_views = views;
        }
        if let Some(date) = patch.last_reset_date {
            self.quota.last_reset_date = Some(date);
        }
        if let Some(ids) = patch.viewed_ids {
            self.quota.viewed_ids = ids;
        }
        if let Some(history) = patch.week_history {
            self.quota.week_history = history;
        }
        if let Some(layout) = patch.layout {
            self.layout = Some(layout);
        }
        if let Some(at) = patch.last_updated {
            self.last_updated = Some(at);
        }
        Ok(())
    }
}
