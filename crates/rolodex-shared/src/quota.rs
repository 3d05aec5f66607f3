//! The per-user quota record and the pure transitions applied to it.
//!
//! Invariants maintained by every mutator in this module:
//! - `daily_views == viewed_ids.len()` once the record has been rolled over
//!   to the current day.
//! - `week_history` holds at most [`WEEK_HISTORY_CAPACITY`] buckets, ordered
//!   oldest first and unique by calendar date.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::WEEK_HISTORY_CAPACITY;
use crate::rollover::{classify, Rollover};

// ---------------------------------------------------------------------------
// Weekly history
// ---------------------------------------------------------------------------

/// One day of reveal activity in the rolling weekly histogram.
///
/// Buckets are matched by `date`; `day` is only a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBucket {
    /// Short weekday label (`Mon` .. `Sun`).
    pub day: String,
    /// Calendar date the bucket counts.
    pub date: NaiveDate,
    /// Reveals recorded on that date.
    pub views: u32,
    /// Time of the most recent tick.
    pub timestamp: DateTime<Utc>,
}

impl WeekBucket {
    fn first_tick(now: DateTime<Utc>) -> Self {
        let date = now.date_naive();
        Self {
            day: date.weekday().to_string(),
            date,
            views: 1,
            timestamp: now,
        }
    }
}

/// Count one view for `now`'s date, creating the bucket if needed and
/// evicting the oldest buckets beyond capacity.
pub fn record_week_tick(history: &mut Vec<WeekBucket>, now: DateTime<Utc>) {
    let date = now.date_naive();

    match history.iter_mut().find(|bucket| bucket.date == date) {
        Some(bucket) => {
            bucket.views = bucket.views.saturating_add(1);
            bucket.timestamp = now;
        }
        None => {
            history.push(WeekBucket::first_tick(now));
            history.sort_by_key(|bucket| bucket.date);
        }
    }

    if history.len() > WEEK_HISTORY_CAPACITY {
        let excess = history.len() - WEEK_HISTORY_CAPACITY;
        history.drain(..excess);
    }
}

// ---------------------------------------------------------------------------
// QuotaRecord
// ---------------------------------------------------------------------------

/// A user's reveal budget for the current day plus the weekly histogram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRecord {
    /// Reveals consumed on `last_reset_date`.
    pub daily_views: u32,
    /// Day the counters were last zeroed. `None` for a brand new profile.
    pub last_reset_date: Option<NaiveDate>,
    /// Record ids revealed on `last_reset_date`.
    pub viewed_ids: BTreeSet<String>,
    /// Rolling per-day reveal counts, oldest first.
    pub week_history: Vec<WeekBucket>,
}

impl QuotaRecord {
    pub fn remaining(&self, limit: u32) -> u32 {
        limit.saturating_sub(self.daily_views)
    }

    pub fn has_exceeded(&self, limit: u32) -> bool {
        self.daily_views >= limit
    }

    pub fn is_viewed(&self, id: &str) -> bool {
        self.viewed_ids.contains(id)
    }

    /// Bring the record up to `today`, zeroing the daily counters if the
    /// stored date differs. The weekly history is left untouched.
    pub fn roll_over(&mut self, today: NaiveDate) -> Rollover {
        let action = classify(self.last_reset_date, today);
        if action.is_required() {
            self.reset(today);
        }
        action
    }

    /// Zero the daily counters and stamp them with `today`.
    pub fn reset(&mut self, today: NaiveDate) {
        self.daily_views = 0;
        self.viewed_ids.clear();
        self.last_reset_date = Some(today);
    }

    /// Record a reveal of `id` on `today`.
    ///
    /// Returns `false` without touching the counter if `id` was already
    /// revealed today. Limits are not checked here.
    pub fn record_view(&mut self, id: &str, today: NaiveDate) -> bool {
        self.roll_over(today);
        if !self.viewed_ids.insert(id.to_string()) {
            return false;
        }
        self.daily_views = self.daily_views.saturating_add(1);
        true
    }
}
