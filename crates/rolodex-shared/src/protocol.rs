//! JSON wire format of the profile API.
//!
//! Field names are camelCase to stay compatible with the dashboard front end.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::quota::{QuotaRecord, WeekBucket};

// ---------------------------------------------------------------------------
// GET /view-status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStatus {
    /// Limit the server enforces. Clients size their local gate from it.
    pub daily_limit: u32,
    pub daily_views: u32,
    pub remaining_views: u32,
    pub has_exceeded_limit: bool,
    pub last_reset_date: NaiveDate,
    pub viewed_contacts: Vec<String>,
    #[serde(default)]
    pub week_views: Vec<WeekBucket>,
}

impl ViewStatus {
    /// Describe a record that has already been rolled over to `today`.
    pub fn from_record(record: &QuotaRecord, limit: u32, today: NaiveDate) -> Self {
        Self {
            daily_limit: limit,
            daily_views: record.daily_views,
            remaining_views: record.remaining(limit),
            has_exceeded_limit: record.has_exceeded(limit),
            last_reset_date: record.last_reset_date.unwrap_or(today),
            viewed_contacts: record.viewed_ids.iter().cloned().collect(),
            week_views: record.week_history.clone(),
        }
    }

    pub fn into_record(self) -> QuotaRecord {
        QuotaRecord {
            daily_views: self.daily_views,
            last_reset_date: Some(self.last_reset_date),
            viewed_ids: self.viewed_contacts.into_iter().collect(),
            week_history: self.week_views,
        }
    }
}

// ---------------------------------------------------------------------------
// POST /track-view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackViewRequest {
    #[serde(default)]
    pub contact_id: Option<String>,
}

/// `200` body of `POST /track-view`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackViewResponse {
    pub success: bool,
    pub already_viewed: bool,
    pub daily_limit: u32,
    pub daily_views: u32,
    pub remaining_views: u32,
    pub has_exceeded_limit: bool,
    pub viewed_contacts: Vec<String>,
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
}

impl TrackViewResponse {
    pub fn from_record(record: &QuotaRecord, limit: u32, already_viewed: bool) -> Self {
        Self {
            success: true,
            already_viewed,
            daily_limit: limit,
            daily_views: record.daily_views,
            remaining_views: record.remaining(limit),
            has_exceeded_limit: record.has_exceeded(limit),
            viewed_contacts: record.viewed_ids.iter().cloned().collect(),
            last_reset_date: record.last_reset_date,
        }
    }

    /// Daily counters carried by the response. The weekly history is not
    /// part of this payload and comes back empty.
    pub fn into_record(self) -> QuotaRecord {
        QuotaRecord {
            daily_views: self.daily_views,
            last_reset_date: self.last_reset_date,
            viewed_ids: self.viewed_contacts.into_iter().collect(),
            week_history: Vec::new(),
        }
    }
}

/// `403` body of `POST /track-view`: the authoritative snapshot at the time
/// the limit check failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitExceededBody {
    pub error: String,
    pub daily_limit: u32,
    pub daily_views: u32,
    pub remaining_views: u32,
    pub has_exceeded_limit: bool,
    pub viewed_contacts: Vec<String>,
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
}

impl LimitExceededBody {
    pub fn from_record(record: &QuotaRecord, limit: u32) -> Self {
        Self {
            error: "Daily limit exceeded".to_string(),
            daily_limit: limit,
            daily_views: record.daily_views,
            remaining_views: 0,
            has_exceeded_limit: true,
            viewed_contacts: record.viewed_ids.iter().cloned().collect(),
            last_reset_date: record.last_reset_date,
        }
    }

    pub fn into_record(self) -> QuotaRecord {
        QuotaRecord {
            daily_views: self.daily_views,
            last_reset_date: self.last_reset_date,
            viewed_ids: self.viewed_contacts.into_iter().collect(),
            week_history: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// POST /week-views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekViewsResponse {
    pub success: bool,
    pub week_views: Vec<WeekBucket>,
}

// ---------------------------------------------------------------------------
// /layout-settings
// ---------------------------------------------------------------------------

/// Per-user sidebar preferences persisted alongside the quota record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    pub collapsible: String,
    pub variant: String,
    pub sidebar_open: bool,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            collapsible: "offcanvas".to_string(),
            variant: "sidebar".to_string(),
            sidebar_open: true,
        }
    }
}

/// Partial update of [`LayoutSettings`]; absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettingsPatch {
    pub collapsible: Option<String>,
    pub variant: Option<String>,
    pub sidebar_open: Option<bool>,
}

impl LayoutSettings {
    pub fn merge(mut self, patch: LayoutSettingsPatch) -> Self {
        if let Some(collapsible) = patch.collapsible {
            self.collapsible = collapsible;
        }
        if let Some(variant) = patch.variant {
            self.variant = variant;
        }
        if let Some(open) = patch.sidebar_open {
            self.sidebar_open = open;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettingsResponse {
    pub success: bool,
    pub layout_settings: LayoutSettings,
}

// ---------------------------------------------------------------------------
// Admin and listings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetViewsRequest {
    pub user_id: String,
}

/// One page of a record listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    /// Slice `all` into 1-based page `page` of `per_page` items.
    pub fn slice(all: &[T], page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_items = all.len();
        let total_pages = total_items.div_ceil(per_page);
        let start = (page - 1).saturating_mul(per_page).min(total_items);
        let end = start.saturating_add(per_page).min(total_items);

        Self {
            items: all[start..end].to_vec(),
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
