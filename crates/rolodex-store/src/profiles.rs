//! Profile rows in SQLite.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, TransactionBehavior};

use rolodex_shared::quota::QuotaRecord;
use rolodex_shared::types::UserId;

use crate::database::Database;
use crate::error::Result;
use crate::models::{Profile, ProfilePatch};

/// Raw column values of one `profiles` row.
struct ProfileRow {
    daily_views: u32,
    last_reset_date: Option<String>,
    viewed_ids: String,
    week_history: String,
    layout_settings: Option<String>,
    last_updated: Option<String>,
}

impl ProfileRow {
    fn into_profile(self) -> Result<Profile> {
        let last_reset_date = self
            .last_reset_date
            .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
            .transpose()?;
        let last_updated = self
            .last_updated
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
            .transpose()?;
        let layout = self
            .layout_settings
            .map(|s| serde_json::from_str(&s))
            .transpose()?;

        Ok(Profile {
            quota: QuotaRecord {
                daily_views: self.daily_views,
                last_reset_date,
                viewed_ids: serde_json::from_str(&self.viewed_ids)?,
                week_history: serde_json::from_str(&self.week_history)?,
            },
            layout,
            last_updated,
        })
    }
}

fn read_profile(conn: &rusqlite::Connection, user: &UserId) -> Result<Option<Profile>> {
    let row = conn
        .query_row(
            "SELECT daily_views, last_reset_date, viewed_ids, week_history,
                    layout_settings, last_updated
             FROM profiles
             WHERE user_id = ?1",
            params![user.as_str()],
            |row| {
                Ok(ProfileRow {
                    daily_views: row.get(0)?,
                    last_reset_date: row.get(1)?,
                    viewed_ids: row.get(2)?,
                    week_history: row.get(3)?,
                    layout_settings: row.get(4)?,
                    last_updated: row.get(5)?,
                })
            },
        )
        .optional()?;

    row.map(ProfileRow::into_profile).transpose()
}

fn write_profile(conn: &rusqlite::Connection, user: &UserId, profile: &Profile) -> Result<()> {
    let layout = profile
        .layout
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO profiles (user_id, daily_views, last_reset_date, viewed_ids,
                               week_history, layout_settings, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id) DO UPDATE SET
             daily_views     = excluded.daily_views,
             last_reset_date = excluded.last_reset_date,
             viewed_ids      = excluded.viewed_ids,
             week_history    = excluded.week_history,
             layout_settings = excluded.layout_settings,
             last_updated    = excluded.last_updated",
        params![
            user.as_str(),
            profile.quota.daily_views,
            profile
                .quota
                .last_reset_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            serde_json::to_string(&profile.quota.viewed_ids)?,
            serde_json::to_string(&profile.quota.week_history)?,
            layout,
            profile.last_updated.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

impl Database {
    /// Fetch a stored profile, or `None` if the user has never been written.
    pub fn get_profile(&self, user: &UserId) -> Result<Option<Profile>> {
        read_profile(self.conn(), user)
    }

    /// Merge `patch` into the user's row inside a single write transaction.
    pub fn merge_profile(&mut self, user: &UserId, patch: ProfilePatch) -> Result<Profile> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut profile = read_profile(&tx, user)?.unwrap_or_default();
        profile.apply(patch)?;
        write_profile(&tx, user, &profile)?;

        tx.commit()?;
        Ok(profile)
    }

    /// Number of stored profiles.
    pub fn count_profiles(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolodex_shared::protocol::LayoutSettings;
    use rolodex_shared::quota::record_week_tick;

    #[test]
    fn test_missing_profile_is_none() {
        let db = Database::open_in_memory().unwrap();
        let user = UserId::parse("ghost").unwrap();
        assert!(db.get_profile(&user).unwrap().is_none());
        assert_eq!(db.count_profiles().unwrap(), 0);
    }

    #[test]
    fn test_merge_round_trips_every_column() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::parse("user_42").unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let now = today.and_hms_opt(8, 30, 0).unwrap().and_utc();

        let mut record = QuotaRecord::default();
        record.record_view("c1", today);
        record.record_view("c2", today);
        let mut history = Vec::new();
        record_week_tick(&mut history, now);

        db.merge_profile(&user, ProfilePatch::daily(&record).stamped(now))
            .unwrap();
        db.merge_profile(&user, ProfilePatch::week_history(history.clone()))
            .unwrap();
        let merged = db
            .merge_profile(&user, ProfilePatch::layout(LayoutSettings::default()))
            .unwrap();

        let stored = db.get_profile(&user).unwrap().unwrap();
        assert_eq!(stored, merged);
        assert_eq!(stored.quota.daily_views, 2);
        assert_eq!(stored.quota.last_reset_date, Some(today));
        assert!(stored.quota.is_viewed("c2"));
        assert_eq!(stored.quota.week_history, history);
        assert_eq!(stored.layout, Some(LayoutSettings::default()));
        assert_eq!(stored.last_updated, Some(now));
    }

    #[test]
    fn test_stale_merge_rolls_back() {
        let mut db = Database::open_in_memory().unwrap();
        let user = UserId::parse("user_7").unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();

        let mut current = QuotaRecord::default();
        current.record_view("c1", tuesday);
        db.merge_profile(&user, ProfilePatch::daily(&current)).unwrap();

        let mut stale = QuotaRecord::default();
        stale.reset(tuesday.pred_opt().unwrap());
        let result = db.merge_profile(&user, ProfilePatch::daily(&stale));

        assert!(matches!(result, Err(crate::StoreError::StaleWrite { .. })));
        let stored = db.get_profile(&user).unwrap().unwrap();
        assert_eq!(stored.quota.daily_views, 1);
    }
}
