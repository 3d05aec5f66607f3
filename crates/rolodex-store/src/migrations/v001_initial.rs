//! v001 -- Initial schema creation.
//!
//! Creates the `profiles` table: one row per user holding the quota
//! counters, the weekly histogram and layout preferences.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    user_id         TEXT PRIMARY KEY NOT NULL,  -- identity provider user id
    daily_views     INTEGER NOT NULL DEFAULT 0,
    last_reset_date TEXT,                       -- YYYY-MM-DD, NULL until first use
    viewed_ids      TEXT NOT NULL DEFAULT '[]', -- JSON array of record ids
    week_history    TEXT NOT NULL DEFAULT '[]', -- JSON array of week buckets
    layout_settings TEXT,                       -- JSON object, NULL for defaults
    last_updated    TEXT                        -- RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
