use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A JSON column could not be encoded or decoded.
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),

    /// Chrono parsing error.
    #[error("Date parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// A write carried a reset date older than the one already stored.
    #[error("Stale write: stored reset date {stored}, write carries {attempted}")]
    StaleWrite {
        stored: NaiveDate,
        attempted: NaiveDate,
    },

    /// The blocking worker running a database call failed.
    #[error("Store worker error: {0}")]
    Worker(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
