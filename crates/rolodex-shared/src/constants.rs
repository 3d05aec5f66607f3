/// Application name
pub const APP_NAME: &str = "Rolodex";

/// Number of contact reveals a user may spend per calendar day
pub const DAILY_LIMIT: u32 = 50;

/// Maximum number of daily buckets kept in the weekly view history
pub const WEEK_HISTORY_CAPACITY: usize = 7;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Header injected by the upstream identity provider with the caller's user id
pub const DEFAULT_USER_HEADER: &str = "x-user-id";

/// Default and maximum page sizes for record listings
pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const MAX_PAGE_SIZE: usize = 200;

/// Per-call timeout applied by clients talking to the profile API, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
