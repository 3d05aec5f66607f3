//! Client session configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use rolodex_shared::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_HEADER};
use rolodex_shared::types::UserId;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root URL of the profile API, e.g. `http://localhost:8080`.
    pub base_url: String,

    /// Signed-in user. Sent in `user_header` on every request.
    pub user_id: UserId,

    pub user_header: String,

    /// Per-call timeout; an expired call is reported as transient.
    pub timeout: Duration,

    /// Where the quota snapshot is mirrored on device. `None` keeps it in
    /// memory only.
    pub cache_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, user_id: UserId) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
            user_header: DEFAULT_USER_HEADER.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_path: None,
        }
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Mirror the snapshot under the platform data directory, one file per
    /// user. Leaves the config unchanged if no home directory is known.
    pub fn with_default_cache(mut self) -> Self {
        if let Some(dirs) = ProjectDirs::from("com", "rolodex", "rolodex") {
            let name: String = self
                .user_id
                .as_str()
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            self.cache_path = Some(dirs.data_dir().join(format!("quota-{name}.json")));
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
