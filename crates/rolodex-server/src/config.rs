//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use rolodex_shared::constants::{DAILY_LIMIT, DEFAULT_HTTP_PORT, DEFAULT_USER_HEADER};

/// Where user profiles are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// SQLite file on disk.
    Sqlite,
    /// Process memory; lost on restart.
    Memory,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Reveals allowed per user per day.
    /// Env: `DAILY_LIMIT`
    /// Default: `50`
    pub daily_limit: u32,

    /// Profile store backend.
    /// Env: `STORE_BACKEND` (`sqlite` / `memory`)
    /// Default: `sqlite`
    pub store_backend: StoreBackend,

    /// SQLite database file. `None` uses the platform data directory.
    /// Env: `DATABASE_PATH`
    pub database_path: Option<PathBuf>,

    /// CSV export of contact rows. `None` serves an empty list.
    /// Env: `CONTACTS_CSV`
    pub contacts_csv: Option<PathBuf>,

    /// CSV export of agency rows. `None` serves an empty list.
    /// Env: `AGENCIES_CSV`
    pub agencies_csv: Option<PathBuf>,

    /// Header carrying the authenticated user id, set by the identity
    /// provider's proxy in front of this server.
    /// Env: `USER_HEADER`
    /// Default: `x-user-id`
    pub user_header: String,

    /// Admin API bearer token. Required to access /admin/* endpoints.
    /// Env: `ADMIN_TOKEN`
    /// Default: empty (admin API disabled).
    pub admin_token: Option<String>,

    /// Sustained requests per second allowed per client.
    /// Env: `RATE_LIMIT_PER_SEC`
    /// Default: `10`
    pub rate_limit_per_sec: f64,

    /// Burst size of the per-client token bucket.
    /// Env: `RATE_LIMIT_BURST`
    /// Default: `30`
    pub rate_limit_burst: f64,

    /// Human-readable name for this server instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Rolodex"`
    pub instance_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            daily_limit: DAILY_LIMIT,
            store_backend: StoreBackend::Sqlite,
            database_path: None,
            contacts_csv: None,
            agencies_csv: None,
            user_header: DEFAULT_USER_HEADER.to_string(),
            admin_token: None,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
            instance_name: "Rolodex".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(val) = lookup("DAILY_LIMIT") {
            match val.parse::<u32>() {
                Ok(limit) if limit > 0 => config.daily_limit = limit,
                _ => tracing::warn!(value = %val, "Invalid DAILY_LIMIT, using default"),
            }
        }

        if let Some(val) = lookup("STORE_BACKEND") {
            match val.to_ascii_lowercase().as_str() {
                "sqlite" => config.store_backend = StoreBackend::Sqlite,
                "memory" => config.store_backend = StoreBackend::Memory,
                _ => tracing::warn!(value = %val, "Unknown STORE_BACKEND, using sqlite"),
            }
        }

        config.database_path = non_empty(lookup("DATABASE_PATH")).map(PathBuf::from);
        config.contacts_csv = non_empty(lookup("CONTACTS_CSV")).map(PathBuf::from);
        config.agencies_csv = non_empty(lookup("AGENCIES_CSV")).map(PathBuf::from);

        if let Some(header) = non_empty(lookup("USER_HEADER")) {
            config.user_header = header.to_ascii_lowercase();
        }

        config.admin_token = non_empty(lookup("ADMIN_TOKEN"));

        if let Some(val) = lookup("RATE_LIMIT_PER_SEC") {
            match val.parse::<f64>() {
                Ok(rate) if rate > 0.0 => config.rate_limit_per_sec = rate,
                _ => tracing::warn!(value = %val, "Invalid RATE_LIMIT_PER_SEC, using default"),
            }
        }

        if let Some(val) = lookup("RATE_LIMIT_BURST") {
            match val.parse::<f64>() {
                Ok(burst) if burst >= 1.0 => config.rate_limit_burst = burst,
                _ => tracing::warn!(value = %val, "Invalid RATE_LIMIT_BURST, using default"),
            }
        }

        if let Some(name) = non_empty(lookup("INSTANCE_NAME")) {
            config.instance_name = name;
        }

        config
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.daily_limit, 50);
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.user_header, "x-user-id");
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DAILY_LIMIT", "5"),
            ("STORE_BACKEND", "memory"),
            ("CONTACTS_CSV", "/data/contacts.csv"),
            ("USER_HEADER", "X-Auth-User"),
            ("ADMIN_TOKEN", "s3cret"),
        ]));

        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.daily_limit, 5);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.contacts_csv, Some(PathBuf::from("/data/contacts.csv")));
        assert_eq!(config.user_header, "x-auth-user");
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", "not an addr"),
            ("DAILY_LIMIT", "0"),
            ("STORE_BACKEND", "postgres"),
            ("ADMIN_TOKEN", "  "),
            ("RATE_LIMIT_BURST", "-3"),
        ]));

        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.daily_limit, 50);
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert!(config.admin_token.is_none());
        assert_eq!(config.rate_limit_burst, 30.0);
    }
}
