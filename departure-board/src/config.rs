//! Runtime configuration.
//!
//! All settings have defaults; `from_env` overrides the ones that usually
//! differ between deployments.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::store::StoreConfig;

/// Environment variable naming the zipped feed.
pub const ENV_FEED: &str = "DEPARTURES_FEED";

/// Environment variable naming the SQLite cache file.
pub const ENV_CACHE_DB: &str = "DEPARTURES_CACHE_DB";

/// Environment variable with the scan timeout in whole seconds.
pub const ENV_SCAN_TIMEOUT: &str = "DEPARTURES_SCAN_TIMEOUT_SECS";

/// Environment variable with the HTTP listen address.
pub const ENV_BIND: &str = "DEPARTURES_BIND";

/// An environment value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Configuration for the departure board and its server.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Path to the zipped feed.
    pub feed_path: PathBuf,

    /// Path to the SQLite stop-time cache.
    pub cache_path: PathBuf,

    /// Stop search results when the caller gives no limit.
    pub default_results_limit: usize,

    /// Departures returned when the caller gives no limit.
    pub default_departures_limit: usize,

    /// Upper bound on any caller-supplied limit.
    pub max_limit: usize,

    /// Cached rows read per requested departure before filtering.
    pub overfetch_factor: usize,

    /// Rows per INSERT when writing a stop's cache.
    pub insert_batch_rows: usize,

    /// Longest a single feed scan may run before the request fails.
    pub scan_timeout: Duration,

    /// Number of service days kept in memory.
    pub service_day_capacity: u64,

    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            feed_path: PathBuf::from("data/feed.zip"),
            cache_path: PathBuf::from("gtfs_cache.db"),
            default_results_limit: 12,
            default_departures_limit: 12,
            max_limit: 50,
            overfetch_factor: 20,
            insert_batch_rows: 4000,
            scan_timeout: Duration::from_secs(300),
            service_day_capacity: 4,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl BoardConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(path) = value(ENV_FEED) {
            config.feed_path = PathBuf::from(path);
        }
        if let Some(path) = value(ENV_CACHE_DB) {
            config.cache_path = PathBuf::from(path);
        }
        if let Some(secs) = value(ENV_SCAN_TIMEOUT) {
            let parsed: u64 = secs.trim().parse().map_err(|e| ConfigError {
                var: ENV_SCAN_TIMEOUT,
                value: secs.clone(),
                reason: format!("{e}"),
            })?;
            if parsed == 0 {
                return Err(ConfigError {
                    var: ENV_SCAN_TIMEOUT,
                    value: secs,
                    reason: "must be at least 1".to_string(),
                });
            }
            config.scan_timeout = Duration::from_secs(parsed);
        }
        if let Some(addr) = value(ENV_BIND) {
            config.bind_addr = addr.trim().parse().map_err(|e| ConfigError {
                var: ENV_BIND,
                value: addr.clone(),
                reason: format!("{e}"),
            })?;
        }

        Ok(config)
    }

    pub fn with_feed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.feed_path = path.into();
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn with_max_limit(mut self, max_limit: usize) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    pub fn with_overfetch_factor(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor.max(1);
        self
    }

    pub fn with_service_day_capacity(mut self, capacity: u64) -> Self {
        self.service_day_capacity = capacity;
        self
    }

    /// Clamp a caller-supplied limit, substituting `default` when absent.
    pub fn clamp_limit(&self, requested: Option<usize>, default: usize) -> usize {
        requested.unwrap_or(default).min(self.max_limit)
    }

    /// Settings for the stop-time store.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.cache_path).with_batch_rows(self.insert_batch_rows)
    }
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
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = BoardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.feed_path, PathBuf::from("data/feed.zip"));
        assert_eq!(config.cache_path, PathBuf::from("gtfs_cache.db"));
        assert_eq!(config.overfetch_factor, 20);
        assert_eq!(config.scan_timeout, Duration::from_secs(300));
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn environment_overrides() {
        let config = BoardConfig::from_lookup(lookup(&[
            (ENV_FEED, "/srv/feed.zip"),
            (ENV_CACHE_DB, "/var/cache/departures.db"),
            (ENV_SCAN_TIMEOUT, "30"),
            (ENV_BIND, "0.0.0.0:8080"),
        ]))
        .unwrap();
        assert_eq!(config.feed_path, PathBuf::from("/srv/feed.zip"));
        assert_eq!(config.cache_path, PathBuf::from("/var/cache/departures.db"));
        assert_eq!(config.scan_timeout, Duration::from_secs(30));
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = BoardConfig::from_lookup(lookup(&[(ENV_FEED, "  ")])).unwrap();
        assert_eq!(config.feed_path, PathBuf::from("data/feed.zip"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = BoardConfig::from_lookup(lookup(&[(ENV_SCAN_TIMEOUT, "soon")])).unwrap_err();
        assert_eq!(err.var, ENV_SCAN_TIMEOUT);

        let err = BoardConfig::from_lookup(lookup(&[(ENV_SCAN_TIMEOUT, "0")])).unwrap_err();
        assert_eq!(err.reason, "must be at least 1");

        let err = BoardConfig::from_lookup(lookup(&[(ENV_BIND, "localhost")])).unwrap_err();
        assert_eq!(err.var, ENV_BIND);
    }

    #[test]
    fn clamp_limit_applies_default_and_max() {
        let config = BoardConfig::default();
        assert_eq!(config.clamp_limit(None, 12), 12);
        assert_eq!(config.clamp_limit(Some(5), 12), 5);
        assert_eq!(config.clamp_limit(Some(500), 12), 50);
        assert_eq!(config.clamp_limit(Some(0), 12), 0);
    }
}
