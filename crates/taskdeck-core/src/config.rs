//! Client configuration
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `TASKDECK_*` environment variables.

use crate::error::TaskDeckError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use taskdeck_gateway::LOGIN_PATH;
use taskdeck_query::{CacheConfig, RefetchPolicy, DEFAULT_MAX_ENTRIES};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default directory for local data
pub const DEFAULT_DATA_DIR: &str = ".taskdeck";

/// Environment variable overriding [`TaskDeckConfig::api_url`]
pub const ENV_API_URL: &str = "TASKDECK_API_URL";
/// Environment variable overriding [`TaskDeckConfig::data_dir`]
pub const ENV_DATA_DIR: &str = "TASKDECK_DATA_DIR";
/// Environment variable overriding [`TaskDeckConfig::timeout_secs`]
pub const ENV_TIMEOUT_SECS: &str = "TASKDECK_TIMEOUT_SECS";

/// TaskDeck client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDeckConfig {
    /// REST API base URL
    pub api_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Directory holding the activity log and preferences
    pub data_dir: PathBuf,
    /// Where an expired session is sent
    pub login_path: String,
    /// Query cache tuning
    pub cache: CacheSettings,
}

/// Query cache section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum cached keys
    pub max_entries: u64,
    /// Age in seconds after which a value counts as stale; unset means never
    pub stale_after_secs: Option<u64>,
    /// Minimum seconds between retries of a failed key; unset means retry
    /// only after invalidation
    pub retry_interval_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            stale_after_secs: None,
            retry_interval_secs: None,
        }
    }
}

impl Default for TaskDeckConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            login_path: LOGIN_PATH.to_string(),
            cache: CacheSettings::default(),
        }
    }
}

impl TaskDeckConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// With local data directory
    #[inline]
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// With cache settings
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: CacheSettings) -> Self {
        self.cache = cache;
        self
    }

    /// Parse a TOML document; missing fields keep their defaults.
    ///
    /// # Errors
    /// [`TaskDeckError::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(raw: &str) -> Result<Self, TaskDeckError> {
        let config: Self = toml::from_str(raw).map_err(|e| TaskDeckError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, then apply environment overrides.
    ///
    /// # Errors
    /// [`TaskDeckError::Config`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, TaskDeckError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| TaskDeckError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)?.with_env()
    }

    /// Defaults plus environment overrides
    ///
    /// # Errors
    /// [`TaskDeckError::Config`] when an override is invalid.
    pub fn from_env() -> Result<Self, TaskDeckError> {
        Self::default().with_env()
    }

    /// Apply `TASKDECK_*` variables from the process environment
    ///
    /// # Errors
    /// [`TaskDeckError::Config`] when an override is invalid.
    pub fn with_env(self) -> Result<Self, TaskDeckError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    ///
    /// # Errors
    /// [`TaskDeckError::Config`] when an override is invalid.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, TaskDeckError> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                TaskDeckError::Config(format!("{ENV_TIMEOUT_SECS} is not a number: {raw}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check values that serde cannot
    ///
    /// # Errors
    /// [`TaskDeckError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<(), TaskDeckError> {
        if self.api_url.trim().is_empty() {
            return Err(TaskDeckError::Config("api_url is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(TaskDeckError::Config("timeout_secs must be positive".into()));
        }
        if self.cache.max_entries == 0 {
            return Err(TaskDeckError::Config("cache.max_entries must be positive".into()));
        }
        Ok(())
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Query cache configuration
    #[must_use]
    pub fn cache_config(&self) -> CacheConfig {
        let mut config = CacheConfig::default().with_max_entries(self.cache.max_entries);
        if let Some(secs) = self.cache.stale_after_secs {
            config = config.with_stale_after(Duration::from_secs(secs));
        }
        if let Some(secs) = self.cache.retry_interval_secs {
            config = config.with_refetch(RefetchPolicy::MinInterval(Duration::from_secs(secs)));
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = TaskDeckConfig::default();
        assert_eq!(config.api_url, "http://localhost:5000/api/v1");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.login_path, "/login");

        let cache = config.cache_config();
        assert_eq!(cache.max_entries, 10_000);
        assert_eq!(cache.stale_after, None);
        assert_eq!(cache.refetch, RefetchPolicy::OnInvalidation);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TaskDeckConfig::from_toml_str(
            r#"
            api_url = "https://deck.example.com/api/v1"

            [cache]
            stale_after_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.api_url, "https://deck.example.com/api/v1");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.cache.max_entries, 10_000);
        assert_eq!(
            config.cache_config().stale_after,
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://api.test"),
            (ENV_DATA_DIR, "/tmp/deck"),
            (ENV_TIMEOUT_SECS, "5"),
        ]
        .into_iter()
        .collect();

        let config = TaskDeckConfig::default()
            .with_overrides(|name| env.get(name).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.api_url, "http://api.test");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/deck"));
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_timeout = TaskDeckConfig::default()
            .with_overrides(|name| (name == ENV_TIMEOUT_SECS).then(|| "soon".to_string()));
        assert!(matches!(bad_timeout, Err(TaskDeckError::Config(_))));

        assert!(TaskDeckConfig::from_toml_str("timeout_secs = 0").is_err());
        assert!(TaskDeckConfig::from_toml_str("api_url = [").is_err());
    }
}
