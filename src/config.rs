//! Run configuration.
//!
//! Every setting has a default matching the plain behaviour of the tool, so
//! the config file is optional and may set any subset of keys:
//!
//! ```yaml
//! base_url: https://montrealgazette.com
//! cache_dir: ./cache
//! cache_policy: max_age
//! cache_max_age_secs: 3600
//! concurrency: 4
//! failure_policy: skip
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://montrealgazette.com";
pub const DEFAULT_HOMEPAGE_PATH: &str = "/category/news/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// How the cache decides whether an existing page can be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Any existing entry is considered fresh.
    Existence,
    /// Entries older than `cache_max_age_secs` are fetched again.
    MaxAge,
    /// Always fetch, overwriting the entry.
    Refresh,
}

/// Resolved form of [`CacheMode`] and its age limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    Existence,
    MaxAge(Duration),
    Refresh,
}

/// What happens when a single article cannot be collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run; nothing is written.
    #[default]
    Abort,
    /// Log the failure and leave the article out of the output.
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorConfig {
    pub base_url: String,
    pub homepage_path: String,
    pub user_agent: String,
    pub cache_dir: PathBuf,
    pub cache_policy: CacheMode,
    pub cache_max_age_secs: Option<u64>,
    /// Fetch the homepage on every run regardless of `cache_policy`.
    pub refresh_homepage: bool,
    /// Number of articles fetched and extracted at once.
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            homepage_path: DEFAULT_HOMEPAGE_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_dir: PathBuf::from("."),
            cache_policy: CacheMode::Existence,
            cache_max_age_secs: None,
            refresh_homepage: false,
            concurrency: 1,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl CollectorConfig {
    /// Load the config file at `path`, or the defaults when no path is given.
    ///
    /// The result is validated before it is returned.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!(path = %path.display(), "Loaded configuration");
                config
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML text. An empty document yields the defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base()?;
        if self.concurrency == 0 {
            return Err(ConfigError::Concurrency);
        }
        self.cache_policy()?;
        Ok(())
    }

    /// The site root that homepage and article links are resolved against.
    pub fn base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::BaseUrl(self.base_url.clone()))
    }

    pub fn homepage_url(&self) -> Result<Url, ConfigError> {
        self.base()?
            .join(&self.homepage_path)
            .map_err(|_| ConfigError::BaseUrl(format!("{}{}", self.base_url, self.homepage_path)))
    }

    pub fn cache_policy(&self) -> Result<CachePolicy, ConfigError> {
        match (self.cache_policy, self.cache_max_age_secs) {
            (CacheMode::Existence, _) => Ok(CachePolicy::Existence),
            (CacheMode::Refresh, _) => Ok(CachePolicy::Refresh),
            (CacheMode::MaxAge, Some(secs)) => Ok(CachePolicy::MaxAge(Duration::from_secs(secs))),
            (CacheMode::MaxAge, None) => Err(ConfigError::MaxAge),
        }
    }

    /// Policy applied to the homepage, which may be forced to refresh.
    pub fn homepage_policy(&self) -> Result<CachePolicy, ConfigError> {
        if self.refresh_homepage {
            Ok(CachePolicy::Refresh)
        } else {
            self.cache_policy()
        }
    }
}
