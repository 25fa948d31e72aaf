//! Error types for each stage of a collection run.
//!
//! Every stage has its own enum so callers can tell a network failure from a
//! markup change from a filesystem problem. [`CollectError`] wraps them for
//! the orchestrator; `main` boxes whatever reaches it.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while retrieving a page over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failure while reading or writing the page cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cached page named {key}")]
    Miss { key: String },

    #[error("cache I/O on {key} failed: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// An expected element was not where the page layout puts it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing {element} (selector `{selector}`)")]
    Missing {
        element: &'static str,
        selector: String,
    },

    #[error("{element} has no `{attribute}` attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid base_url `{0}`")]
    BaseUrl(String),

    #[error("concurrency must be at least 1")]
    Concurrency,

    #[error("cache_policy `max_age` needs cache_max_age_secs")]
    MaxAge,
}

/// Anything that can stop a collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("{page}: {source}")]
    Extract {
        page: String,
        #[source]
        source: ExtractError,
    },

    #[error("article link `{0}` has no path segment to name its cache file")]
    InvalidLink(String),

    #[error("article link `{link}` points off-site to {url}")]
    ForeignLink { link: String, url: String },

    #[error("cannot build URL from `{link}`: {source}")]
    Url {
        link: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type CollectResult<T> = Result<T, CollectError>;
