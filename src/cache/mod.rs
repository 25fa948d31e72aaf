//! Page cache keyed by derived filename.
//!
//! Storage is behind the [`PageStore`] trait so the collector can run against
//! the filesystem ([`FileStore`]) or an in-memory map in tests. [`PageCache`]
//! adds the freshness policy and makes sure a key is fetched and written at
//! most once per run, even when several articles are in flight.
//!
//! | Policy | Reuses an existing entry when |
//! |--------|-------------------------------|
//! | `Existence` | it exists |
//! | `MaxAge(d)` | it exists and was written less than `d` ago |
//! | `Refresh` | never (but only fetched once per run) |

pub mod file;
#[cfg(test)]
pub mod memory;

pub use file::FileStore;

use crate::config::CachePolicy;
use crate::error::{CacheError, CollectResult};
use crate::fetcher::Fetch;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Minimal key-value storage for page markup.
pub trait PageStore {
    async fn has(&self, key: &str) -> Result<bool, CacheError>;

    /// Full text of the entry, or [`CacheError::Miss`] if absent.
    async fn read(&self, key: &str) -> Result<String, CacheError>;

    /// Store `body` under `key`, replacing any previous entry.
    async fn write(&self, key: &str, body: &str) -> Result<(), CacheError>;

    /// Time since the entry was written, `None` if absent.
    async fn age(&self, key: &str) -> Result<Option<Duration>, CacheError>;
}

/// A [`PageStore`] plus per-key coordination for one run.
pub struct PageCache<S> {
    store: S,
    /// One async lock per key; the flag records a fetch made during this run.
    keys: Mutex<HashMap<String, Arc<tokio::sync::Mutex<bool>>>>,
}

impl<S: PageStore> PageCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            keys: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<bool>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(keys.entry(key.to_string()).or_default())
    }

    async fn is_fresh(&self, key: &str, policy: CachePolicy) -> Result<bool, CacheError> {
        match policy {
            CachePolicy::Existence => self.store.has(key).await,
            CachePolicy::MaxAge(max_age) => {
                Ok(matches!(self.store.age(key).await?, Some(age) if age <= max_age))
            }
            CachePolicy::Refresh => Ok(false),
        }
    }

    /// Make sure `key` holds the page at `url`, fetching it only if the policy
    /// says the current entry can't be reused.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Used when the entry must be (re)fetched
    /// * `key` - Cache filename, e.g. `homepage.html`
    /// * `url` - Absolute URL of the page
    /// * `policy` - Decides whether an existing entry is reused
    ///
    /// # Returns
    ///
    /// `true` when a fetch happened, `false` on a cache hit. Fetch and store
    /// failures are returned unchanged.
    #[instrument(level = "info", skip(self, fetcher))]
    pub async fn ensure<F: Fetch>(
        &self,
        fetcher: &F,
        key: &str,
        url: &str,
        policy: CachePolicy,
    ) -> CollectResult<bool> {
        let lock = self.key_lock(key);
        let mut fetched_this_run = lock.lock().await;

        if *fetched_this_run || self.is_fresh(key, policy).await? {
            debug!("Cache hit");
            return Ok(false);
        }

        info!("Cache miss; fetching");
        let body = fetcher.fetch(url).await?;
        self.store.write(key, &body).await?;
        *fetched_this_run = true;
        Ok(true)
    }

    /// Cached markup for `key`, or [`CacheError::Miss`].
    pub async fn read(&self, key: &str) -> Result<String, CacheError> {
        self.store.read(key).await
    }
}
