//! In-memory [`PageStore`] used by tests.

use super::PageStore;
use crate::error::CacheError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

#[derive(Default)]
pub struct MemoryStore {
    pages: Mutex<HashMap<String, (String, SystemTime)>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes performed through [`PageStore::write`].
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Seed an entry that appears to have been written `age` ago.
    pub fn insert_aged(&self, key: &str, body: &str, age: Duration) {
        let written = SystemTime::now() - age;
        self.pages
            .lock()
            .unwrap()
            .insert(key.to_string(), (body.to_string(), written));
    }
}

impl PageStore for MemoryStore {
    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.pages.lock().unwrap().contains_key(key))
    }

    async fn read(&self, key: &str) -> Result<String, CacheError> {
        self.pages
            .lock()
            .unwrap()
            .get(key)
            .map(|(body, _)| body.clone())
            .ok_or_else(|| CacheError::Miss {
                key: key.to_string(),
            })
    }

    async fn write(&self, key: &str, body: &str) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .insert(key.to_string(), (body.to_string(), SystemTime::now()));
        Ok(())
    }

    async fn age(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, written)| written.elapsed().unwrap_or_default()))
    }
}
