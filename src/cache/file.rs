//! Filesystem-backed [`PageStore`]: one file per key inside a directory.
//!
//! Writes go straight to the target file; there is no temp file or rename.

use super::PageStore;
use crate::error::CacheError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file that holds `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        key: key.to_string(),
        source,
    }
}

impl PageStore for FileStore {
    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        fs::try_exists(self.path_for(key))
            .await
            .map_err(io_error(key))
    }

    async fn read(&self, key: &str) -> Result<String, CacheError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::Miss {
                key: key.to_string(),
            }),
            Err(e) => Err(io_error(key)(e)),
        }
    }

    #[instrument(level = "debug", skip(self, body), fields(bytes = body.len()))]
    async fn write(&self, key: &str, body: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).await.map_err(io_error(key))?;
        let path = self.path_for(key);
        fs::write(&path, body).await.map_err(io_error(key))?;
        debug!(path = %path.display(), "Cached page");
        Ok(())
    }

    async fn age(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let metadata = match fs::metadata(self.path_for(key)).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(key)(e)),
        };
        let modified = metadata.modified().map_err(io_error(key))?;
        Ok(Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default(),
        ))
    }
}
