//! On-disk cache for tracker responses.
//!
//! One JSON document per key under the cache directory, each carrying its
//! own expiry timestamp. Expired entries are removed lazily on read.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::BugCache;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    expires_at: DateTime<Utc>,
    value: serde_json::Value,
}

/// File-backed [`BugCache`].
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a cache key onto a file name.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    async fn evict(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Failed to evict cache entry");
            }
        }
    }
}

#[async_trait]
impl BugCache for FileCache {
    async fn get(&self, key: &str) -> DomainResult<Option<serde_json::Value>> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::CacheFailed(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(key, error = %e, "Dropping corrupt cache entry");
                Self::evict(&path).await;
                return Ok(None);
            }
        };

        if entry.expires_at <= Utc::now() {
            Self::evict(&path).await;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) -> DomainResult<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| DomainError::CacheFailed(format!("Invalid cache TTL: {e}")))?;
        let entry = CacheEntry {
            expires_at: Utc::now() + ttl,
            value,
        };
        let bytes = serde_json::to_vec(&entry)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            DomainError::CacheFailed(format!("Failed to create {}: {e}", self.dir.display()))
        })?;

        // Write then rename so readers never observe a partial entry.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| DomainError::CacheFailed(format!("Failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| DomainError::CacheFailed(format!("Failed to write {}: {e}", path.display())))?;
        Ok(())
    }
}
