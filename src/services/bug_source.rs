//! Bug Source: tracker facade used by the reconciler.
//!
//! Wraps a [`BugTracker`] with a read-through [`BugCache`] and turns raw
//! tracker payloads into [`BugRecord`]s and ordered [`BugLog`]s. Log entries
//! whose header carries no `Message-ID` cannot be deduplicated and are
//! dropped with a warning.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BugComment, BugLog, BugRecord};
use crate::domain::ports::{BugCache, BugTracker, RawBugStatus, RawLogEntry};

/// Cached, parsed view of the bug tracker.
pub struct BugSource {
    tracker: Arc<dyn BugTracker>,
    cache: Arc<dyn BugCache>,
    ttl: Duration,
}

impl BugSource {
    /// Wrap `tracker`, keeping fetched data in `cache` for `ttl`.
    pub fn new(tracker: Arc<dyn BugTracker>, cache: Arc<dyn BugCache>, ttl: Duration) -> Self {
        Self {
            tracker,
            cache,
            ttl,
        }
    }

    /// Non-archived bug numbers of a package, in tracker order.
    pub async fn list_open_bug_ids(&self, package: &str) -> DomainResult<Vec<u64>> {
        let key = format!("bts_bug_numbers:{package}");
        self.cached(&key, || self.tracker.list_open_bug_ids(package))
            .await
    }

    /// Summary of a bug; `BugNotFound` when the tracker has no record.
    pub async fn get_bug(&self, bug_id: u64) -> DomainResult<BugRecord> {
        let key = format!("bts_bug:{bug_id}");
        self.cached(&key, || async {
            let status = self
                .tracker
                .get_status(bug_id)
                .await?
                .ok_or(DomainError::BugNotFound(bug_id))?;
            Ok(bug_record_from_status(bug_id, status))
        })
        .await
    }

    /// Ordered comment log of a bug.
    pub async fn get_bug_comments(&self, bug_id: u64) -> DomainResult<BugLog> {
        let key = format!("bts_log:{bug_id}");
        self.cached(&key, || async {
            let entries = self.tracker.get_bug_log(bug_id).await?;
            Ok(build_bug_log(bug_id, &entries))
        })
        .await
    }

    async fn cached<T, F, Fut>(&self, key: &str, fetch: F) -> DomainResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        match self.cache.get(key).await {
            Ok(Some(value)) => match serde_json::from_value::<T>(value) {
                Ok(hit) => {
                    tracing::trace!(key, "Cache hit");
                    return Ok(hit);
                }
                Err(e) => tracing::warn!(key, error = %e, "Discarding unreadable cache entry"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(key, error = %e, "Cache lookup failed, fetching from tracker"),
        }

        let fresh = fetch().await?;

        match serde_json::to_value(&fresh) {
            Ok(value) => {
                if let Err(e) = self.cache.put(key, value, self.ttl).await {
                    tracing::warn!(key, error = %e, "Cache store failed");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "Cannot serialize value for cache"),
        }

        Ok(fresh)
    }
}

fn bug_record_from_status(bug_id: u64, status: RawBugStatus) -> BugRecord {
    BugRecord {
        id: bug_id,
        subject: status.subject,
        resolved: !status.done.trim().is_empty(),
        archived: status.archived,
        pending: status.pending,
    }
}

fn build_bug_log(bug_id: u64, entries: &[RawLogEntry]) -> BugLog {
    let mut log = BugLog::new();

    for entry in entries {
        let Some(msg_id) = extract_msg_id(&entry.header) else {
            tracing::warn!(bug_id, "Message-ID not found in comment, skipping it");
            for line in entry.header.lines() {
                tracing::warn!(bug_id, "    {}", line);
            }
            continue;
        };

        let comment = BugComment {
            msg_id: msg_id.to_string(),
            author: extract_author(&entry.header).map(str::to_string),
            body: entry.body.clone(),
        };
        if !log.insert(comment) {
            tracing::debug!(bug_id, msg_id, "Duplicate Message-ID in bug log, keeping first");
        }
    }

    log
}

/// Value of a mail header, following RFC 5322 folded continuation lines.
fn header_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    let mut lines = header.lines();
    while let Some(line) = lines.next() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim_end().eq_ignore_ascii_case(name) {
            continue;
        }
        let value = value.trim();
        if !value.is_empty() {
            return Some(value);
        }
        return lines
            .next()
            .filter(|next| next.starts_with([' ', '\t']))
            .map(str::trim)
            .filter(|next| !next.is_empty());
    }
    None
}

/// Message id of a bug log entry, from its `Message-ID:` header.
pub fn extract_msg_id(header: &str) -> Option<&str> {
    header_value(header, "Message-ID")
}

/// Sender of a bug log entry, from its `From:` header.
pub fn extract_author(header: &str) -> Option<&str> {
    header_value(header, "From")
}
