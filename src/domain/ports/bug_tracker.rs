//! Tracker port.
//!
//! Raw access to the upstream bug tracking system. Implementations return
//! tracker data as-is; header parsing and caching are done by
//! [`BugSource`](crate::services::bug_source::BugSource).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;

/// Status record of a bug as reported by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBugStatus {
    pub bug_num: u64,
    pub subject: String,
    /// Address of whoever closed the bug; empty while open.
    pub done: String,
    pub pending: String,
    pub archived: bool,
}

/// One entry of a bug log: raw mail header block and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogEntry {
    pub header: String,
    pub body: String,
}

#[async_trait]
pub trait BugTracker: Send + Sync {
    /// Numbers of non-archived bugs filed against `package`.
    async fn list_open_bug_ids(&self, package: &str) -> DomainResult<Vec<u64>>;

    /// Status of a single bug; `None` when the tracker knows nothing about it.
    async fn get_status(&self, bug_id: u64) -> DomainResult<Option<RawBugStatus>>;

    /// Full mail log of a bug, in chronological order.
    async fn get_bug_log(&self, bug_id: u64) -> DomainResult<Vec<RawLogEntry>>;
}
