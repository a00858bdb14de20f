//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces implemented by the infrastructure adapters:
//! - BugTracker: raw Debian BTS access
//! - IssueHost: GitHub issue operations
//! - BugCache: read-through cache for tracker data
pub mod bug_tracker;
pub mod cache;
pub mod issue_host;

pub use bug_tracker::{BugTracker, RawBugStatus, RawLogEntry};
pub use cache::{BugCache, NoopCache};
pub use issue_host::IssueHost;
