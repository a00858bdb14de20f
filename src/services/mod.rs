pub mod bug_source;
pub mod issue_matcher;
pub mod reconciler;
pub mod sync_report;
pub mod throttler;

pub use bug_source::BugSource;
pub use issue_matcher::{match_issues, IssueMatch};
pub use reconciler::{Reconciler, SyncOptions};
pub use sync_report::{BugOutcome, RepositoryStatus, RepositorySyncReport, SyncReport};
pub use throttler::{CallKind, Sleeper, Throttler, TokioSleeper};
