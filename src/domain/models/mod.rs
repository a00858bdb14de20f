pub mod bug;
pub mod comment_marker;
pub mod config;
pub mod issue;
pub mod title;

pub use bug::{BugComment, BugLog, BugRecord};
pub use comment_marker::{extract_mirrored_msg_id, format_mirrored_comment};
pub use config::{
    CacheConfig, Config, DebbugsConfig, GitHubConfig, LoggingConfig, RepositoryMapping,
    RetryConfig, SyncPolicyConfig, ThrottleConfig,
};
pub use issue::{HostComment, IssueRecord, IssueState, Label, QuotaSnapshot};
pub use title::{format_issue_title, parse_issue_title, TitleParseError};
