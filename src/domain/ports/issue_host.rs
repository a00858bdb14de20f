//! Issue host port.
//!
//! Everything the reconciler needs from the collaborative issue host.
//! Repositories are addressed as `owner/name`.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{HostComment, IssueRecord, IssueState, Label, QuotaSnapshot};

#[async_trait]
pub trait IssueHost: Send + Sync {
    /// All issues of a repository, any state, pull requests excluded.
    async fn list_issues(&self, repository: &str) -> DomainResult<Vec<IssueRecord>>;

    /// Look up a label; fails with `LabelNotFound` when absent.
    async fn get_label(&self, repository: &str, name: &str) -> DomainResult<Label>;

    async fn create_issue(
        &self,
        repository: &str,
        title: &str,
        labels: &[String],
    ) -> DomainResult<IssueRecord>;

    /// Comments of an issue, oldest first.
    async fn list_comments(
        &self,
        repository: &str,
        issue_number: u64,
    ) -> DomainResult<Vec<HostComment>>;

    async fn create_comment(
        &self,
        repository: &str,
        issue_number: u64,
        body: &str,
    ) -> DomainResult<()>;

    async fn edit_issue_state(
        &self,
        repository: &str,
        issue_number: u64,
        state: IssueState,
    ) -> DomainResult<()>;

    /// Current request budget.
    async fn remaining_quota(&self) -> DomainResult<QuotaSnapshot>;
}
