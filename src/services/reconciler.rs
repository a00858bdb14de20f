//! Reconciler: drives one (package, repository) pair to a consistent state.
//!
//! For every open bug of the package the reconciler makes sure that
//!
//! 1. a host issue titled `[<bug-id>] <subject>` with the sync label exists,
//! 2. every tracker comment is mirrored exactly once, in tracker order,
//! 3. the issue is closed iff the bug is resolved.
//!
//! Host comments are only ever appended. Every host call is followed by a
//! pass through the [`Throttler`]. In dry-run mode all reads still happen and
//! the intended mutations are logged instead of performed.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    extract_mirrored_msg_id, format_issue_title, format_mirrored_comment, BugComment, IssueRecord,
    IssueState, RepositoryMapping,
};
use crate::domain::ports::IssueHost;
use crate::services::bug_source::BugSource;
use crate::services::issue_matcher::{match_issues, IssueMatch};
use crate::services::sync_report::{BugOutcome, RepositoryStatus, RepositorySyncReport, SyncReport};
use crate::services::throttler::{CallKind, Throttler};

/// Behaviour switches of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Perform reads only; log the mutations that would happen.
    pub dry_run: bool,
    /// Create (and immediately close) issues for bugs resolved before they
    /// were ever mirrored.
    pub create_resolved_bugs: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            create_resolved_bugs: true,
        }
    }
}

/// Mirrors tracker bugs into host issues, one repository at a time.
pub struct Reconciler {
    bugs: BugSource,
    host: Arc<dyn IssueHost>,
    throttler: Throttler,
    options: SyncOptions,
}

impl Reconciler {
    /// Create a reconciler over the given bug source and host.
    pub fn new(
        bugs: BugSource,
        host: Arc<dyn IssueHost>,
        throttler: Throttler,
        options: SyncOptions,
    ) -> Self {
        Self {
            bugs,
            host,
            throttler,
            options,
        }
    }

    /// Sync every configured pair, in order.
    ///
    /// A failing repository never prevents the following ones from running.
    pub async fn run(&self, repositories: &[RepositoryMapping], sync_label: &str) -> SyncReport {
        let mut report = SyncReport::default();
        for mapping in repositories {
            let repo_report = self
                .sync(&mapping.debian_pkg, &mapping.github_repo, sync_label)
                .await;
            report.repositories.push(repo_report);
        }
        report
    }

    /// Mirror the open bugs of `package` into `repository`.
    #[instrument(skip(self))]
    pub async fn sync(
        &self,
        package: &str,
        repository: &str,
        sync_label: &str,
    ) -> RepositorySyncReport {
        let mut report = RepositorySyncReport::new(package, repository);

        match self
            .sync_repository(package, repository, sync_label, &mut report)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    issues_created = report.issues_created,
                    comments_created = report.comments_created,
                    state_changes = report.state_changes,
                    bugs_skipped = report.bugs_skipped,
                    "Repository sync complete"
                );
            }
            Err(err @ DomainError::LabelNotFound { .. }) => {
                tracing::error!(error = %err, "Sync label missing, skipping repository");
                report.status = RepositoryStatus::LabelMissing;
            }
            Err(err) => {
                tracing::error!(error = %err, "Repository sync aborted");
                report.status = RepositoryStatus::Failed(err.to_string());
            }
        }

        report
    }

    async fn sync_repository(
        &self,
        package: &str,
        repository: &str,
        sync_label: &str,
        report: &mut RepositorySyncReport,
    ) -> DomainResult<()> {
        tracing::debug!("Mirroring from {} to {}", package, repository);

        let bug_ids = self.bugs.list_open_bug_ids(package).await?;
        tracing::debug!("  {} bugs on the BTS", bug_ids.len());

        let label = self.host.get_label(repository, sync_label).await?;
        self.pace(CallKind::Read).await?;

        let issues = self.host.list_issues(repository).await?;
        self.pace(CallKind::Read).await?;

        let mut matched = match_issues(&issues, &label.name);
        report.duplicate_issues = matched.duplicates.len();
        report.malformed_titles = matched.malformed.len();
        tracing::debug!("  {} issues currently on GitHub", matched.len());

        for bug_id in bug_ids {
            tracing::info!("    processing {}: {}", package, bug_id);

            let mut outcome = BugOutcome::default();
            match self
                .apply_bug(bug_id, repository, &label.name, &mut matched, &mut outcome)
                .await
            {
                Ok(()) => report.record(&outcome),
                Err(err) if err.is_bug_scoped() => {
                    tracing::error!(bug_id, error = %err, "Skipping bug");
                    report.record_partial(&outcome);
                    report.record_skipped();
                }
                Err(err) => {
                    report.record_partial(&outcome);
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Bring the host issue of a single bug up to date.
    ///
    /// `existing` is the matcher output for the repository; issues created
    /// here are added to it.
    pub async fn sync_bug(
        &self,
        bug_id: u64,
        repository: &str,
        sync_label: &str,
        existing: &mut IssueMatch,
    ) -> DomainResult<BugOutcome> {
        let mut outcome = BugOutcome::default();
        self.apply_bug(bug_id, repository, sync_label, existing, &mut outcome)
            .await?;
        Ok(outcome)
    }

    /// Work of [`sync_bug`](Self::sync_bug). `outcome` reflects every
    /// mutation performed so far, including when an error is returned.
    async fn apply_bug(
        &self,
        bug_id: u64,
        repository: &str,
        sync_label: &str,
        existing: &mut IssueMatch,
        outcome: &mut BugOutcome,
    ) -> DomainResult<()> {
        let bug = self.bugs.get_bug(bug_id).await?;

        let issue = if let Some(issue) = existing.get(bug_id) {
            issue.clone()
        } else if bug.resolved && !self.options.create_resolved_bugs {
            tracing::info!(bug_id, "       bug already resolved, not creating an issue");
            outcome.skipped_resolved = true;
            return Ok(());
        } else if self.options.dry_run {
            tracing::info!(
                bug_id,
                title = %format_issue_title(bug_id, &bug.subject),
                "       not creating new issue (dry run)"
            );
            outcome.suppressed_actions += 1;
            return Ok(());
        } else {
            tracing::info!(bug_id, "       creating new issue");
            let title = format_issue_title(bug_id, &bug.subject);
            let created = self
                .host
                .create_issue(repository, &title, &[sync_label.to_string()])
                .await?;
            existing.insert(bug_id, created.clone());
            outcome.issue_created = true;
            outcome.issue = Some(created.number);
            self.pace(CallKind::Write).await?;
            created
        };
        outcome.issue = Some(issue.number);

        let bug_log = self.bugs.get_bug_comments(bug_id).await?;
        tracing::debug!(bug_id, "      {} comments on the BTS", bug_log.len());

        let host_comments = self.host.list_comments(repository, issue.number).await?;
        self.pace(CallKind::Read).await?;

        let mirrored: HashSet<&str> = host_comments
            .iter()
            .filter_map(|c| extract_mirrored_msg_id(&c.body))
            .collect();
        let missing: Vec<&BugComment> = bug_log
            .iter()
            .filter(|c| !mirrored.contains(c.msg_id.as_str()))
            .collect();
        tracing::debug!(bug_id, "      {} comments to be created", missing.len());

        for comment in missing {
            if self.options.dry_run {
                tracing::info!(
                    bug_id,
                    issue = issue.number,
                    msg_id = %comment.msg_id,
                    "    not creating comment (dry run)"
                );
                outcome.suppressed_actions += 1;
                continue;
            }

            let body = format_mirrored_comment(comment);
            self.host
                .create_comment(repository, issue.number, &body)
                .await?;
            outcome.comments_created += 1;
            self.pace(CallKind::Write).await?;
        }

        let target = IssueState::for_resolved(bug.resolved);
        if issue.state != target {
            if self.options.dry_run {
                tracing::info!(
                    bug_id,
                    issue = issue.number,
                    from = %issue.state,
                    to = %target,
                    "    not changing issue state (dry run)"
                );
                outcome.suppressed_actions += 1;
            } else {
                tracing::info!(
                    bug_id,
                    issue = issue.number,
                    from = %issue.state,
                    to = %target,
                    "    changing issue state"
                );
                self.host
                    .edit_issue_state(repository, issue.number, target)
                    .await?;
                existing.insert(
                    bug_id,
                    IssueRecord {
                        state: target,
                        ..issue
                    },
                );
                outcome.state_changed = true;
                self.pace(CallKind::Write).await?;
            }
        }

        Ok(())
    }

    async fn pace(&self, kind: CallKind) -> DomainResult<()> {
        let quota = self.host.remaining_quota().await?;
        self.throttler.wait_if_needed(quota, kind).await;
        Ok(())
    }
}
