//! Outcome bookkeeping for sync passes.

use serde::Serialize;

/// What happened to one bug during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BugOutcome {
    /// Issue mirroring the bug, when one exists (or was just created).
    pub issue: Option<u64>,
    pub issue_created: bool,
    pub comments_created: usize,
    pub state_changed: bool,
    /// Mutations logged but not performed because of dry-run mode.
    pub suppressed_actions: usize,
    /// Resolved bug left alone because it was never mirrored.
    pub skipped_resolved: bool,
}

/// How a repository pass ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum RepositoryStatus {
    Completed,
    /// The sync label does not exist on the repository.
    LabelMissing,
    /// Aborted by a host or tracker failure.
    Failed(String),
}

/// Counters for one (package, repository) pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySyncReport {
    pub package: String,
    pub repository: String,
    pub status: RepositoryStatus,
    pub bugs_seen: usize,
    pub bugs_skipped: usize,
    pub issues_created: usize,
    pub comments_created: usize,
    pub state_changes: usize,
    pub suppressed_actions: usize,
    pub duplicate_issues: usize,
    pub malformed_titles: usize,
}

impl RepositorySyncReport {
    pub fn new(package: &str, repository: &str) -> Self {
        Self {
            package: package.to_string(),
            repository: repository.to_string(),
            status: RepositoryStatus::Completed,
            bugs_seen: 0,
            bugs_skipped: 0,
            issues_created: 0,
            comments_created: 0,
            state_changes: 0,
            suppressed_actions: 0,
            duplicate_issues: 0,
            malformed_titles: 0,
        }
    }

    /// Fold a bug outcome into the counters.
    pub fn record(&mut self, outcome: &BugOutcome) {
        self.bugs_seen += 1;
        if outcome.skipped_resolved {
            self.bugs_skipped += 1;
        }
        self.record_partial(outcome);
    }

    /// Count the mutations of a bug whose sync did not complete.
    pub fn record_partial(&mut self, outcome: &BugOutcome) {
        if outcome.issue_created {
            self.issues_created += 1;
        }
        if outcome.state_changed {
            self.state_changes += 1;
        }
        self.comments_created += outcome.comments_created;
        self.suppressed_actions += outcome.suppressed_actions;
    }

    pub fn record_skipped(&mut self) {
        self.bugs_seen += 1;
        self.bugs_skipped += 1;
    }

    /// Host mutations performed during the pass.
    pub const fn mutations(&self) -> usize {
        self.issues_created + self.comments_created + self.state_changes
    }
}

/// Outcome of a whole run over all configured repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub repositories: Vec<RepositorySyncReport>,
}

impl SyncReport {
    /// `false` when any repository pass was aborted by a failure.
    ///
    /// A missing sync label is an operator action item, not a failure.
    pub fn is_success(&self) -> bool {
        self.repositories
            .iter()
            .all(|r| !matches!(r.status, RepositoryStatus::Failed(_)))
    }

    pub fn mutations(&self) -> usize {
        self.repositories.iter().map(RepositorySyncReport::mutations).sum()
    }
}
