//! Issue Matcher: which host issue mirrors which tracker bug.
//!
//! Pure derivation over a repository's issue list. Only issues carrying the
//! sync label take part; their bug id is read back from the title. When
//! several issues claim the same bug the lowest issue number wins and the
//! others are reported, never merged or closed.

use std::collections::BTreeMap;

use crate::domain::models::{parse_issue_title, IssueRecord};

/// Second issue found for a bug that already has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateIssue {
    pub bug_id: u64,
    /// Issue number kept as the mirror of `bug_id`.
    pub kept: u64,
    /// Issue number left unmirrored.
    pub duplicate: u64,
}

/// Labelled issue whose title does not follow `[<bug-id>] <subject>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTitle {
    pub issue: u64,
    pub title: String,
    pub reason: String,
}

/// Result of matching a repository's issues against bug ids.
#[derive(Debug, Clone, Default)]
pub struct IssueMatch {
    issues: BTreeMap<u64, IssueRecord>,
    pub duplicates: Vec<DuplicateIssue>,
    pub malformed: Vec<MalformedTitle>,
}

impl IssueMatch {
    /// Issue mirroring `bug_id`, if any.
    pub fn get(&self, bug_id: u64) -> Option<&IssueRecord> {
        self.issues.get(&bug_id)
    }

    /// Record an issue created during this pass.
    pub fn insert(&mut self, bug_id: u64, issue: IssueRecord) {
        self.issues.insert(bug_id, issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Bug ids with a mirrored issue, ascending.
    pub fn bug_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.issues.keys().copied()
    }
}

/// Map bug ids to the host issues that mirror them.
pub fn match_issues(issues: &[IssueRecord], sync_label: &str) -> IssueMatch {
    let mut labelled: Vec<&IssueRecord> = issues.iter().filter(|i| i.has_label(sync_label)).collect();
    labelled.sort_by_key(|i| i.number);

    let mut result = IssueMatch::default();

    for issue in labelled {
        let bug_id = match parse_issue_title(&issue.title) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    issue = issue.number,
                    title = %issue.title,
                    reason = %e,
                    "Unable to parse bug number from issue title, skipping"
                );
                result.malformed.push(MalformedTitle {
                    issue: issue.number,
                    title: issue.title.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if let Some(kept) = result.issues.get(&bug_id) {
            tracing::warn!(
                bug_id,
                kept = kept.number,
                duplicate = issue.number,
                "Duplicate issues mirror the same bug, keeping the lowest-numbered one"
            );
            result.duplicates.push(DuplicateIssue {
                bug_id,
                kept: kept.number,
                duplicate: issue.number,
            });
            continue;
        }

        result.issues.insert(bug_id, issue.clone());
    }

    result
}
