//! GitHub Issues API response and request models.
//!
//! These structs map to the GitHub REST API v3 JSON payloads.
//! They are used internally by the GitHub client and are converted to the
//! domain models before leaving the adapter.

use serde::{Deserialize, Serialize};

use crate::domain::models::{HostComment, IssueRecord, IssueState};

/// An issue returned by the GitHub API.
///
/// Note: issues and pull requests share the same endpoint. Pull requests
/// include a non-null `pull_request` field; the client skips those.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssue {
    /// Sequential number within the repository (e.g., 42 → "#42").
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Current state: "open" or "closed".
    pub state: String,
    /// Labels applied to the issue.
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    /// Present when this item is actually a pull request, not an issue.
    #[serde(default)]
    pub pull_request: Option<GitHubPullRequestRef>,
}

impl From<GitHubIssue> for IssueRecord {
    fn from(issue: GitHubIssue) -> Self {
        let state = if issue.state.eq_ignore_ascii_case("closed") {
            IssueState::Closed
        } else {
            IssueState::Open
        };
        Self {
            number: issue.number,
            title: issue.title,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            state,
        }
    }
}

/// A label applied to a GitHub issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubLabel {
    /// The label name (e.g., "bug", "bts-sync").
    pub name: String,
}

/// Reference object present on pull requests (absent on plain issues).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubPullRequestRef {
    /// API URL of the pull request resource.
    #[serde(default)]
    pub url: Option<String>,
}

/// A comment on an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
}

impl From<GitHubComment> for HostComment {
    fn from(comment: GitHubComment) -> Self {
        Self {
            id: comment.id,
            body: comment.body.unwrap_or_default(),
        }
    }
}

/// Request body for posting a comment on an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommentRequest {
    /// The comment body (plain text or Markdown).
    pub body: String,
}

/// Request body for creating a new GitHub issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCreateIssueRequest {
    /// Issue title.
    pub title: String,
    /// Labels to apply to the new issue.
    pub labels: Vec<String>,
}

/// Request body for updating (patching) an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssueUpdateRequest {
    /// New state: "open" or "closed".
    pub state: String,
}

/// Response of `GET /rate_limit`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRateLimitResponse {
    pub resources: GitHubRateLimitResources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRateLimitResources {
    pub core: GitHubRateLimit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRateLimit {
    pub limit: u32,
    pub remaining: u32,
}
