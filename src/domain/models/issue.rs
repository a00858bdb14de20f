//! Host-side models: issues, labels, comments and quota.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Open/closed state of a host issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// Target host state for a tracker bug.
    pub const fn for_resolved(resolved: bool) -> Self {
        if resolved {
            Self::Closed
        } else {
            Self::Open
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issue on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Repository-scoped issue number.
    pub number: u64,
    pub title: String,
    /// Label names applied to the issue.
    pub labels: Vec<String>,
    pub state: IssueState,
}

impl IssueRecord {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

/// A repository label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// A comment on a host issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostComment {
    pub id: u64,
    pub body: String,
}

/// Remaining host request budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub remaining: u32,
    pub total: u32,
}

impl QuotaSnapshot {
    pub const fn new(remaining: u32, total: u32) -> Self {
        Self { remaining, total }
    }

    /// Budget of a host that does not enforce a request quota.
    pub const fn unlimited() -> Self {
        Self::new(u32::MAX, 0)
    }
}
