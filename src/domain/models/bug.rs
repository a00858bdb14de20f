//! Tracker-side models: bug summaries and ordered comment logs.

use serde::{Deserialize, Serialize};

/// Snapshot of a tracker bug, fetched once per sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugRecord {
    /// Tracker-assigned bug number.
    pub id: u64,
    /// Bug subject line.
    pub subject: String,
    /// `true` once the bug is marked done on the tracker.
    pub resolved: bool,
    /// Whether the tracker has archived the bug.
    #[serde(default)]
    pub archived: bool,
    /// Raw pending status ("pending", "done", "forwarded", ...).
    #[serde(default)]
    pub pending: String,
}

/// One message of a bug log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugComment {
    /// Message-ID of the mail; dedup key when mirroring.
    pub msg_id: String,
    /// Sender, taken from the `From:` header when present.
    pub author: Option<String>,
    /// Message body, verbatim.
    pub body: String,
}

/// Ordered comment log of a bug, keyed by message id.
///
/// Iteration order is the order in which comments were inserted, which is
/// the chronological order reported by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugLog {
    entries: Vec<BugComment>,
}

impl BugLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a comment.
    ///
    /// Returns `false` (and leaves the log untouched) when a comment with the
    /// same message id is already present.
    pub fn insert(&mut self, comment: BugComment) -> bool {
        if self.contains(&comment.msg_id) {
            return false;
        }
        self.entries.push(comment);
        true
    }

    pub fn contains(&self, msg_id: &str) -> bool {
        self.entries.iter().any(|c| c.msg_id == msg_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BugComment> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a BugLog {
    type Item = &'a BugComment;
    type IntoIter = std::slice::Iter<'a, BugComment>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<BugComment> for BugLog {
    fn from_iter<I: IntoIterator<Item = BugComment>>(iter: I) -> Self {
        let mut log = Self::new();
        for comment in iter {
            log.insert(comment);
        }
        log
    }
}
