//! Wire format of mirrored comments on the host.
//!
//! ```text
//! BTS_msg_id: <message-id>
//! BTS author: <author>
//!
//! <body>
//! ```
//!
//! The first line is the only persisted link back to the tracker message.

use super::bug::BugComment;

/// Prefix of the first line of every mirrored comment.
pub const MSG_ID_MARKER: &str = "BTS_msg_id:";

/// Prefix of the author line of every mirrored comment.
pub const AUTHOR_MARKER: &str = "BTS author:";

/// Render a tracker comment as a host comment body.
pub fn format_mirrored_comment(comment: &BugComment) -> String {
    format!(
        "{MSG_ID_MARKER} {}\n{AUTHOR_MARKER} {}\n\n{}",
        comment.msg_id,
        comment.author.as_deref().unwrap_or(""),
        comment.body
    )
}

/// Message id carried by a host comment, if it was mirrored from the tracker.
///
/// Comments written by humans on the host return `None`.
pub fn extract_mirrored_msg_id(body: &str) -> Option<&str> {
    let first_line = body.lines().next()?;
    let msg_id = first_line.strip_prefix(MSG_ID_MARKER)?.trim();
    (!msg_id.is_empty()).then_some(msg_id)
}
