//! Issue title convention: `[<bug-id>] <subject>`.
//!
//! The host has no structured field to carry the bug id, so the
//! correspondence lives in the title. Both directions of the convention are
//! kept here so it can change without touching the reconciler.

use thiserror::Error;

/// Why a title could not be mapped back to a bug id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleParseError {
    #[error("title does not start with '['")]
    MissingOpeningBracket,

    #[error("title has no closing ']'")]
    MissingClosingBracket,

    #[error("bracketed prefix '{0}' is not a bug number")]
    InvalidBugId(String),
}

/// Build the host issue title for a bug.
pub fn format_issue_title(bug_id: u64, subject: &str) -> String {
    format!("[{bug_id}] {subject}")
}

/// Extract the bug id from an issue title.
///
/// The first character must be `[` and the text up to the first `]` must be
/// a base-10 integer (surrounding whitespace allowed). The rest is ignored.
pub fn parse_issue_title(title: &str) -> Result<u64, TitleParseError> {
    let rest = title
        .strip_prefix('[')
        .ok_or(TitleParseError::MissingOpeningBracket)?;
    let (prefix, _) = rest
        .split_once(']')
        .ok_or(TitleParseError::MissingClosingBracket)?;

    let digits = prefix.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TitleParseError::InvalidBugId(prefix.to_string()));
    }
    digits
        .parse::<u64>()
        .map_err(|_| TitleParseError::InvalidBugId(prefix.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_issue_title() {
        assert_eq!(format_issue_title(100, "crash on startup"), "[100] crash on startup");
    }

    #[test]
    fn test_parse_valid_titles() {
        assert_eq!(parse_issue_title("[42] segfault"), Ok(42));
        assert_eq!(parse_issue_title("[42]segfault"), Ok(42));
        assert_eq!(parse_issue_title("[ 7 ] padded"), Ok(7));
        assert_eq!(parse_issue_title("[123456]"), Ok(123_456));
    }

    #[test]
    fn test_parse_rejects_missing_opening_bracket() {
        assert_eq!(
            parse_issue_title("42 no brackets"),
            Err(TitleParseError::MissingOpeningBracket)
        );
        assert_eq!(
            parse_issue_title(" [42] leading space"),
            Err(TitleParseError::MissingOpeningBracket)
        );
        assert_eq!(parse_issue_title(""), Err(TitleParseError::MissingOpeningBracket));
    }

    #[test]
    fn test_parse_rejects_unterminated_prefix() {
        assert_eq!(
            parse_issue_title("[42 never closed"),
            Err(TitleParseError::MissingClosingBracket)
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric_prefix() {
        assert!(matches!(
            parse_issue_title("[abc] words"),
            Err(TitleParseError::InvalidBugId(p)) if p == "abc"
        ));
        assert!(matches!(
            parse_issue_title("[] empty"),
            Err(TitleParseError::InvalidBugId(_))
        ));
        assert!(matches!(
            parse_issue_title("[-5] negative"),
            Err(TitleParseError::InvalidBugId(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_title_roundtrip(bug_id in 1u64..=u64::MAX, subject in ".*") {
            let title = format_issue_title(bug_id, &subject);
            prop_assert_eq!(parse_issue_title(&title), Ok(bug_id));
        }

        #[test]
        fn prop_titles_without_bracket_are_rejected(title in "[^\\[].*") {
            prop_assert_eq!(
                parse_issue_title(&title),
                Err(TitleParseError::MissingOpeningBracket)
            );
        }
    }
}
