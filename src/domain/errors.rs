//! Domain errors for the BTS to GitHub sync.

use thiserror::Error;

/// Domain-level errors that can occur while mirroring bugs.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No BTS data for bug #{0}")]
    BugNotFound(u64),

    #[error("Label '{label}' not found in {repository}: create such a label on GitHub")]
    LabelNotFound { repository: String, label: String },

    #[error("Tracker request failed: {0}")]
    TrackerFailed(String),

    #[error("Host request failed ({status:?}): {message}")]
    HostFailed {
        status: Option<u16>,
        message: String,
        /// Set when the host flagged the response as rate limited.
        rate_limited: bool,
    },

    /// The connection failed before the request left the client.
    #[error("Host unreachable: {0}")]
    HostUnreachable(String),

    #[error("Parse failed: {0}")]
    ParseFailed(String),

    #[error("Cache error: {0}")]
    CacheFailed(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Build a host failure from a transport error (no HTTP status).
    pub fn host_transport(message: impl Into<String>) -> Self {
        Self::HostFailed {
            status: None,
            message: message.into(),
            rate_limited: false,
        }
    }

    /// Whether this error only concerns the bug being processed.
    ///
    /// Bug-scoped errors skip a single bug; anything else terminates the
    /// repository pass.
    pub const fn is_bug_scoped(&self) -> bool {
        matches!(
            self,
            Self::BugNotFound(_) | Self::TrackerFailed(_) | Self::ParseFailed(_)
        )
    }

    /// Whether retrying the same host call may succeed.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::HostFailed {
                status,
                rate_limited,
                ..
            } => match status {
                None => true,
                Some(code) => *code >= 500 || *rate_limited,
            },
            Self::HostUnreachable(_) => true,
            _ => false,
        }
    }

    /// Whether a non-idempotent host call can be sent again.
    ///
    /// Only failures proving the host never applied the write qualify: the
    /// connection was never established, or the request was rejected by
    /// rate limiting.
    pub const fn is_resend_safe(&self) -> bool {
        matches!(
            self,
            Self::HostUnreachable(_)
                | Self::HostFailed {
                    rate_limited: true,
                    ..
                }
        )
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(status: Option<u16>, rate_limited: bool) -> DomainError {
        DomainError::HostFailed {
            status,
            message: "boom".to_string(),
            rate_limited,
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(host(None, false).is_transient());
        assert!(host(Some(502), false).is_transient());
        assert!(host(Some(403), true).is_transient());
        assert!(host(Some(429), true).is_transient());
        assert!(!host(Some(404), false).is_transient());
        assert!(!host(Some(422), false).is_transient());
        assert!(DomainError::HostUnreachable("refused".into()).is_transient());
        assert!(!DomainError::BugNotFound(1).is_transient());
    }

    #[test]
    fn test_resend_safe_classification() {
        assert!(DomainError::HostUnreachable("refused".into()).is_resend_safe());
        assert!(host(Some(429), true).is_resend_safe());
        assert!(host(Some(403), true).is_resend_safe());
        assert!(!host(None, false).is_resend_safe());
        assert!(!host(Some(502), false).is_resend_safe());
        assert!(!host(Some(403), false).is_resend_safe());
    }

    #[test]
    fn test_bug_scoped_classification() {
        assert!(DomainError::BugNotFound(7).is_bug_scoped());
        assert!(DomainError::TrackerFailed("x".into()).is_bug_scoped());
        assert!(!host(Some(500), false).is_bug_scoped());
        assert!(!DomainError::LabelNotFound {
            repository: "o/r".into(),
            label: "bts".into()
        }
        .is_bug_scoped());
    }

    #[test]
    fn test_label_not_found_message_is_actionable() {
        let err = DomainError::LabelNotFound {
            repository: "org/repo".into(),
            label: "bts-sync".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("bts-sync"));
        assert!(msg.contains("org/repo"));
        assert!(msg.contains("create"));
    }
}
