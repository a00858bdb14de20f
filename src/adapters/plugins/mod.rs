//! Clients for the external systems the sync talks to.
//!
//! Each sub-module wraps one remote API and implements the matching domain
//! port trait directly.

pub mod debbugs;
pub mod github_issues;

pub use debbugs::DebbugsClient;
pub use github_issues::{GitHubClient, GitHubClientConfig};
