//! GitHub Issues adapter.
//!
//! Implements the issue host port against the GitHub REST API v3.

pub mod client;
pub mod models;

pub use client::{GitHubClient, GitHubClientConfig};
