//! bts-github-sync - one-way mirror of Debian BTS bugs into GitHub issues
//!
//! For each configured (Debian package, GitHub repository) pair, every open
//! bug becomes an issue titled `[<bug-id>] <subject>`, its mail log is
//! appended as issue comments, and the issue is closed once the bug is
//! resolved. Running the sync twice without upstream changes is a no-op.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): throttling, matching and reconciliation
//! - **Adapters** (`adapters`): Debbugs SOAP, GitHub REST and on-disk cache
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, retries
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    BugComment, BugLog, BugRecord, Config, IssueRecord, IssueState, RepositoryMapping,
};
pub use domain::ports::{BugCache, BugTracker, IssueHost};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Reconciler, SyncOptions, SyncReport, Throttler};
