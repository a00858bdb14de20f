//! Infrastructure layer module
//!
//! Cross-cutting plumbing used by the adapters and the binary:
//! - Configuration management
//! - Logging infrastructure
//! - Retry policy for host requests

pub mod config;
pub mod logging;
pub mod retry;
