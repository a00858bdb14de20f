//! Read-through cache port for tracker data.
//!
//! The cache is never authoritative: a miss, an expired entry or a failing
//! backend all lead to a fresh tracker call.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

#[async_trait]
pub trait BugCache: Send + Sync {
    /// Cached value for `key`, if present and not expired.
    async fn get(&self, key: &str) -> DomainResult<Option<serde_json::Value>>;

    /// Store `value` under `key` for `ttl`.
    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) -> DomainResult<()>;
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl BugCache for NoopCache {
    async fn get(&self, _key: &str) -> DomainResult<Option<serde_json::Value>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: serde_json::Value, _ttl: Duration) -> DomainResult<()> {
        Ok(())
    }
}
