//! Pacing of calls to the issue host.
//!
//! The host enforces two independent limits: an hourly request quota and an
//! abuse limiter that reacts to bursts of content-creating requests. The
//! [`Throttler`] is consulted after every host call and suspends the flow:
//!
//! - for a long cooldown once the remaining quota drops below a low-water
//!   mark;
//! - otherwise for `total * backoff_factor / remaining` seconds, so the less
//!   headroom is left the slower the sync goes;
//! - plus a fixed delay after every write.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::models::{QuotaSnapshot, ThrottleConfig};

/// Sleep primitive, injectable so the policy can be tested without delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Whether a host call only read data or created/changed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Read,
    Write,
}

/// Host request pacing policy.
#[derive(Clone)]
pub struct Throttler {
    config: ThrottleConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for Throttler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Throttler {
    /// Create a throttler sleeping on the tokio timer.
    pub fn new(config: ThrottleConfig) -> Self {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: ThrottleConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, sleeper }
    }

    /// Delay owed after a call of `kind`, given the quota it left behind.
    pub fn delay_for(&self, quota: QuotaSnapshot, kind: CallKind) -> Duration {
        if quota.remaining < self.config.low_water_mark || quota.remaining == 0 {
            return Duration::from_secs(self.config.cooldown_secs);
        }

        let mut delay = if quota.total == 0 {
            Duration::ZERO
        } else {
            let secs =
                f64::from(quota.total) * self.config.backoff_factor / f64::from(quota.remaining);
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
        };

        if kind == CallKind::Write {
            delay += Duration::from_millis(self.config.write_delay_ms);
        }
        delay
    }

    /// Suspend the caller for as long as the policy requires.
    pub async fn wait_if_needed(&self, quota: QuotaSnapshot, kind: CallKind) {
        let delay = self.delay_for(quota, kind);

        if quota.remaining < self.config.low_water_mark || quota.remaining == 0 {
            tracing::info!(
                remaining = quota.remaining,
                total = quota.total,
                sleep_secs = delay.as_secs(),
                "Rate limit critical, pausing host calls"
            );
        } else {
            tracing::trace!(
                remaining = quota.remaining,
                total = quota.total,
                kind = ?kind,
                sleep_ms = delay.as_millis() as u64,
                "Throttling host call"
            );
        }

        if !delay.is_zero() {
            self.sleeper.sleep(delay).await;
        }
    }
}
