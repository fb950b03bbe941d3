//! Per-server retry policy and cancellable backoff

use std::time::Duration;

use dirauth_core::config::RetrySettings;
use tokio_util::sync::CancellationToken;

/// Retries beyond the first attempt against one server
pub const MAX_RETRIES_PER_SERVER: u32 = 2;

/// First backoff delay; doubles on every further retry
pub const BACKOFF_BASE_MILLIS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES_PER_SERVER,
            backoff_base: Duration::from_millis(BACKOFF_BASE_MILLIS),
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries_per_server,
            backoff_base: Duration::from_millis(settings.backoff_base_millis),
        }
    }
}

impl RetryPolicy {
    /// Whether a server may be tried again after `failures` transient failures
    pub fn allows_retry(&self, failures: u32) -> bool {
        failures <= self.max_retries
    }

    /// Delay before retry number `retry` (1-based): base, 2x base, 4x base, ...
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }
}

/// How a backoff delay ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Elapsed,
    Cancelled,
}

/// Sleep for `delay` unless `cancel` fires first
pub async fn backoff_delay(delay: Duration, cancel: Option<&CancellationToken>) -> Backoff {
    match cancel {
        Some(token) => {
            tokio::select! {
                _ = token.cancelled() => Backoff::Cancelled,
                _ = tokio::time::sleep(delay) => Backoff::Elapsed,
            }
        }
        None => {
            tokio::time::sleep(delay).await;
            Backoff::Elapsed
        }
    }
}
