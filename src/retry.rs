// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Retry policy applied around cluster calls.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Bounded retry with exponential backoff.
///
/// The same policy value is injected into every component that talks to the
/// cluster, instead of hardcoding attempt counts at each call site.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, initial_backoff: Duration, multiplier: u32) -> Self {
        RetryPolicy {
            max_attempts,
            initial_backoff,
            multiplier,
        }
    }

    /// Policy used by the retrying client transport: 3 attempts, fixed 3s backoff
    pub const fn transport() -> Self {
        RetryPolicy::new(3, Duration::from_secs(3), 1)
    }

    /// Backoff before the attempt following `attempt` (zero-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff * self.multiplier.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    /// 4 attempts starting at 50ms, tripling each time
    fn default() -> Self {
        RetryPolicy::new(4, Duration::from_millis(50), 3)
    }
}

/// Run `op` until it succeeds or the policy's attempts are exhausted.
/// Every error is considered retryable; the last error is returned.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(err);
                }
                let backoff = policy.backoff(attempt - 1);
                debug!(
                    "Attempt {}/{} failed, retrying in {:?}: {}",
                    attempt, policy.max_attempts, backoff, err
                );
                sleep(backoff).await;
            }
        }
    }
}
