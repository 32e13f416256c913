// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Interval/timeout polling primitive used by the wait features.

use crate::constants::defaults;
use crate::error::{Result, TestkitError};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// How a wait loop is executed. A `timeout` of `None` means the loop only
/// ends once the condition holds.
#[derive(Debug, Clone, Copy)]
pub struct WaitParams {
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl Default for WaitParams {
    fn default() -> Self {
        WaitParams {
            interval: defaults::POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl WaitParams {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        WaitParams { interval, timeout }
    }
}

/// Map a user-facing timeout to an optional deadline: zero means unbounded.
pub fn optional_timeout(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() {
        None
    } else {
        Some(timeout)
    }
}

/// Check `condition` every interval until it returns `Ok(true)` or the
/// timeout elapses. A condition error aborts the whole wait: transient fetch
/// problems are not distinguished from fatal ones here.
pub async fn poll_until<F, Fut>(params: &WaitParams, mut condition: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    loop {
        if condition().await? {
            return Ok(());
        }
        if let Some(timeout) = params.timeout {
            if start.elapsed() >= timeout {
                return Err(TestkitError::WaitTimeout(format!(
                    "condition not met within {:?}",
                    timeout
                )));
            }
        }
        sleep(params.interval).await;
    }
}

/// Run `fut` under a deadline, unless the timeout is zero (delete with no
/// deadline attached).
pub async fn with_optional_deadline<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    match optional_timeout(timeout) {
        None => Ok(fut.await),
        Some(deadline) => tokio::time::timeout(deadline, fut).await.map_err(|_| {
            TestkitError::WaitTimeout(format!("operation did not complete within {:?}", deadline))
        }),
    }
}
