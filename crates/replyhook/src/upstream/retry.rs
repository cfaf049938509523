// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry with a fixed backoff schedule.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Backoff schedule: one delay per retry, so `delays.len()` retries after the first attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    /// Exponential schedule: `base`, `base * 2`, ... for `retries` retries.
    pub fn exponential(base: Duration, retries: u32) -> Self {
        Self { delays: (0..retries).map(|i| base * 2u32.pow(i)).collect() }
    }

    /// Profile lookups: 3 retries at 2s, 4s, 8s.
    pub fn profile() -> Self {
        Self::exponential(Duration::from_secs(2), 3)
    }

    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// schedule is exhausted. `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut, R>(&self, label: &str, mut op: F, retryable: R) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            if !retryable(&err) {
                tracing::debug!(op = label, attempt, err = %err, "non-retryable failure");
                return Err(err);
            }
            let Some(delay) = self.delays.get(attempt as usize - 1).copied() else {
                tracing::warn!(op = label, attempt, err = %err, "retries exhausted");
                return Err(err);
            };
            tracing::warn!(
                op = label,
                attempt,
                delay_secs = delay.as_secs_f64(),
                err = %err,
                "attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
