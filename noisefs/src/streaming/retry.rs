// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Retry Policy
//!
//! Exponential backoff applied around a single retryable stage. Hand
//! rolled rather than pulled from a crate, mirroring the reference
//! architecture's own resource-manager backoff logic rather than a
//! generic retry dependency.

use noisefs_domain::NoiseFsError;
use std::sync::Arc;
use std::time::Duration;

/// Governs whether and how a retryable streaming stage is retried.
///
/// Context-cancellation and timeout errors are never retried regardless
/// of this policy (checked by the caller before consulting it).
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Overrides the default `NoiseFsError::is_recoverable` check when
    /// set. Receives the error that just occurred.
    pub retryable: Option<Arc<dyn Fn(&NoiseFsError) -> bool + Send + Sync>>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("retryable", &self.retryable.is_some())
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            retryable: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries: the first failure is final.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn is_retryable(&self, err: &NoiseFsError) -> bool {
        match &self.retryable {
            Some(predicate) => predicate(err),
            None => err.is_recoverable(),
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_multiplier.max(1.0).powi(attempt as i32);
        Duration::from_secs_f64(scaled).min(self.max_delay)
    }

    /// Runs `op`, retrying on recoverable failures per this policy with
    /// exponential backoff. Never retries `Cancelled`/`DeadlineExceeded`.
    /// On exhaustion, wraps the last error in `RetryExhausted`.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> Result<T, NoiseFsError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, NoiseFsError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let terminal = matches!(err, NoiseFsError::Cancelled(_) | NoiseFsError::DeadlineExceeded(_));
                    attempt += 1;
                    if terminal || attempt >= self.max_attempts || !self.is_retryable(&err) {
                        if attempt > 1 && !terminal {
                            return Err(NoiseFsError::retry_exhausted(attempt, err));
                        }
                        return Err(err);
                    }
                    tokio::time::sleep(self.delay_for_attempt(attempt - 1)).await;
                }
            }
        }
    }
}
