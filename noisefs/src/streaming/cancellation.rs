// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cancellation Token
//!
//! A minimal, hand-rolled cancellation primitive rather than a pulled-in
//! crate, consistent with the reference architecture's preference for
//! owning its own concurrency primitives (`GlobalResourceManager`'s
//! semaphore wrapper) over reaching for a generic abstraction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// A cooperative cancellation signal. Workers check
/// [`CancellationToken::is_cancelled`] at suspension points and bail out
/// promptly; [`CancellationToken::cancelled`] lets a task `select!` on
/// the signal instead of polling.
#[derive(Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }

    /// Derives an independent child token that is cancelled either when
    /// `self` is cancelled or when `timeout` elapses, whichever comes
    /// first. Cancelling the child (including via its own timeout) never
    /// cancels `self`; only `self`'s cancellation forwards to the child,
    /// one-way.
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        let child = CancellationToken::new();

        let parent = self.clone();
        let forward_target = child.clone();
        tokio::spawn(async move {
            parent.cancelled().await;
            forward_target.cancel();
        });

        if let Some(duration) = timeout {
            let timeout_target = child.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => timeout_target.cancel(),
                    _ = timeout_target.cancelled() => {}
                }
            });
        }

        child
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        token.cancel();
        handle.await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn timeout_cancels_derived_token() {
        let parent = CancellationToken::new();
        let derived = parent.with_timeout(Some(Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(derived.is_cancelled());
    }

    #[tokio::test]
    async fn no_timeout_never_auto_cancels() {
        let parent = CancellationToken::new();
        let derived = parent.with_timeout(None);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!derived.is_cancelled());
    }

    #[tokio::test]
    async fn derived_timeout_never_cancels_parent() {
        let parent = CancellationToken::new();
        let derived = parent.with_timeout(Some(Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(derived.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn parent_cancellation_forwards_to_derived() {
        let parent = CancellationToken::new();
        let derived = parent.with_timeout(None);
        parent.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(derived.is_cancelled());
    }
}
