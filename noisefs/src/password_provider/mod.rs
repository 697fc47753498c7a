// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Password Provider Implementations
//!
//! Construction helpers for the [`PasswordProvider`] port: a static value
//! (tests, scripted callers), an environment variable lookup, and a
//! closure adapter. An interactive-terminal-prompt variant is
//! deliberately not provided here — password-prompt UIs are an
//! out-of-scope external collaborator (spec §1); a CLI embedding this
//! crate supplies one via the closure adapter.

use async_trait::async_trait;
use noisefs_domain::ports::PasswordProvider;
use noisefs_domain::NoiseFsError;
use std::sync::Arc;

/// Always returns the same password. An empty string requests the
/// unencrypted path.
pub struct StaticPasswordProvider {
    password: String,
}

impl StaticPasswordProvider {
    pub fn new(password: impl Into<String>) -> Self {
        Self { password: password.into() }
    }

    pub fn empty() -> Self {
        Self::new(String::new())
    }
}

#[async_trait]
impl PasswordProvider for StaticPasswordProvider {
    async fn provide(&self) -> Result<String, NoiseFsError> {
        Ok(self.password.clone())
    }
}

/// Reads the password from an environment variable on every call (no
/// caching, so changes to the environment are observed immediately).
pub struct EnvPasswordProvider {
    var_name: String,
}

impl EnvPasswordProvider {
    pub fn new(var_name: impl Into<String>) -> Self {
        Self { var_name: var_name.into() }
    }
}

#[async_trait]
impl PasswordProvider for EnvPasswordProvider {
    async fn provide(&self) -> Result<String, NoiseFsError> {
        match std::env::var(&self.var_name) {
            Ok(value) => Ok(value),
            Err(std::env::VarError::NotPresent) => Ok(String::new()),
            Err(e) => Err(NoiseFsError::invalid_argument(format!(
                "environment variable {} is not valid unicode: {e}",
                self.var_name
            ))),
        }
    }
}

/// Adapts a caller-supplied closure (e.g. a CLI's interactive prompt, or
/// a GUI's dialog) to the port. The closure is invoked fresh on every
/// call; it must not cache the returned password itself.
pub struct ClosurePasswordProvider {
    f: Arc<dyn Fn() -> Result<String, NoiseFsError> + Send + Sync>,
}

impl ClosurePasswordProvider {
    pub fn new(f: impl Fn() -> Result<String, NoiseFsError> + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }
}

#[async_trait]
impl PasswordProvider for ClosurePasswordProvider {
    async fn provide(&self) -> Result<String, NoiseFsError> {
        (self.f)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_returns_fixed_value() {
        let p = StaticPasswordProvider::new("hunter2");
        assert_eq!(p.provide().await.unwrap(), "hunter2");
    }

    #[tokio::test]
    async fn env_provider_returns_empty_when_unset() {
        let p = EnvPasswordProvider::new("NOISEFS_TEST_PASSWORD_DOES_NOT_EXIST");
        assert_eq!(p.provide().await.unwrap(), "");
    }

    #[tokio::test]
    async fn closure_provider_is_invoked_fresh_each_call() {
        let counter = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter2 = counter.clone();
        let p = ClosurePasswordProvider::new(move || {
            counter2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok("from-closure".to_string())
        });
        p.provide().await.unwrap();
        p.provide().await.unwrap();
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
