// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Tracing Initialization
//!
//! Installs a global `tracing` subscriber, grounded on the reference
//! CLI's `FmtSubscriber` setup, extended with `EnvFilter` so the level
//! can be tuned per-module via `RUST_LOG` without a rebuild.

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber honoring `RUST_LOG`, defaulting to
/// `info` when the variable is unset or invalid.
///
/// Returns an error rather than panicking if a global subscriber is
/// already installed, so embedding applications that configure their
/// own tracing setup are not disrupted.
pub fn init_tracing() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_does_not_panic_on_repeat_calls() {
        let _ = init_tracing();
        let second = init_tracing();
        assert!(second.is_err());
    }
}
