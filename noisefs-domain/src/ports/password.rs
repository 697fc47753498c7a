// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PasswordProvider Port
//!
//! A pure, zero-argument callable returning a password. Implementations
//! must not cache: the descriptor store invokes the provider fresh on
//! every save and load.

use crate::error::NoiseFsError;
use async_trait::async_trait;

#[async_trait]
pub trait PasswordProvider: Send + Sync {
    /// Returns the password to use for this operation. An empty string
    /// means "store/load unencrypted".
    async fn provide(&self) -> Result<String, NoiseFsError>;
}
