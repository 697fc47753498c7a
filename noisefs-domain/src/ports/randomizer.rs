// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # RandomizerProvider Port
//!
//! Selects, caches, and generates the randomizer blocks the streaming
//! engine XORs against data blocks. Selection policy (performance vs.
//! privacy vs. balanced, cache eviction, reuse heuristics) is an external
//! concern; this crate only consumes the contract.

use crate::error::NoiseFsError;
use async_trait::async_trait;

/// The two randomizer blocks selected for one data block, plus how many
/// bytes of genuinely new randomizer content were introduced (as
/// opposed to reused from cache) — useful for the caller's privacy
/// accounting.
pub struct SelectedRandomizers {
    pub block1: Vec<u8>,
    pub cid1: String,
    pub block2: Vec<u8>,
    pub cid2: String,
    pub new_bytes_introduced: u64,
}

/// A randomizer selection/generation/caching strategy.
#[async_trait]
pub trait RandomizerProvider: Send + Sync {
    /// Selects two randomizer blocks of exactly `block_size` bytes.
    /// `hint` is an opaque, provider-specific hint (e.g. prior CIDs to
    /// avoid reusing).
    async fn select(&self, block_size: usize, hint: Option<&str>) -> Result<SelectedRandomizers, NoiseFsError>;

    /// Generates and stores a single fresh randomizer block.
    async fn generate(&self, block_size: usize, metadata: Option<&str>) -> Result<(Vec<u8>, String), NoiseFsError>;

    /// Caches a block under `cid` for future selection.
    async fn cache(&self, cid: &str, block: &[u8], metadata: Option<&str>) -> Result<(), NoiseFsError>;

    /// Switches the provider's selection strategy.
    async fn set_strategy(&self, strategy: &str) -> Result<(), NoiseFsError>;
}
