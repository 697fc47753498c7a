// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Backend Port
//!
//! The block storage backend NoiseFS is built on top of: a byte-addressable
//! key-value interface. Concrete backends (filesystem, IPFS, S3, ...) are
//! an out-of-scope external collaborator; this crate only consumes the
//! trait, plus an in-memory implementation used by its own tests.

use crate::error::NoiseFsError;
use async_trait::async_trait;

/// A pluggable, content-addressed block store.
///
/// Implementations must be safe for concurrent use: the streaming engine
/// calls `put`/`get` from many tasks at once and holds no lock across
/// the call.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stores `block` and returns its content identifier.
    async fn put(&self, block: &[u8]) -> Result<String, NoiseFsError>;

    /// Retrieves the block named by `cid`. Fails with `NotFound` if absent.
    async fn get(&self, cid: &str) -> Result<Vec<u8>, NoiseFsError>;

    /// Checks presence without transferring the block's bytes.
    async fn has(&self, cid: &str) -> Result<bool, NoiseFsError>;

    /// Removes the block named by `cid`.
    async fn delete(&self, cid: &str) -> Result<(), NoiseFsError>;

    /// Starts the backend (connection pools, background tasks, ...).
    async fn start(&self) -> Result<(), NoiseFsError>;

    /// Stops the backend, releasing any held resources.
    async fn stop(&self) -> Result<(), NoiseFsError>;

    /// Reports whether the backend is currently reachable and healthy.
    async fn health_check(&self) -> Result<(), NoiseFsError>;
}
