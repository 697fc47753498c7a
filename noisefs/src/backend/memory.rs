// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Backend
//!
//! A content-addressed block store kept entirely in process memory. It
//! exists to exercise the descriptor stores and streaming engine in this
//! crate's own tests; a production deployment plugs in a real backend
//! over the same [`Backend`] trait (spec §6 out-of-scope collaborator).

use async_trait::async_trait;
use noisefs_domain::crypto::primitives::sha256;
use noisefs_domain::ports::Backend;
use noisefs_domain::NoiseFsError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// CID scheme: lowercase hex of the SHA-256 digest of the block's bytes.
fn cid_for(block: &[u8]) -> String {
    hex::encode(sha256(block))
}

/// A content-addressed, in-process block store.
#[derive(Default)]
pub struct InMemoryBackend {
    blocks: Mutex<HashMap<String, Vec<u8>>>,
    started: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(HashMap::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Number of distinct blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.lock().expect("backend mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn put(&self, block: &[u8]) -> Result<String, NoiseFsError> {
        let cid = cid_for(block);
        self.blocks
            .lock()
            .expect("backend mutex poisoned")
            .insert(cid.clone(), block.to_vec());
        Ok(cid)
    }

    async fn get(&self, cid: &str) -> Result<Vec<u8>, NoiseFsError> {
        self.blocks
            .lock()
            .expect("backend mutex poisoned")
            .get(cid)
            .cloned()
            .ok_or_else(|| NoiseFsError::not_found(format!("block {cid} not found")))
    }

    async fn has(&self, cid: &str) -> Result<bool, NoiseFsError> {
        Ok(self.blocks.lock().expect("backend mutex poisoned").contains_key(cid))
    }

    async fn delete(&self, cid: &str) -> Result<(), NoiseFsError> {
        self.blocks.lock().expect("backend mutex poisoned").remove(cid);
        Ok(())
    }

    async fn start(&self) -> Result<(), NoiseFsError> {
        self.started.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn stop(&self) -> Result<(), NoiseFsError> {
        self.started.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), NoiseFsError> {
        if self.started.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(NoiseFsError::backend_failure("backend not started"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_round_trips_by_content_hash() {
        let backend = InMemoryBackend::new();
        backend.start().await.unwrap();
        let cid = backend.put(b"hello world").await.unwrap();
        assert_eq!(backend.get(&cid).await.unwrap(), b"hello world");
        assert!(backend.has(&cid).await.unwrap());

        let cid2 = backend.put(b"hello world").await.unwrap();
        assert_eq!(cid, cid2, "identical content must map to the same CID");
    }

    #[tokio::test]
    async fn missing_block_is_not_found() {
        let backend = InMemoryBackend::new();
        assert!(backend.get("does-not-exist").await.is_err());
        assert!(!backend.has("does-not-exist").await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_block() {
        let backend = InMemoryBackend::new();
        let cid = backend.put(b"data").await.unwrap();
        backend.delete(&cid).await.unwrap();
        assert!(!backend.has(&cid).await.unwrap());
    }

    #[tokio::test]
    async fn health_check_requires_start() {
        let backend = InMemoryBackend::new();
        assert!(backend.health_check().await.is_err());
        backend.start().await.unwrap();
        assert!(backend.health_check().await.is_ok());
    }
}
