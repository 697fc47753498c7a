// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Block Assembler
//!
//! The download-side counterpart to the splitter: a single consumer
//! that accepts out-of-order, de-anonymized blocks from many retrieval
//! workers and writes them strictly in order to the sink, truncating
//! the final block's padding. Grounded on the reference architecture's
//! `Arc<RwLock<HashMap<...>>>` pending-state pattern in its stage
//! executor, specialized here to a pending-block map drained at the
//! head on every insert.

use super::xor::xor3;
use noisefs_domain::NoiseFsError;
use std::collections::{HashMap, HashSet};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Counters exposed to the caller's progress reporting.
#[derive(Debug, Clone, Default)]
pub struct AssemblerProgress {
    pub bytes_written: u64,
    pub processed_blocks: u64,
}

/// Reconstructs a single downloaded file from out-of-order block
/// retrievals: de-anonymizes each triple, buffers it under its index,
/// and writes strictly in index order, capping the final block's
/// writable length at `original_size`.
pub struct BlockAssembler<W> {
    writer: W,
    expected_blocks: u64,
    original_size: u64,
    next_expected_index: u64,
    pending: HashMap<u64, Vec<u8>>,
    received: HashSet<u64>,
    bytes_written: u64,
    processed_blocks: u64,
    closed: bool,
}

impl<W: AsyncWrite + Unpin> BlockAssembler<W> {
    pub fn new(writer: W, expected_blocks: u64, original_size: u64) -> Self {
        Self {
            writer,
            expected_blocks,
            original_size,
            next_expected_index: 0,
            pending: HashMap::new(),
            received: HashSet::new(),
            bytes_written: 0,
            processed_blocks: 0,
            closed: false,
        }
    }

    pub fn progress(&self) -> AssemblerProgress {
        AssemblerProgress {
            bytes_written: self.bytes_written,
            processed_blocks: self.processed_blocks,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.next_expected_index == self.expected_blocks
    }

    /// Indices of blocks the assembler has not yet received.
    pub fn get_missing_blocks(&self) -> Vec<u64> {
        (0..self.expected_blocks).filter(|i| !self.received.contains(i)).collect()
    }

    /// De-anonymizes `out` with `r1`/`r2`, buffers it under `index`, and
    /// drains the pending buffer in order starting at
    /// `next_expected_index`. Returns whether the file is now fully
    /// assembled.
    pub async fn add_block(&mut self, index: u64, out: &[u8], r1: &[u8], r2: &[u8]) -> Result<bool, NoiseFsError> {
        if self.closed {
            return Err(NoiseFsError::invalid_argument("assembler is closed"));
        }
        if out.len() != r1.len() || out.len() != r2.len() {
            return Err(NoiseFsError::invalid_argument(
                "block and randomizers must be the same length",
            ));
        }
        let original = xor3(out, r1, r2)?;
        self.received.insert(index);
        self.pending.insert(index, original);

        while let Some(block) = self.pending.remove(&self.next_expected_index) {
            let remaining = self.original_size.saturating_sub(self.bytes_written);
            let writable = (block.len() as u64).min(remaining) as usize;
            if writable > 0 {
                self.writer.write_all(&block[..writable]).await?;
                self.bytes_written += writable as u64;
            }
            self.next_expected_index += 1;
            self.processed_blocks += 1;
        }

        Ok(self.is_complete())
    }

    /// Releases the assembler and any buffered blocks without writing
    /// further bytes.
    pub fn cancel(&mut self) {
        self.pending.clear();
        self.closed = true;
    }

    /// Idempotent: flushes the writer once, subsequent calls are no-ops.
    pub async fn close(&mut self) -> Result<(), NoiseFsError> {
        if self.closed {
            return Ok(());
        }
        self.writer.flush().await?;
        self.closed = true;
        Ok(())
    }
}
