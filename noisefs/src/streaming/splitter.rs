// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Block Splitter
//!
//! A single-producer, bounded-memory reader that slices a byte stream
//! into fixed-size blocks, zero-padding the final short block. Grounded
//! on the reference architecture's chunked `FileIOService` read-loop
//! style: a reusable buffer, one allocation amortized across the whole
//! read.

use noisefs_domain::NoiseFsError;
use tokio::io::{AsyncRead, AsyncReadExt};

/// One block emitted by the splitter.
pub struct SplitBlock {
    pub index: u64,
    /// Exactly `block_size` bytes; the tail is zero-padded on the final
    /// block.
    pub bytes: Vec<u8>,
    /// How many of `bytes` came from the source reader (the rest, if
    /// any, is padding). Only the final block can be short.
    pub unpadded_len: usize,
    /// Whether this is the last block the source will yield. Determined
    /// by actually exhausting the reader (a short fill, or a zero-byte
    /// probe read after an exact fill), not merely by a short read.
    pub is_final: bool,
}

/// Reads `reader` in `block_size` chunks until EOF. The final partial
/// chunk (if any) is zero-padded up to `block_size`. Tracks the exact
/// number of source bytes read, which becomes the descriptor's
/// `file_size`.
pub struct BlockSplitter<R> {
    reader: R,
    block_size: usize,
    next_index: u64,
    total_read: u64,
    done: bool,
    /// A single byte read ahead from the source to test for EOF after a
    /// block fills exactly to `block_size`, carried into the next block.
    pending: Option<u8>,
}

impl<R: AsyncRead + Unpin> BlockSplitter<R> {
    pub fn new(reader: R, block_size: usize) -> Result<Self, NoiseFsError> {
        if block_size == 0 {
            return Err(NoiseFsError::invalid_options("block_size must be > 0"));
        }
        Ok(Self {
            reader,
            block_size,
            next_index: 0,
            total_read: 0,
            done: false,
            pending: None,
        })
    }

    /// Total bytes read from the source so far (the eventual `file_size`
    /// once the stream is exhausted).
    pub fn bytes_read(&self) -> u64 {
        self.total_read
    }

    /// Reads and returns the next block, or `None` once the source is
    /// exhausted and the final (possibly padded) block has already been
    /// returned.
    pub async fn next_block(&mut self) -> Result<Option<SplitBlock>, NoiseFsError> {
        if self.done {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.block_size];
        let mut filled = 0;

        if let Some(byte) = self.pending.take() {
            buf[0] = byte;
            filled = 1;
        }

        while filled < self.block_size {
            let n = self.reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            self.done = true;
            return Ok(None);
        }

        let index = self.next_index;
        self.next_index += 1;

        let is_final = if filled < self.block_size {
            // Source ran out mid-fill; this short block is the last one.
            self.done = true;
            true
        } else {
            // The buffer filled exactly to block_size, which could mean the
            // source landed on a block boundary or that it's exhausted.
            // Read one more byte to tell the two apart, carrying it into
            // the next block if the source isn't actually done.
            let mut probe = [0u8; 1];
            let probed = self.reader.read(&mut probe).await?;
            if probed == 0 {
                self.done = true;
                true
            } else {
                self.pending = Some(probe[0]);
                false
            }
        };

        self.total_read += filled as u64;

        Ok(Some(SplitBlock {
            index,
            unpadded_len: filled,
            is_final,
            bytes: buf,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn splits_exact_multiple_with_no_padding() {
        let data = vec![7u8; 1024];
        let mut splitter = BlockSplitter::new(Cursor::new(data.clone()), 512).unwrap();
        let b0 = splitter.next_block().await.unwrap().unwrap();
        let b1 = splitter.next_block().await.unwrap().unwrap();
        assert!(splitter.next_block().await.unwrap().is_none());
        assert_eq!(b0.index, 0);
        assert_eq!(b1.index, 1);
        assert_eq!(b0.unpadded_len, 512);
        assert_eq!(b1.unpadded_len, 512);
        assert!(!b0.is_final);
        assert!(b1.is_final);
        assert_eq!(splitter.bytes_read(), 1024);
    }

    #[tokio::test]
    async fn pads_final_short_block_with_zeros() {
        let mut data = vec![1u8; 1100];
        data.truncate(1124); // 1024 full + 100 remainder against a 1024 block size below
        let mut splitter = BlockSplitter::new(Cursor::new(vec![9u8; 1124]), 1024).unwrap();
        let b0 = splitter.next_block().await.unwrap().unwrap();
        let b1 = splitter.next_block().await.unwrap().unwrap();
        assert!(splitter.next_block().await.unwrap().is_none());
        assert_eq!(b0.bytes.len(), 1024);
        assert_eq!(b1.bytes.len(), 1024);
        assert_eq!(b1.unpadded_len, 100);
        assert!(b1.bytes[100..].iter().all(|&b| b == 0));
        assert_eq!(splitter.bytes_read(), 1124);
        let _ = data;
    }

    #[tokio::test]
    async fn empty_source_yields_no_blocks() {
        let mut splitter = BlockSplitter::new(Cursor::new(Vec::<u8>::new()), 128).unwrap();
        assert!(splitter.next_block().await.unwrap().is_none());
        assert_eq!(splitter.bytes_read(), 0);
    }

    #[tokio::test]
    async fn rejects_zero_block_size() {
        assert!(BlockSplitter::new(Cursor::new(Vec::<u8>::new()), 0).is_err());
    }
}
