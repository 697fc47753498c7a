// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Block Processor
//!
//! The per-block transform at the heart of an upload: select two
//! randomizers, XOR them into the data block, and store the anonymized
//! result. Concurrency across blocks is the engine's job (a bounded
//! worker pool, grounded on the reference architecture's stage-executor
//! dispatch); this module is the single unit of work one worker runs.

use super::metrics::ProcessorMetrics;
use super::retry::RetryPolicy;
use super::validation::ValidationLevel;
use super::xor::xor3;
use noisefs_domain::error::StreamError;
use noisefs_domain::ports::{Backend, RandomizerProvider};
use noisefs_domain::value_objects::BlockTriple;
use noisefs_domain::NoiseFsError;
use std::sync::Arc;
use std::time::Instant;

/// Processes one data block into a stored, anonymized block plus the
/// triple of CIDs that lets it be reversed later.
pub struct BlockProcessor {
    backend: Arc<dyn Backend>,
    randomizer: Arc<dyn RandomizerProvider>,
    retry_policy: RetryPolicy,
    validation: ValidationLevel,
    metrics: Arc<ProcessorMetrics>,
}

impl BlockProcessor {
    pub fn new(
        backend: Arc<dyn Backend>,
        randomizer: Arc<dyn RandomizerProvider>,
        retry_policy: RetryPolicy,
        validation: ValidationLevel,
        metrics: Arc<ProcessorMetrics>,
    ) -> Self {
        Self {
            backend,
            randomizer,
            retry_policy,
            validation,
            metrics,
        }
    }

    /// Anonymizes and stores one data block, returning the CID triple
    /// that can later recover it. Retries the randomizer/store
    /// sub-steps per the configured policy; surfaces failures wrapped in
    /// a `StreamError` tagged `stage = "block_processing"`.
    #[tracing::instrument(skip(self, data), fields(block_size = data.len()))]
    pub async fn process_block(&self, index: u64, data: &[u8]) -> Result<BlockTriple, StreamError> {
        let start = Instant::now();
        let block_size = data.len();

        let result = self
            .retry_policy
            .run(|| async {
                let randomizers = self.randomizer.select(block_size, None).await?;
                self.validation.check_block_size(block_size, data, &randomizers.block1, &randomizers.block2)?;

                let anonymized = xor3(data, &randomizers.block1, &randomizers.block2)?;
                let data_cid = self.backend.put(&anonymized).await?;

                let triple = BlockTriple::new(data_cid, randomizers.cid1, randomizers.cid2)?;
                self.validation.check_triple(&triple)?;
                Ok(triple)
            })
            .await;

        match result {
            Ok(triple) => {
                self.metrics.record_block(start.elapsed());
                tracing::debug!(block_index = index, "block processed");
                Ok(triple)
            }
            Err(err) => {
                self.metrics.record_error();
                let retryable = self.retry_policy.is_retryable(&err);
                Err(StreamError::new("upload", "block_processing", err)
                    .retryable(retryable)
                    .with_context("block_index", index.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use async_trait::async_trait;
    use noisefs_domain::ports::SelectedRandomizers;

    struct FixedRandomizer {
        r1: Vec<u8>,
        r2: Vec<u8>,
    }

    #[async_trait]
    impl RandomizerProvider for FixedRandomizer {
        async fn select(&self, block_size: usize, _hint: Option<&str>) -> Result<SelectedRandomizers, NoiseFsError> {
            Ok(SelectedRandomizers {
                block1: self.r1[..block_size].to_vec(),
                cid1: "r1-cid".to_string(),
                block2: self.r2[..block_size].to_vec(),
                cid2: "r2-cid".to_string(),
                new_bytes_introduced: block_size as u64,
            })
        }

        async fn generate(&self, block_size: usize, _metadata: Option<&str>) -> Result<(Vec<u8>, String), NoiseFsError> {
            Ok((vec![0u8; block_size], "generated".to_string()))
        }

        async fn cache(&self, _cid: &str, _block: &[u8], _metadata: Option<&str>) -> Result<(), NoiseFsError> {
            Ok(())
        }

        async fn set_strategy(&self, _strategy: &str) -> Result<(), NoiseFsError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn processes_and_stores_block() {
        let backend = Arc::new(InMemoryBackend::new());
        let randomizer = Arc::new(FixedRandomizer {
            r1: vec![0xAAu8; 16],
            r2: vec![0x55u8; 16],
        });
        let processor = BlockProcessor::new(
            backend.clone(),
            randomizer,
            RetryPolicy::none(),
            ValidationLevel::Standard,
            Arc::new(ProcessorMetrics::new()),
        );

        let data = vec![0x0Fu8; 16];
        let triple = processor.process_block(0, &data).await.unwrap();
        assert_eq!(triple.rand1_cid, "r1-cid");
        assert_eq!(triple.rand2_cid, "r2-cid");
        assert!(backend.has(&triple.data_cid).await.unwrap());
    }
}
