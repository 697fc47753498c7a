// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Streaming Engine
//!
//! The orchestrator tying the splitter, per-block processor, and
//! assembler together into upload/download operations with bounded
//! concurrency, cancellation, timeouts, and retry. Grounded on the
//! reference architecture's `StageExecutor` dispatch loop, generalized
//! from a fixed pipeline of heterogeneous stages to a bounded pool of
//! homogeneous per-block tasks fanned out from a single producer
//! (splitter) or into a single consumer (assembler).

use super::assembler::BlockAssembler;
use super::cancellation::CancellationToken;
use super::metrics::{EngineMetrics, MetricsSnapshot, ProcessorMetrics};
use super::processor::BlockProcessor;
use super::retry::RetryPolicy;
use super::splitter::BlockSplitter;
use super::validation::ValidationLevel;
use crate::config::EngineConfig;
use crate::descriptor_store::{DescriptorStore, EncryptedDescriptorStore};
use crate::password_provider::StaticPasswordProvider;
use noisefs_domain::ports::{Backend, ProgressInfo, ProgressReporter, RandomizerProvider};
use noisefs_domain::value_objects::{Descriptor, DescriptorType};
use noisefs_domain::NoiseFsError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Semaphore;

/// Per-upload overrides. Any field left at its default falls back to
/// the engine's [`EngineConfig`].
pub struct UploadOptions {
    pub filename: String,
    pub block_size: Option<usize>,
    pub max_concurrency: Option<usize>,
    pub progress: Option<Arc<dyn ProgressReporter>>,
    pub timeout: Option<Duration>,
    pub buffer_size: Option<usize>,
    pub enable_encryption: bool,
    pub encryption_password: Option<String>,
    pub retry_policy: RetryPolicy,
    pub validation_level: ValidationLevel,
    pub tags: HashMap<String, String>,
}

impl UploadOptions {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            block_size: None,
            max_concurrency: None,
            progress: None,
            timeout: None,
            buffer_size: None,
            enable_encryption: false,
            encryption_password: None,
            retry_policy: RetryPolicy::default(),
            validation_level: ValidationLevel::default(),
            tags: HashMap::new(),
        }
    }
}

/// Per-download overrides. Any field left at its default falls back to
/// the engine's [`EngineConfig`].
pub struct DownloadOptions {
    pub max_concurrency: Option<usize>,
    pub progress: Option<Arc<dyn ProgressReporter>>,
    pub timeout: Option<Duration>,
    pub buffer_size: Option<usize>,
    pub decryption_password: Option<String>,
    pub retry_policy: RetryPolicy,
    pub validation_level: ValidationLevel,
    pub verify_integrity: bool,
    pub prefer_cached: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            progress: None,
            timeout: None,
            buffer_size: None,
            decryption_password: None,
            retry_policy: RetryPolicy::default(),
            validation_level: ValidationLevel::default(),
            verify_integrity: false,
            prefer_cached: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub descriptor_cid: String,
    pub file_size: u64,
    pub blocks: usize,
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub bytes_written: u64,
    pub blocks: usize,
}

struct InFlightGuard<'a> {
    counter: &'a AtomicU64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Drives uploads and downloads against a [`Backend`] and
/// [`RandomizerProvider`]. Safe to share across tasks: every method
/// takes `&self`.
pub struct StreamingEngine {
    backend: Arc<dyn Backend>,
    randomizer: Arc<dyn RandomizerProvider>,
    config: EngineConfig,
    metrics: Arc<EngineMetrics>,
    cancellation: CancellationToken,
    closed: AtomicBool,
    in_flight: AtomicU64,
}

impl StreamingEngine {
    pub fn new(backend: Arc<dyn Backend>, randomizer: Arc<dyn RandomizerProvider>, config: EngineConfig) -> Self {
        Self {
            backend,
            randomizer,
            config,
            metrics: Arc::new(EngineMetrics::new()),
            cancellation: CancellationToken::new(),
            closed: AtomicBool::new(false),
            in_flight: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(backend: Arc<dyn Backend>, randomizer: Arc<dyn RandomizerProvider>) -> Self {
        Self::new(backend, randomizer, EngineConfig::default())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Cancels every in-flight and future operation until a new engine
    /// is constructed; there is no "un-cancel".
    pub fn cancel_all(&self) {
        self.cancellation.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops accepting new operations and waits for in-flight ones to
    /// finish. Idempotent.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn enter(&self) -> Result<InFlightGuard<'_>, NoiseFsError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(NoiseFsError::StreamerClosed("engine is closed".to_string()));
        }
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Ok(InFlightGuard { counter: &self.in_flight })
    }

    /// Splits `reader` into fixed-size blocks, anonymizes and stores
    /// each one across a bounded worker pool, and saves the resulting
    /// descriptor (plain or password-encrypted per `options`).
    pub async fn upload<R: AsyncRead + Unpin + Send>(
        &self,
        reader: R,
        options: UploadOptions,
    ) -> Result<UploadResult, NoiseFsError> {
        let _guard = self.enter()?;
        let start = Instant::now();
        self.metrics.enter_concurrency();
        let result = self.run_upload(reader, options, start).await;
        self.metrics.exit_concurrency();
        match &result {
            Ok(upload) => self.metrics.record_success(upload.file_size, start.elapsed()),
            Err(NoiseFsError::Cancelled(_)) => self.metrics.record_cancelled(),
            Err(_) => self.metrics.record_failure(),
        }
        result
    }

    async fn run_upload<R: AsyncRead + Unpin + Send>(
        &self,
        reader: R,
        options: UploadOptions,
        start: Instant,
    ) -> Result<UploadResult, NoiseFsError> {
        let block_size = options.block_size.unwrap_or(self.config.default_block_size);
        let max_concurrency = options.max_concurrency.unwrap_or(self.config.default_max_concurrency).max(1);
        let token = self.cancellation.with_timeout(options.timeout);

        let mut splitter = BlockSplitter::new(reader, block_size)?;
        let processor = Arc::new(BlockProcessor::new(
            self.backend.clone(),
            self.randomizer.clone(),
            options.retry_policy.clone(),
            options.validation_level,
            Arc::new(ProcessorMetrics::new()),
        ));
        let semaphore = Arc::new(Semaphore::new(max_concurrency));

        let mut handles = Vec::new();
        loop {
            if token.is_cancelled() {
                for (_, handle) in handles {
                    handle.abort();
                }
                if let Some(p) = &options.progress {
                    p.cancel("upload cancelled");
                }
                return Err(NoiseFsError::Cancelled("upload cancelled".to_string()));
            }
            let Some(block) = splitter.next_block().await? else {
                break;
            };
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| NoiseFsError::backend_failure("worker pool closed"))?;
            let processor = processor.clone();
            let data = block.bytes;
            let block_len = data.len() as u64;
            let index = block.index;
            let handle = tokio::spawn(async move {
                let _permit = permit;
                processor.process_block(index, &data).await.map(|triple| (triple, block_len))
            });
            handles.push((index, handle));
        }

        let original_size = splitter.bytes_read();
        let total_blocks = handles.len() as u64;
        let mut descriptor = Descriptor::new_file_descriptor(options.filename.clone(), 1, 1, block_size as u64);
        let mut bytes_processed = 0u64;

        for (i, (_, handle)) in handles.into_iter().enumerate() {
            let outcome = handle
                .await
                .map_err(|e| NoiseFsError::backend_failure(format!("block task panicked: {e}")))?;
            let (triple, block_len) = outcome.map_err(|stream_err| stream_err.underlying().clone())?;
            bytes_processed += block_len;
            descriptor.add_block_triple(triple.data_cid, triple.rand1_cid, triple.rand2_cid)?;

            if let Some(p) = &options.progress {
                p.report_progress(&ProgressInfo {
                    stage: "upload".to_string(),
                    bytes_processed,
                    total_bytes: None,
                    blocks_processed: (i + 1) as u64,
                    total_blocks: Some(total_blocks),
                    elapsed: start.elapsed(),
                    throughput_bytes_per_sec: bytes_processed as f64 / start.elapsed().as_secs_f64().max(1e-9),
                });
            }
        }

        descriptor.file_size = original_size;
        descriptor.padded_file_size = total_blocks * block_size as u64;
        descriptor.validate()?;

        let store = EncryptedDescriptorStore::new(
            self.backend.clone(),
            Arc::new(StaticPasswordProvider::new(options.encryption_password.clone().unwrap_or_default())),
        );
        let descriptor_cid = if options.enable_encryption {
            store.save(&descriptor).await?
        } else {
            store.save_unencrypted(&descriptor).await?
        };

        if let Some(p) = &options.progress {
            p.complete(&ProgressInfo {
                stage: "upload".to_string(),
                bytes_processed,
                total_bytes: Some(original_size),
                blocks_processed: total_blocks,
                total_blocks: Some(total_blocks),
                elapsed: start.elapsed(),
                throughput_bytes_per_sec: bytes_processed as f64 / start.elapsed().as_secs_f64().max(1e-9),
            });
        }

        Ok(UploadResult {
            descriptor_cid,
            file_size: original_size,
            blocks: descriptor.blocks.len(),
        })
    }

    /// Loads the descriptor at `descriptor_cid` (transparently decrypting
    /// it if needed), retrieves and de-anonymizes its blocks across a
    /// bounded worker pool, and writes the reconstructed file to `writer`.
    pub async fn download<W: AsyncWrite + Unpin + Send>(
        &self,
        descriptor_cid: &str,
        writer: W,
        options: DownloadOptions,
    ) -> Result<DownloadResult, NoiseFsError> {
        let _guard = self.enter()?;
        let start = Instant::now();
        self.metrics.enter_concurrency();
        let result = self.run_download(descriptor_cid, writer, options, start).await;
        self.metrics.exit_concurrency();
        match &result {
            Ok(download) => self.metrics.record_success(download.bytes_written, start.elapsed()),
            Err(NoiseFsError::Cancelled(_)) => self.metrics.record_cancelled(),
            Err(_) => self.metrics.record_failure(),
        }
        result
    }

    async fn run_download<W: AsyncWrite + Unpin + Send>(
        &self,
        descriptor_cid: &str,
        writer: W,
        options: DownloadOptions,
        start: Instant,
    ) -> Result<DownloadResult, NoiseFsError> {
        let store = EncryptedDescriptorStore::new(
            self.backend.clone(),
            Arc::new(StaticPasswordProvider::new(options.decryption_password.clone().unwrap_or_default())),
        );
        let descriptor = store.load(descriptor_cid).await?;
        if descriptor.descriptor_type != DescriptorType::File {
            return Err(NoiseFsError::invalid_argument("descriptor does not reference a file"));
        }

        let max_concurrency = options.max_concurrency.unwrap_or(self.config.default_max_concurrency).max(1);
        let token = self.cancellation.with_timeout(options.timeout);
        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let validation = if options.verify_integrity {
            ValidationLevel::Strict.max(options.validation_level)
        } else {
            options.validation_level
        };
        let block_size = descriptor.block_size as usize;

        let mut handles = Vec::with_capacity(descriptor.blocks.len());
        for (index, triple) in descriptor.blocks.iter().cloned().enumerate() {
            if token.is_cancelled() {
                for (_, handle) in handles {
                    handle.abort();
                }
                if let Some(p) = &options.progress {
                    p.cancel("download cancelled");
                }
                return Err(NoiseFsError::Cancelled("download cancelled".to_string()));
            }
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| NoiseFsError::backend_failure("worker pool closed"))?;
            let backend = self.backend.clone();
            let retry_policy = options.retry_policy.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                retry_policy
                    .run(|| {
                        let backend = backend.clone();
                        let triple = triple.clone();
                        async move {
                            let out = backend.get(&triple.data_cid).await?;
                            let r1 = backend.get(&triple.rand1_cid).await?;
                            let r2 = backend.get(&triple.rand2_cid).await?;
                            validation.check_block_size(block_size, &out, &r1, &r2)?;
                            validation.check_integrity(&out, &triple.data_cid)?;
                            Ok::<_, NoiseFsError>((out, r1, r2))
                        }
                    })
                    .await
            });
            handles.push((index as u64, handle));
        }

        let total_blocks = descriptor.blocks.len() as u64;
        let mut assembler = BlockAssembler::new(writer, total_blocks, descriptor.file_size);

        for (index, handle) in handles {
            let outcome = handle
                .await
                .map_err(|e| NoiseFsError::backend_failure(format!("block task panicked: {e}")))?;
            let (out, r1, r2) = outcome?;
            assembler.add_block(index, &out, &r1, &r2).await?;

            if let Some(p) = &options.progress {
                let progress = assembler.progress();
                p.report_progress(&ProgressInfo {
                    stage: "download".to_string(),
                    bytes_processed: progress.bytes_written,
                    total_bytes: Some(descriptor.file_size),
                    blocks_processed: progress.processed_blocks,
                    total_blocks: Some(total_blocks),
                    elapsed: start.elapsed(),
                    throughput_bytes_per_sec: progress.bytes_written as f64 / start.elapsed().as_secs_f64().max(1e-9),
                });
            }
        }

        validation.check_block_count(descriptor.blocks.len(), assembler.progress().processed_blocks as usize)?;

        assembler.close().await?;
        let final_progress = assembler.progress();

        if let Some(p) = &options.progress {
            p.complete(&ProgressInfo {
                stage: "download".to_string(),
                bytes_processed: final_progress.bytes_written,
                total_bytes: Some(descriptor.file_size),
                blocks_processed: final_progress.processed_blocks,
                total_blocks: Some(total_blocks),
                elapsed: start.elapsed(),
                throughput_bytes_per_sec: final_progress.bytes_written as f64 / start.elapsed().as_secs_f64().max(1e-9),
            });
        }

        Ok(DownloadResult {
            bytes_written: final_progress.bytes_written,
            blocks: final_progress.processed_blocks as usize,
        })
    }
}
