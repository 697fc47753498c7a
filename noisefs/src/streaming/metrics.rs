// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Metrics
//!
//! Aggregate counters for a [`StreamingEngine`](super::engine::StreamingEngine)
//! instance. Counts are atomic; the handful of floating-point moving
//! averages live behind a short-lived `parking_lot::Mutex` that is never
//! held across I/O, mirroring the reference architecture's
//! `ProgressIndicatorService` atomic-counters-plus-short-lock pattern.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A read-only snapshot of an engine's aggregate counters.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub total_ops: u64,
    pub successful: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub total_bytes: u64,
    pub avg_throughput: f64,
    pub peak_throughput: f64,
    pub avg_op_duration: Duration,
    pub peak_memory: u64,
    pub current_concurrency: u64,
    pub error_rate: f64,
    pub last_op_time: Option<Instant>,
}

#[derive(Default)]
struct Averages {
    avg_throughput: f64,
    avg_op_duration: Duration,
    last_op_time: Option<Instant>,
}

/// Owned per-engine metrics record. Updates on the write path use
/// atomics or a short-held mutex; reads return a consistent snapshot
/// built from a single acquisition of each.
pub struct EngineMetrics {
    total_ops: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    total_bytes: AtomicU64,
    peak_throughput_bits: AtomicU64,
    peak_memory: AtomicU64,
    current_concurrency: AtomicI64,
    averages: Mutex<Averages>,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            total_ops: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            peak_throughput_bits: AtomicU64::new(0),
            peak_memory: AtomicU64::new(0),
            current_concurrency: AtomicI64::new(0),
            averages: Mutex::new(Averages::default()),
        }
    }

    pub fn enter_concurrency(&self) {
        self.current_concurrency.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exit_concurrency(&self) {
        self.current_concurrency.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, bytes: u64, duration: Duration) {
        self.total_ops.fetch_add(1, Ordering::Relaxed);
        self.successful.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.record_throughput(bytes, duration);
    }

    pub fn record_failure(&self) {
        self.total_ops.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.total_ops.fetch_add(1, Ordering::Relaxed);
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_peak_memory(&self, bytes: u64) {
        self.peak_memory.fetch_max(bytes, Ordering::Relaxed);
    }

    fn record_throughput(&self, bytes: u64, duration: Duration) {
        let throughput = if duration.as_secs_f64() > 0.0 {
            bytes as f64 / duration.as_secs_f64()
        } else {
            0.0
        };
        self.peak_throughput_bits.fetch_max(throughput.to_bits(), Ordering::Relaxed);

        let mut averages = self.averages.lock();
        let n = self.successful.load(Ordering::Relaxed).max(1) as f64;
        averages.avg_throughput += (throughput - averages.avg_throughput) / n;
        let prev_nanos = averages.avg_op_duration.as_nanos() as f64;
        let new_nanos = prev_nanos + (duration.as_nanos() as f64 - prev_nanos) / n;
        averages.avg_op_duration = Duration::from_nanos(new_nanos as u64);
        averages.last_op_time = Some(Instant::now());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_ops = self.total_ops.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let averages = self.averages.lock();
        MetricsSnapshot {
            total_ops,
            successful: self.successful.load(Ordering::Relaxed),
            failed,
            cancelled: self.cancelled.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            avg_throughput: averages.avg_throughput,
            peak_throughput: f64::from_bits(self.peak_throughput_bits.load(Ordering::Relaxed)),
            avg_op_duration: averages.avg_op_duration,
            peak_memory: self.peak_memory.load(Ordering::Relaxed),
            current_concurrency: self.current_concurrency.load(Ordering::Relaxed).max(0) as u64,
            error_rate: if total_ops > 0 { failed as f64 / total_ops as f64 } else { 0.0 },
            last_op_time: averages.last_op_time,
        }
    }
}

/// Per-processor metrics for the block XOR/store stage of one operation.
#[derive(Default)]
pub struct ProcessorMetrics {
    blocks_processed: AtomicU64,
    error_count: AtomicU64,
    total_processing_nanos: AtomicU64,
    peak_processing_nanos: AtomicU64,
}

#[derive(Debug, Clone)]
pub struct ProcessorMetricsSnapshot {
    pub blocks_processed: u64,
    pub avg_processing_time: Duration,
    pub peak_processing_time: Duration,
    pub error_count: u64,
    pub success_rate: f64,
    pub total_processing_time: Duration,
}

impl ProcessorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_block(&self, duration: Duration) {
        self.blocks_processed.fetch_add(1, Ordering::Relaxed);
        self.total_processing_nanos.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        self.peak_processing_nanos.fetch_max(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProcessorMetricsSnapshot {
        let blocks = self.blocks_processed.load(Ordering::Relaxed);
        let errors = self.error_count.load(Ordering::Relaxed);
        let total_nanos = self.total_processing_nanos.load(Ordering::Relaxed);
        let attempts = blocks + errors;
        ProcessorMetricsSnapshot {
            blocks_processed: blocks,
            avg_processing_time: if blocks > 0 {
                Duration::from_nanos(total_nanos / blocks)
            } else {
                Duration::ZERO
            },
            peak_processing_time: Duration::from_nanos(self.peak_processing_nanos.load(Ordering::Relaxed)),
            error_count: errors,
            success_rate: if attempts > 0 { blocks as f64 / attempts as f64 } else { 1.0 },
            total_processing_time: Duration::from_nanos(total_nanos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_operations() {
        let metrics = EngineMetrics::new();
        metrics.record_success(1024, Duration::from_millis(10));
        metrics.record_success(2048, Duration::from_millis(20));
        metrics.record_failure();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_ops, 3);
        assert_eq!(snap.successful, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.total_bytes, 3072);
        assert!(snap.avg_throughput > 0.0);
        assert!((snap.error_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn concurrency_counter_tracks_enter_exit() {
        let metrics = EngineMetrics::new();
        metrics.enter_concurrency();
        metrics.enter_concurrency();
        assert_eq!(metrics.snapshot().current_concurrency, 2);
        metrics.exit_concurrency();
        assert_eq!(metrics.snapshot().current_concurrency, 1);
    }

    #[test]
    fn processor_metrics_track_blocks_and_errors() {
        let metrics = ProcessorMetrics::new();
        metrics.record_block(Duration::from_millis(5));
        metrics.record_block(Duration::from_millis(15));
        metrics.record_error();

        let snap = metrics.snapshot();
        assert_eq!(snap.blocks_processed, 2);
        assert_eq!(snap.error_count, 1);
        assert_eq!(snap.avg_processing_time, Duration::from_millis(10));
        assert!((snap.success_rate - 2.0 / 3.0).abs() < 1e-9);
    }
}
