// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Progress Reporters
//!
//! Reference implementations of [`ProgressReporter`]: a throttled
//! terminal reporter and its `tracing`-backed sibling, a non-blocking
//! channel fan-out, a broadcast-to-many wrapper, and a no-op. Grounded
//! on the reference architecture's `ProgressIndicatorService`: atomic
//! counters for the hot path, a short-held mutex only for throttling
//! and output coordination.

use noisefs_domain::ports::{ProgressInfo, ProgressReporter};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

const THROTTLE_INTERVAL: Duration = Duration::from_millis(100);
const THROTTLE_BLOCK_STRIDE: u64 = 10;

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[unit])
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// Throttles reporter updates to at most once per [`THROTTLE_INTERVAL`]
/// or every [`THROTTLE_BLOCK_STRIDE`] blocks, whichever comes first.
struct Throttle {
    last_emit: Mutex<Instant>,
}

impl Throttle {
    fn new() -> Self {
        Self { last_emit: Mutex::new(Instant::now()) }
    }

    fn should_emit(&self, blocks_processed: u64) -> bool {
        if blocks_processed > 0 && blocks_processed % THROTTLE_BLOCK_STRIDE == 0 {
            *self.last_emit.lock() = Instant::now();
            return true;
        }
        let mut last_emit = self.last_emit.lock();
        if last_emit.elapsed() >= THROTTLE_INTERVAL {
            *last_emit = Instant::now();
            true
        } else {
            false
        }
    }
}

/// Writes an in-place progress line to stdout, throttled to avoid
/// flooding the terminal under high block throughput.
pub struct ConsoleProgressReporter {
    throttle: Throttle,
    terminal: Mutex<()>,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self { throttle: Throttle::new(), terminal: Mutex::new(()) }
    }
}

impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, info: &ProgressInfo) {
        if !self.throttle.should_emit(info.blocks_processed) {
            return;
        }
        let _lock = self.terminal.lock();
        print!(
            "\r{}: {} blocks, {} ({:.1} MB/s)",
            info.stage,
            info.blocks_processed,
            format_bytes(info.bytes_processed),
            info.throughput_bytes_per_sec / (1024.0 * 1024.0)
        );
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }

    fn report_error(&self, message: &str, context: &str) {
        let _lock = self.terminal.lock();
        println!("\nerror during {context}: {message}");
    }

    fn set_total(&self, total_bytes: u64, total_blocks: u64) {
        let _lock = self.terminal.lock();
        println!("expecting {total_blocks} blocks, {}", format_bytes(total_bytes));
    }

    fn complete(&self, info: &ProgressInfo) {
        let _lock = self.terminal.lock();
        println!(
            "\n{} complete: {} in {:.2}s ({:.1} MB/s)",
            info.stage,
            format_bytes(info.bytes_processed),
            info.elapsed.as_secs_f64(),
            info.throughput_bytes_per_sec / (1024.0 * 1024.0)
        );
    }

    fn cancel(&self, reason: &str) {
        let _lock = self.terminal.lock();
        println!("\ncancelled: {reason}");
    }
}

/// Emits progress through `tracing` instead of the terminal, at the
/// same throttle cadence as [`ConsoleProgressReporter`]. Suited to
/// services that already route everything through structured logging.
pub struct LogProgressReporter {
    throttle: Throttle,
}

impl LogProgressReporter {
    pub fn new() -> Self {
        Self { throttle: Throttle::new() }
    }
}

impl Default for LogProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for LogProgressReporter {
    fn report_progress(&self, info: &ProgressInfo) {
        if !self.throttle.should_emit(info.blocks_processed) {
            return;
        }
        tracing::info!(
            stage = %info.stage,
            blocks_processed = info.blocks_processed,
            bytes_processed = info.bytes_processed,
            throughput_mb_s = info.throughput_bytes_per_sec / (1024.0 * 1024.0),
            "progress"
        );
    }

    fn report_error(&self, message: &str, context: &str) {
        tracing::warn!(context, message, "streaming error");
    }

    fn set_total(&self, total_bytes: u64, total_blocks: u64) {
        tracing::info!(total_bytes, total_blocks, "operation started");
    }

    fn complete(&self, info: &ProgressInfo) {
        tracing::info!(
            stage = %info.stage,
            bytes_processed = info.bytes_processed,
            elapsed_secs = info.elapsed.as_secs_f64(),
            "operation complete"
        );
    }

    fn cancel(&self, reason: &str) {
        tracing::warn!(reason, "operation cancelled");
    }
}

/// A single reportable event, as sent over a [`ChannelProgressReporter`].
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Progress(ProgressInfo),
    Error { message: String, context: String },
    Total { total_bytes: u64, total_blocks: u64 },
    Complete(ProgressInfo),
    Cancel(String),
}

/// Forwards every event onto an unbounded `tokio::sync::mpsc` channel
/// without blocking the caller, decoupling a slow consumer (a UI) from
/// the streaming engine's hot path.
pub struct ChannelProgressReporter {
    sender: tokio::sync::mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressReporter {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressReporter for ChannelProgressReporter {
    fn report_progress(&self, info: &ProgressInfo) {
        let _ = self.sender.send(ProgressEvent::Progress(info.clone()));
    }

    fn report_error(&self, message: &str, context: &str) {
        let _ = self.sender.send(ProgressEvent::Error {
            message: message.to_string(),
            context: context.to_string(),
        });
    }

    fn set_total(&self, total_bytes: u64, total_blocks: u64) {
        let _ = self.sender.send(ProgressEvent::Total { total_bytes, total_blocks });
    }

    fn complete(&self, info: &ProgressInfo) {
        let _ = self.sender.send(ProgressEvent::Complete(info.clone()));
    }

    fn cancel(&self, reason: &str) {
        let _ = self.sender.send(ProgressEvent::Cancel(reason.to_string()));
    }
}

/// Broadcasts every event to a fixed set of reporters, e.g. a console
/// reporter for the operator plus a channel reporter for a UI.
pub struct MultiProgressReporter {
    reporters: Vec<std::sync::Arc<dyn ProgressReporter>>,
}

impl MultiProgressReporter {
    pub fn new(reporters: Vec<std::sync::Arc<dyn ProgressReporter>>) -> Self {
        Self { reporters }
    }
}

impl ProgressReporter for MultiProgressReporter {
    fn report_progress(&self, info: &ProgressInfo) {
        for r in &self.reporters {
            r.report_progress(info);
        }
    }

    fn report_error(&self, message: &str, context: &str) {
        for r in &self.reporters {
            r.report_error(message, context);
        }
    }

    fn set_total(&self, total_bytes: u64, total_blocks: u64) {
        for r in &self.reporters {
            r.set_total(total_bytes, total_blocks);
        }
    }

    fn complete(&self, info: &ProgressInfo) {
        for r in &self.reporters {
            r.complete(info);
        }
    }

    fn cancel(&self, reason: &str) {
        for r in &self.reporters {
            r.cancel(reason);
        }
    }
}

/// Discards every event. The default for callers that don't need
/// progress feedback.
#[derive(Default)]
pub struct NoopProgressReporter;

impl ProgressReporter for NoopProgressReporter {
    fn report_progress(&self, _info: &ProgressInfo) {}
    fn report_error(&self, _message: &str, _context: &str) {}
    fn set_total(&self, _total_bytes: u64, _total_blocks: u64) {}
    fn complete(&self, _info: &ProgressInfo) {}
    fn cancel(&self, _reason: &str) {}
}
