// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ProgressReporter Port
//!
//! A narrow reporting interface the streaming engine drives from its hot
//! path. Implementations must not block: a channel-backed reporter
//! exists precisely to decouple slow consumers (a UI, a log sink) from
//! block processing.

use std::time::Duration;

/// A single progress snapshot for one upload or download operation.
#[derive(Debug, Clone, Default)]
pub struct ProgressInfo {
    pub stage: String,
    pub bytes_processed: u64,
    pub total_bytes: Option<u64>,
    pub blocks_processed: u64,
    pub total_blocks: Option<u64>,
    pub elapsed: Duration,
    pub throughput_bytes_per_sec: f64,
}

impl ProgressInfo {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            ..Default::default()
        }
    }
}

/// Receives progress events from the streaming engine. Every method must
/// return quickly; implementations that need to do slow work (terminal
/// I/O, network calls) should hand off to a background task.
pub trait ProgressReporter: Send + Sync {
    fn report_progress(&self, info: &ProgressInfo);

    fn report_error(&self, message: &str, context: &str);

    fn set_total(&self, total_bytes: u64, total_blocks: u64);

    fn complete(&self, info: &ProgressInfo);

    fn cancel(&self, reason: &str);
}
