// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! Error kinds for the cryptographic envelope, descriptor/manifest
//! validation, descriptor store, and streaming engine. Every streaming
//! failure is additionally wrapped in a [`StreamError`] that carries the
//! operation/stage context the engine needs to decide whether to retry.

use thiserror::Error;

/// Domain-specific errors for NoiseFS.
#[derive(Error, Debug, Clone)]
pub enum NoiseFsError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend failure: {0}")]
    BackendFailure(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("decryption required: {0}")]
    DecryptionRequired(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("streamer closed: {0}")]
    StreamerClosed(String),

    #[error("retry exhausted after {attempts} attempts: {source}")]
    RetryExhausted { attempts: u32, source: Box<NoiseFsError> },

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("io error: {0}")]
    IoError(String),
}

impl NoiseFsError {
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn backend_failure(msg: impl Into<String>) -> Self {
        Self::BackendFailure(msg.into())
    }

    pub fn authentication_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    pub fn retry_exhausted(attempts: u32, source: NoiseFsError) -> Self {
        Self::RetryExhausted { attempts, source: Box::new(source) }
    }

    /// Whether a caller may retry the operation that produced this error.
    ///
    /// Matches the retryable set from the error handling design: backend
    /// failures and not-found lookups are transient by nature; everything
    /// else (bad input, auth failure, cancellation, closed streamer) is
    /// terminal.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NoiseFsError::BackendFailure(_) | NoiseFsError::NotFound(_))
    }

    pub fn category(&self) -> &'static str {
        match self {
            NoiseFsError::InvalidOptions(_) => "options",
            NoiseFsError::InvalidArgument(_) => "argument",
            NoiseFsError::NotFound(_) => "not_found",
            NoiseFsError::BackendFailure(_) => "backend",
            NoiseFsError::AuthenticationFailed(_) => "authentication",
            NoiseFsError::DecryptionRequired(_) => "decryption",
            NoiseFsError::ValidationFailed(_) => "validation",
            NoiseFsError::Cancelled(_) => "cancellation",
            NoiseFsError::DeadlineExceeded(_) => "deadline",
            NoiseFsError::StreamerClosed(_) => "closed",
            NoiseFsError::RetryExhausted { .. } => "retry",
            NoiseFsError::SerializationError(_) => "serialization",
            NoiseFsError::IoError(_) => "io",
        }
    }
}

impl From<std::io::Error> for NoiseFsError {
    fn from(err: std::io::Error) -> Self {
        NoiseFsError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for NoiseFsError {
    fn from(err: serde_json::Error) -> Self {
        NoiseFsError::SerializationError(err.to_string())
    }
}

/// Structured failure surfaced by the streaming engine, carrying the
/// context a caller needs to decide whether and how to retry.
///
/// `context` must never carry passwords or raw key material — only
/// identifiers (CIDs, block indices) useful for diagnostics.
#[derive(Error, Debug, Clone)]
#[error("{operation} failed at stage {stage}: {source}")]
pub struct StreamError {
    pub operation: String,
    pub stage: String,
    #[source]
    pub source: NoiseFsError,
    pub retryable: bool,
    pub recovery_action: Option<String>,
    pub context: std::collections::HashMap<String, String>,
}

impl StreamError {
    pub fn new(operation: impl Into<String>, stage: impl Into<String>, source: NoiseFsError) -> Self {
        let retryable = source.is_recoverable();
        Self {
            operation: operation.into(),
            stage: stage.into(),
            source,
            retryable,
            recovery_action: None,
            context: std::collections::HashMap::new(),
        }
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn recovery_action(mut self, action: impl Into<String>) -> Self {
        self.recovery_action = Some(action.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Recovers the underlying error, for equality checks against a known
    /// error kind regardless of the stage wrapper.
    pub fn underlying(&self) -> &NoiseFsError {
        &self.source
    }
}

pub type Result<T> = std::result::Result<T, NoiseFsError>;
