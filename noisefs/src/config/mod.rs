// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Configuration
//!
//! The defaults a [`StreamingEngine`](crate::streaming::StreamingEngine)
//! falls back to when a caller's `UploadOptions`/`DownloadOptions` leave
//! a field unset. Loadable from TOML, grounded on the reference
//! architecture's `ConfigService::load_observability_config`: a
//! missing file is not an error, only a reason to fall back to
//! built-in defaults with a logged warning.

use crate::streaming::{RetryPolicy, ValidationLevel};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default block size: 128 KiB, matching the data model's recommended
/// balance between anonymization overhead and per-block bookkeeping.
pub const DEFAULT_BLOCK_SIZE: usize = 128 * 1024;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Engine-wide defaults. Every field here has a counterpart that may be
/// overridden per-call in `UploadOptions`/`DownloadOptions`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub default_block_size: usize,
    pub default_max_concurrency: usize,
    pub default_buffer_size: usize,
    pub default_retry_policy: RetryPolicy,
    pub default_validation_level: ValidationLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_block_size: DEFAULT_BLOCK_SIZE,
            default_max_concurrency: DEFAULT_MAX_CONCURRENCY,
            default_buffer_size: DEFAULT_BUFFER_SIZE,
            default_retry_policy: RetryPolicy::default(),
            default_validation_level: ValidationLevel::default(),
        }
    }
}

/// The subset of `EngineConfig` that can be expressed in TOML; the
/// retry policy's function-valued `retryable` override is necessarily
/// code-only and is left at its default when loading from a file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    streaming: RawStreamingSection,
}

#[derive(Debug, Deserialize)]
struct RawStreamingSection {
    #[serde(default = "default_block_size")]
    block_size: usize,
    #[serde(default = "default_max_concurrency")]
    max_concurrency: usize,
    #[serde(default = "default_buffer_size")]
    buffer_size: usize,
    #[serde(default)]
    validation_level: RawValidationLevel,
    #[serde(default = "default_retry_attempts")]
    retry_max_attempts: u32,
    #[serde(default = "default_retry_initial_delay_ms")]
    retry_initial_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    retry_max_delay_ms: u64,
    #[serde(default = "default_retry_backoff_multiplier")]
    retry_backoff_multiplier: f64,
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}
fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}
fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_initial_delay_ms() -> u64 {
    100
}
fn default_retry_max_delay_ms() -> u64 {
    5000
}
fn default_retry_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RawStreamingSection {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            max_concurrency: default_max_concurrency(),
            buffer_size: default_buffer_size(),
            validation_level: RawValidationLevel::default(),
            retry_max_attempts: default_retry_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            retry_backoff_multiplier: default_retry_backoff_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawValidationLevel {
    None,
    #[default]
    Basic,
    Standard,
    Strict,
}

impl From<RawValidationLevel> for ValidationLevel {
    fn from(raw: RawValidationLevel) -> Self {
        match raw {
            RawValidationLevel::None => ValidationLevel::None,
            RawValidationLevel::Basic => ValidationLevel::Basic,
            RawValidationLevel::Standard => ValidationLevel::Standard,
            RawValidationLevel::Strict => ValidationLevel::Strict,
        }
    }
}

impl EngineConfig {
    /// Parses a `[streaming]` TOML section into engine defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, noisefs_domain::NoiseFsError> {
        let raw: RawConfig = toml::from_str(contents)
            .map_err(|e| noisefs_domain::NoiseFsError::invalid_options(format!("invalid config: {e}")))?;
        let section = raw.streaming;
        Ok(Self {
            default_block_size: section.block_size,
            default_max_concurrency: section.max_concurrency,
            default_buffer_size: section.buffer_size,
            default_retry_policy: RetryPolicy {
                max_attempts: section.retry_max_attempts,
                initial_delay: Duration::from_millis(section.retry_initial_delay_ms),
                max_delay: Duration::from_millis(section.retry_max_delay_ms),
                backoff_multiplier: section.retry_backoff_multiplier,
                retryable: None,
            },
            default_validation_level: section.validation_level.into(),
        })
    }

    /// Loads configuration from `path`. A missing file is not an error:
    /// it falls back to [`EngineConfig::default`] with a logged warning,
    /// since most embeddings run fine on defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, noisefs_domain::NoiseFsError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.default_block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.default_max_concurrency, DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn parses_streaming_section() {
        let toml = r#"
            [streaming]
            block_size = 65536
            max_concurrency = 16
            validation_level = "strict"
        "#;
        let config = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.default_block_size, 65536);
        assert_eq!(config.default_max_concurrency, 16);
        assert_eq!(config.default_validation_level, ValidationLevel::Strict);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EngineConfig::from_file("/nonexistent/path/noisefs.toml").unwrap();
        assert_eq!(config.default_block_size, DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn empty_section_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.default_block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.default_validation_level, ValidationLevel::Basic);
    }

    #[test]
    fn loads_an_actual_file_from_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [streaming]
            block_size = 32768
            max_concurrency = 2
            "#
        )
        .unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_block_size, 32768);
        assert_eq!(config.default_max_concurrency, 2);
    }
}
