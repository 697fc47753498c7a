//! # Streaming Engine
//!
//! Bounded-memory upload/download over the 3-tuple XOR anonymization
//! scheme: a single-producer splitter, a bounded pool of per-block
//! processors/retrievers, and a single-consumer assembler, orchestrated
//! by [`StreamingEngine`].

pub mod assembler;
pub mod cancellation;
pub mod engine;
pub mod metrics;
pub mod processor;
pub mod retry;
pub mod splitter;
pub mod validation;
pub mod xor;

pub use assembler::{AssemblerProgress, BlockAssembler};
pub use cancellation::CancellationToken;
pub use engine::{DownloadOptions, DownloadResult, StreamingEngine, UploadOptions, UploadResult};
pub use metrics::{EngineMetrics, MetricsSnapshot, ProcessorMetrics, ProcessorMetricsSnapshot};
pub use processor::BlockProcessor;
pub use retry::RetryPolicy;
pub use splitter::{BlockSplitter, SplitBlock};
pub use validation::ValidationLevel;
pub use xor::xor3;
