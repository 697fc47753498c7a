// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # NoiseFS
//!
//! A privacy-preserving, content-addressed storage engine built around
//! 3-tuple XOR anonymization: every stored block is XORed against two
//! randomizer blocks before it ever reaches the backend, so no single
//! stored block by itself reveals anything about the original content.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Streaming Engine                         │
//! │   (splitter → bounded worker pool → assembler, retry,       │
//! │    cancellation, metrics, progress reporting)                │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             │
//! ┌───────────────────────────┴───────────────────────────────────┐
//! │                   Descriptor Store (plain/encrypted)         │
//! │   (maps a file/directory's block triples to one stored      │
//! │    block, optionally password-encrypted)                     │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             │
//! ┌───────────────────────────┴───────────────────────────────────┐
//! │         External Collaborators (ports, consumed only)        │
//! │   Backend · RandomizerProvider · PasswordProvider            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! ### Block Triples
//! Every anonymized block is recoverable from exactly three content
//! identifiers: the stored (anonymized) block and the two randomizer
//! blocks it was XORed against. XOR is its own inverse, so
//! `original = anonymized ⊕ rand1 ⊕ rand2`.
//!
//! ### Descriptors
//! A [`Descriptor`](noisefs_domain::value_objects::Descriptor) is the
//! only piece of metadata that ties a file's block triples back
//! together. Directories are described indirectly through an encrypted
//! [`DirectoryManifest`](noisefs_domain::value_objects::DirectoryManifest).
//!
//! ### Streaming Engine
//! Uploads and downloads never hold a whole file in memory: a single
//! producer splits (or assembles) blocks while a bounded pool of
//! workers anonymizes/stores (or retrieves/de-anonymizes) them
//! concurrently. See [`streaming::StreamingEngine`].
//!
//! ## Crates
//!
//! This crate builds on [`noisefs_domain`], which holds the pure value
//! objects, cryptographic primitives, and port traits with no
//! dependency on a concrete backend, randomizer provider, or password
//! source. This crate supplies the streaming engine, descriptor
//! stores, reference progress reporters, and an in-memory backend used
//! by its own tests.
//!
//! ## Security
//!
//! - Argon2id for password-derived storage keys and directory keys
//! - AES-256-GCM for descriptor and manifest encryption
//! - `zeroize` on every path that touches a password or raw key
//!
//! See [`noisefs_domain::crypto`] for the primitives themselves.

pub mod backend;
pub mod config;
pub mod descriptor_store;
pub mod password_provider;
pub mod progress;
pub mod streaming;
pub mod telemetry;

pub use noisefs_domain::error::{NoiseFsError, Result, StreamError};
pub use streaming::{DownloadOptions, DownloadResult, StreamingEngine, UploadOptions, UploadResult};
