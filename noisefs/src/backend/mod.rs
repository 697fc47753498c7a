//! # Reference Backend
//!
//! The block storage backend itself is an out-of-scope external
//! collaborator (spec §1); this module carries only the in-memory,
//! content-hash-addressed implementation this crate's own tests and
//! doctests run against.

pub mod memory;

pub use memory::InMemoryBackend;
