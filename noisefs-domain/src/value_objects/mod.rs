//! # Descriptor and Manifest Value Objects
//!
//! Pure data types with validation and (de)serialization: the block
//! triple, the file/directory descriptor, the directory manifest, and
//! the encrypted-descriptor wire envelope.

pub mod block_triple;
pub mod descriptor;
pub mod directory_manifest;
pub mod encrypted_descriptor;

pub use block_triple::BlockTriple;
pub use descriptor::{Descriptor, DescriptorType};
pub use directory_manifest::{DirectoryEntry, DirectoryManifest, EntryType, SnapshotInfo};
pub use encrypted_descriptor::EncryptedDescriptor;
