// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Descriptor
//!
//! The versioned metadata object that lets a file or directory be
//! reconstructed from the backend: for a file, the ordered block triples
//! plus the original length; for a directory, a pointer to the
//! (typically encrypted) [`DirectoryManifest`](super::directory_manifest::DirectoryManifest).

use super::block_triple::BlockTriple;
use crate::error::NoiseFsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DESCRIPTOR_VERSION: &str = "4.0";

/// Distinguishes a file descriptor from a directory descriptor.
///
/// Absent on load (legacy bytes with no `type` field) is treated as
/// [`DescriptorType::File`] for backward compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorType {
    File,
    Directory,
}

impl Default for DescriptorType {
    fn default() -> Self {
        DescriptorType::File
    }
}

/// Versioned metadata for a stored file or directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    pub version: String,
    #[serde(rename = "type", default)]
    pub descriptor_type: DescriptorType,
    pub filename: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub padded_file_size: u64,
    #[serde(default)]
    pub block_size: u64,
    #[serde(default)]
    pub blocks: Vec<BlockTriple>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub manifest_cid: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Descriptor {
    /// Initializes an empty file descriptor at version 4.0. Blocks are
    /// added one at a time via [`Descriptor::add_block_triple`].
    pub fn new_file_descriptor(filename: impl Into<String>, file_size: u64, padded_file_size: u64, block_size: u64) -> Self {
        Self {
            version: DESCRIPTOR_VERSION.to_string(),
            descriptor_type: DescriptorType::File,
            filename: filename.into(),
            file_size,
            padded_file_size,
            block_size,
            blocks: Vec::new(),
            manifest_cid: None,
            created_at: Utc::now(),
        }
    }

    /// Initializes a directory descriptor at version 4.0, referencing
    /// the (typically encrypted) manifest by CID.
    pub fn new_directory_descriptor(name: impl Into<String>, manifest_cid: impl Into<String>) -> Self {
        Self {
            version: DESCRIPTOR_VERSION.to_string(),
            descriptor_type: DescriptorType::Directory,
            filename: name.into(),
            file_size: 0,
            padded_file_size: 0,
            block_size: 0,
            blocks: Vec::new(),
            manifest_cid: Some(manifest_cid.into()),
            created_at: Utc::now(),
        }
    }

    /// Appends a block triple after validating non-emptiness and
    /// pairwise distinctness of its three CIDs.
    pub fn add_block_triple(
        &mut self,
        data_cid: impl Into<String>,
        rand1_cid: impl Into<String>,
        rand2_cid: impl Into<String>,
    ) -> Result<(), NoiseFsError> {
        let triple = BlockTriple::new(data_cid, rand1_cid, rand2_cid)?;
        self.blocks.push(triple);
        Ok(())
    }

    /// True when the final block carries zero-padding past the original
    /// length.
    pub fn is_padded(&self) -> bool {
        self.padded_file_size > self.file_size
    }

    /// Padded length, falling back to `file_size` when the field is
    /// unset (legacy descriptors that predate padding tracking).
    pub fn get_padded_file_size(&self) -> u64 {
        if self.padded_file_size == 0 {
            self.file_size
        } else {
            self.padded_file_size
        }
    }

    /// Checks the type-specific invariants from the data model: file
    /// descriptors require all block fields and forbid `manifest_cid`;
    /// directory descriptors require `manifest_cid` and forbid `blocks`.
    pub fn validate(&self) -> Result<(), NoiseFsError> {
        if self.version != DESCRIPTOR_VERSION {
            return Err(NoiseFsError::validation_failed(format!(
                "unsupported descriptor version {}",
                self.version
            )));
        }
        if self.filename.is_empty() {
            return Err(NoiseFsError::validation_failed("descriptor filename must be non-empty"));
        }
        match self.descriptor_type {
            DescriptorType::File => {
                if self.file_size == 0 {
                    return Err(NoiseFsError::validation_failed("file descriptor requires file_size > 0"));
                }
                if self.block_size == 0 {
                    return Err(NoiseFsError::validation_failed("file descriptor requires block_size > 0"));
                }
                if self.padded_file_size != 0 && self.padded_file_size < self.file_size {
                    return Err(NoiseFsError::validation_failed(
                        "padded_file_size must be >= file_size",
                    ));
                }
                if self.blocks.is_empty() {
                    return Err(NoiseFsError::validation_failed("file descriptor requires at least one block"));
                }
                if self.manifest_cid.is_some() {
                    return Err(NoiseFsError::validation_failed("file descriptor must not carry manifest_cid"));
                }
                for block in &self.blocks {
                    block.validate()?;
                }
            }
            DescriptorType::Directory => {
                match &self.manifest_cid {
                    Some(cid) if !cid.is_empty() => {}
                    _ => return Err(NoiseFsError::validation_failed("directory descriptor requires manifest_cid")),
                }
                if !self.blocks.is_empty() {
                    return Err(NoiseFsError::validation_failed("directory descriptor must not carry blocks"));
                }
            }
        }
        Ok(())
    }

    /// Pretty-printed JSON serialization.
    pub fn to_json(&self) -> Result<Vec<u8>, NoiseFsError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Deserializes and validates in one step; an invalid descriptor
    /// never escapes this function.
    pub fn from_json(bytes: &[u8]) -> Result<Self, NoiseFsError> {
        let descriptor: Descriptor = serde_json::from_slice(bytes)?;
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_descriptor_round_trips_through_json() {
        let mut d = Descriptor::new_file_descriptor("a.txt", 3, 3, 128);
        d.add_block_triple("d", "r1", "r2").unwrap();
        let json = d.to_json().unwrap();
        let back = Descriptor::from_json(&json).unwrap();
        assert_eq!(back.filename, "a.txt");
        assert_eq!(back.blocks.len(), 1);
        assert_eq!(back.descriptor_type, DescriptorType::File);
    }

    #[test]
    fn directory_descriptor_forbids_blocks() {
        let mut d = Descriptor::new_directory_descriptor("docs", "QmManifest");
        d.blocks.push(BlockTriple::new("d", "r1", "r2").unwrap());
        assert!(d.validate().is_err());
    }

    #[test]
    fn file_descriptor_forbids_manifest_cid() {
        let mut d = Descriptor::new_file_descriptor("a.txt", 3, 3, 128);
        d.add_block_triple("d", "r1", "r2").unwrap();
        d.manifest_cid = Some("Qm".to_string());
        assert!(d.validate().is_err());
    }

    #[test]
    fn missing_type_field_defaults_to_file() {
        let json = br#"{"version":"4.0","filename":"a.txt","file_size":3,"padded_file_size":3,
            "block_size":128,"blocks":[{"data_cid":"d","randomizer_cid1":"r1","randomizer_cid2":"r2"}],
            "created_at":"2024-01-01T00:00:00Z"}"#;
        let d = Descriptor::from_json(json).unwrap();
        assert_eq!(d.descriptor_type, DescriptorType::File);
    }

    #[test]
    fn padding_helpers() {
        let d = Descriptor::new_file_descriptor("a", 100, 128, 128);
        assert!(d.is_padded());
        assert_eq!(d.get_padded_file_size(), 128);

        let legacy = Descriptor {
            padded_file_size: 0,
            ..Descriptor::new_file_descriptor("a", 100, 0, 128)
        };
        assert_eq!(legacy.get_padded_file_size(), 100);
    }
}
