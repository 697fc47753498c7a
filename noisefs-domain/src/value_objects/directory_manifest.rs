// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # DirectoryManifest
//!
//! The decrypted payload referenced by a directory [`Descriptor`](super::descriptor::Descriptor).
//! On the wire it is gzip-compressed JSON; when stored it is further
//! wrapped in the AEAD envelope produced by [`encrypt_manifest`].

use crate::crypto::key::EncryptionKey;
use crate::crypto::primitives;
use crate::error::NoiseFsError;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};

pub const MANIFEST_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    File,
    Directory,
}

/// One entry in a directory manifest: an encrypted filename paired with
/// the CID of the entry's own descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub encrypted_name: Vec<u8>,
    pub cid: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub size: i64,
    pub modified_at: DateTime<Utc>,
}

impl DirectoryEntry {
    pub fn validate(&self) -> Result<(), NoiseFsError> {
        if self.encrypted_name.is_empty() {
            return Err(NoiseFsError::validation_failed("directory entry encrypted_name must be non-empty"));
        }
        if self.cid.is_empty() {
            return Err(NoiseFsError::validation_failed("directory entry cid must be non-empty"));
        }
        if self.entry_type == EntryType::Directory && self.size != 0 {
            return Err(NoiseFsError::validation_failed("directory entries must have size == 0"));
        }
        if self.entry_type == EntryType::File && self.size < 0 {
            return Err(NoiseFsError::validation_failed("file entries must have size >= 0"));
        }
        Ok(())
    }
}

/// A named, timestamped reference to a prior manifest state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub is_snapshot: bool,
    pub original_cid: String,
    pub creation_time: DateTime<Utc>,
    pub snapshot_name: String,
    pub description: String,
}

/// The decrypted payload a directory descriptor's `manifest_cid` points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryManifest {
    pub version: String,
    pub entries: Vec<DirectoryEntry>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<HashMap<String, Vec<u8>>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub snapshot_info: Option<SnapshotInfo>,
}

impl DirectoryManifest {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: MANIFEST_VERSION.to_string(),
            entries: Vec::new(),
            created_at: now,
            modified_at: now,
            metadata: None,
            snapshot_info: None,
        }
    }

    pub fn validate(&self) -> Result<(), NoiseFsError> {
        if self.version != MANIFEST_VERSION {
            return Err(NoiseFsError::validation_failed(format!(
                "unsupported manifest version {}",
                self.version
            )));
        }
        for entry in &self.entries {
            entry.validate()?;
        }
        if let Some(info) = &self.snapshot_info {
            if info.is_snapshot && info.snapshot_name.is_empty() {
                return Err(NoiseFsError::validation_failed("snapshot manifest requires a non-empty snapshot_name"));
            }
        }
        Ok(())
    }

    /// JSON-encode then gzip-compress.
    pub fn marshal(&self) -> Result<Vec<u8>, NoiseFsError> {
        self.validate()?;
        let json = serde_json::to_vec(self)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    /// Inverse of [`DirectoryManifest::marshal`]: gunzip then decode.
    pub fn unmarshal(bytes: &[u8]) -> Result<Self, NoiseFsError> {
        let mut decoder = GzDecoder::new(bytes);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json)?;
        let manifest: DirectoryManifest = serde_json::from_slice(&json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validates, marshals, and AEAD-encrypts under `key`.
    pub fn encrypt_manifest(&self, key: &EncryptionKey) -> Result<Vec<u8>, NoiseFsError> {
        let marshaled = self.marshal()?;
        primitives::encrypt(&marshaled, key.key_bytes())
    }

    /// AEAD-decrypts, unmarshals, and validates. A wrong key surfaces as
    /// `AuthenticationFailed` from the inner AEAD decrypt.
    pub fn decrypt_manifest(ciphertext: &[u8], key: &EncryptionKey) -> Result<Self, NoiseFsError> {
        let marshaled = primitives::decrypt(ciphertext, key.key_bytes())?;
        Self::unmarshal(&marshaled)
    }

    fn find_index_by_name(&self, encrypted_name: &[u8]) -> Option<usize> {
        self.entries.iter().position(|e| e.encrypted_name == encrypted_name)
    }

    pub fn find_entry_by_name(&self, encrypted_name: &[u8]) -> Option<&DirectoryEntry> {
        self.find_index_by_name(encrypted_name).map(|i| &self.entries[i])
    }

    pub fn has_entry(&self, encrypted_name: &[u8]) -> bool {
        self.find_index_by_name(encrypted_name).is_some()
    }

    pub fn add_entry(&mut self, entry: DirectoryEntry) -> Result<(), NoiseFsError> {
        entry.validate()?;
        if self.has_entry(&entry.encrypted_name) {
            return Err(NoiseFsError::invalid_argument("an entry with this encrypted name already exists"));
        }
        self.entries.push(entry);
        self.modified_at = Utc::now();
        Ok(())
    }

    pub fn remove_entry(&mut self, encrypted_name: &[u8]) -> Result<DirectoryEntry, NoiseFsError> {
        let idx = self
            .find_index_by_name(encrypted_name)
            .ok_or_else(|| NoiseFsError::not_found("no entry with this encrypted name"))?;
        let removed = self.entries.remove(idx);
        self.modified_at = Utc::now();
        Ok(removed)
    }

    pub fn update_entry(&mut self, encrypted_name: &[u8], updated: DirectoryEntry) -> Result<(), NoiseFsError> {
        updated.validate()?;
        let idx = self
            .find_index_by_name(encrypted_name)
            .ok_or_else(|| NoiseFsError::not_found("no entry with this encrypted name"))?;
        self.entries[idx] = updated;
        self.modified_at = Utc::now();
        Ok(())
    }

    /// Deep-copies `original`'s entries and metadata into a new manifest
    /// stamped with a fresh timestamp and attached snapshot info.
    pub fn new_snapshot_manifest(
        original: &DirectoryManifest,
        original_cid: impl Into<String>,
        snapshot_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, NoiseFsError> {
        let snapshot_name = snapshot_name.into();
        if snapshot_name.is_empty() {
            return Err(NoiseFsError::invalid_argument("snapshot_name must be non-empty"));
        }
        let now = Utc::now();
        Ok(Self {
            version: MANIFEST_VERSION.to_string(),
            entries: original.entries.clone(),
            created_at: now,
            modified_at: now,
            metadata: original.metadata.clone(),
            snapshot_info: Some(SnapshotInfo {
                is_snapshot: true,
                original_cid: original_cid.into(),
                creation_time: now,
                snapshot_name,
                description: description.into(),
            }),
        })
    }
}

impl Default for DirectoryManifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &[u8], cid: &str) -> DirectoryEntry {
        DirectoryEntry {
            encrypted_name: name.to_vec(),
            cid: cid.to_string(),
            entry_type: EntryType::File,
            size: 1024,
            modified_at: Utc::now(),
        }
    }

    #[test]
    fn marshal_round_trips() {
        let mut m = DirectoryManifest::new();
        m.add_entry(entry(b"E", "QmCid")).unwrap();
        let bytes = m.marshal().unwrap();
        let back = DirectoryManifest::unmarshal(&bytes).unwrap();
        assert_eq!(back.entries.len(), 1);
        assert_eq!(back.entries[0].cid, "QmCid");
    }

    #[test]
    fn encrypt_decrypt_round_trips_and_rejects_wrong_key() {
        let key = EncryptionKey::generate_key(b"p").unwrap();
        let other = EncryptionKey::generate_key(b"q").unwrap();
        let mut m = DirectoryManifest::new();
        m.add_entry(entry(b"E", "QmCid")).unwrap();
        let ct = m.encrypt_manifest(&key).unwrap();
        let back = DirectoryManifest::decrypt_manifest(&ct, &key).unwrap();
        assert_eq!(back.entries[0].cid, "QmCid");
        assert!(DirectoryManifest::decrypt_manifest(&ct, &other).is_err());
    }

    #[test]
    fn directory_entries_must_have_zero_size() {
        let mut bad = entry(b"E", "QmCid");
        bad.entry_type = EntryType::Directory;
        bad.size = 10;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn snapshot_deep_copies_and_stamps_info() {
        let mut original = DirectoryManifest::new();
        original.add_entry(entry(b"E", "QmCid")).unwrap();
        let snap = DirectoryManifest::new_snapshot_manifest(&original, "QmOriginal", "before-migration", "pre-migration backup").unwrap();
        assert_eq!(snap.entries, original.entries);
        let info = snap.snapshot_info.unwrap();
        assert!(info.is_snapshot);
        assert_eq!(info.original_cid, "QmOriginal");
        assert_eq!(info.snapshot_name, "before-migration");
    }

    #[test]
    fn mutation_lookups_are_by_encrypted_name() {
        let mut m = DirectoryManifest::new();
        m.add_entry(entry(b"E1", "cid1")).unwrap();
        assert!(m.has_entry(b"E1"));
        assert!(!m.has_entry(b"E2"));
        let mut updated = entry(b"E1", "cid1-new");
        updated.size = 2048;
        m.update_entry(b"E1", updated).unwrap();
        assert_eq!(m.find_entry_by_name(b"E1").unwrap().cid, "cid1-new");
        m.remove_entry(b"E1").unwrap();
        assert!(!m.has_entry(b"E1"));
    }
}
