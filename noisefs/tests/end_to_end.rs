//! End-to-end scenarios exercised through the public crate API rather
//! than in-module unit tests: a legacy unwrapped descriptor loaded by
//! the streaming engine, and a directory manifest whose filenames and
//! payload are only recoverable under the matching directory key.

use async_trait::async_trait;
use noisefs::backend::InMemoryBackend;
use noisefs::streaming::{xor3, DownloadOptions, StreamingEngine, UploadOptions};
use noisefs_domain::crypto::key::EncryptionKey;
use noisefs_domain::crypto::{decrypt_filename, encrypt_filename, primitives};
use noisefs_domain::ports::{Backend, RandomizerProvider, SelectedRandomizers};
use noisefs_domain::value_objects::{Descriptor, DirectoryEntry, DirectoryManifest, EntryType};
use noisefs_domain::NoiseFsError;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct FixedRandomizer {
    counter: AtomicU64,
}

impl FixedRandomizer {
    fn new() -> Self {
        Self { counter: AtomicU64::new(0) }
    }
}

#[async_trait]
impl RandomizerProvider for FixedRandomizer {
    async fn select(&self, block_size: usize, _hint: Option<&str>) -> Result<SelectedRandomizers, NoiseFsError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(SelectedRandomizers {
            block1: vec![(n * 2 + 1) as u8; block_size],
            cid1: format!("r1-{n}"),
            block2: vec![(n * 2 + 2) as u8; block_size],
            cid2: format!("r2-{n}"),
            new_bytes_introduced: block_size as u64,
        })
    }

    async fn generate(&self, block_size: usize, _metadata: Option<&str>) -> Result<(Vec<u8>, String), NoiseFsError> {
        Ok((vec![0u8; block_size], "generated".to_string()))
    }

    async fn cache(&self, _cid: &str, _block: &[u8], _metadata: Option<&str>) -> Result<(), NoiseFsError> {
        Ok(())
    }

    async fn set_strategy(&self, _strategy: &str) -> Result<(), NoiseFsError> {
        Ok(())
    }
}

/// A file stored by hand-building its block triples and writing a bare
/// descriptor (no encrypted-descriptor envelope) straight to the
/// backend mimics bytes left over from before the envelope format
/// existed. The streaming engine must still load and reconstruct it.
#[tokio::test]
async fn engine_downloads_a_legacy_unwrapped_descriptor() {
    let backend = Arc::new(InMemoryBackend::new());
    let block_size = 64usize;
    let data = vec![9u8; block_size];
    let r1 = vec![1u8; block_size];
    let r2 = vec![2u8; block_size];
    let anonymized = xor3(&data, &r1, &r2).unwrap();

    let data_cid = backend.put(&anonymized).await.unwrap();
    let r1_cid = backend.put(&r1).await.unwrap();
    let r2_cid = backend.put(&r2).await.unwrap();

    let mut descriptor = Descriptor::new_file_descriptor("legacy.bin", block_size as u64, block_size as u64, block_size as u64);
    descriptor.add_block_triple(data_cid, r1_cid, r2_cid).unwrap();
    let descriptor_cid = backend.put(&descriptor.to_json().unwrap()).await.unwrap();

    let engine = StreamingEngine::with_defaults(backend, Arc::new(FixedRandomizer::new()));
    let mut out = Vec::new();
    let result = engine.download(&descriptor_cid, &mut out, DownloadOptions::default()).await.unwrap();

    assert_eq!(result.bytes_written, block_size as u64);
    assert_eq!(out, data);
}

/// A full upload/download round trip with default (unencrypted)
/// descriptor storage, verifying the universal invariant that the
/// recovered bytes equal the original bytes exactly regardless of
/// block-size/stream-length alignment.
#[tokio::test]
async fn upload_then_download_recovers_original_bytes() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = StreamingEngine::with_defaults(backend, Arc::new(FixedRandomizer::new()));

    let data: Vec<u8> = (0..5000u32).map(|i| (i % 256) as u8).collect();
    let mut options = UploadOptions::new("data.bin");
    options.block_size = Some(777);
    options.max_concurrency = Some(3);

    let upload = engine.upload(Cursor::new(data.clone()), options).await.unwrap();
    let mut out = Vec::new();
    let download = engine.download(&upload.descriptor_cid, &mut out, DownloadOptions::default()).await.unwrap();

    assert_eq!(download.bytes_written, data.len() as u64);
    assert_eq!(out, data);
}

/// A directory manifest's filenames and its own ciphertext are bound to
/// a specific directory key derived from a specific master key and
/// path; the wrong master, or the right master at the wrong path, must
/// not be able to recover either.
#[tokio::test]
async fn directory_manifest_only_decrypts_under_its_own_directory_key() {
    let backend = Arc::new(InMemoryBackend::new());

    let master = EncryptionKey::generate_key(b"family photos password").unwrap();
    let dir_key = EncryptionKey::derive_directory_key(&master, "/photos/2026").unwrap();

    let encrypted_name = encrypt_filename("vacation.jpg", &dir_key).unwrap();
    let mut manifest = DirectoryManifest::new();
    manifest
        .add_entry(DirectoryEntry {
            encrypted_name: encrypted_name.clone(),
            cid: "QmChildDescriptor".to_string(),
            entry_type: EntryType::File,
            size: 2_048_000,
            modified_at: chrono::Utc::now(),
        })
        .unwrap();

    let manifest_ciphertext = manifest.encrypt_manifest(&dir_key).unwrap();
    let manifest_cid = backend.put(&manifest_ciphertext).await.unwrap();

    let descriptor = Descriptor::new_directory_descriptor("2026", manifest_cid.clone());
    let descriptor_cid = backend.put(&descriptor.to_json().unwrap()).await.unwrap();

    // Authorized reader: same master, same path.
    let loaded_bytes = backend.get(&descriptor_cid).await.unwrap();
    let loaded_descriptor = Descriptor::from_json(&loaded_bytes).unwrap();
    let stored_manifest_bytes = backend.get(loaded_descriptor.manifest_cid.as_ref().unwrap()).await.unwrap();
    let recovered = DirectoryManifest::decrypt_manifest(&stored_manifest_bytes, &dir_key).unwrap();
    let entry = recovered.find_entry_by_name(&encrypted_name).unwrap();
    assert_eq!(decrypt_filename(&entry.encrypted_name, &dir_key).unwrap(), "vacation.jpg");

    // Same master, sibling directory: derives an independent key.
    let sibling_key = EncryptionKey::derive_directory_key(&master, "/photos/2027").unwrap();
    assert!(DirectoryManifest::decrypt_manifest(&stored_manifest_bytes, &sibling_key).is_err());
    assert!(decrypt_filename(&encrypted_name, &sibling_key).is_err());

    // Different master entirely, same path: also fails.
    let other_master = EncryptionKey::generate_key(b"a different password").unwrap();
    let other_key = EncryptionKey::derive_directory_key(&other_master, "/photos/2026").unwrap();
    assert!(DirectoryManifest::decrypt_manifest(&stored_manifest_bytes, &other_key).is_err());
}

/// Tamper with a single byte of an anonymized block's ciphertext wire
/// format (AEAD envelope) and confirm the authentication tag, not just
/// a checksum, is what catches it.
#[tokio::test]
async fn tampered_manifest_ciphertext_is_rejected() {
    let master = EncryptionKey::generate_key(b"p").unwrap();
    let dir_key = EncryptionKey::derive_directory_key(&master, "/x").unwrap();
    let manifest = DirectoryManifest::new();
    let mut ciphertext = manifest.encrypt_manifest(&dir_key).unwrap();
    let last = ciphertext.len() - 1;
    ciphertext[last] ^= 0x01;
    assert!(DirectoryManifest::decrypt_manifest(&ciphertext, &dir_key).is_err());
}

/// `primitives::encrypt`/`decrypt` directly, to pin the documented wire
/// format (`nonce || ciphertext_with_tag`) at the integration level
/// rather than only inside the crate's own unit tests.
#[tokio::test]
async fn raw_aead_round_trip_via_generated_key() {
    let key = EncryptionKey::generate_key(b"hunter2").unwrap();
    let ciphertext = primitives::encrypt(b"top secret", key.key_bytes()).unwrap();
    assert!(ciphertext.len() > primitives::NONCE_LEN);
    let plaintext = primitives::decrypt(&ciphertext, key.key_bytes()).unwrap();
    assert_eq!(plaintext, b"top secret");
}
