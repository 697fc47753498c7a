// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # EncryptionKey
//!
//! An owned `(key_bytes[32], salt_bytes)` pair with a canonical text
//! encoding and a zeroizing destructor.

use crate::crypto::primitives::{self, KEY_LEN, SALT_LEN};
use crate::error::NoiseFsError;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroize;

const DIRECTORY_KEY_INFO_PREFIX: &str = "noisefs-directory:";
const SYNC_KEY_STRETCH_ITERATIONS: u32 = 100_000;

/// A 32-byte symmetric key paired with its 32-byte salt.
///
/// The key bytes are securely overwritten on drop. The salt is not
/// secret and is not zeroized.
#[derive(Clone)]
pub struct EncryptionKey {
    key: Vec<u8>,
    salt: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct KeyText {
    key: String,
    salt: String,
}

impl EncryptionKey {
    fn from_parts(key: Vec<u8>, salt: Vec<u8>) -> Self {
        Self { key, salt }
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn salt_bytes(&self) -> &[u8] {
        &self.salt
    }

    /// Draws a random 32-byte salt and derives a key from `password` via
    /// the memory-hard storage KDF.
    pub fn generate_key(password: &[u8]) -> Result<Self, NoiseFsError> {
        let salt = primitives::secure_random(SALT_LEN)?;
        let key = primitives::derive(password, &salt)?;
        Ok(Self::from_parts(key.to_vec(), salt))
    }

    /// Reproduces an existing key from `password` and a known 32-byte
    /// `salt`.
    pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<Self, NoiseFsError> {
        let key = primitives::derive(password, salt)?;
        Ok(Self::from_parts(key.to_vec(), salt.to_vec()))
    }

    /// Derives a per-directory key from `master` via an HKDF-like
    /// extract-then-expand over SHA-256, using the master's salt as the
    /// HKDF salt and `"noisefs-directory:" + dir_path` as the info
    /// string. Deterministic: same master and path always yield the
    /// same key; different paths yield independent keys. The returned
    /// key carries the master's salt verbatim.
    pub fn derive_directory_key(master: &EncryptionKey, dir_path: &str) -> Result<Self, NoiseFsError> {
        let info = format!("{DIRECTORY_KEY_INFO_PREFIX}{dir_path}");
        let prk = hkdf_extract(&master.salt, &master.key);
        let okm = hkdf_expand(&prk, info.as_bytes(), KEY_LEN);
        Ok(Self::from_parts(okm, master.salt.clone()))
    }

    /// Derives a fresh sync key by mixing random entropy, an optional
    /// user salt, the session id, and a monotonic timestamp through a
    /// password-stretching KDF. Two calls with identical inputs produce
    /// different keys because of the fresh entropy and timestamp.
    /// `session_id == ""` is an error.
    pub fn generate_secure_sync_key(session_id: &str, user_salt: Option<&[u8]>) -> Result<Self, NoiseFsError> {
        if session_id.is_empty() {
            return Err(NoiseFsError::invalid_argument("session_id must not be empty"));
        }
        let entropy = primitives::secure_random(KEY_LEN)?;
        let salt = compose_sync_salt(session_id, user_salt)?;
        let key = stretch(&entropy, &salt)?;
        Ok(Self::from_parts(key, salt))
    }

    /// Derives a rotation of a sync key by namespacing the session id
    /// with the rotation counter.
    pub fn with_rotation(session_id: &str, user_salt: Option<&[u8]>, counter: u64) -> Result<Self, NoiseFsError> {
        let rotated_session = format!("{session_id}-rotation-{counter}");
        Self::generate_secure_sync_key(&rotated_session, user_salt)
    }

    /// Canonical text form: `base64( JSON({"key":base64(key),"salt":base64(salt)}) )`.
    pub fn to_text(&self) -> Result<String, NoiseFsError> {
        let text = KeyText {
            key: B64.encode(&self.key),
            salt: B64.encode(&self.salt),
        };
        let json = serde_json::to_vec(&text)?;
        Ok(B64.encode(json))
    }

    /// Strict parsing of the canonical text form: empty string, bad
    /// base64, malformed JSON, or missing fields all fail.
    pub fn parse_from_text(text: &str) -> Result<Self, NoiseFsError> {
        if text.is_empty() {
            return Err(NoiseFsError::invalid_argument("empty key text"));
        }
        let json = B64
            .decode(text)
            .map_err(|e| NoiseFsError::invalid_argument(format!("bad base64: {e}")))?;
        let parsed: KeyText = serde_json::from_slice(&json)?;
        let key = B64
            .decode(&parsed.key)
            .map_err(|e| NoiseFsError::invalid_argument(format!("bad key base64: {e}")))?;
        let salt = B64
            .decode(&parsed.salt)
            .map_err(|e| NoiseFsError::invalid_argument(format!("bad salt base64: {e}")))?;
        Ok(Self::from_parts(key, salt))
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

fn compose_sync_salt(session_id: &str, user_salt: Option<&[u8]>) -> Result<Vec<u8>, NoiseFsError> {
    let mut buf = Vec::new();
    if let Some(s) = user_salt {
        buf.extend_from_slice(s);
    }
    buf.extend_from_slice(&primitives::secure_random(16)?);
    buf.extend_from_slice(session_id.as_bytes());
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64
        ^ (SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() << 32);
    buf.extend_from_slice(&nanos.to_le_bytes());
    buf.truncate(SALT_LEN.min(buf.len()));
    // pad to SALT_LEN if the composed buffer happened to be shorter
    buf.resize(SALT_LEN, 0);
    Ok(buf)
}

/// SHA-256-HMAC-based stretch, 100,000 iterations, 32-byte output.
fn stretch(entropy: &[u8], salt: &[u8]) -> Result<Vec<u8>, NoiseFsError> {
    let mut out = vec![0u8; KEY_LEN];
    let iterations = std::num::NonZeroU32::new(SYNC_KEY_STRETCH_ITERATIONS)
        .ok_or_else(|| NoiseFsError::invalid_argument("invalid iteration count"))?;
    ring::pbkdf2::derive(ring::pbkdf2::PBKDF2_HMAC_SHA256, iterations, salt, entropy, &mut out);
    Ok(out)
}

fn hkdf_extract(salt: &[u8], ikm: &[u8]) -> ring::hmac::Tag {
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, salt);
    ring::hmac::sign(&key, ikm)
}

fn hkdf_expand(prk: &ring::hmac::Tag, info: &[u8], len: usize) -> Vec<u8> {
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, prk.as_ref());
    let mut t = Vec::new();
    let mut okm = Vec::with_capacity(len);
    let mut counter: u8 = 1;
    while okm.len() < len {
        let mut ctx = ring::hmac::Context::with_key(&key);
        ctx.update(&t);
        ctx.update(info);
        ctx.update(&[counter]);
        let block = ctx.sign();
        t = block.as_ref().to_vec();
        okm.extend_from_slice(&t);
        counter += 1;
    }
    okm.truncate(len);
    okm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_then_derive_round_trips() {
        let k = EncryptionKey::generate_key(b"hunter2").unwrap();
        let k2 = EncryptionKey::derive_key(b"hunter2", k.salt_bytes()).unwrap();
        assert_eq!(k.key_bytes(), k2.key_bytes());
    }

    #[test]
    fn directory_key_is_deterministic_and_path_dependent() {
        let master = EncryptionKey::generate_key(b"hunter2").unwrap();
        let a1 = EncryptionKey::derive_directory_key(&master, "/a").unwrap();
        let a2 = EncryptionKey::derive_directory_key(&master, "/a").unwrap();
        let b = EncryptionKey::derive_directory_key(&master, "/b").unwrap();
        assert_eq!(a1.key_bytes(), a2.key_bytes());
        assert_ne!(a1.key_bytes(), b.key_bytes());
        assert_eq!(a1.salt_bytes(), master.salt_bytes());
    }

    #[test]
    fn sync_key_requires_nonempty_session() {
        assert!(EncryptionKey::generate_secure_sync_key("", None).is_err());
    }

    #[test]
    fn sync_key_differs_between_calls() {
        let k1 = EncryptionKey::generate_secure_sync_key("session", None).unwrap();
        let k2 = EncryptionKey::generate_secure_sync_key("session", None).unwrap();
        assert_ne!(k1.key_bytes(), k2.key_bytes());
    }

    #[test]
    fn text_encoding_round_trips() {
        let k = EncryptionKey::generate_key(b"hunter2").unwrap();
        let text = k.to_text().unwrap();
        let parsed = EncryptionKey::parse_from_text(&text).unwrap();
        assert_eq!(k.key_bytes(), parsed.key_bytes());
        assert_eq!(k.salt_bytes(), parsed.salt_bytes());
    }

    #[test]
    fn text_parsing_rejects_empty_and_garbage() {
        assert!(EncryptionKey::parse_from_text("").is_err());
        assert!(EncryptionKey::parse_from_text("not base64 json!!").is_err());
    }
}
