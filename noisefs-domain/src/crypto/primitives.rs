// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cryptographic Primitives
//!
//! Free functions over explicit `(key, bytes)` arguments; no global state.
//! The password-based key derivation is memory-hard (Argon2id), the
//! symmetric encryption is an AEAD (AES-256-GCM) with the nonce prepended
//! to the ciphertext, and a separate, lower-cost Argon2id profile backs
//! user-credential password hashing (distinct from the storage KDF).

use crate::error::NoiseFsError;
use aes_gcm::{aead::Aead, Aes256Gcm, Key, KeyInit, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use ring::rand::{SecureRandom, SystemRandom};

pub const KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Parameters for the storage-key KDF: `t=1, m=64 MiB, p=4, output=32B`.
fn storage_kdf() -> Result<Argon2<'static>, NoiseFsError> {
    let params = Params::new(64 * 1024, 1, 4, Some(KEY_LEN))
        .map_err(|e| NoiseFsError::invalid_argument(format!("invalid KDF params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Draws `len` cryptographically secure random bytes.
pub fn secure_random(len: usize) -> Result<Vec<u8>, NoiseFsError> {
    let rng = SystemRandom::new();
    let mut out = vec![0u8; len];
    rng.fill(&mut out)
        .map_err(|_| NoiseFsError::invalid_argument("failed to generate random bytes"))?;
    Ok(out)
}

/// Derives a 32-byte key from `password` and a 32-byte `salt` via the
/// memory-hard storage KDF. Fails if `salt` is not exactly 32 bytes.
pub fn derive(password: &[u8], salt: &[u8]) -> Result<[u8; KEY_LEN], NoiseFsError> {
    if salt.len() != SALT_LEN {
        return Err(NoiseFsError::invalid_argument(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }
    let kdf = storage_kdf()?;
    let mut out = [0u8; KEY_LEN];
    kdf.hash_password_into(password, salt, &mut out)
        .map_err(|e| NoiseFsError::invalid_argument(format!("key derivation failed: {e}")))?;
    Ok(out)
}

/// Encrypts `plain` under `key` (must be 32 bytes). Returns
/// `nonce(12) || ciphertext_with_tag`.
pub fn encrypt(plain: &[u8], key: &[u8]) -> Result<Vec<u8>, NoiseFsError> {
    if key.len() != KEY_LEN {
        return Err(NoiseFsError::invalid_argument(format!(
            "AEAD key must be {KEY_LEN} bytes"
        )));
    }
    let nonce_bytes = secure_random(NONCE_LEN)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plain)
        .map_err(|_| NoiseFsError::invalid_argument("encryption failed"))?;
    let mut out = nonce_bytes;
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts `nonce(12) || ciphertext_with_tag` under `key`. Fails with
/// `AuthenticationFailed` if the tag does not verify; no plaintext is
/// returned on failure.
pub fn decrypt(data: &[u8], key: &[u8]) -> Result<Vec<u8>, NoiseFsError> {
    if key.len() != KEY_LEN {
        return Err(NoiseFsError::invalid_argument(format!(
            "AEAD key must be {KEY_LEN} bytes"
        )));
    }
    if data.len() < NONCE_LEN {
        return Err(NoiseFsError::invalid_argument("ciphertext shorter than nonce"));
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| NoiseFsError::authentication_failed("AEAD tag verification failed"))
}

/// Hashes a user credential password with a cost-factor-12-equivalent
/// Argon2id profile, returning a PHC-format string suitable for storage.
pub fn hash_password(password: &[u8]) -> Result<String, NoiseFsError> {
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(19456, 2, 1, None)
        .map_err(|e| NoiseFsError::invalid_argument(format!("invalid password hash params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let hash = argon2
        .hash_password(password, &salt)
        .map_err(|e| NoiseFsError::invalid_argument(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verifies a password against a PHC-format hash in constant time.
pub fn verify_password(password: &[u8], phc_hash: &str) -> Result<bool, NoiseFsError> {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};
    let parsed = PasswordHash::new(phc_hash)
        .map_err(|e| NoiseFsError::invalid_argument(format!("malformed password hash: {e}")))?;
    Ok(Argon2::default().verify_password(password, &parsed).is_ok())
}

/// Overwrites `buf` with zeros in a manner the compiler may not elide.
pub fn secure_erase(buf: &mut [u8]) {
    use zeroize::Zeroize;
    buf.zeroize();
}

/// SHA-256 digest, used by the in-memory test backend's content
/// addressing and by integrity checks at `ValidationLevel::Strict`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = ring::digest::digest(&ring::digest::SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}
