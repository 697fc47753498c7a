// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Filename encryption under a directory key.

use crate::crypto::key::EncryptionKey;
use crate::crypto::primitives;
use crate::error::NoiseFsError;

/// AEAD-encrypts `name` under `dir_key`. A fresh nonce is drawn each
/// call, so two encryptions of the same name produce different bytes.
pub fn encrypt_filename(name: &str, dir_key: &EncryptionKey) -> Result<Vec<u8>, NoiseFsError> {
    primitives::encrypt(name.as_bytes(), dir_key.key_bytes())
}

/// Inverse of [`encrypt_filename`]. A wrong `dir_key` surfaces as
/// `AuthenticationFailed`.
pub fn decrypt_filename(bytes: &[u8], dir_key: &EncryptionKey) -> Result<String, NoiseFsError> {
    let plain = primitives::decrypt(bytes, dir_key.key_bytes())?;
    String::from_utf8(plain).map_err(|e| NoiseFsError::invalid_argument(format!("decrypted filename not utf-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_and_varies_ciphertext() {
        let master = EncryptionKey::generate_key(b"p").unwrap();
        let dir_key = EncryptionKey::derive_directory_key(&master, "/home/user/docs").unwrap();
        let a = encrypt_filename("secret-document.pdf", &dir_key).unwrap();
        let b = encrypt_filename("secret-document.pdf", &dir_key).unwrap();
        assert_ne!(a, b);
        assert_eq!(decrypt_filename(&a, &dir_key).unwrap(), "secret-document.pdf");
        assert_eq!(decrypt_filename(&b, &dir_key).unwrap(), "secret-document.pdf");
    }

    #[test]
    fn wrong_key_fails() {
        let master = EncryptionKey::generate_key(b"p").unwrap();
        let dir_key = EncryptionKey::derive_directory_key(&master, "/a").unwrap();
        let other_dir_key = EncryptionKey::derive_directory_key(&master, "/b").unwrap();
        let ct = encrypt_filename("name", &dir_key).unwrap();
        assert!(decrypt_filename(&ct, &other_dir_key).is_err());
    }
}
