// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Encrypted Descriptor Store
//!
//! Adds password-based encryption on top of [`PlainDescriptorStore`]'s
//! JSON-to-block mapping: the password provider is consulted fresh on
//! every save/load, an empty password stores the plain descriptor
//! wrapped in an unencrypted envelope, and a non-empty password
//! AEAD-encrypts it under a freshly derived key.

use super::DescriptorStore;
use async_trait::async_trait;
use noisefs_domain::crypto::key::EncryptionKey;
use noisefs_domain::crypto::primitives;
use noisefs_domain::ports::{Backend, PasswordProvider};
use noisefs_domain::value_objects::{Descriptor, EncryptedDescriptor};
use noisefs_domain::NoiseFsError;
use std::sync::Arc;
use zeroize::Zeroize;

pub struct EncryptedDescriptorStore {
    backend: Arc<dyn Backend>,
    password_provider: Arc<dyn PasswordProvider>,
}

impl EncryptedDescriptorStore {
    pub fn new(backend: Arc<dyn Backend>, password_provider: Arc<dyn PasswordProvider>) -> Self {
        Self { backend, password_provider }
    }

    async fn save_with_password(&self, descriptor: &Descriptor, password: &str) -> Result<String, NoiseFsError> {
        descriptor.validate()?;
        let mut plaintext = descriptor.to_json()?;

        let envelope = if password.is_empty() {
            EncryptedDescriptor::plain(plaintext.clone())
        } else {
            let mut password_bytes = password.as_bytes().to_vec();
            let key = EncryptionKey::generate_key(&password_bytes);
            password_bytes.zeroize();
            let key = key?;
            let ciphertext = primitives::encrypt(&plaintext, key.key_bytes());
            // `key`'s Drop impl zeroizes its key bytes; the salt is not secret.
            let salt = key.salt_bytes().to_vec();
            drop(key);
            let ciphertext = ciphertext?;
            EncryptedDescriptor::encrypted(salt, ciphertext)
        };
        plaintext.zeroize();

        let envelope_json = envelope.to_json()?;
        self.backend.put(&envelope_json).await
    }
}

#[async_trait]
impl DescriptorStore for EncryptedDescriptorStore {
    async fn save(&self, descriptor: &Descriptor) -> Result<String, NoiseFsError> {
        let mut password = self.password_provider.provide().await?;
        let result = self.save_with_password(descriptor, &password).await;
        password.zeroize();
        result
    }

    async fn load(&self, cid: &str) -> Result<Descriptor, NoiseFsError> {
        let bytes = self.backend.get(cid).await?;

        let envelope = match EncryptedDescriptor::from_json(&bytes) {
            Ok(envelope) if envelope.version == noisefs_domain::value_objects::encrypted_descriptor::ENVELOPE_VERSION => envelope,
            _ => {
                // Legacy tolerance: bytes with no envelope are an
                // unwrapped plain descriptor.
                return Descriptor::from_json(&bytes);
            }
        };

        if !envelope.is_encrypted {
            return Descriptor::from_json(&envelope.ciphertext);
        }

        let salt = envelope
            .salt
            .as_ref()
            .ok_or_else(|| NoiseFsError::validation_failed("encrypted envelope missing salt"))?;

        let mut password = self.password_provider.provide().await?;
        if password.is_empty() {
            password.zeroize();
            return Err(NoiseFsError::DecryptionRequired(
                "descriptor is encrypted but no password was provided".to_string(),
            ));
        }
        let mut password_bytes = password.as_bytes().to_vec();
        password.zeroize();
        let key = EncryptionKey::derive_key(&password_bytes, salt);
        password_bytes.zeroize();
        let key = key?;

        let plaintext = primitives::decrypt(&envelope.ciphertext, key.key_bytes());
        drop(key);
        let plaintext = plaintext.map_err(|e| match e {
            NoiseFsError::AuthenticationFailed(_) => {
                NoiseFsError::authentication_failed("decryption failed, wrong password?")
            }
            other => other,
        })?;

        let descriptor = Descriptor::from_json(&plaintext);
        let mut plaintext = plaintext;
        plaintext.zeroize();
        descriptor
    }

    async fn save_unencrypted(&self, descriptor: &Descriptor) -> Result<String, NoiseFsError> {
        self.save_with_password(descriptor, "").await
    }

    async fn is_encrypted(&self, cid: &str) -> Result<bool, NoiseFsError> {
        let bytes = self.backend.get(cid).await?;
        match EncryptedDescriptor::from_json(&bytes) {
            Ok(envelope) => Ok(envelope.is_encrypted),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::password_provider::StaticPasswordProvider;

    fn sample_descriptor() -> Descriptor {
        let mut d = Descriptor::new_file_descriptor("a.txt", 3, 3, 128);
        d.add_block_triple("d", "r1", "r2").unwrap();
        d
    }

    #[tokio::test]
    async fn empty_password_is_stored_unencrypted() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = EncryptedDescriptorStore::new(backend, Arc::new(StaticPasswordProvider::empty()));
        let d = sample_descriptor();
        let cid = store.save(&d).await.unwrap();
        assert!(!store.is_encrypted(&cid).await.unwrap());
        let back = store.load(&cid).await.unwrap();
        assert_eq!(back.filename, d.filename);
    }

    #[tokio::test]
    async fn wrong_password_fails_with_authentication_error() {
        let backend = Arc::new(InMemoryBackend::new());
        let save_store = EncryptedDescriptorStore::new(backend.clone(), Arc::new(StaticPasswordProvider::new("correct")));
        let d = sample_descriptor();
        let cid = save_store.save(&d).await.unwrap();
        assert!(save_store.is_encrypted(&cid).await.unwrap());

        let load_store = EncryptedDescriptorStore::new(backend, Arc::new(StaticPasswordProvider::new("wrong")));
        let err = load_store.load(&cid).await.unwrap_err();
        assert!(matches!(err, NoiseFsError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn save_unencrypted_ignores_provider() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = EncryptedDescriptorStore::new(backend, Arc::new(StaticPasswordProvider::new("a-password")));
        let d = sample_descriptor();
        let cid = store.save_unencrypted(&d).await.unwrap();
        assert!(!store.is_encrypted(&cid).await.unwrap());
    }

    #[tokio::test]
    async fn legacy_plain_descriptor_bytes_load_via_fallback() {
        let backend = Arc::new(InMemoryBackend::new());
        let d = sample_descriptor();
        let cid = backend.put(&d.to_json().unwrap()).await.unwrap();

        let store = EncryptedDescriptorStore::new(backend, Arc::new(StaticPasswordProvider::empty()));
        let back = store.load(&cid).await.unwrap();
        assert_eq!(back.filename, d.filename);
    }
}
