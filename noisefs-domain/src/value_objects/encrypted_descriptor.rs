// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # EncryptedDescriptor
//!
//! The wire envelope a descriptor store writes: either plain descriptor
//! JSON bytes (`is_encrypted == false`, `salt == None`) or the AEAD
//! ciphertext of that JSON plus the KDF salt (`is_encrypted == true`).

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

pub const ENVELOPE_VERSION: &str = "3.0";

mod base64_bytes {
    use super::{B64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&B64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        B64.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

mod base64_opt_bytes {
    use super::{B64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_str(&B64.encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let text: Option<String> = Option::deserialize(d)?;
        match text {
            Some(t) => B64.decode(t.as_bytes()).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// The on-wire envelope that a descriptor store writes to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedDescriptor {
    pub version: String,
    #[serde(with = "base64_opt_bytes", default)]
    pub salt: Option<Vec<u8>>,
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    pub is_encrypted: bool,
}

impl EncryptedDescriptor {
    pub fn plain(plain_json: Vec<u8>) -> Self {
        Self {
            version: ENVELOPE_VERSION.to_string(),
            salt: None,
            ciphertext: plain_json,
            is_encrypted: false,
        }
    }

    pub fn encrypted(salt: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        Self {
            version: ENVELOPE_VERSION.to_string(),
            salt: Some(salt),
            ciphertext,
            is_encrypted: true,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, crate::error::NoiseFsError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, crate::error::NoiseFsError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_envelope_round_trips() {
        let env = EncryptedDescriptor::plain(b"{\"hello\":true}".to_vec());
        let json = env.to_json().unwrap();
        let back = EncryptedDescriptor::from_json(&json).unwrap();
        assert!(!back.is_encrypted);
        assert!(back.salt.is_none());
        assert_eq!(back.ciphertext, b"{\"hello\":true}");
    }

    #[test]
    fn encrypted_envelope_round_trips() {
        let env = EncryptedDescriptor::encrypted(vec![1, 2, 3], vec![4, 5, 6]);
        let json = env.to_json().unwrap();
        let back = EncryptedDescriptor::from_json(&json).unwrap();
        assert!(back.is_encrypted);
        assert_eq!(back.salt.unwrap(), vec![1, 2, 3]);
        assert_eq!(back.ciphertext, vec![4, 5, 6]);
    }
}
