// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Plain Descriptor Store
//!
//! Serializes a descriptor to JSON and stores the bytes as a single
//! opaque block, with no envelope and no encryption.

use super::DescriptorStore;
use async_trait::async_trait;
use noisefs_domain::ports::Backend;
use noisefs_domain::value_objects::Descriptor;
use noisefs_domain::NoiseFsError;
use std::sync::Arc;

pub struct PlainDescriptorStore {
    backend: Arc<dyn Backend>,
}

impl PlainDescriptorStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl DescriptorStore for PlainDescriptorStore {
    async fn save(&self, descriptor: &Descriptor) -> Result<String, NoiseFsError> {
        descriptor.validate()?;
        let json = descriptor.to_json()?;
        self.backend.put(&json).await
    }

    async fn load(&self, cid: &str) -> Result<Descriptor, NoiseFsError> {
        let bytes = self.backend.get(cid).await?;
        Descriptor::from_json(&bytes)
    }

    async fn save_unencrypted(&self, descriptor: &Descriptor) -> Result<String, NoiseFsError> {
        self.save(descriptor).await
    }

    async fn is_encrypted(&self, _cid: &str) -> Result<bool, NoiseFsError> {
        Ok(false)
    }
}
