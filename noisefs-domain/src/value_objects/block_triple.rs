// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # BlockTriple
//!
//! The `(data, rand1, rand2)` triple of content identifiers that lets a
//! stored block be de-anonymized: `data = anonymized ⊕ rand1 ⊕ rand2`.

use crate::error::NoiseFsError;
use serde::{Deserialize, Serialize};

/// A validated triple of content identifiers referencing an anonymized
/// data block and the two randomizer blocks it was XORed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTriple {
    #[serde(rename = "data_cid")]
    pub data_cid: String,
    #[serde(rename = "randomizer_cid1")]
    pub rand1_cid: String,
    #[serde(rename = "randomizer_cid2")]
    pub rand2_cid: String,
}

impl BlockTriple {
    /// Builds a triple, rejecting empty or duplicate identifiers.
    pub fn new(
        data_cid: impl Into<String>,
        rand1_cid: impl Into<String>,
        rand2_cid: impl Into<String>,
    ) -> Result<Self, NoiseFsError> {
        let triple = Self {
            data_cid: data_cid.into(),
            rand1_cid: rand1_cid.into(),
            rand2_cid: rand2_cid.into(),
        };
        triple.validate()?;
        Ok(triple)
    }

    pub fn validate(&self) -> Result<(), NoiseFsError> {
        if self.data_cid.is_empty() || self.rand1_cid.is_empty() || self.rand2_cid.is_empty() {
            return Err(NoiseFsError::invalid_argument("block triple CIDs must be non-empty"));
        }
        if self.data_cid == self.rand1_cid || self.data_cid == self.rand2_cid || self.rand1_cid == self.rand2_cid {
            return Err(NoiseFsError::invalid_argument(
                "block triple CIDs must be pairwise distinct",
            ));
        }
        Ok(())
    }
}
