// /////////////////////////////////////////////////////////////////////////////
// NoiseFS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Block XOR
//!
//! The 3-tuple anonymization primitive: `out = data ⊕ r1 ⊕ r2`, and its
//! own inverse (XOR is an involution). Large blocks are folded in
//! parallel chunks via `rayon`; small blocks fall back to a plain loop
//! to avoid thread-pool overhead dominating the work.

use noisefs_domain::NoiseFsError;
use rayon::prelude::*;

/// Above this many bytes, split the XOR across rayon's global pool.
const PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Computes `a ⊕ b ⊕ c`, requiring all three inputs to be the same
/// length (the streaming engine always calls this with same-sized
/// blocks; a mismatch is a caller bug, not a runtime condition).
pub fn xor3(a: &[u8], b: &[u8], c: &[u8]) -> Result<Vec<u8>, NoiseFsError> {
    if a.len() != b.len() || a.len() != c.len() {
        return Err(NoiseFsError::invalid_argument(format!(
            "xor3 requires equal-length blocks: {} vs {} vs {}",
            a.len(),
            b.len(),
            c.len()
        )));
    }

    let mut out = vec![0u8; a.len()];
    if a.len() >= PARALLEL_THRESHOLD {
        out.par_iter_mut().enumerate().for_each(|(i, byte)| {
            *byte = a[i] ^ b[i] ^ c[i];
        });
    } else {
        for i in 0..a.len() {
            out[i] = a[i] ^ b[i] ^ c[i];
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_is_its_own_inverse() {
        let data = vec![0xABu8; 1024];
        let r1 = vec![0x11u8; 1024];
        let r2 = vec![0x22u8; 1024];
        let anonymized = xor3(&data, &r1, &r2).unwrap();
        let recovered = xor3(&anonymized, &r1, &r2).unwrap();
        assert_eq!(recovered, data);
    }

    #[test]
    fn xor_rejects_mismatched_lengths() {
        assert!(xor3(&[1, 2, 3], &[1, 2], &[1, 2, 3]).is_err());
    }

    #[test]
    fn xor_matches_across_threshold() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let r1: Vec<u8> = (0..200_000u32).map(|i| (i % 199) as u8).collect();
        let r2: Vec<u8> = (0..200_000u32).map(|i| (i % 233) as u8).collect();
        let parallel = xor3(&data, &r1, &r2).unwrap();
        let serial: Vec<u8> = data.iter().zip(&r1).zip(&r2).map(|((d, a), b)| d ^ a ^ b).collect();
        assert_eq!(parallel, serial);
    }
}
