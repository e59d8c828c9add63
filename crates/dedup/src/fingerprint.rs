//! Bit-voting fingerprints over weighted shingle hashes.

use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::config::{DedupConfig, FINGERPRINT_BITS};
use crate::shingles::shingle_counts;

/// 64-bit locality-sensitive fingerprint of a string.
///
/// Hamming distance between fingerprints approximates how different the
/// shingle sets of the underlying strings are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn hamming_distance(self, other: Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for Fingerprint {
    fn from(bits: u64) -> Self {
        Fingerprint(bits)
    }
}

/// Fingerprint `s` with the shingle width and seed from `cfg`.
pub fn fingerprint(s: &str, cfg: &DedupConfig) -> Fingerprint {
    fingerprint_with(s, cfg.shingle_width, cfg.seed)
}

/// Fingerprint `s` from its `width`-character shingles.
///
/// Every distinct shingle is hashed once and votes with its occurrence
/// count: `+count` on each bit set in its hash, `-count` on each clear bit.
/// Output bit `i` is set iff the vote on bit `i` is non-negative.
pub fn fingerprint_with(s: &str, width: usize, seed: u64) -> Fingerprint {
    let mut votes = [0i64; FINGERPRINT_BITS];
    for (shingle, count) in shingle_counts(s, width) {
        let hash = xxh3_64_with_seed(shingle.as_bytes(), seed);
        let weight = i64::from(count);
        for (bit, vote) in votes.iter_mut().enumerate() {
            if (hash >> bit) & 1 == 1 {
                *vote += weight;
            } else {
                *vote -= weight;
            }
        }
    }

    let bits = votes
        .iter()
        .enumerate()
        .filter(|&(_, &vote)| vote >= 0)
        .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit));
    Fingerprint(bits)
}
