//! Configuration and error types for near-duplicate keyword detection.
//!
//! Everything here is a plain value: detection is a pure function of
//! `(keywords, DedupConfig)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fingerprint width in bits.
pub const FINGERPRINT_BITS: usize = 64;

/// Parameters for fingerprinting, blocking and post-filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DedupConfig {
    /// Configuration schema version.
    ///
    /// Any change that can alter fingerprints (shingling, hashing, voting)
    /// must bump this.
    pub version: u32,
    /// Characters per shingle. Strings shorter than this yield a single
    /// shingle, the string itself.
    pub shingle_width: usize,
    /// Maximum Hamming distance between fingerprints of a duplicate pair.
    pub max_hamming_distance: u32,
    /// Number of contiguous bit blocks used for candidate bucketing.
    ///
    /// Must satisfy `max_hamming_distance < num_blocks <= 64`: with more
    /// blocks than differing bits, any true pair agrees on at least one
    /// whole block.
    pub num_blocks: usize,
    /// Maximum Levenshtein distance for an accepted pair.
    pub max_edit_distance: usize,
    /// Seed for shingle hashing. Same seed and inputs give bit-identical
    /// fingerprints.
    pub seed: u64,
    /// Fingerprint and bucket with rayon. Output is identical either way.
    pub use_parallel: bool,
}

impl DedupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shingle_width(mut self, width: usize) -> Self {
        self.shingle_width = width;
        self
    }

    pub fn with_max_hamming_distance(mut self, distance: u32) -> Self {
        self.max_hamming_distance = distance;
        self
    }

    pub fn with_num_blocks(mut self, blocks: usize) -> Self {
        self.num_blocks = blocks;
        self
    }

    pub fn with_max_edit_distance(mut self, distance: usize) -> Self {
        self.max_edit_distance = distance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), DedupError> {
        if self.version < 1 {
            return Err(DedupError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.shingle_width < 1 {
            return Err(DedupError::InvalidShingleWidth {
                width: self.shingle_width,
            });
        }
        validate_blocking(self.max_hamming_distance, self.num_blocks)
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            version: 1,
            shingle_width: 3,
            max_hamming_distance: 3,
            num_blocks: 4,
            max_edit_distance: 2,
            seed: 0xF00D_FACE_F00D_FACE,
            use_parallel: false,
        }
    }
}

/// Check `max_hamming_distance < num_blocks <= 64`.
pub(crate) fn validate_blocking(max_hamming_distance: u32, num_blocks: usize) -> Result<(), DedupError> {
    if num_blocks == 0
        || num_blocks > FINGERPRINT_BITS
        || num_blocks <= max_hamming_distance as usize
    {
        return Err(DedupError::InvalidBlocking {
            max_hamming_distance,
            num_blocks,
        });
    }
    Ok(())
}

/// Errors returned by the near-duplicate detector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DedupError {
    #[error(
        "invalid blocking: need max_hamming_distance < num_blocks <= 64 \
         (got max_hamming_distance={max_hamming_distance}, num_blocks={num_blocks})"
    )]
    InvalidBlocking {
        max_hamming_distance: u32,
        num_blocks: usize,
    },

    #[error("invalid config: shingle_width must be >= 1 (got {width})")]
    InvalidShingleWidth { width: usize },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },
}
