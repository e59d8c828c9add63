//! # Near-duplicate keyword detection
//!
//! Finds spelling and plural variants in a keyword vocabulary (`colour` /
//! `color`, `kernels` / `kernel`) and maps each longer variant to its
//! shorter form. The result feeds the canonical mapping table used when
//! rewriting matched spans.
//!
//! ## Pipeline
//!
//! 1. **Shingling**: each keyword is cut into overlapping character
//!    shingles (default width 3).
//! 2. **Fingerprinting**: shingles are hashed with seeded xxh3 and combined
//!    by count-weighted bit voting into a 64-bit [`Fingerprint`].
//! 3. **Blocking**: the 64 bits are split into `num_blocks` contiguous
//!    blocks; keywords sharing any whole block become candidate pairs.
//! 4. **Verification**: candidates must be within `max_hamming_distance`
//!    bits and `max_edit_distance` Levenshtein edits.
//!
//! Output is a pure function of `(keywords, DedupConfig)`; the parallel and
//! sequential paths produce identical mappings.
//!
//! ```
//! use dedup::{detect, DedupConfig};
//!
//! let cfg = DedupConfig::new()
//!     .with_max_hamming_distance(10)
//!     .with_num_blocks(11);
//! let mapping = detect(["color", "colour"], &cfg).unwrap();
//! assert_eq!(mapping.get("colour"), Some("color"));
//! ```

pub mod blocking;
pub mod config;
mod detect;
pub mod fingerprint;
mod shingles;

pub use crate::blocking::{find_candidate_pairs, BlockLayout};
pub use crate::config::{DedupConfig, DedupError, FINGERPRINT_BITS};
pub use crate::detect::{detect, DuplicateMapping, DuplicatePair};
pub use crate::fingerprint::{fingerprint, fingerprint_with, Fingerprint};
pub use crate::shingles::{shingle_counts, shingles};
