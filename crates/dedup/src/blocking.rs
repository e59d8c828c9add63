//! Bit-partitioned candidate search.
//!
//! The 64 fingerprint bits are cut into `num_blocks` contiguous blocks. Two
//! fingerprints within Hamming distance `k < num_blocks` differ in at most
//! `k` blocks, so they agree on at least one. Bucketing by each block value
//! therefore finds every true pair, plus some false positives that the
//! caller must verify.

use std::collections::BTreeSet;
use std::ops::Range;

use hashbrown::HashMap;
use rayon::prelude::*;

use crate::config::{validate_blocking, DedupError, FINGERPRINT_BITS};
use crate::fingerprint::Fingerprint;

/// Contiguous bit ranges covering all 64 bits; sizes differ by at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    blocks: Vec<Range<u32>>,
}

impl BlockLayout {
    /// Layout for `num_blocks` blocks. Larger blocks come first.
    pub fn new(max_hamming_distance: u32, num_blocks: usize) -> Result<Self, DedupError> {
        validate_blocking(max_hamming_distance, num_blocks)?;
        let base = FINGERPRINT_BITS / num_blocks;
        let extra = FINGERPRINT_BITS % num_blocks;

        let mut blocks = Vec::with_capacity(num_blocks);
        let mut start = 0u32;
        for i in 0..num_blocks {
            let size = (base + usize::from(i < extra)) as u32;
            blocks.push(start..start + size);
            start += size;
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[Range<u32>] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Bits of `fp` inside block `block`, shifted down to bit 0.
    #[inline]
    pub fn block_value(&self, fp: Fingerprint, block: usize) -> u64 {
        let range = &self.blocks[block];
        let width = range.end - range.start;
        let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
        (fp.bits() >> range.start) & mask
    }

    /// Index pairs `(i, j)`, `i < j`, sharing the value of one block.
    fn pairs_in_block(&self, fingerprints: &[Fingerprint], block: usize) -> Vec<(usize, usize)> {
        let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
        for (idx, &fp) in fingerprints.iter().enumerate() {
            buckets.entry(self.block_value(fp, block)).or_default().push(idx);
        }

        let mut pairs = Vec::new();
        for members in buckets.values().filter(|m| m.len() > 1) {
            for (a, &i) in members.iter().enumerate() {
                for &j in &members[a + 1..] {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    /// Candidate pairs over every block.
    pub fn candidate_pairs(
        &self,
        fingerprints: &[Fingerprint],
        use_parallel: bool,
    ) -> BTreeSet<(usize, usize)> {
        if use_parallel {
            let per_block: Vec<Vec<(usize, usize)>> = (0..self.len())
                .into_par_iter()
                .map(|block| self.pairs_in_block(fingerprints, block))
                .collect();
            per_block.into_iter().flatten().collect()
        } else {
            (0..self.len())
                .flat_map(|block| self.pairs_in_block(fingerprints, block))
                .collect()
        }
    }
}

/// All unordered index pairs `(i, j)` with `i < j` whose fingerprints agree
/// on at least one of `num_blocks` blocks.
///
/// Fails with [`DedupError::InvalidBlocking`] unless
/// `max_hamming_distance < num_blocks <= 64`. Sharing a block is necessary
/// but not sufficient for a pair to be within `max_hamming_distance`.
pub fn find_candidate_pairs(
    fingerprints: &[Fingerprint],
    max_hamming_distance: u32,
    num_blocks: usize,
) -> Result<BTreeSet<(usize, usize)>, DedupError> {
    let layout = BlockLayout::new(max_hamming_distance, num_blocks)?;
    Ok(layout.candidate_pairs(fingerprints, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_cover_all_bits() {
        for n in 1..=64 {
            let layout = BlockLayout::new(0, n).unwrap();
            assert_eq!(layout.len(), n);
            let mut next = 0;
            let mut sizes = Vec::new();
            for range in layout.blocks() {
                assert_eq!(range.start, next);
                next = range.end;
                sizes.push(range.end - range.start);
            }
            assert_eq!(next, 64);
            let max = sizes.iter().max().unwrap();
            let min = sizes.iter().min().unwrap();
            assert!(max - min <= 1, "n={n} sizes={sizes:?}");
        }
    }

    #[test]
    fn eleven_blocks_layout() {
        let layout = BlockLayout::new(10, 11).unwrap();
        let sizes: Vec<u32> = layout.blocks().iter().map(|r| r.end - r.start).collect();
        assert_eq!(sizes, vec![6, 6, 6, 6, 6, 6, 6, 6, 6, 5, 5]);
    }

    #[test]
    fn single_block_spans_whole_word() {
        let layout = BlockLayout::new(0, 1).unwrap();
        assert_eq!(layout.block_value(Fingerprint(u64::MAX), 0), u64::MAX);
    }

    #[test]
    fn identical_fingerprints_pair_up() {
        let fps = [Fingerprint(0xDEAD_BEEF), Fingerprint(!0xDEAD_BEEF), Fingerprint(0xDEAD_BEEF)];
        let pairs = find_candidate_pairs(&fps, 3, 4).unwrap();
        assert!(pairs.contains(&(0, 2)));
        assert!(!pairs.contains(&(0, 1)));
        assert!(!pairs.contains(&(1, 2)));
    }

    #[test]
    fn every_pair_within_distance_is_found() {
        let base = 0x0123_4567_89AB_CDEFu64;
        // Flip three bits spread across the word.
        let near = base ^ (1 << 1) ^ (1 << 30) ^ (1 << 63);
        let fps = [Fingerprint(base), Fingerprint(near)];
        let pairs = find_candidate_pairs(&fps, 3, 4).unwrap();
        assert_eq!(pairs.into_iter().collect::<Vec<_>>(), vec![(0, 1)]);
    }

    #[test]
    fn fully_different_fingerprints_never_pair() {
        let fps = [Fingerprint(0), Fingerprint(u64::MAX)];
        assert!(find_candidate_pairs(&fps, 3, 4).unwrap().is_empty());
    }

    #[test]
    fn pairs_are_ordered_and_unique() {
        let fps = vec![Fingerprint(7); 4];
        let pairs: Vec<_> = find_candidate_pairs(&fps, 1, 8).unwrap().into_iter().collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn invalid_blocking_fails_before_work() {
        let err = find_candidate_pairs(&[], 10, 10).unwrap_err();
        assert_eq!(
            err,
            DedupError::InvalidBlocking {
                max_hamming_distance: 10,
                num_blocks: 10
            }
        );
    }

    #[test]
    fn parallel_matches_sequential() {
        let fps: Vec<Fingerprint> = (0..200u64)
            .map(|i| Fingerprint(i.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> (i % 7)))
            .collect();
        let layout = BlockLayout::new(3, 4).unwrap();
        assert_eq!(
            layout.candidate_pairs(&fps, true),
            layout.candidate_pairs(&fps, false)
        );
    }
}
