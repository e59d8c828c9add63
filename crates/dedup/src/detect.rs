use std::cmp::Ordering;
use std::collections::BTreeMap;

use hashbrown::HashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::blocking::BlockLayout;
use crate::config::{DedupConfig, DedupError};
use crate::fingerprint::{fingerprint, Fingerprint};

/// An accepted `from -> to` pair. `from` is the longer string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub from: String,
    pub to: String,
    pub edit_distance: usize,
    pub hamming_distance: u32,
}

/// Longer-to-shorter mapping produced by [`detect`], sorted by `from`.
///
/// Each key appears once. Targets are strictly smaller than their source in
/// `(char count, lexical)` order, so no pass produces a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMapping {
    pairs: Vec<DuplicatePair>,
}

impl DuplicateMapping {
    pub fn pairs(&self) -> &[DuplicatePair] {
        &self.pairs
    }

    pub fn get(&self, from: &str) -> Option<&str> {
        self.pairs
            .binary_search_by(|p| p.from.as_str().cmp(from))
            .ok()
            .map(|idx| self.pairs[idx].to.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|p| (p.from.as_str(), p.to.as_str()))
    }

    /// Convert into a canonical mapping table for span rewriting.
    #[cfg(feature = "with_canonical")]
    pub fn to_canonical_map(&self) -> canonical::CanonicalMap {
        self.iter().collect()
    }
}

/// `(longer, shorter)`; equal lengths put the lexically greater first.
pub(crate) fn orient<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    let key = |s: &str| s.chars().count();
    match key(a).cmp(&key(b)).then_with(|| a.cmp(b)) {
        Ordering::Less => (b, a),
        _ => (a, b),
    }
}

/// Whether `candidate` beats `current` as the target for one source:
/// smaller edit distance, then shorter target, then lexically smaller.
pub(crate) fn is_better_target(candidate: &DuplicatePair, current: &DuplicatePair) -> bool {
    let rank = |p: &DuplicatePair| (p.edit_distance, p.to.chars().count());
    match rank(candidate).cmp(&rank(current)) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => candidate.to < current.to,
    }
}

/// Find near-duplicate keywords and map each to its preferred shorter form.
///
/// The configuration is validated before any fingerprinting. Repeated input
/// strings are considered once. A candidate pair from bit blocking is kept
/// only if its true Hamming distance is within `max_hamming_distance` and
/// its Levenshtein distance within `max_edit_distance`.
pub fn detect<I, S>(keywords: I, cfg: &DedupConfig) -> Result<DuplicateMapping, DedupError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cfg.validate()?;
    let layout = BlockLayout::new(cfg.max_hamming_distance, cfg.num_blocks)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut distinct: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword = keyword.as_ref();
        if seen.insert(keyword.to_string()) {
            distinct.push(keyword.to_string());
        }
    }

    let fingerprints: Vec<Fingerprint> = if cfg.use_parallel {
        distinct.par_iter().map(|k| fingerprint(k, cfg)).collect()
    } else {
        distinct.iter().map(|k| fingerprint(k, cfg)).collect()
    };

    let candidates = layout.candidate_pairs(&fingerprints, cfg.use_parallel);
    let mut best: BTreeMap<String, DuplicatePair> = BTreeMap::new();
    let mut verified = 0usize;

    for &(i, j) in &candidates {
        let hamming_distance = fingerprints[i].hamming_distance(fingerprints[j]);
        if hamming_distance > cfg.max_hamming_distance {
            continue;
        }
        verified += 1;
        let (from, to) = orient(&distinct[i], &distinct[j]);
        let edit_distance = strsim::levenshtein(from, to);
        if edit_distance > cfg.max_edit_distance {
            continue;
        }

        let pair = DuplicatePair {
            from: from.to_string(),
            to: to.to_string(),
            edit_distance,
            hamming_distance,
        };
        match best.get_mut(from) {
            Some(current) if is_better_target(&pair, current) => *current = pair,
            Some(_) => {}
            None => {
                best.insert(pair.from.clone(), pair);
            }
        }
    }

    tracing::debug!(
        keywords = distinct.len(),
        candidates = candidates.len(),
        verified,
        accepted = best.len(),
        "near-duplicate detection finished"
    );

    Ok(DuplicateMapping {
        pairs: best.into_values().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(from: &str, to: &str, edit_distance: usize) -> DuplicatePair {
        DuplicatePair {
            from: from.into(),
            to: to.into(),
            edit_distance,
            hamming_distance: 0,
        }
    }

    fn vocabulary() -> Vec<&'static str> {
        vec![
            "color", "colour", "colors", "colours", "network", "networks", "netw0rk", "neural",
            "neuron", "neurons", "kernel", "kernels", "kernal", "model", "models", "modeling",
            "modelling", "hidden unit", "hidden units", "optimisation", "optimization", "svm",
            "svms", "lstm", "gan", "gans",
        ]
    }

    #[test]
    fn colour_maps_to_color() {
        let cfg = DedupConfig::new()
            .with_max_hamming_distance(10)
            .with_num_blocks(11);
        let mapping = detect(["color", "colour"], &cfg).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("colour"), Some("color"));
        assert_eq!(mapping.get("color"), None);
        assert_eq!(mapping.pairs()[0].edit_distance, 1);
    }

    #[test]
    fn never_exceeds_edit_threshold() {
        for max_edit in [0, 1, 2] {
            let cfg = DedupConfig::new()
                .with_max_hamming_distance(20)
                .with_num_blocks(32)
                .with_max_edit_distance(max_edit);
            let mapping = detect(vocabulary(), &cfg).unwrap();
            for p in mapping.pairs() {
                assert!(strsim::levenshtein(&p.from, &p.to) <= max_edit, "{p:?}");
                assert!(p.hamming_distance <= 20);
            }
        }
    }

    #[test]
    fn zero_edit_threshold_yields_nothing_for_distinct_inputs() {
        let cfg = DedupConfig::new()
            .with_max_hamming_distance(20)
            .with_num_blocks(32)
            .with_max_edit_distance(0);
        assert!(detect(vocabulary(), &cfg).unwrap().is_empty());
    }

    #[test]
    fn mapping_points_to_shorter_or_lexically_smaller() {
        let cfg = DedupConfig::new()
            .with_max_hamming_distance(20)
            .with_num_blocks(32);
        let mapping = detect(vocabulary(), &cfg).unwrap();
        for p in mapping.pairs() {
            let (from_len, to_len) = (p.from.chars().count(), p.to.chars().count());
            assert!(from_len > to_len || (from_len == to_len && p.from > p.to), "{p:?}");
            assert_ne!(mapping.get(&p.to), Some(p.from.as_str()));
        }
    }

    #[test]
    fn repeated_inputs_are_not_self_pairs() {
        let mapping = detect(["svm", "svm", "svm"], &DedupConfig::default()).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn empty_input_is_fine() {
        let mapping = detect(Vec::<String>::new(), &DedupConfig::default()).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn invalid_blocking_is_reported_before_work() {
        let cfg = DedupConfig::new()
            .with_max_hamming_distance(10)
            .with_num_blocks(4);
        assert!(matches!(
            detect(["color", "colour"], &cfg),
            Err(DedupError::InvalidBlocking { .. })
        ));
    }

    #[test]
    fn parallel_matches_sequential() {
        let cfg = DedupConfig::new()
            .with_max_hamming_distance(20)
            .with_num_blocks(32);
        let sequential = detect(vocabulary(), &cfg).unwrap();
        let parallel = detect(vocabulary(), &cfg.clone().with_parallel(true)).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn orientation_rules() {
        assert_eq!(orient("colour", "color"), ("colour", "color"));
        assert_eq!(orient("color", "colour"), ("colour", "color"));
        assert_eq!(orient("gray", "grey"), ("grey", "gray"));
        assert_eq!(orient("grey", "gray"), ("grey", "gray"));
        // Character count, not bytes.
        assert_eq!(orient("né", "nee"), ("nee", "né"));
    }

    #[test]
    fn closest_target_wins() {
        let current = pair("colours", "colors", 1);
        assert!(!is_better_target(&pair("colours", "color", 2), &current));
        assert!(is_better_target(&pair("colours", "colour", 1), &pair("colours", "colours_", 1)));
        assert!(is_better_target(&pair("abcd", "abc", 1), &pair("abcd", "abd", 1)));
    }

    #[test]
    fn mapping_lookup_uses_sorted_order() {
        let mapping = DuplicateMapping {
            pairs: vec![pair("b2", "b", 1), pair("c2", "c", 1), pair("zz", "z", 1)],
        };
        assert_eq!(mapping.get("c2"), Some("c"));
        assert_eq!(mapping.get("a"), None);
        assert_eq!(mapping.iter().count(), 3);
    }
}
