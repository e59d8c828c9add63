use std::collections::BTreeMap;

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Raw term to canonical term lookup table.
///
/// Entries typically come from two sources: hand-curated TSV files (plural
/// and spelling variants) and the `longer -> shorter` pairs emitted by the
/// near-duplicate detector. Keys are kept sorted so serialized maps are
/// stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalMap {
    entries: BTreeMap<String, String>,
}

impl CanonicalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `raw` to `canonical`, returning the previous target if any.
    pub fn insert(&mut self, raw: impl Into<String>, canonical: impl Into<String>) -> Option<String> {
        self.entries.insert(raw.into(), canonical.into())
    }

    /// Single-hop lookup.
    pub fn get(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.entries.contains_key(raw)
    }

    /// Follow `term -> a -> b -> ...` until a term with no further mapping.
    ///
    /// Unmapped terms resolve to themselves. If the chain loops back onto a
    /// term already visited, resolution stops at the last new term and the
    /// cycle is logged.
    pub fn resolve<'a>(&'a self, term: &'a str) -> &'a str {
        let mut current = term;
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        visited.insert(term);

        while let Some(next) = self.entries.get(current) {
            let next = next.as_str();
            if next == current {
                break;
            }
            if !visited.insert(next) {
                tracing::warn!(term, stopped_at = current, "cycle in canonical mapping");
                break;
            }
            current = next;
        }
        current
    }

    /// Canonical target for `raw`, or `None` when `raw` is not mapped.
    ///
    /// With `resolve_chains` the target is followed to its fixed point,
    /// otherwise a single hop is taken.
    pub fn lookup<'a>(&'a self, raw: &'a str, resolve_chains: bool) -> Option<&'a str> {
        if !self.contains(raw) {
            return None;
        }
        if resolve_chains {
            Some(self.resolve(raw))
        } else {
            self.get(raw)
        }
    }

    /// Merge `other` into `self`; entries from `other` win on collision.
    pub fn merge(&mut self, other: CanonicalMap) {
        self.entries.extend(other.entries);
    }

    /// A copy where every key points directly at its fixed point.
    pub fn flatten(&self) -> CanonicalMap {
        self.entries
            .keys()
            .map(|raw| (raw.clone(), self.resolve(raw).to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(raw, canonical)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CanonicalMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = CanonicalMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for CanonicalMap {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (raw, canonical) in iter {
            self.insert(raw, canonical);
        }
    }
}
