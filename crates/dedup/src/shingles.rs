//! Character shingling.

use hashbrown::HashMap;

/// Overlapping character shingles of width `width`, in order of appearance.
///
/// Offsets are Unicode scalar values, so multi-byte characters count as one.
/// A string with fewer than `width` characters (including the empty string)
/// yields exactly one shingle: the string itself. A width of zero is treated
/// as one.
pub fn shingles(s: &str, width: usize) -> Vec<&str> {
    let width = width.max(1);
    let bounds: Vec<usize> = s
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(s.len()))
        .collect();
    let chars = bounds.len() - 1;
    if chars < width {
        return vec![s];
    }
    (0..=chars - width)
        .map(|i| &s[bounds[i]..bounds[i + width]])
        .collect()
}

/// Distinct shingles with their occurrence counts.
pub fn shingle_counts(s: &str, width: usize) -> HashMap<&str, u32> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for shingle in shingles(s, width) {
        *counts.entry(shingle).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_trigrams() {
        assert_eq!(shingles("colour", 3), vec!["col", "olo", "lou", "our"]);
    }

    #[test]
    fn exact_width_is_one_shingle() {
        assert_eq!(shingles("svm", 3), vec!["svm"]);
    }

    #[test]
    fn short_strings_yield_themselves() {
        assert_eq!(shingles("ai", 3), vec!["ai"]);
        assert_eq!(shingles("", 3), vec![""]);
    }

    #[test]
    fn multibyte_characters_count_once() {
        assert_eq!(shingles("né", 2), vec!["né"]);
        assert_eq!(shingles("réseau", 4), vec!["rése", "ésea", "seau"]);
    }

    #[test]
    fn zero_width_behaves_like_one() {
        assert_eq!(shingles("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn counts_repeated_shingles() {
        let counts = shingle_counts("aaaa", 2);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["aa"], 3);
    }
}
