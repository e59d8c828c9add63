use std::error::Error;

use docsim::files::{load_mappings, load_vectors};
use docsim::{
    detect_duplicates, CanonicalError, CanonicalMap, CanonicalizeConfig, DedupConfig, DedupError,
    DocsimConfig, IndexConfig, IndexError, InputError, MatchError, Matcher, MatcherConfig,
    Pipeline, PipelineError, SimilarityIndex, TokenFilter,
};
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn blocking_precondition_fails_before_work() {
    let cfg = DedupConfig::new()
        .with_max_hamming_distance(5)
        .with_num_blocks(5);
    let err = detect_duplicates(["color", "colour"], &cfg).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Dedup(DedupError::InvalidBlocking {
            max_hamming_distance: 5,
            num_blocks: 5
        })
    );
    assert!(err.source().is_some());
}

#[test]
fn empty_dictionary_never_matches() {
    let pipeline = Pipeline::new(
        Vec::<String>::new(),
        CanonicalMap::new(),
        &DocsimConfig::default(),
    )
    .unwrap();
    assert!(pipeline.matcher().find_all("anything at all").is_empty());
    assert_eq!(pipeline.canonicalize("  anything   at all ").unwrap(), "anything at all");
}

#[test]
fn empty_keyword_is_rejected() {
    let err = Pipeline::new(["svm", ""], CanonicalMap::new(), &DocsimConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::Match(MatchError::EmptyKeyword { position: 1 })
    );
}

#[test]
fn invalid_canonical_config_is_rejected() {
    let matcher = Arc::new(Matcher::build(["svm"], &MatcherConfig::default()).unwrap());
    let cfg = CanonicalizeConfig::default().with_join_char(' ');
    let err = Pipeline::from_parts(matcher, CanonicalMap::new(), cfg, TokenFilter::default())
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Canonical(CanonicalError::InvalidConfig(_))
    ));
}

#[test]
fn out_of_range_row_is_not_clamped() {
    let index = SimilarityIndex::build(
        ["a", "b"],
        ndarray::array![[1.0_f32], [2.0]],
        &IndexConfig::default(),
    )
    .unwrap();
    assert_eq!(
        index.top_n(2, 1),
        Err(IndexError::RowOutOfRange { row: 2, len: 2 })
    );
}

#[test]
fn zero_matrix_scores_are_zero_not_nan() {
    let index = SimilarityIndex::build(
        ["a", "b", "c"],
        ndarray::Array2::zeros((3, 5)),
        &IndexConfig::default(),
    )
    .unwrap();
    assert!(index.scores().iter().all(|s| *s == 0.0));
}

#[test]
fn malformed_mapping_lines_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("map.tsv");
    std::fs::write(&path, "good\tfine\nno tab here\ntoo\tmany\tcols\n\t\n").unwrap();
    let map = load_mappings(&[path]).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("good"), Some("fine"));
}

#[test]
fn ragged_vectors_are_an_input_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vectors.tsv");
    std::fs::write(&path, "a\t1 2 3\nb\t1 2\n").unwrap();
    let err = load_vectors(&path).unwrap_err();
    assert!(matches!(err, InputError::Invalid { line: 2, .. }));
    let wrapped = PipelineError::from(err);
    assert!(wrapped.to_string().starts_with("input failure"));
}
