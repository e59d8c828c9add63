//! Workspace umbrella crate for the docsim paper-similarity pipeline.
//!
//! Stitches the stage crates together:
//!
//! * [`matcher`] finds dictionary keywords in free text,
//! * [`canonical`] rewrites matched spans to their canonical forms and filters
//!   tokens,
//! * [`dedup`] detects near-duplicate keywords and feeds the mapping table,
//! * [`index`] precomputes document similarity and serves neighbor lists.
//!
//! [`Pipeline`] bundles the text side (match, rewrite, tokenize, filter);
//! [`detect_duplicates`] and [`build_similarity_index`] wrap the other two
//! stages with the same metrics hooks.

pub mod config;
pub mod files;

pub use canonical::{
    collapse_whitespace, default_stopwords, CanonicalError, CanonicalMap, CanonicalizeConfig,
    Canonicalizer, StopwordSet, TokenAttributes, TokenFilter, Tokenizer, WordTokenizer,
};
pub use dedup::{detect, DedupConfig, DedupError, DuplicateMapping, DuplicatePair, Fingerprint};
pub use index::{
    paginate, DocumentFacets, DocumentLookup, Factorization, FeatureVocabulary, IndexConfig,
    IndexError, Neighbor, Page, ProjectionModel, ScoreNormalization, SimilarityIndex,
    SparseVector, TopicInference,
};
pub use matcher::{Match, MatchError, Matcher, MatcherConfig};

pub use crate::config::{ConfigLoadError, DocsimConfig};
pub use crate::files::InputError;

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Errors that can occur while running a pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Match(MatchError),
    Canonical(CanonicalError),
    Dedup(DedupError),
    Index(IndexError),
    Input(InputError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Match(err) => write!(f, "keyword matcher failure: {err}"),
            PipelineError::Canonical(err) => write!(f, "canonicalization failure: {err}"),
            PipelineError::Dedup(err) => write!(f, "duplicate detection failure: {err}"),
            PipelineError::Index(err) => write!(f, "similarity index failure: {err}"),
            PipelineError::Input(err) => write!(f, "input failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Match(err) => Some(err),
            PipelineError::Canonical(err) => Some(err),
            PipelineError::Dedup(err) => Some(err),
            PipelineError::Index(err) => Some(err),
            PipelineError::Input(err) => Some(err),
        }
    }
}

impl From<MatchError> for PipelineError {
    fn from(value: MatchError) -> Self {
        PipelineError::Match(value)
    }
}

impl From<CanonicalError> for PipelineError {
    fn from(value: CanonicalError) -> Self {
        PipelineError::Canonical(value)
    }
}

impl From<DedupError> for PipelineError {
    fn from(value: DedupError) -> Self {
        PipelineError::Dedup(value)
    }
}

impl From<IndexError> for PipelineError {
    fn from(value: IndexError) -> Self {
        PipelineError::Index(value)
    }
}

impl From<InputError> for PipelineError {
    fn from(value: InputError) -> Self {
        PipelineError::Input(value)
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_match(&self, latency: Duration, matches: usize);
    fn record_canonical(&self, latency: Duration, result: Result<(), PipelineError>);
    fn record_dedup(&self, latency: Duration, result: Result<(), PipelineError>);
    fn record_similarity(&self, latency: Duration, result: Result<(), PipelineError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_match(self, matches: usize) {
        self.recorder.record_match(self.start.elapsed(), matches);
    }

    fn record_canonical(self, result: Result<(), PipelineError>) {
        self.recorder.record_canonical(self.start.elapsed(), result);
    }

    fn record_dedup(self, result: Result<(), PipelineError>) {
        self.recorder.record_dedup(self.start.elapsed(), result);
    }

    fn record_similarity(self, result: Result<(), PipelineError>) {
        self.recorder.record_similarity(self.start.elapsed(), result);
    }
}

fn outcome<T>(result: &Result<T, PipelineError>) -> Result<(), PipelineError> {
    match result {
        Ok(_) => Ok(()),
        Err(err) => Err(err.clone()),
    }
}

/// A document reduced to its model tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessedDocument {
    pub id: String,
    pub tokens: Vec<String>,
}

/// Text side of the pipeline: match keywords, rewrite them canonically,
/// tokenize, and keep the tokens worth modelling.
///
/// Immutable once built; share it across threads freely.
#[derive(Debug, Clone)]
pub struct Pipeline {
    matcher: Arc<Matcher>,
    map: CanonicalMap,
    canonical_cfg: CanonicalizeConfig,
    tokenizer: WordTokenizer,
    filter: TokenFilter,
}

impl Pipeline {
    /// Build the automaton over `keywords` and configure every stage from `cfg`.
    pub fn new<I, S>(keywords: I, map: CanonicalMap, cfg: &DocsimConfig) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let matcher = Matcher::build(keywords, &cfg.matcher_config())?;
        Self::from_parts(
            Arc::new(matcher),
            map,
            cfg.canonical_config(),
            cfg.token_filter(),
        )
    }

    pub fn from_parts(
        matcher: Arc<Matcher>,
        map: CanonicalMap,
        canonical_cfg: CanonicalizeConfig,
        filter: TokenFilter,
    ) -> Result<Self, PipelineError> {
        canonical_cfg.validate()?;
        tracing::debug!(
            keywords = matcher.len(),
            states = matcher.state_count(),
            mappings = map.len(),
            "pipeline ready"
        );
        Ok(Self {
            matcher,
            map,
            canonical_cfg,
            tokenizer: WordTokenizer::new(filter.stopwords.clone()),
            filter,
        })
    }

    /// Rewrite every keyword occurrence in `text` to its canonical form.
    pub fn canonicalize(&self, text: &str) -> Result<String, PipelineError> {
        let prepared = canonical::prepare_text(text, &self.canonical_cfg);

        let match_metrics = MetricsSpan::start();
        let matches = self.matcher.find_all(&prepared);
        if let Some(span) = match_metrics {
            span.record_match(matches.len());
        }

        let canonical_metrics = MetricsSpan::start();
        let result = canonical::apply(
            &prepared,
            &matches,
            &self.matcher,
            &self.map,
            &self.canonical_cfg,
        )
        .map_err(PipelineError::from);
        if let Some(span) = canonical_metrics {
            span.record_canonical(outcome(&result));
        }
        result
    }

    /// Canonicalize, tokenize and filter `text` into model tokens.
    pub fn preprocess(&self, text: &str) -> Result<Vec<String>, PipelineError> {
        let rewritten = self.canonicalize(text)?;
        Ok(self.filter.filter_text(&self.tokenizer, &rewritten))
    }

    /// Preprocess `(id, text)` pairs, keeping input order.
    pub fn preprocess_corpus(
        &self,
        documents: &[(String, String)],
        use_parallel: bool,
    ) -> Result<Vec<PreprocessedDocument>, PipelineError> {
        let run = |(id, text): &(String, String)| -> Result<PreprocessedDocument, PipelineError> {
            Ok(PreprocessedDocument {
                id: id.clone(),
                tokens: self.preprocess(text)?,
            })
        };
        let docs = if use_parallel {
            documents.par_iter().map(run).collect::<Result<Vec<_>, _>>()?
        } else {
            documents.iter().map(run).collect::<Result<Vec<_>, _>>()?
        };
        tracing::info!(documents = docs.len(), parallel = use_parallel, "corpus preprocessed");
        Ok(docs)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn map(&self) -> &CanonicalMap {
        &self.map
    }

    pub fn canonical_config(&self) -> &CanonicalizeConfig {
        &self.canonical_cfg
    }
}

/// Run near-duplicate detection over a keyword vocabulary.
pub fn detect_duplicates<I, S>(keywords: I, cfg: &DedupConfig) -> Result<DuplicateMapping, PipelineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let metrics = MetricsSpan::start();
    let result = dedup::detect(keywords, cfg).map_err(PipelineError::from);
    if let Some(span) = metrics {
        span.record_dedup(outcome(&result));
    }
    result
}

/// Combine detected duplicates with an explicit mapping table.
///
/// Explicit entries override detected ones for the same raw keyword.
pub fn merge_detected(detected: &DuplicateMapping, explicit: CanonicalMap) -> CanonicalMap {
    let mut merged = detected.to_canonical_map();
    merged.merge(explicit);
    merged
}

/// Build the similarity index over `vectors`, one row per id.
pub fn build_similarity_index<I, S>(
    ids: I,
    vectors: Array2<f32>,
    cfg: &IndexConfig,
) -> Result<SimilarityIndex, PipelineError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let metrics = MetricsSpan::start();
    let result = SimilarityIndex::build(ids, vectors, cfg).map_err(PipelineError::from);
    if let Some(span) = metrics {
        span.record_similarity(outcome(&result));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::RwLock;

    fn scenario_pipeline() -> Pipeline {
        let map: CanonicalMap = [
            ("neural networks", "neural network"),
            ("hidden units", "hidden unit"),
        ]
        .into_iter()
        .collect();
        Pipeline::new(
            ["neural networks", "hidden units"],
            map,
            &DocsimConfig::default(),
        )
        .expect("pipeline")
    }

    #[test]
    fn canonicalize_merges_collocations() {
        let pipeline = scenario_pipeline();
        let out = pipeline
            .canonicalize("we trained neural networks with hidden units.")
            .unwrap();
        assert_eq!(out, "we trained neural_network with hidden_unit.");
    }

    #[test]
    fn preprocess_keeps_model_tokens() {
        let pipeline = scenario_pipeline();
        let tokens = pipeline
            .preprocess("The Neural Networks had 1024 hidden units and they were trained")
            .unwrap();
        assert_eq!(tokens, vec!["neural_network", "hidden_unit", "trained"]);
    }

    #[test]
    fn corpus_order_is_stable_in_parallel() {
        let pipeline = scenario_pipeline();
        let docs: Vec<(String, String)> = (0..16)
            .map(|i| (format!("p{i}.txt"), format!("document {i} about neural networks")))
            .collect();
        let seq = pipeline.preprocess_corpus(&docs, false).unwrap();
        let par = pipeline.preprocess_corpus(&docs, true).unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq[3].id, "p3.txt");
        assert!(seq[3].tokens.contains(&"neural_network".to_string()));
    }

    #[test]
    fn explicit_mappings_override_detected() {
        let cfg = DedupConfig::new()
            .with_max_hamming_distance(10)
            .with_num_blocks(11);
        let detected = detect_duplicates(["color", "colour"], &cfg).unwrap();
        let explicit: CanonicalMap = [("colour", "hue")].into_iter().collect();
        let merged = merge_detected(&detected, explicit);
        assert_eq!(merged.get("colour"), Some("hue"));

        let merged = merge_detected(&detected, CanonicalMap::new());
        assert_eq!(merged.get("colour"), Some("color"));
    }

    #[test]
    fn duplicate_keywords_are_a_match_error() {
        let err = Pipeline::new(["svm", "svm"], CanonicalMap::new(), &DocsimConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Match(MatchError::DuplicateKeyword { .. })));
        assert!(err.source().is_some());
    }

    #[derive(Default)]
    struct CountingMetrics {
        events: RwLock<Vec<&'static str>>,
    }

    impl CountingMetrics {
        fn push(&self, label: &'static str) {
            self.events.write().unwrap().push(label);
        }

        fn snapshot(&self) -> Vec<&'static str> {
            self.events.read().unwrap().clone()
        }
    }

    impl PipelineMetrics for CountingMetrics {
        fn record_match(&self, _latency: Duration, _matches: usize) {
            self.push("match");
        }

        fn record_canonical(&self, _latency: Duration, result: Result<(), PipelineError>) {
            self.push(if result.is_ok() { "canonical_ok" } else { "canonical_err" });
        }

        fn record_dedup(&self, _latency: Duration, result: Result<(), PipelineError>) {
            self.push(if result.is_ok() { "dedup_ok" } else { "dedup_err" });
        }

        fn record_similarity(&self, _latency: Duration, result: Result<(), PipelineError>) {
            self.push(if result.is_ok() { "similarity_ok" } else { "similarity_err" });
        }
    }

    #[test]
    fn metrics_recorder_tracks_stage_outcomes() {
        let metrics = Arc::new(CountingMetrics::default());
        set_pipeline_metrics(Some(metrics.clone()));

        scenario_pipeline().canonicalize("neural networks").unwrap();
        let bad = DedupConfig::new().with_max_hamming_distance(4).with_num_blocks(4);
        assert!(detect_duplicates(["a"], &bad).is_err());
        build_similarity_index(["a"], ndarray::array![[1.0_f32]], &IndexConfig::default())
            .unwrap();

        set_pipeline_metrics(None);
        let events = metrics.snapshot();
        assert!(events.contains(&"match"));
        assert!(events.contains(&"canonical_ok"));
        assert!(events.contains(&"dedup_err"));
        assert!(events.contains(&"similarity_ok"));
    }
}
