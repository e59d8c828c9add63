//! Text file formats read and written by the pipeline.
//!
//! * keyword dictionary: one keyword per line,
//! * mapping tables: `raw<TAB>canonical`, later files override earlier ones,
//! * corpus cache: `filename<TAB>space-joined tokens`,
//! * vectors: `doc_id<TAB>space-separated floats`,
//! * facets: a JSON object `{ doc_id: { keywords, authors, organizations } }`.
//!
//! Malformed lines in line-oriented files are skipped with a `warn` log.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use canonical::CanonicalMap;
use index::DocumentFacets;
use matcher::MatcherConfig;
use ndarray::Array2;
use thiserror::Error;

use crate::{Pipeline, PipelineError, PreprocessedDocument};

/// Failures reading or writing pipeline inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("{path}:{line}: {reason}")]
    Invalid {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

fn read_to_string(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|e| InputError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_string(path: &Path, contents: &str) -> Result<(), InputError> {
    fs::write(path, contents).map_err(|e| InputError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Numbered lines with trailing `\r` removed; blank lines dropped.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Load a keyword dictionary, keeping first-occurrence order.
///
/// Leading and trailing whitespace is trimmed and exact repeats are dropped.
/// Use [`load_dictionary_for`] when the matcher folds case.
pub fn load_dictionary(path: impl AsRef<Path>) -> Result<Vec<String>, InputError> {
    load_dictionary_for(path, &MatcherConfig::default())
}

/// Like [`load_dictionary`], but repeats are detected the way a matcher built
/// with `cfg` compares keywords, so the result is always a valid
/// [`matcher::Matcher`] input for it.
pub fn load_dictionary_for(
    path: impl AsRef<Path>,
    cfg: &MatcherConfig,
) -> Result<Vec<String>, InputError> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut keywords = Vec::new();
    for (line_no, line) in content_lines(&text) {
        let keyword = line.trim();
        let key = if cfg.ascii_case_insensitive {
            keyword.to_ascii_lowercase()
        } else {
            keyword.to_string()
        };
        if !seen.insert(key) {
            tracing::warn!(path = %path.display(), line = line_no, keyword, "duplicate keyword skipped");
            continue;
        }
        keywords.push(keyword.to_string());
    }
    tracing::debug!(path = %path.display(), keywords = keywords.len(), "dictionary loaded");
    Ok(keywords)
}

/// Parse one mapping table into `map`, overriding existing keys.
pub fn read_mapping_into(path: impl AsRef<Path>, map: &mut CanonicalMap) -> Result<usize, InputError> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    let mut loaded = 0;
    for (line_no, line) in content_lines(&text) {
        let columns: Vec<&str> = line.split('\t').collect();
        let [raw, canonical] = columns.as_slice() else {
            tracing::warn!(
                path = %path.display(),
                line = line_no,
                columns = columns.len(),
                "mapping line skipped: expected 2 columns"
            );
            continue;
        };
        let (raw, canonical) = (raw.trim(), canonical.trim());
        if raw.is_empty() || canonical.is_empty() {
            tracing::warn!(path = %path.display(), line = line_no, "mapping line skipped: empty column");
            continue;
        }
        map.insert(raw, canonical);
        loaded += 1;
    }
    Ok(loaded)
}

/// Load mapping tables in order; later files win on key collisions.
pub fn load_mappings<P: AsRef<Path>>(paths: &[P]) -> Result<CanonicalMap, InputError> {
    let mut map = CanonicalMap::new();
    for path in paths {
        let loaded = read_mapping_into(path, &mut map)?;
        tracing::debug!(path = %path.as_ref().display(), loaded, "mapping table loaded");
    }
    Ok(map)
}

/// Write `map` as a `raw<TAB>canonical` table, sorted by raw keyword.
pub fn write_mapping(path: impl AsRef<Path>, map: &CanonicalMap) -> Result<(), InputError> {
    let mut out = String::new();
    for (raw, canonical) in map.iter() {
        out.push_str(raw);
        out.push('\t');
        out.push_str(canonical);
        out.push('\n');
    }
    write_string(path.as_ref(), &out)
}

pub fn load_corpus_cache(path: impl AsRef<Path>) -> Result<Vec<PreprocessedDocument>, InputError> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    let mut docs = Vec::new();
    for (line_no, line) in content_lines(&text) {
        let Some((id, tokens)) = line.split_once('\t') else {
            tracing::warn!(path = %path.display(), line = line_no, "corpus line skipped: no tab");
            continue;
        };
        if tokens.contains('\t') {
            tracing::warn!(path = %path.display(), line = line_no, "corpus line skipped: extra columns");
            continue;
        }
        docs.push(PreprocessedDocument {
            id: id.to_string(),
            tokens: tokens.split_whitespace().map(str::to_string).collect(),
        });
    }
    Ok(docs)
}

pub fn write_corpus_cache(path: impl AsRef<Path>, docs: &[PreprocessedDocument]) -> Result<(), InputError> {
    let mut out = String::new();
    for doc in docs {
        out.push_str(&doc.id);
        out.push('\t');
        out.push_str(&doc.tokens.join(" "));
        out.push('\n');
    }
    write_string(path.as_ref(), &out)
}

/// Every `*.txt` file directly under `dir` as `(filename, contents)`,
/// sorted by filename.
pub fn read_raw_documents(dir: impl AsRef<Path>) -> Result<Vec<(String, String)>, InputError> {
    let dir = dir.as_ref();
    let read_err = |e: std::io::Error| InputError::Read {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };
    let mut docs = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };
        docs.push((name.to_string(), read_to_string(&path)?));
    }
    docs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(docs)
}

/// Load the corpus cache, or rebuild it from `raw_dir` when it is missing.
pub fn load_or_preprocess_corpus(
    cache: impl AsRef<Path>,
    raw_dir: impl AsRef<Path>,
    pipeline: &Pipeline,
    use_parallel: bool,
) -> Result<Vec<PreprocessedDocument>, PipelineError> {
    let cache = cache.as_ref();
    if cache.exists() {
        let docs = load_corpus_cache(cache)?;
        tracing::info!(path = %cache.display(), documents = docs.len(), "corpus cache loaded");
        return Ok(docs);
    }
    tracing::info!(path = %cache.display(), "corpus cache missing; reprocessing raw documents");
    let raw = read_raw_documents(raw_dir)?;
    let docs = pipeline.preprocess_corpus(&raw, use_parallel)?;
    write_corpus_cache(cache, &docs)?;
    Ok(docs)
}

/// Load a vector table. Every row must have the same dimension.
pub fn load_vectors(path: impl AsRef<Path>) -> Result<(Vec<String>, Array2<f32>), InputError> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    let mut ids = Vec::new();
    let mut values: Vec<f32> = Vec::new();
    let mut dim: Option<usize> = None;

    for (line_no, line) in content_lines(&text) {
        let Some((id, rest)) = line.split_once('\t') else {
            tracing::warn!(path = %path.display(), line = line_no, "vector line skipped: no tab");
            continue;
        };
        let row: Result<Vec<f32>, _> = rest.split_whitespace().map(str::parse::<f32>).collect();
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(path = %path.display(), line = line_no, error = %e, "vector line skipped");
                continue;
            }
        };
        match dim {
            None => dim = Some(row.len()),
            Some(d) if d != row.len() => {
                return Err(InputError::Invalid {
                    path: path.to_path_buf(),
                    line: line_no,
                    reason: format!("expected {d} values, found {}", row.len()),
                });
            }
            Some(_) => {}
        }
        ids.push(id.to_string());
        values.extend(row);
    }

    let dim = dim.unwrap_or(0);
    let matrix = Array2::from_shape_vec((ids.len(), dim), values).map_err(|e| InputError::Invalid {
        path: path.to_path_buf(),
        line: 0,
        reason: e.to_string(),
    })?;
    Ok((ids, matrix))
}

/// Load per-document facets from a JSON object keyed by document id.
pub fn load_facets(path: impl AsRef<Path>) -> Result<BTreeMap<String, DocumentFacets>, InputError> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| InputError::Invalid {
        path: path.to_path_buf(),
        line: e.line(),
        reason: e.to_string(),
    })
}
