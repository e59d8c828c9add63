use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::lookup::DocumentLookup;
use crate::{IndexConfig, IndexError, ScoreNormalization};

/// Precomputed all-pairs similarity over a fixed corpus.
///
/// Immutable after [`SimilarityIndex::build`]; queries take `&self` and can
/// run concurrently.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    pub(crate) lookup: DocumentLookup,
    pub(crate) vectors: Array2<f32>,
    pub(crate) scores: Array2<f32>,
    pub(crate) normalization: ScoreNormalization,
    /// Frobenius norm of `vectors`.
    pub(crate) frobenius: f64,
    /// Euclidean norm of each row of `vectors`.
    pub(crate) row_norms: Vec<f64>,
}

/// Sequential dot product accumulated in `f64`.
#[inline]
pub(crate) fn dot(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

pub(crate) fn row_norms(vectors: ArrayView2<'_, f32>) -> Vec<f64> {
    vectors.rows().into_iter().map(|r| dot(r, r).sqrt()).collect()
}

pub(crate) fn frobenius_norm(vectors: ArrayView2<'_, f32>) -> f64 {
    vectors
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

/// Scale a raw inner product; a zero normalizer gives a zero score.
#[inline]
pub(crate) fn scale_score(
    raw: f64,
    normalization: ScoreNormalization,
    frobenius: f64,
    norm_a: f64,
    norm_b: f64,
) -> f32 {
    let denom = match normalization {
        ScoreNormalization::Frobenius => frobenius,
        ScoreNormalization::Cosine => norm_a * norm_b,
        ScoreNormalization::None => 1.0,
    };
    if denom == 0.0 {
        return 0.0;
    }
    let score = (raw / denom) as f32;
    // Signed zeros compare unequal under `total_cmp`.
    if score == 0.0 {
        0.0
    } else {
        score
    }
}

impl SimilarityIndex {
    /// Build the index over `vectors` (`documents x features`); `ids` name
    /// the rows in order.
    pub fn build<I, S>(ids: I, vectors: Array2<f32>, cfg: &IndexConfig) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lookup = DocumentLookup::from_ids(ids)?;
        if lookup.len() != vectors.nrows() {
            return Err(IndexError::DimensionMismatch {
                expected: vectors.nrows(),
                found: lookup.len(),
            });
        }

        let n = vectors.nrows();
        let norms = row_norms(vectors.view());
        let frobenius = frobenius_norm(vectors.view());
        let normalization = cfg.normalization;

        // Upper triangle only; row `i` holds columns `i..n`.
        let upper_row = |i: usize| -> Vec<f32> {
            let vi = vectors.row(i);
            (i..n)
                .map(|j| {
                    let raw = dot(vi, vectors.row(j));
                    scale_score(raw, normalization, frobenius, norms[i], norms[j])
                })
                .collect()
        };
        let upper: Vec<Vec<f32>> = if cfg.use_parallel {
            (0..n).into_par_iter().map(upper_row).collect()
        } else {
            (0..n).map(upper_row).collect()
        };

        let mut scores = Array2::zeros((n, n));
        for (i, row) in upper.into_iter().enumerate() {
            for (offset, score) in row.into_iter().enumerate() {
                let j = i + offset;
                scores[[i, j]] = score;
                scores[[j, i]] = score;
            }
        }

        tracing::debug!(
            documents = n,
            features = vectors.ncols(),
            ?normalization,
            frobenius,
            "similarity matrix built"
        );

        Ok(Self {
            lookup,
            vectors,
            scores,
            normalization,
            frobenius,
            row_norms: norms,
        })
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.scores.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimensionality.
    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn score(&self, i: usize, j: usize) -> Result<f32, IndexError> {
        self.check_row(i)?;
        self.check_row(j)?;
        Ok(self.scores[[i, j]])
    }

    pub fn scores(&self) -> &Array2<f32> {
        &self.scores
    }

    pub fn vectors(&self) -> &Array2<f32> {
        &self.vectors
    }

    pub fn lookup(&self) -> &DocumentLookup {
        &self.lookup
    }

    pub fn id(&self, row: usize) -> Option<&str> {
        self.lookup.id(row)
    }

    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.lookup.row(id)
    }

    pub fn normalization(&self) -> ScoreNormalization {
        self.normalization
    }

    pub(crate) fn check_row(&self, row: usize) -> Result<(), IndexError> {
        if row >= self.len() {
            return Err(IndexError::RowOutOfRange {
                row,
                len: self.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("doc-{i}")).collect()
    }

    fn corpus() -> Array2<f32> {
        array![
            [0.9, 0.1, 0.0, 0.3],
            [0.8, 0.2, 0.1, 0.0],
            [0.0, 0.0, 1.0, 0.7],
            [0.1, 0.9, 0.0, 0.2],
            [0.3, 0.3, 0.3, 0.3],
        ]
    }

    #[test]
    fn matrix_is_exactly_symmetric() {
        for normalization in [
            ScoreNormalization::Frobenius,
            ScoreNormalization::Cosine,
            ScoreNormalization::None,
        ] {
            let cfg = IndexConfig::new().with_normalization(normalization);
            let index = SimilarityIndex::build(ids(5), corpus(), &cfg).unwrap();
            let s = index.scores();
            for i in 0..5 {
                for j in 0..5 {
                    assert_eq!(s[[i, j]], s[[j, i]], "{normalization:?} ({i},{j})");
                }
            }
        }
    }

    #[test]
    fn frobenius_scaling() {
        let v = array![[3.0_f32, 0.0], [0.0, 4.0]];
        let index = SimilarityIndex::build(ids(2), v, &IndexConfig::default()).unwrap();
        assert_eq!(index.scores(), &array![[9.0 / 5.0, 0.0], [0.0, 16.0 / 5.0]]);
    }

    #[test]
    fn single_document_yields_one_by_one_matrix() {
        let index =
            SimilarityIndex::build(ids(1), array![[3.0_f32, 4.0]], &IndexConfig::default())
                .unwrap();
        assert_eq!(index.scores().dim(), (1, 1));
        let k = index.score(0, 0).unwrap();
        assert!(k >= 0.0);
        assert_eq!(k, 5.0);
    }

    #[test]
    fn zero_matrix_scores_zero() {
        for normalization in [ScoreNormalization::Frobenius, ScoreNormalization::Cosine] {
            let cfg = IndexConfig::new().with_normalization(normalization);
            let index = SimilarityIndex::build(ids(3), Array2::zeros((3, 4)), &cfg).unwrap();
            assert!(index.scores().iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn no_features_scores_zero() {
        let index =
            SimilarityIndex::build(ids(2), Array2::zeros((2, 0)), &IndexConfig::default())
                .unwrap();
        assert!(index.scores().iter().all(|&s| s == 0.0));
        assert_eq!(index.dim(), 0);
    }

    #[test]
    fn cosine_diagonal_is_one_for_nonzero_rows() {
        let cfg = IndexConfig::new().with_normalization(ScoreNormalization::Cosine);
        let index = SimilarityIndex::build(ids(5), corpus(), &cfg).unwrap();
        for i in 0..5 {
            assert!((index.score(i, i).unwrap() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn parallel_build_is_bit_identical() {
        let seq = SimilarityIndex::build(ids(5), corpus(), &IndexConfig::default()).unwrap();
        let par = SimilarityIndex::build(
            ids(5),
            corpus(),
            &IndexConfig::default().with_parallel(true),
        )
        .unwrap();
        assert_eq!(seq.scores(), par.scores());
    }

    #[test]
    fn id_count_must_match_rows() {
        let err = SimilarityIndex::build(ids(2), corpus(), &IndexConfig::default()).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 5,
                found: 2
            }
        );
    }

    #[test]
    fn score_checks_bounds() {
        let index = SimilarityIndex::build(ids(5), corpus(), &IndexConfig::default()).unwrap();
        assert_eq!(
            index.score(0, 5),
            Err(IndexError::RowOutOfRange { row: 5, len: 5 })
        );
        assert_eq!(index.row_of("doc-3"), Some(3));
        assert_eq!(index.id(4), Some("doc-4"));
    }
}
