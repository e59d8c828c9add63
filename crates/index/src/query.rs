use std::cmp::Ordering;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::model::{Factorization, SparseVector};
use crate::similarity::{dot, scale_score, SimilarityIndex};
use crate::{IndexError, ScoreNormalization};

/// One ranked neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Corpus row of the neighbor.
    pub row: usize,
    pub score: f32,
}

/// Highest score first; equal scores keep the lower row first.
fn rank<I>(scored: I, n: usize) -> Vec<Neighbor>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    let mut all: Vec<Neighbor> = scored
        .into_iter()
        .map(|(row, score)| Neighbor { row, score })
        .collect();
    all.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.row.cmp(&b.row),
        other => other,
    });
    all.truncate(n);
    all
}

impl SimilarityIndex {
    /// Top `n` rows by score against `row`, the row itself included.
    ///
    /// Returns `min(n, len)` entries.
    pub fn top_n(&self, row: usize, n: usize) -> Result<Vec<Neighbor>, IndexError> {
        self.check_row(row)?;
        let scores = self.scores.row(row);
        Ok(rank(scores.iter().copied().enumerate(), n))
    }

    /// Like [`SimilarityIndex::top_n`] but never returns `row` itself.
    pub fn top_n_excluding_self(&self, row: usize, n: usize) -> Result<Vec<Neighbor>, IndexError> {
        self.check_row(row)?;
        let scores = self.scores.row(row);
        Ok(rank(
            scores
                .iter()
                .copied()
                .enumerate()
                .filter(|&(other, _)| other != row),
            n,
        ))
    }

    /// [`SimilarityIndex::top_n`] addressed by document id.
    pub fn top_n_for_id(&self, id: &str, n: usize) -> Result<Vec<Neighbor>, IndexError> {
        let row = self
            .row_of(id)
            .ok_or_else(|| IndexError::UnknownDocument(id.to_string()))?;
        self.top_n(row, n)
    }

    /// Rank the corpus against an arbitrary vector in the index space.
    ///
    /// Scores use the same scaling as the stored matrix.
    pub fn query_by_vector(
        &self,
        query: ArrayView1<'_, f32>,
        n: usize,
    ) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dim() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim(),
                found: query.len(),
            });
        }
        let query_norm = match self.normalization {
            ScoreNormalization::Cosine => dot(query, query).sqrt(),
            _ => 0.0,
        };
        let scored = self.vectors.rows().into_iter().enumerate().map(|(row, v)| {
            let raw = dot(v, query);
            let score = scale_score(
                raw,
                self.normalization,
                self.frobenius,
                self.row_norms[row],
                query_norm,
            );
            (row, score)
        });
        Ok(rank(scored, n))
    }

    /// Project a sparse feature vector (for example the centroid of a
    /// user's liked papers) through `model` and rank the corpus against it.
    pub fn query_by_centroid(
        &self,
        features: &SparseVector,
        n: usize,
        model: &dyn Factorization,
    ) -> Result<Vec<Neighbor>, IndexError> {
        if model.n_components() != self.dim() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim(),
                found: model.n_components(),
            });
        }
        let projected = model.transform(features)?;
        tracing::trace!(nnz = features.nnz(), n, "centroid query");
        self.query_by_vector(projected.view(), n)
    }
}
