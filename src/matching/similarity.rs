//! Pairwise cosine similarity between two sets of embeddings

use crate::embedding::validate_embeddings;
use crate::error::EmbeddingError;
use ndarray::Array2;

/// Floor for row norms, so zero vectors normalize to zero instead of NaN
pub const NORM_EPSILON: f64 = 1e-9;

/// `[required x resume]` cosine similarities.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    scores: Array2<f32>,
}

impl SimilarityMatrix {
    /// Normalize both sides to unit length and take `A · Bᵀ`.
    ///
    /// Normalization and the product run in f64 and every score is clamped
    /// to `[-1, 1]`, so identical vectors score exactly `1.0`.
    /// Both sides must be non-empty and share one dimensionality.
    pub fn compute(required: &[Vec<f32>], resume: &[Vec<f32>]) -> Result<Self, EmbeddingError> {
        let required = normalized_rows(required)?;
        let resume = normalized_rows(resume)?;

        if required.ncols() != resume.ncols() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: required.ncols(),
                actual: resume.ncols(),
            });
        }

        let scores = required
            .dot(&resume.t())
            .mapv(|score| score.clamp(-1.0, 1.0) as f32);
        Ok(Self { scores })
    }

    /// (rows, columns) = (required count, resume count)
    pub fn shape(&self) -> (usize, usize) {
        self.scores.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.scores.get((row, col)).copied()
    }

    /// Best column of a row and its score. Ties go to the earliest column.
    pub fn row_max(&self, row: usize) -> Option<(usize, f32)> {
        if row >= self.scores.nrows() {
            return None;
        }

        self.scores
            .row(row)
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (col, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((col, score)),
            })
    }
}

fn normalized_rows(vectors: &[Vec<f32>]) -> Result<Array2<f64>, EmbeddingError> {
    let dim = validate_embeddings(vectors.len(), vectors)?;
    if dim == 0 {
        return Err(EmbeddingError::Malformed("no embeddings to compare".to_string()));
    }

    let flat: Vec<f64> = vectors.iter().flatten().map(|&x| f64::from(x)).collect();
    let mut matrix = Array2::from_shape_vec((vectors.len(), dim), flat)
        .map_err(|e| EmbeddingError::Malformed(format!("Invalid embedding shape: {}", e)))?;

    for mut row in matrix.rows_mut() {
        let denom = row.dot(&row).sqrt().max(NORM_EPSILON);
        row.mapv_inplace(|x| x / denom);
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_and_orthogonal() {
        let required = vec![vec![3.0, 4.0], vec![0.0, 2.0]];
        let resume = vec![vec![0.6, 0.8], vec![5.0, 0.0]];

        let matrix = SimilarityMatrix::compute(&required, &resume).unwrap();
        assert_eq!(matrix.shape(), (2, 2));
        assert_relative_eq!(matrix.get(0, 0).unwrap(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(matrix.get(0, 1).unwrap(), 0.6, epsilon = 1e-6);
        assert_relative_eq!(matrix.get(1, 0).unwrap(), 0.8, epsilon = 1e-6);
        assert_relative_eq!(matrix.get(1, 1).unwrap(), 0.0, epsilon = 1e-6);
        assert!(matrix.get(2, 0).is_none());
    }

    #[test]
    fn test_opposite_vectors() {
        let matrix = SimilarityMatrix::compute(&[vec![1.0, 1.0]], &[vec![-2.0, -2.0]]).unwrap();
        assert_relative_eq!(matrix.get(0, 0).unwrap(), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let matrix = SimilarityMatrix::compute(&[vec![0.0, 0.0]], &[vec![1.0, 0.0]]).unwrap();
        let score = matrix.get(0, 0).unwrap();
        assert!(score.is_finite());
        assert_relative_eq!(score, 0.0);
    }

    #[test]
    fn test_row_max_and_ties() {
        let required = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let resume = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0]];

        let matrix = SimilarityMatrix::compute(&required, &resume).unwrap();
        let (col, score) = matrix.row_max(0).unwrap();
        assert_eq!(col, 1);
        assert_relative_eq!(score, 1.0, epsilon = 1e-6);
        assert_eq!(matrix.row_max(1).unwrap().0, 0);
        assert!(matrix.row_max(5).is_none());
        assert_eq!(matrix.shape(), (2, 3));
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = SimilarityMatrix::compute(&[vec![1.0, 0.0]], &[vec![1.0, 0.0, 0.0]]);
        assert!(matches!(
            result,
            Err(EmbeddingError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_empty_side_rejected() {
        assert!(SimilarityMatrix::compute(&[], &[vec![1.0]]).is_err());
    }

    #[test]
    fn test_identical_vectors_score_exactly_one() {
        for vector in [
            vec![0.1, 0.2, 0.3],
            vec![1e-4, 2e-4, 3e-4],
            vec![0.3, 0.7, 0.2],
            vec![-12.5, 3.25, 1e-3, 7.0],
        ] {
            let matrix = SimilarityMatrix::compute(&[vector.clone()], &[vector.clone()]).unwrap();
            assert_eq!(matrix.get(0, 0).unwrap(), 1.0, "self-similarity of {:?}", vector);
        }
    }

    #[test]
    fn test_scores_stay_within_unit_range() {
        let required = vec![vec![0.1, 0.2, 0.3], vec![-0.1, -0.2, -0.3]];
        let resume = vec![vec![0.2, 0.4, 0.6], vec![1e-6, 2e-6, 3e-6]];

        let matrix = SimilarityMatrix::compute(&required, &resume).unwrap();
        for row in 0..2 {
            for col in 0..2 {
                let score = matrix.get(row, col).unwrap();
                assert!((-1.0..=1.0).contains(&score));
            }
        }
        assert_eq!(matrix.get(1, 0).unwrap(), -1.0);
    }
}
