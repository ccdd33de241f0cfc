//! Cosine similarity over sparse row vectors.
//!
//! Rows are kept in CSR form and mirrored in CSC form so the similarities
//! of one row against every other row can be accumulated by walking the
//! postings of that row's non-zero columns, without materialising the
//! full square matrix.

use rayon::prelude::*;
use sprs::CsMat;

/// Pairwise cosine similarity between the rows of a sparse matrix.
///
/// The self-similarity of every row is 1, including rows without any
/// non-zero entry. Two distinct rows where either has zero norm have similarity 0.
#[derive(Debug, Clone)]
pub struct CosineSimilarity {
    rows: CsMat<f64>,
    columns: CsMat<f64>,
    norms: Vec<f64>,
}

impl CosineSimilarity {
    /// Index the rows of `matrix` (any storage order)
    pub fn new(matrix: CsMat<f64>) -> Self {
        let rows = matrix.to_csr();
        let columns = rows.to_csc();

        let norms: Vec<f64> = (0..rows.rows())
            .map(|row| {
                rows.outer_view(row)
                    .map(|v| v.iter().map(|(_, value)| value * value).sum::<f64>().sqrt())
                    .unwrap_or(0.0)
            })
            .collect();

        Self {
            rows,
            columns,
            norms,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    /// Similarity of `row` against every row, indexed by row.
    ///
    /// Returns `None` when `row` is out of range.
    pub fn similarity_row(&self, row: usize) -> Option<Vec<f64>> {
        let vector = self.rows.outer_view(row)?;
        let mut dots = vec![0.0; self.len()];

        for (col, value) in vector.iter() {
            if let Some(posting) = self.columns.outer_view(col) {
                for (other, other_value) in posting.iter() {
                    dots[other] += value * other_value;
                }
            }
        }

        let norm = self.norms[row];
        let similarities = dots
            .into_iter()
            .enumerate()
            .map(|(other, dot)| {
                if other == row {
                    1.0
                } else {
                    let denominator = norm * self.norms[other];
                    if denominator > 0.0 {
                        dot / denominator
                    } else {
                        0.0
                    }
                }
            })
            .collect();
        Some(similarities)
    }

    /// Similarity between two rows
    pub fn similarity(&self, a: usize, b: usize) -> Option<f64> {
        if b >= self.len() {
            return None;
        }
        self.similarity_row(a).map(|row| row[b])
    }

    /// The full square similarity matrix, one row per input row.
    ///
    /// Quadratic in the number of rows; rows are computed in parallel and
    /// collected in order.
    pub fn similarity_matrix(&self) -> Vec<Vec<f64>> {
        (0..self.len())
            .into_par_iter()
            .map(|row| self.similarity_row(row).unwrap_or_default())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    fn matrix(num_rows: usize, num_cols: usize, triplets: &[(usize, usize, f64)]) -> CsMat<f64> {
        let mut input = TriMat::new((num_rows, num_cols));
        for &(row, col, val) in triplets {
            input.add_triplet(row, col, val);
        }
        input.to_csr()
    }

    #[test]
    fn test_known_cosine_values() {
        let sim = CosineSimilarity::new(matrix(
            3,
            3,
            &[(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (2, 2, 2.0)],
        ));

        let row = sim.similarity_row(0).unwrap();
        assert!((row[0] - 1.0).abs() < 1e-12);
        assert!((row[1] - 1.0 / 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(row[2], 0.0);
    }

    #[test]
    fn test_symmetric_with_unit_diagonal() {
        let sim = CosineSimilarity::new(matrix(
            4,
            4,
            &[
                (0, 0, 2.0),
                (0, 3, 1.0),
                (1, 0, 1.0),
                (1, 1, 1.0),
                (2, 1, 3.0),
                (2, 3, 1.0),
            ],
        ));
        let full = sim.similarity_matrix();

        for i in 0..4 {
            assert!((full[i][i] - 1.0).abs() < 1e-12, "diagonal at {}", i);
            for j in 0..4 {
                assert!((full[i][j] - full[j][i]).abs() < 1e-12);
                assert!(full[i][j] >= 0.0 && full[i][j] <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn test_zero_row_is_only_similar_to_itself() {
        let sim = CosineSimilarity::new(matrix(2, 1, &[(1, 0, 1.0)]));
        assert_eq!(sim.similarity_row(0).unwrap(), vec![1.0, 0.0]);
        assert_eq!(sim.similarity(1, 0), Some(0.0));
    }

    #[test]
    fn test_out_of_range_row() {
        let sim = CosineSimilarity::new(matrix(1, 1, &[(0, 0, 1.0)]));
        assert!(sim.similarity_row(5).is_none());
        assert!(sim.similarity(0, 5).is_none());
    }
}
