use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    utils::datastruct::CsrMatrix,
};

/// Read-only summary of a weighted matrix.
/// Field order is the column order of the stats table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixStats {
    pub matrix_name: String,
    pub num_documents: usize,
    pub num_features: usize,
    /// `(1 - nnz / (documents * features)) * 100`
    pub sparsity_percent: f64,
    pub nnz: usize,
}

impl MatrixStats {
    pub fn from_matrix<N>(matrix_name: impl Into<String>, matrix: &CsrMatrix<N>) -> Self
    where
        N: num::Num + Copy,
    {
        let (num_documents, num_features) = matrix.shape();
        Self {
            matrix_name: matrix_name.into(),
            num_documents,
            num_features,
            sparsity_percent: sparsity(matrix.nnz(), num_documents, num_features) * 100.0,
            nnz: matrix.nnz(),
        }
    }

    /// Sparsity as a fraction in [0, 1]
    pub fn sparsity(&self) -> f64 {
        self.sparsity_percent / 100.0
    }
}

/// `1 - nnz / cells`; a matrix without cells counts as fully sparse
pub fn sparsity(nnz: usize, rows: usize, cols: usize) -> f64 {
    let cells = rows as f64 * cols as f64;
    if cells == 0.0 {
        return 1.0;
    }
    1.0 - nnz as f64 / cells
}

/// Checks that matrix rows line up with metadata rows and columns with the vocabulary.
pub fn validate_shape<N>(matrix: &CsrMatrix<N>, metadata_rows: usize, vocabulary_len: usize) -> Result<()>
where
    N: num::Num + Copy,
{
    let (rows, cols) = matrix.shape();
    if rows != metadata_rows {
        return Err(Error::ShapeMismatch(format!(
            "matrix has {rows} rows but there are {metadata_rows} metadata rows"
        )));
    }
    if cols != vocabulary_len {
        return Err(Error::ShapeMismatch(format!(
            "matrix has {cols} columns but the vocabulary has {vocabulary_len} terms"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::utils::datastruct::SparseRow;

    #[test]
    fn stats_of_small_matrix() {
        let m = CsrMatrix::from_rows(
            4,
            vec![SparseRow::from_unsorted(vec![0, 1], vec![1.0, 2.0]), SparseRow::from_unsorted(vec![3], vec![1.0])],
        )
        .unwrap();
        let s = MatrixStats::from_matrix("BM25-test", &m);
        assert_eq!(s.matrix_name, "BM25-test");
        assert_eq!((s.num_documents, s.num_features, s.nnz), (2, 4, 3));
        assert_abs_diff_eq!(s.sparsity_percent, 62.5, epsilon = 1e-12);
        assert_abs_diff_eq!(s.sparsity(), 0.625, epsilon = 1e-12);
    }

    #[test]
    fn empty_shape_is_fully_sparse() {
        assert_eq!(sparsity(0, 0, 10), 1.0);
    }

    #[test]
    fn shape_validation() {
        let m = CsrMatrix::<f64>::zeros(3, 5);
        assert!(validate_shape(&m, 3, 5).is_ok());
        assert!(matches!(validate_shape(&m, 2, 5), Err(Error::ShapeMismatch(_))));
        assert!(matches!(validate_shape(&m, 3, 4), Err(Error::ShapeMismatch(_))));
    }
}
