use std::fmt::Debug;

use num::Num;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::sort::sort_by_column;

/// Compressed-row sparse matrix.
///
/// Row `i` owns the entries `indptr[i]..indptr[i + 1]` of `indices` / `data`.
/// Column indices inside a row are strictly ascending.
///
/// The shape is fixed at construction. Transformations never mutate a matrix
/// in place; they produce a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix<N> {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<u32>,
    data: Vec<N>,
}

/// Borrowed view of a single matrix row
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a, N> {
    pub indices: &'a [u32],
    pub values: &'a [N],
}

impl<'a, N: Copy> RowView<'a, N> {
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// (column, value) pairs in column order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (u32, N)> + 'a {
        let (indices, values) = (self.indices, self.values);
        indices.iter().copied().zip(values.iter().copied())
    }
}

/// Owned sparse row, sorted by column.
/// Building block for assembling a `CsrMatrix` from independently computed rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseRow<N> {
    indices: Vec<u32>,
    values: Vec<N>,
}

impl<N> SparseRow<N>
where
    N: Num + Copy,
{
    pub fn new() -> Self {
        Self { indices: Vec::new(), values: Vec::new() }
    }

    /// Builds a row from unordered (column, value) pairs.
    /// Zero values are dropped; columns must be unique.
    pub fn from_unsorted(mut indices: Vec<u32>, mut values: Vec<N>) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        sort_by_column(&mut indices, &mut values);
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]), "duplicate column in row");
        let mut row = Self { indices, values };
        row.drop_zeros();
        row
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn view(&self) -> RowView<'_, N> {
        RowView { indices: &self.indices, values: &self.values }
    }

    fn drop_zeros(&mut self) {
        if self.values.iter().all(|v| *v != N::zero()) {
            return;
        }
        let (indices, values): (Vec<u32>, Vec<N>) = self
            .indices
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .filter(|(_, v)| *v != N::zero())
            .unzip();
        self.indices = indices;
        self.values = values;
    }
}

impl<N> CsrMatrix<N>
where
    N: Num + Copy,
{
    /// Empty matrix with `n_rows` all-zero rows
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            indptr: vec![0; n_rows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Assembles a matrix from rows in row order.
    ///
    /// # Errors
    /// Returns a description of the first row holding a column outside `0..n_cols`.
    pub fn from_rows(n_cols: usize, rows: Vec<SparseRow<N>>) -> Result<Self, String> {
        let n_rows = rows.len();
        let nnz: usize = rows.iter().map(SparseRow::nnz).sum();
        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::with_capacity(nnz);
        let mut data = Vec::with_capacity(nnz);
        indptr.push(0);
        for (i, row) in rows.into_iter().enumerate() {
            if let Some(&last) = row.indices.last() {
                if last as usize >= n_cols {
                    return Err(format!("row {i} has column {last} but matrix has {n_cols} columns"));
                }
            }
            indices.extend(row.indices);
            data.extend(row.values);
            indptr.push(indices.len());
        }
        Ok(Self { n_rows, n_cols, indptr, indices, data })
    }

    /// Builds a matrix from raw CSR parts, checking structural invariants.
    pub fn from_parts(
        n_rows: usize,
        n_cols: usize,
        indptr: Vec<usize>,
        indices: Vec<u32>,
        data: Vec<N>,
    ) -> Result<Self, String> {
        let m = Self { n_rows, n_cols, indptr, indices, data };
        m.validate()?;
        Ok(m)
    }

    /// (rows, columns)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of explicitly stored entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn data(&self) -> &[N] {
        &self.data
    }

    /// # Panics
    /// if `i >= n_rows`
    #[inline]
    pub fn row(&self, i: usize) -> RowView<'_, N> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        RowView {
            indices: &self.indices[start..end],
            values: &self.data[start..end],
        }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowView<'_, N>> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Value at (row, col), zero when not stored
    pub fn get(&self, row: usize, col: u32) -> N {
        let r = self.row(row);
        match r.indices.binary_search(&col) {
            Ok(pos) => r.values[pos],
            Err(_) => N::zero(),
        }
    }

    /// Sum of the stored values of every row
    pub fn row_sums(&self) -> Vec<f64>
    where
        N: Into<f64>,
    {
        self.iter_rows()
            .map(|r| r.values.iter().fold(0.0_f64, |acc, &v| acc + v.into()))
            .collect()
    }

    /// True when both matrices have the same shape and store entries at
    /// exactly the same positions.
    pub fn same_pattern<M>(&self, other: &CsrMatrix<M>) -> bool {
        self.n_rows == other.n_rows
            && self.n_cols == other.n_cols
            && self.indptr == other.indptr
            && self.indices == other.indices
    }

    /// Maps every row to new values on the same sparsity pattern.
    ///
    /// Rows are processed in parallel and reassembled in row order. The
    /// closure receives the row index and the row, and returns one value per
    /// stored entry, or `None` to abort; an aborted map yields `None` and no
    /// partial matrix.
    pub fn try_map_rows<M, F>(&self, f: F) -> Option<CsrMatrix<M>>
    where
        N: Send + Sync,
        M: Num + Copy + Send,
        F: Fn(usize, RowView<'_, N>) -> Option<Vec<M>> + Send + Sync,
    {
        let rows: Option<Vec<Vec<M>>> = (0..self.n_rows)
            .into_par_iter()
            .map(|i| {
                let row = self.row(i);
                let values = f(i, row)?;
                debug_assert_eq!(values.len(), row.nnz(), "row {i} changed its entry count");
                Some(values)
            })
            .collect();
        let data: Vec<M> = rows?.into_iter().flatten().collect();
        Some(CsrMatrix {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            indptr: self.indptr.clone(),
            indices: self.indices.clone(),
            data,
        })
    }

    /// Dense copy, for inspection and tests
    pub fn to_dense(&self) -> Vec<Vec<N>> {
        self.iter_rows()
            .map(|r| {
                let mut dense = vec![N::zero(); self.n_cols];
                for (c, v) in r.iter() {
                    dense[c as usize] = v;
                }
                dense
            })
            .collect()
    }

    /// Checks the CSR structural invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.indptr.len() != self.n_rows + 1 {
            return Err(format!(
                "indptr has {} entries, expected {}",
                self.indptr.len(),
                self.n_rows + 1
            ));
        }
        if self.indices.len() != self.data.len() {
            return Err(format!(
                "{} column indices but {} values",
                self.indices.len(),
                self.data.len()
            ));
        }
        if self.indptr[0] != 0 || self.indptr[self.n_rows] != self.data.len() {
            return Err("indptr does not span the stored entries".to_string());
        }
        for i in 0..self.n_rows {
            let (start, end) = (self.indptr[i], self.indptr[i + 1]);
            if start > end || end > self.indices.len() {
                return Err(format!("indptr is not monotone within bounds at row {i}"));
            }
            let cols = &self.indices[start..end];
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(format!("row {i} columns are not strictly ascending"));
            }
            if let Some(&last) = cols.last() {
                if last as usize >= self.n_cols {
                    return Err(format!("row {i} has out-of-range column {last}"));
                }
            }
        }
        Ok(())
    }
}

impl CsrMatrix<f64> {
    /// True when no stored value is NaN or infinite
    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CsrMatrix<f64> {
        CsrMatrix::from_rows(
            4,
            vec![
                SparseRow::from_unsorted(vec![3, 0], vec![2.0, 1.0]),
                SparseRow::new(),
                SparseRow::from_unsorted(vec![1], vec![5.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn from_rows_builds_sorted_csr() {
        let m = sample();
        assert_eq!(m.shape(), (3, 4));
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.indptr(), &[0, 2, 2, 3]);
        assert_eq!(m.indices(), &[0, 3, 1]);
        assert_eq!(m.data(), &[1.0, 2.0, 5.0]);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn zero_values_are_not_stored() {
        let row = SparseRow::from_unsorted(vec![2, 1, 0], vec![0u32, 4, 0]);
        assert_eq!(row.nnz(), 1);
        assert_eq!(row.view().iter().collect::<Vec<_>>(), vec![(1, 4)]);
    }

    #[test]
    fn out_of_range_column_is_rejected() {
        let err = CsrMatrix::from_rows(2, vec![SparseRow::from_unsorted(vec![2], vec![1.0])]);
        assert!(err.is_err());
    }

    #[test]
    fn get_and_dense_agree() {
        let m = sample();
        let dense = m.to_dense();
        for (i, row) in dense.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                assert_eq!(m.get(i, j as u32), *v);
            }
        }
        assert_eq!(dense[1], vec![0.0; 4]);
    }

    #[test]
    fn row_sums_include_empty_rows() {
        assert_eq!(sample().row_sums(), vec![3.0, 0.0, 5.0]);
    }

    #[test]
    fn try_map_rows_keeps_pattern() {
        let m = sample();
        let doubled = m
            .try_map_rows(|_, r| Some(r.values.iter().map(|v| v * 2.0).collect()))
            .unwrap();
        assert!(m.same_pattern(&doubled));
        assert_eq!(doubled.data(), &[2.0, 4.0, 10.0]);
    }

    #[test]
    fn try_map_rows_abort_returns_none() {
        let m = sample();
        let aborted: Option<CsrMatrix<f64>> =
            m.try_map_rows(|i, r| if i == 2 { None } else { Some(r.values.to_vec()) });
        assert!(aborted.is_none());
    }

    #[test]
    fn from_parts_detects_broken_structure() {
        assert!(CsrMatrix::<f64>::from_parts(2, 2, vec![0, 1], vec![0], vec![1.0]).is_err());
        assert!(CsrMatrix::<f64>::from_parts(1, 2, vec![0, 2], vec![1, 0], vec![1.0, 1.0]).is_err());
        assert!(CsrMatrix::<f64>::from_parts(1, 2, vec![0, 2], vec![0, 1], vec![1.0, 1.0]).is_ok());
    }

    #[test]
    fn cbor_roundtrip_preserves_matrix() {
        let m = sample();
        let bytes = serde_cbor::to_vec(&m).unwrap();
        let back: CsrMatrix<f64> = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(m, back);
    }
}
