//! Sparsity patterns and CSR helpers.
use crate::error::SparseError;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeSet;

/// A sparsity pattern that can grow one entry at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicSparsityPattern {
    n_cols: usize,
    rows: Vec<BTreeSet<usize>>,
}

impl DynamicSparsityPattern {
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: vec![BTreeSet::new(); n_rows],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// # Panics
    ///
    /// Panics if the entry is out of bounds.
    pub fn add(&mut self, row: usize, col: usize) {
        assert!(col < self.n_cols, "Column {} out of bounds ({} columns)", col, self.n_cols);
        self.rows[row].insert(col);
    }

    pub fn add_entries(&mut self, row: usize, cols: impl IntoIterator<Item = usize>) {
        for col in cols {
            self.add(row, col);
        }
    }

    pub fn exists(&self, row: usize, col: usize) -> bool {
        self.rows[row].contains(&col)
    }

    /// Column indices of a row in increasing order.
    pub fn row(&self, row: usize) -> impl '_ + Iterator<Item = usize> {
        self.rows[row].iter().copied()
    }

    pub fn n_nonzero(&self) -> usize {
        self.rows.iter().map(BTreeSet::len).sum()
    }

    pub fn to_sparsity_pattern(&self) -> SparsityPattern {
        let mut offsets = Vec::with_capacity(self.rows.len() + 1);
        let mut indices = Vec::with_capacity(self.n_nonzero());
        offsets.push(0);
        for row in &self.rows {
            indices.extend(row.iter().copied());
            offsets.push(indices.len());
        }
        SparsityPattern::try_from_offsets_and_indices(self.rows.len(), self.n_cols, offsets, indices)
            .expect("Rows of a dynamic pattern are sorted, unique and in bounds")
    }
}

/// A CSR matrix on `pattern` with all values zero.
pub fn zero_csr_from_pattern(pattern: &SparsityPattern) -> CsrMatrix<f64> {
    let values = vec![0.0; pattern.nnz()];
    CsrMatrix::try_from_pattern_and_values(pattern.clone(), values)
        .expect("One value per pattern entry is always a valid CSR matrix")
}

/// Adds `value` to an existing entry of a CSR matrix.
pub fn add_to_csr(matrix: &mut CsrMatrix<f64>, row: usize, col: usize, value: f64) -> Result<(), SparseError> {
    if row >= matrix.nrows() {
        return Err(SparseError::EntryNotInPattern { row, col });
    }
    let mut row_view = matrix.row_mut(row);
    let (cols, values) = row_view.cols_and_values_mut();
    match cols.binary_search(&col) {
        Ok(k) => {
            values[k] += value;
            Ok(())
        }
        Err(_) => Err(SparseError::EntryNotInPattern { row, col }),
    }
}
