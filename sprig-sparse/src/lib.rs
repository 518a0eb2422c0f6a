//! Sparse linear algebra used by `sprig`: matrix-vector products on CSR matrices, linear
//! operators and a preconditioned conjugate gradient solver.
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::CsrMatrix;
use std::error::Error;
use std::fmt;

mod cg;

pub use cg::*;

/// Boxed error returned by operators.
pub type OperatorError = Box<dyn Error + Send + Sync>;

/// Returned by operators applied to vectors of the wrong size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dimension mismatch: expected {}, got {}", self.expected, self.actual)
    }
}

impl Error for DimensionMismatch {}

fn check_len(expected: usize, actual: usize) -> Result<(), DimensionMismatch> {
    if expected == actual {
        Ok(())
    } else {
        Err(DimensionMismatch { expected, actual })
    }
}

/// A square linear operator `y = A x`.
pub trait LinearOperator {
    fn apply(&self, y: &mut DVector<f64>, x: &DVector<f64>) -> Result<(), OperatorError>;
}

impl<'a, A> LinearOperator for &'a A
where
    A: ?Sized + LinearOperator,
{
    fn apply(&self, y: &mut DVector<f64>, x: &DVector<f64>) -> Result<(), OperatorError> {
        <A as LinearOperator>::apply(self, y, x)
    }
}

impl LinearOperator for DMatrix<f64> {
    fn apply(&self, y: &mut DVector<f64>, x: &DVector<f64>) -> Result<(), OperatorError> {
        check_len(self.ncols(), x.len())?;
        check_len(self.nrows(), y.len())?;
        y.gemv(1.0, self, x, 0.0);
        Ok(())
    }
}

impl LinearOperator for CsrMatrix<f64> {
    fn apply(&self, y: &mut DVector<f64>, x: &DVector<f64>) -> Result<(), OperatorError> {
        spmv_into(y, self, x)?;
        Ok(())
    }
}

/// The identity, used as the default (absent) preconditioner.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOperator;

impl LinearOperator for IdentityOperator {
    fn apply(&self, y: &mut DVector<f64>, x: &DVector<f64>) -> Result<(), OperatorError> {
        check_len(y.len(), x.len())?;
        y.copy_from(x);
        Ok(())
    }
}

/// Jacobi preconditioner `P = diag(A)^{-1}`.
///
/// Zero diagonal entries are replaced by one.
#[derive(Debug, Clone)]
pub struct DiagonalPreconditioner {
    inverse_diagonal: DVector<f64>,
}

impl DiagonalPreconditioner {
    pub fn from_csr(matrix: &CsrMatrix<f64>) -> Self {
        let mut inverse_diagonal = DVector::from_element(matrix.nrows(), 1.0);
        for (i, row) in matrix.row_iter().enumerate() {
            let diagonal = row
                .col_indices()
                .iter()
                .zip(row.values())
                .find(|(&j, _)| j == i)
                .map(|(_, &value)| value)
                .unwrap_or(0.0);
            if diagonal != 0.0 {
                inverse_diagonal[i] = 1.0 / diagonal;
            }
        }
        Self { inverse_diagonal }
    }

    pub fn inverse_diagonal(&self) -> &DVector<f64> {
        &self.inverse_diagonal
    }
}

impl LinearOperator for DiagonalPreconditioner {
    fn apply(&self, y: &mut DVector<f64>, x: &DVector<f64>) -> Result<(), OperatorError> {
        check_len(self.inverse_diagonal.len(), x.len())?;
        check_len(self.inverse_diagonal.len(), y.len())?;
        y.copy_from(x);
        y.component_mul_assign(&self.inverse_diagonal);
        Ok(())
    }
}

/// Computes `y = A x`.
pub fn spmv_into(y: &mut DVector<f64>, matrix: &CsrMatrix<f64>, x: &DVector<f64>) -> Result<(), DimensionMismatch> {
    check_len(matrix.ncols(), x.len())?;
    check_len(matrix.nrows(), y.len())?;
    spmm_csr_dense(0.0, y, 1.0, Op::NoOp(matrix), Op::NoOp(x));
    Ok(())
}

/// Returns `A x`.
///
/// # Panics
///
/// Panics if the length of `x` does not match the number of columns of `A`.
pub fn spmv(matrix: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let mut y = DVector::zeros(matrix.nrows());
    if let Err(err) = spmv_into(&mut y, matrix, x) {
        panic!("spmv: {}", err);
    }
    y
}

/// Returns `Aᵀ x` without forming the transpose.
///
/// # Panics
///
/// Panics if the length of `x` does not match the number of rows of `A`.
pub fn spmv_transpose(matrix: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    assert_eq!(matrix.nrows(), x.len(), "spmv_transpose: x must have one entry per row");
    let mut y = DVector::zeros(matrix.ncols());
    spmm_csr_dense(0.0, &mut y, 1.0, Op::Transpose(matrix), Op::NoOp(x));
    y
}
