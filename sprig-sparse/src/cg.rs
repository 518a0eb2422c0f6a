use crate::{IdentityOperator, LinearOperator, OperatorError};
use nalgebra::DVector;
use std::fmt;
use std::ops::{Deref, DerefMut};

pub trait CgStoppingCriterion {
    fn has_converged(&self, b_norm: f64, iteration: usize, approx_residual: &DVector<f64>) -> bool;
}

/// Relative residual tolerance `||r|| <= tol * ||b||`, evaluated on the recursively updated
/// residual.
#[derive(Debug, Clone, Copy)]
pub struct RelativeResidualCriterion {
    tol: f64,
}

impl RelativeResidualCriterion {
    pub fn new(tol: f64) -> Self {
        Self { tol }
    }

    pub fn tolerance(&self) -> f64 {
        self.tol
    }
}

impl Default for RelativeResidualCriterion {
    fn default() -> Self {
        Self::new(1e-8)
    }
}

impl CgStoppingCriterion for RelativeResidualCriterion {
    fn has_converged(&self, b_norm: f64, _iteration: usize, approx_residual: &DVector<f64>) -> bool {
        approx_residual.norm() <= self.tol * b_norm
    }
}

#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct CgWorkspace {
    r: DVector<f64>,
    z: DVector<f64>,
    p: DVector<f64>,
    Ap: DVector<f64>,
}

#[allow(non_snake_case)]
struct Buffers<'a> {
    r: &'a mut DVector<f64>,
    z: &'a mut DVector<f64>,
    p: &'a mut DVector<f64>,
    Ap: &'a mut DVector<f64>,
}

impl Default for CgWorkspace {
    fn default() -> Self {
        Self {
            r: DVector::zeros(0),
            z: DVector::zeros(0),
            p: DVector::zeros(0),
            Ap: DVector::zeros(0),
        }
    }
}

impl CgWorkspace {
    fn prepare_buffers(&mut self, dim: usize) -> Buffers<'_> {
        self.r.resize_vertically_mut(dim, 0.0);
        self.z.resize_vertically_mut(dim, 0.0);
        self.p.resize_vertically_mut(dim, 0.0);
        self.Ap.resize_vertically_mut(dim, 0.0);
        Buffers {
            r: &mut self.r,
            z: &mut self.z,
            p: &mut self.p,
            Ap: &mut self.Ap,
        }
    }
}

#[derive(Debug)]
enum OwnedOrMutRef<'a, T> {
    Owned(T),
    MutRef(&'a mut T),
}

impl<'a, T> Deref for OwnedOrMutRef<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}

impl<'a, T> DerefMut for OwnedOrMutRef<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}

/// Preconditioned conjugate gradient for symmetric positive definite operators.
///
/// Without a configured maximum the solver iterates until the stopping criterion is met.
pub struct ConjugateGradient<'a, A, P = IdentityOperator, Criterion = RelativeResidualCriterion> {
    workspace: OwnedOrMutRef<'a, CgWorkspace>,
    operator: A,
    preconditioner: P,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
}

impl<'a, A: LinearOperator> ConjugateGradient<'a, A> {
    pub fn new(operator: A) -> Self {
        Self {
            workspace: OwnedOrMutRef::Owned(CgWorkspace::default()),
            operator,
            preconditioner: IdentityOperator,
            stopping_criterion: RelativeResidualCriterion::default(),
            max_iter: None,
        }
    }

    pub fn with_workspace(operator: A, workspace: &'a mut CgWorkspace) -> Self {
        Self {
            workspace: OwnedOrMutRef::MutRef(workspace),
            operator,
            preconditioner: IdentityOperator,
            stopping_criterion: RelativeResidualCriterion::default(),
            max_iter: None,
        }
    }
}

impl<'a, A, P, Criterion> ConjugateGradient<'a, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<'a, A, P2, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_stopping_criterion<C2>(self, stopping_criterion: C2) -> ConjugateGradient<'a, A, P, C2> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    OperatorError(OperatorError),
    PreconditionerError(OperatorError),
    DimensionMismatch { rhs: usize, solution: usize },
    IndefiniteOperator,
    IndefinitePreconditioner,
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorError(err) => {
                write!(f, "Error applying operator: ")?;
                err.fmt(f)
            }
            Self::PreconditionerError(err) => {
                write!(f, "Error applying preconditioner: ")?;
                err.fmt(f)
            }
            Self::DimensionMismatch { rhs, solution } => {
                write!(f, "Right-hand side has length {} but solution has length {}", rhs, solution)
            }
            Self::IndefiniteOperator => write!(f, "Operator appears to be indefinite"),
            Self::IndefinitePreconditioner => write!(f, "Indefinite preconditioner"),
            Self::MaxIterationsReached { max_iter } => {
                write!(f, "Max iterations ({}) reached", max_iter)
            }
        }
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct SolveError {
    pub output: CgOutput,
    pub kind: SolveErrorKind,
}

impl SolveError {
    fn new(output: CgOutput, kind: SolveErrorKind) -> Self {
        Self { output, kind }
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CG solve failed after {} iterations: {}", self.output.num_iterations, self.kind)
    }
}

impl std::error::Error for SolveError {}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct CgOutput {
    /// Number of updates made to the (initial) solution vector.
    pub num_iterations: usize,
}

impl<'a, A, P, Criterion> ConjugateGradient<'a, A, P, Criterion>
where
    A: LinearOperator,
    P: LinearOperator,
    Criterion: CgStoppingCriterion,
{
    /// Solves `A x = b` starting from a zero initial guess.
    pub fn solve(&mut self, b: &DVector<f64>) -> Result<DVector<f64>, SolveError> {
        let mut x = DVector::zeros(b.len());
        self.solve_with_guess(b, &mut x)?;
        Ok(x)
    }

    #[allow(non_snake_case)]
    pub fn solve_with_guess(&mut self, b: &DVector<f64>, x: &mut DVector<f64>) -> Result<CgOutput, SolveError> {
        use SolveErrorKind::*;
        let mut output = CgOutput { num_iterations: 0 };
        if b.len() != x.len() {
            let kind = DimensionMismatch {
                rhs: b.len(),
                solution: x.len(),
            };
            return Err(SolveError::new(output, kind));
        }

        let Buffers { r, z, p, Ap } = self.workspace.prepare_buffers(x.len());

        let b_norm = b.norm();
        if b_norm == 0.0 {
            x.fill(0.0);
            return Ok(output);
        }

        // r = b - Ax
        if let Err(err) = self.operator.apply(&mut *r, &*x) {
            return Err(SolveError::new(output, OperatorError(err)));
        }
        r.axpy(1.0, b, -1.0);

        // z = Pr
        if let Err(err) = self.preconditioner.apply(&mut *z, &*r) {
            return Err(SolveError::new(output, PreconditionerError(err)));
        }
        p.copy_from(&*z);
        let mut zTr = z.dot(&*r);

        loop {
            if self
                .stopping_criterion
                .has_converged(b_norm, output.num_iterations, &*r)
            {
                break;
            } else if let Some(max_iter) = self.max_iter {
                if output.num_iterations >= max_iter {
                    return Err(SolveError::new(output, MaxIterationsReached { max_iter }));
                }
            }

            // Ap = A * p
            if let Err(err) = self.operator.apply(&mut *Ap, &*p) {
                return Err(SolveError::new(output, OperatorError(err)));
            }
            let pAp = p.dot(&*Ap);

            if pAp <= 0.0 {
                return Err(SolveError::new(output, IndefiniteOperator));
            }
            if zTr <= 0.0 {
                return Err(SolveError::new(output, IndefinitePreconditioner));
            }

            let alpha = zTr / pAp;
            x.axpy(alpha, &*p, 1.0);
            r.axpy(-alpha, &*Ap, 1.0);
            output.num_iterations += 1;

            // z <- P r
            if let Err(err) = self.preconditioner.apply(&mut *z, &*r) {
                return Err(SolveError::new(output, PreconditionerError(err)));
            }
            let zTr_next = z.dot(&*r);
            let beta = zTr_next / zTr;

            // p <- z + beta * p
            p.axpy(1.0, &*z, beta);
            zTr = zTr_next;
        }

        Ok(output)
    }
}
