//! Assembly of global matrices and vectors on a single mesh.
use crate::constraints::AffineConstraints;
use crate::dof_tools::make_sparsity_pattern;
use crate::dofs::DofHandler;
use crate::error::SparseError;
use crate::mapping::Mapping;
use crate::quadrature::Quadrature;
use crate::sparse::{zero_csr_from_pattern, DynamicSparsityPattern};
use itertools::izip;
use nalgebra::{DMatrix, DVector, Point};
use nalgebra_sparse::CsrMatrix;

/// Assembles the mass matrix `M_ij = ∫ φ_i · φ_j dx` condensed with `constraints`, which must be
/// closed.
pub fn create_mass_matrix<const DIM: usize, const SPACEDIM: usize>(
    dof_handler: &DofHandler<DIM, SPACEDIM>,
    quadrature: &dyn Quadrature<DIM>,
    mapping: &dyn Mapping<DIM, SPACEDIM>,
    constraints: &AffineConstraints,
) -> Result<CsrMatrix<f64>, SparseError> {
    let n = dof_handler.n_dofs();
    let mut dsp = DynamicSparsityPattern::new(n, n);
    make_sparsity_pattern(dof_handler, &mut dsp, constraints, false);
    let mut matrix = zero_csr_from_pattern(&dsp.to_sparsity_pattern());

    let fe = dof_handler.fe();
    let n_local = fe.dofs_per_cell();
    let mut local = DMatrix::zeros(n_local, n_local);
    for (cell, dofs) in dof_handler.active_cells() {
        let vertices = cell.vertices();
        local.fill(0.0);
        for (&weight, xi) in izip!(quadrature.weights(), quadrature.points()) {
            let jxw = mapping.jxw(&vertices, xi, weight);
            for i in 0..n_local {
                let phi_i = fe.shape_value(i, xi);
                for j in 0..n_local {
                    if fe.system_to_component(i) == fe.system_to_component(j) {
                        local[(i, j)] += phi_i * fe.shape_value(j, xi) * jxw;
                    }
                }
            }
        }
        constraints.distribute_local_to_global(&local, None, dofs, &mut matrix, None)?;
    }
    Ok(matrix)
}

/// Assembles `F_i = ∫ f(x, c_i) φ_i dx`, where `c_i` is the component of `φ_i`, condensed with
/// `constraints`.
pub fn create_right_hand_side<const DIM: usize, const SPACEDIM: usize>(
    dof_handler: &DofHandler<DIM, SPACEDIM>,
    quadrature: &dyn Quadrature<DIM>,
    mapping: &dyn Mapping<DIM, SPACEDIM>,
    f: impl Fn(&Point<f64, SPACEDIM>, usize) -> f64,
    constraints: &AffineConstraints,
) -> DVector<f64> {
    let fe = dof_handler.fe();
    let n_local = fe.dofs_per_cell();
    let mut rhs = DVector::zeros(dof_handler.n_dofs());
    let mut local = DVector::zeros(n_local);
    for (cell, dofs) in dof_handler.active_cells() {
        let vertices = cell.vertices();
        local.fill(0.0);
        for (&weight, xi) in izip!(quadrature.weights(), quadrature.points()) {
            let x = mapping.map(&vertices, xi);
            let jxw = mapping.jxw(&vertices, xi, weight);
            for i in 0..n_local {
                local[i] += f(&x, fe.system_to_component(i)) * fe.shape_value(i, xi) * jxw;
            }
        }
        constraints.distribute_local_vector_to_global(&local, dofs, &mut rhs);
    }
    rhs
}
