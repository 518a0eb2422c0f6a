//! Coupling operators between non-matching meshes.
//!
//! Mesh 1 is immersed in mesh 0 (`DIM0 >= DIM1`, same ambient space). Integrals over mesh 1 are
//! evaluated with a quadrature rule on its cells, and the shape functions of mesh 0 are evaluated
//! at the reference coordinates of the quadrature points in the mesh 0 cells containing them.
use crate::constraints::AffineConstraints;
use crate::dofs::DofHandler;
use crate::element::ComponentMask;
use crate::error::SparseError;
use crate::mapping::{Mapping, MAPPING_Q1};
use crate::mesh::CellId;
use crate::quadrature::Quadrature;
use crate::sparse::{zero_csr_from_pattern, DynamicSparsityPattern};
use itertools::izip;
use log::{debug, trace};
use nalgebra::{DMatrix, Point};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

mod cache;

pub use cache::{GridCache, PointLocationTolerance};

/// A quadrature point of the immersed mesh that is not inside any cell of the background mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLocationFailure {
    pub cell: CellId,
    pub quadrature_index: usize,
    pub point: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CouplingError {
    /// All quadrature points that could not be located.
    PointLocation { failures: Vec<PointLocationFailure> },
    /// The component masks select different numbers of components.
    ComponentMismatch { selected0: usize, selected1: usize },
    /// A pattern or matrix does not have `n_dofs0` rows and `n_dofs1` columns.
    DimensionMismatch { expected: (usize, usize), actual: (usize, usize) },
    Sparse(SparseError),
}

impl fmt::Display for CouplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointLocation { failures } => {
                write!(f, "{} quadrature points lie outside the background mesh", failures.len())?;
                if let Some(first) = failures.first() {
                    write!(
                        f,
                        " (first: point {} of cell {} at {:?})",
                        first.quadrature_index, first.cell, first.point
                    )?;
                }
                Ok(())
            }
            Self::ComponentMismatch { selected0, selected1 } => write!(
                f,
                "Component masks select {} and {} components",
                selected0, selected1
            ),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "Expected a {}x{} coupling pattern, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::Sparse(err) => write!(f, "Sparse assembly failed: {}", err),
        }
    }
}

impl Error for CouplingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sparse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SparseError> for CouplingError {
    fn from(err: SparseError) -> Self {
        Self::Sparse(err)
    }
}

static NO_CONSTRAINTS: AffineConstraints = AffineConstraints::new();

struct StaticDims<const DIM0: usize, const DIM1: usize>;

impl<const DIM0: usize, const DIM1: usize> StaticDims<DIM0, DIM1> {
    const IMMERSED: () = assert!(DIM0 >= DIM1, "The immersed mesh cannot have a higher dimension");
}

/// The quadrature points of one mesh 1 cell that lie in one mesh 0 cell.
struct CellPairPoints<const DIM0: usize, const DIM1: usize> {
    cell0: CellId,
    cell1: CellId,
    points: Vec<(Point<f64, DIM0>, Point<f64, DIM1>, f64)>,
}

/// Builder for coupling sparsity patterns and mass matrices.
pub struct Coupling<'a, const DIM0: usize, const DIM1: usize, const SPACEDIM: usize> {
    cache0: &'a GridCache<'a, DIM0, SPACEDIM>,
    dof_handler0: &'a DofHandler<'a, DIM0, SPACEDIM>,
    dof_handler1: &'a DofHandler<'a, DIM1, SPACEDIM>,
    quadrature1: &'a dyn Quadrature<DIM1>,
    constraints0: &'a AffineConstraints,
    constraints1: &'a AffineConstraints,
    mask0: ComponentMask,
    mask1: ComponentMask,
    mapping1: &'a dyn Mapping<DIM1, SPACEDIM>,
}

impl<'a, const DIM0: usize, const DIM1: usize, const SPACEDIM: usize> Coupling<'a, DIM0, DIM1, SPACEDIM> {
    /// `cache0` must index the triangulation of `dof_handler0`.
    pub fn new(
        cache0: &'a GridCache<'a, DIM0, SPACEDIM>,
        dof_handler0: &'a DofHandler<'a, DIM0, SPACEDIM>,
        dof_handler1: &'a DofHandler<'a, DIM1, SPACEDIM>,
        quadrature1: &'a dyn Quadrature<DIM1>,
    ) -> Self {
        let () = StaticDims::<DIM0, DIM1>::IMMERSED;
        assert!(
            std::ptr::eq(cache0.triangulation(), dof_handler0.triangulation()),
            "The cache must be built on the triangulation of the first DoF handler"
        );
        Self {
            cache0,
            dof_handler0,
            dof_handler1,
            quadrature1,
            constraints0: &NO_CONSTRAINTS,
            constraints1: &NO_CONSTRAINTS,
            mask0: ComponentMask::default(),
            mask1: ComponentMask::default(),
            mapping1: &MAPPING_Q1,
        }
    }

    pub fn with_constraints0(self, constraints0: &'a AffineConstraints) -> Self {
        Self { constraints0, ..self }
    }

    pub fn with_constraints1(self, constraints1: &'a AffineConstraints) -> Self {
        Self { constraints1, ..self }
    }

    pub fn with_component_masks(self, mask0: ComponentMask, mask1: ComponentMask) -> Self {
        Self { mask0, mask1, ..self }
    }

    /// Mapping of the immersed mesh.
    pub fn with_mapping(self, mapping1: &'a dyn Mapping<DIM1, SPACEDIM>) -> Self {
        Self { mapping1, ..self }
    }

    /// Pairs `(i, j)` of local shape functions of mesh 0 and mesh 1 that couple: the `k`-th selected
    /// component of mesh 0 couples with the `k`-th selected component of mesh 1.
    fn coupled_local_pairs(&self) -> Result<Vec<(usize, usize)>, CouplingError> {
        let fe0 = self.dof_handler0.fe();
        let fe1 = self.dof_handler1.fe();
        let selected0 = self.mask0.selected_components(fe0.n_components());
        let selected1 = self.mask1.selected_components(fe1.n_components());
        if selected0.len() != selected1.len() {
            return Err(CouplingError::ComponentMismatch {
                selected0: selected0.len(),
                selected1: selected1.len(),
            });
        }
        let position = |selected: &[usize], component: usize| selected.iter().position(|&c| c == component);

        let mut pairs = Vec::new();
        for i in 0..fe0.dofs_per_cell() {
            let Some(k) = position(&selected0, fe0.system_to_component(i)) else { continue };
            for j in 0..fe1.dofs_per_cell() {
                if position(&selected1, fe1.system_to_component(j)) == Some(k) {
                    pairs.push((i, j));
                }
            }
        }
        Ok(pairs)
    }

    /// Locates the quadrature points of every mesh 1 cell in parallel and groups them by the
    /// mesh 0 cell containing them.
    fn locate_quadrature_points(&self) -> Result<Vec<CellPairPoints<DIM0, DIM1>>, CouplingError> {
        let tria1 = self.dof_handler1.triangulation();
        let cells1 = tria1.active_cell_ids();
        let located: Vec<Result<Vec<CellPairPoints<DIM0, DIM1>>, Vec<PointLocationFailure>>> = cells1
            .par_iter()
            .map(|&cell1| {
                let vertices = tria1.cell(cell1).vertices();
                let mut by_cell0 = BTreeMap::<CellId, Vec<_>>::new();
                let mut failures = Vec::new();
                for (q, &weight, xi1) in izip!(0.., self.quadrature1.weights(), self.quadrature1.points()) {
                    let x = self.mapping1.map(&vertices, xi1);
                    match self.cache0.locate_point(&x) {
                        Some((cell0, xi0)) => {
                            let jxw = self.mapping1.jxw(&vertices, xi1, weight);
                            by_cell0.entry(cell0).or_default().push((xi0, *xi1, jxw));
                        }
                        None => {
                            trace!("Quadrature point {} of cell {} at {:?} not located", q, cell1, x);
                            failures.push(PointLocationFailure {
                                cell: cell1,
                                quadrature_index: q,
                                point: x.coords.iter().copied().collect(),
                            });
                        }
                    }
                }
                if failures.is_empty() {
                    Ok(by_cell0
                        .into_iter()
                        .map(|(cell0, points)| CellPairPoints { cell0, cell1, points })
                        .collect())
                } else {
                    Err(failures)
                }
            })
            .collect();

        let mut pairs = Vec::new();
        let mut failures = Vec::new();
        for result in located {
            match result {
                Ok(cell_pairs) => pairs.extend(cell_pairs),
                Err(cell_failures) => failures.extend(cell_failures),
            }
        }
        if failures.is_empty() {
            debug!(
                "Located {} quadrature points in {} cell pairs",
                pairs.iter().map(|pair| pair.points.len()).sum::<usize>(),
                pairs.len()
            );
            Ok(pairs)
        } else {
            Err(CouplingError::PointLocation { failures })
        }
    }

    /// Adds the entries of the coupling matrix to `pattern`, which must have `n_dofs0` rows and
    /// `n_dofs1` columns. Constrained entries are kept.
    pub fn create_sparsity_pattern(&self, pattern: &mut DynamicSparsityPattern) -> Result<(), CouplingError> {
        self.check_dimensions(pattern.n_rows(), pattern.n_cols())?;
        let local_pairs = self.coupled_local_pairs()?;
        for pair in self.locate_quadrature_points()? {
            let dofs0 = self.dof_handler0.cell_dof_indices(pair.cell0);
            let dofs1 = self.dof_handler1.cell_dof_indices(pair.cell1);
            for &(i, j) in &local_pairs {
                self.constraints0.add_entries_local_to_global_rectangular(
                    &dofs0[i..=i],
                    self.constraints1,
                    &dofs1[j..=j],
                    pattern,
                    true,
                );
            }
        }
        Ok(())
    }

    /// Assembles `C_ij = ∫ φ_i ψ_j dx` over mesh 1 on a pattern obtained from
    /// [`create_sparsity_pattern`](Self::create_sparsity_pattern), condensing both sides with their
    /// constraints.
    pub fn create_mass_matrix(&self, pattern: &SparsityPattern) -> Result<CsrMatrix<f64>, CouplingError> {
        self.check_dimensions(pattern.major_dim(), pattern.minor_dim())?;
        let local_pairs = self.coupled_local_pairs()?;
        let fe0 = self.dof_handler0.fe();
        let fe1 = self.dof_handler1.fe();
        let mut matrix = zero_csr_from_pattern(pattern);
        let mut local = DMatrix::zeros(fe0.dofs_per_cell(), fe1.dofs_per_cell());
        for pair in self.locate_quadrature_points()? {
            local.fill(0.0);
            for (xi0, xi1, jxw) in &pair.points {
                for &(i, j) in &local_pairs {
                    local[(i, j)] += fe0.shape_value(i, xi0) * fe1.shape_value(j, xi1) * jxw;
                }
            }
            self.constraints0.distribute_local_to_global_rectangular(
                self.constraints1,
                &local,
                self.dof_handler0.cell_dof_indices(pair.cell0),
                self.dof_handler1.cell_dof_indices(pair.cell1),
                &mut matrix,
            )?;
        }
        debug!("Assembled coupling matrix with {} non-zeros", matrix.nnz());
        Ok(matrix)
    }

    fn check_dimensions(&self, rows: usize, cols: usize) -> Result<(), CouplingError> {
        let expected = (self.dof_handler0.n_dofs(), self.dof_handler1.n_dofs());
        if (rows, cols) == expected {
            Ok(())
        } else {
            Err(CouplingError::DimensionMismatch {
                expected,
                actual: (rows, cols),
            })
        }
    }
}
