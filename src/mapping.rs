//! Maps from the reference hypercube to physical cells.
use crate::element::{FeQ1, FiniteElement};
use crate::reference::{unit_center, vertices_per_cell};
use nalgebra::{Cholesky, Point, SMatrix, SVector};

/// A map from the reference cell `[0, 1]^DIM` to a cell with vertices in `SPACEDIM` dimensions.
pub trait Mapping<const DIM: usize, const SPACEDIM: usize>: Send + Sync {
    fn map(&self, vertices: &[Point<f64, SPACEDIM>], xi: &Point<f64, DIM>) -> Point<f64, SPACEDIM>;

    /// The `SPACEDIM x DIM` matrix of partial derivatives.
    fn jacobian(&self, vertices: &[Point<f64, SPACEDIM>], xi: &Point<f64, DIM>) -> SMatrix<f64, SPACEDIM, DIM>;

    /// Quadrature weight times the generalized determinant `sqrt(det(JᵀJ))`.
    fn jxw(&self, vertices: &[Point<f64, SPACEDIM>], xi: &Point<f64, DIM>, weight: f64) -> f64 {
        let j = self.jacobian(vertices, xi);
        let jtj: SMatrix<f64, DIM, DIM> = j.transpose() * j;
        // JᵀJ is only semi-definite for a degenerate cell, whose measure is zero
        Cholesky::new(jtj).map_or(0.0, |chol| weight * chol.determinant().sqrt())
    }

    /// Reference coordinates of the point of the cell closest to `p`.
    ///
    /// Returns `None` if the iteration breaks down on a degenerate cell. The result may lie
    /// outside the reference cell when `p` lies outside the physical cell.
    fn inverse_map(&self, vertices: &[Point<f64, SPACEDIM>], p: &Point<f64, SPACEDIM>) -> Option<Point<f64, DIM>>;
}

/// Multilinear map, interpolating the vertices with tensor-product linear shape functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingQ1;

/// The default mapping.
pub const MAPPING_Q1: MappingQ1 = MappingQ1;

const MAX_NEWTON_ITERATIONS: usize = 50;
const NEWTON_TOLERANCE: f64 = 1e-13;

impl<const DIM: usize, const SPACEDIM: usize> Mapping<DIM, SPACEDIM> for MappingQ1 {
    fn map(&self, vertices: &[Point<f64, SPACEDIM>], xi: &Point<f64, DIM>) -> Point<f64, SPACEDIM> {
        debug_assert_eq!(vertices.len(), vertices_per_cell(DIM));
        let fe = FeQ1::<DIM>::new();
        let x = vertices
            .iter()
            .enumerate()
            .fold(SVector::<f64, SPACEDIM>::zeros(), |x, (v, vertex)| {
                x + vertex.coords * fe.shape_value(v, xi)
            });
        Point::from(x)
    }

    fn jacobian(&self, vertices: &[Point<f64, SPACEDIM>], xi: &Point<f64, DIM>) -> SMatrix<f64, SPACEDIM, DIM> {
        let fe = FeQ1::<DIM>::new();
        vertices
            .iter()
            .enumerate()
            .fold(SMatrix::<f64, SPACEDIM, DIM>::zeros(), |j, (v, vertex)| {
                j + vertex.coords * fe.shape_grad(v, xi).transpose()
            })
    }

    fn inverse_map(&self, vertices: &[Point<f64, SPACEDIM>], p: &Point<f64, SPACEDIM>) -> Option<Point<f64, DIM>> {
        // Gauss-Newton on the normal equations JᵀJ dξ = Jᵀ(p - x(ξ)), exact after one step for
        // affine cells
        let mut xi = unit_center::<DIM>();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let residual = p - self.map(vertices, &xi);
            let j = self.jacobian(vertices, &xi);
            let jtj: SMatrix<f64, DIM, DIM> = j.transpose() * j;
            let jtr: SVector<f64, DIM> = j.transpose() * residual;
            let step = Cholesky::new(jtj)?.solve(&jtr);
            xi.coords += step;
            if step.norm() <= NEWTON_TOLERANCE {
                break;
            }
        }
        xi.iter().all(|x| x.is_finite()).then_some(xi)
    }
}
