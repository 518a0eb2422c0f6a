//! Finite elements on the reference hypercube.
//!
//! Local shape functions are numbered with vertex functions first, vertex by vertex with the
//! components of each vertex consecutive, followed by the cell interior functions.
use crate::reference::{unit_center, unit_vertex, vertices_per_cell};
use nalgebra::{Point, SVector};
use std::fmt;

/// Evaluates the shape functions of a (possibly vector-valued) element.
///
/// Every shape function is non-zero in exactly one component.
pub trait FiniteElement<const DIM: usize>: fmt::Debug + Send + Sync {
    fn name(&self) -> String;

    fn n_components(&self) -> usize;

    /// Number of DoFs attached to each vertex of a cell.
    fn dofs_per_vertex(&self) -> usize;

    /// Number of DoFs owned by the cell alone.
    fn dofs_per_cell_interior(&self) -> usize;

    fn dofs_per_cell(&self) -> usize {
        vertices_per_cell(DIM) * self.dofs_per_vertex() + self.dofs_per_cell_interior()
    }

    /// The component in which shape function `i` is non-zero.
    fn system_to_component(&self, i: usize) -> usize;

    fn shape_value(&self, i: usize, xi: &Point<f64, DIM>) -> f64;

    fn shape_grad(&self, i: usize, xi: &Point<f64, DIM>) -> SVector<f64, DIM>;

    /// Reference point at which the DoF of shape function `i` is defined.
    fn unit_support_point(&self, i: usize) -> Point<f64, DIM>;
}

/// Continuous tensor-product linear Lagrange element, optionally with several components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeQ1<const DIM: usize> {
    n_components: usize,
}

impl<const DIM: usize> FeQ1<DIM> {
    pub fn new() -> Self {
        Self::vector(1)
    }

    /// # Panics
    ///
    /// Panics if `n_components` is zero.
    pub fn vector(n_components: usize) -> Self {
        assert!(n_components > 0, "An element needs at least one component");
        Self { n_components }
    }

    fn vertex(&self, i: usize) -> usize {
        assert!(i < self.dofs_per_cell(), "Shape function index out of bounds");
        i / self.n_components
    }
}

impl<const DIM: usize> Default for FeQ1<DIM> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DIM: usize> FiniteElement<DIM> for FeQ1<DIM> {
    fn name(&self) -> String {
        if self.n_components == 1 {
            format!("FE_Q<{}>(1)", DIM)
        } else {
            format!("FESystem[FE_Q<{}>(1)^{}]", DIM, self.n_components)
        }
    }

    fn n_components(&self) -> usize {
        self.n_components
    }

    fn dofs_per_vertex(&self) -> usize {
        self.n_components
    }

    fn dofs_per_cell_interior(&self) -> usize {
        0
    }

    fn system_to_component(&self, i: usize) -> usize {
        i % self.n_components
    }

    fn shape_value(&self, i: usize, xi: &Point<f64, DIM>) -> f64 {
        let v = self.vertex(i);
        (0..DIM)
            .map(|a| if (v >> a) & 1 == 1 { xi[a] } else { 1.0 - xi[a] })
            .product()
    }

    fn shape_grad(&self, i: usize, xi: &Point<f64, DIM>) -> SVector<f64, DIM> {
        let v = self.vertex(i);
        SVector::from_fn(|axis, _| {
            (0..DIM)
                .map(|a| {
                    let upper = (v >> a) & 1 == 1;
                    match (a == axis, upper) {
                        (true, true) => 1.0,
                        (true, false) => -1.0,
                        (false, true) => xi[a],
                        (false, false) => 1.0 - xi[a],
                    }
                })
                .product()
        })
    }

    fn unit_support_point(&self, i: usize) -> Point<f64, DIM> {
        unit_vertex(self.vertex(i))
    }
}

/// Discontinuous piecewise constant element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeDgq0<const DIM: usize> {
    n_components: usize,
}

impl<const DIM: usize> FeDgq0<DIM> {
    pub fn new() -> Self {
        Self::vector(1)
    }

    pub fn vector(n_components: usize) -> Self {
        assert!(n_components > 0, "An element needs at least one component");
        Self { n_components }
    }
}

impl<const DIM: usize> Default for FeDgq0<DIM> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DIM: usize> FiniteElement<DIM> for FeDgq0<DIM> {
    fn name(&self) -> String {
        if self.n_components == 1 {
            format!("FE_DGQ<{}>(0)", DIM)
        } else {
            format!("FESystem[FE_DGQ<{}>(0)^{}]", DIM, self.n_components)
        }
    }

    fn n_components(&self) -> usize {
        self.n_components
    }

    fn dofs_per_vertex(&self) -> usize {
        0
    }

    fn dofs_per_cell_interior(&self) -> usize {
        self.n_components
    }

    fn system_to_component(&self, i: usize) -> usize {
        assert!(i < self.n_components, "Shape function index out of bounds");
        i
    }

    fn shape_value(&self, i: usize, _xi: &Point<f64, DIM>) -> f64 {
        assert!(i < self.n_components, "Shape function index out of bounds");
        1.0
    }

    fn shape_grad(&self, i: usize, _xi: &Point<f64, DIM>) -> SVector<f64, DIM> {
        assert!(i < self.n_components, "Shape function index out of bounds");
        SVector::zeros()
    }

    fn unit_support_point(&self, _i: usize) -> Point<f64, DIM> {
        unit_center()
    }
}

/// Selects a subset of the components of a vector-valued element.
///
/// The default mask selects every component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentMask {
    mask: Option<Vec<bool>>,
}

impl ComponentMask {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_bools(mask: impl Into<Vec<bool>>) -> Self {
        Self {
            mask: Some(mask.into()),
        }
    }

    /// Selects component `component` out of `n_components`.
    pub fn single(component: usize, n_components: usize) -> Self {
        Self::from_bools((0..n_components).map(|c| c == component).collect::<Vec<_>>())
    }

    /// Components not covered by an explicit mask are not selected.
    pub fn selects(&self, component: usize) -> bool {
        match &self.mask {
            None => true,
            Some(mask) => mask.get(component).copied().unwrap_or(false),
        }
    }

    pub fn n_selected(&self, n_components: usize) -> usize {
        (0..n_components).filter(|&c| self.selects(c)).count()
    }

    /// Selected components in increasing order.
    pub fn selected_components(&self, n_components: usize) -> Vec<usize> {
        (0..n_components).filter(|&c| self.selects(c)).collect()
    }
}
