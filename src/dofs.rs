//! Distribution of degrees of freedom over a triangulation.
use crate::element::FiniteElement;
use crate::mapping::Mapping;
use crate::mesh::{CellAccessor, CellId, Triangulation};
use log::debug;
use nalgebra::Point;
use std::fmt;

/// Global DoF indices of every active cell for one finite element.
///
/// The handler borrows the triangulation, so it cannot outlive a change of the mesh.
pub struct DofHandler<'a, const DIM: usize, const SPACEDIM: usize> {
    tria: &'a Triangulation<DIM, SPACEDIM>,
    fe: Box<dyn FiniteElement<DIM> + 'a>,
    n_dofs: usize,
    /// First DoF of every vertex, `None` for vertices not used by active cells.
    vertex_dofs: Vec<Option<usize>>,
    /// Local-to-global DoF indices, `dofs_per_cell` entries per active cell.
    cell_dofs: Vec<usize>,
}

impl<'a, const DIM: usize, const SPACEDIM: usize> fmt::Debug for DofHandler<'a, DIM, SPACEDIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DofHandler")
            .field("fe", &self.fe)
            .field("n_dofs", &self.n_dofs)
            .finish()
    }
}

impl<'a, const DIM: usize, const SPACEDIM: usize> DofHandler<'a, DIM, SPACEDIM> {
    /// Numbers the DoFs by visiting the active cells in order. Vertex DoFs are numbered when the
    /// vertex is first seen, followed by the interior DoFs of the cell.
    pub fn distribute_dofs(tria: &'a Triangulation<DIM, SPACEDIM>, fe: impl FiniteElement<DIM> + 'a) -> Self {
        let fe: Box<dyn FiniteElement<DIM> + 'a> = Box::new(fe);
        let dofs_per_vertex = fe.dofs_per_vertex();
        let dofs_per_interior = fe.dofs_per_cell_interior();

        let mut vertex_dofs = vec![None; tria.n_vertices()];
        let mut cell_dofs = Vec::with_capacity(tria.n_active_cells() * fe.dofs_per_cell());
        let mut n_dofs = 0;
        for cell in tria.active_cells() {
            for &v in cell.vertex_indices() {
                let first = *vertex_dofs[v].get_or_insert_with(|| {
                    let first = n_dofs;
                    n_dofs += dofs_per_vertex;
                    first
                });
                cell_dofs.extend(first..first + dofs_per_vertex);
            }
            cell_dofs.extend(n_dofs..n_dofs + dofs_per_interior);
            n_dofs += dofs_per_interior;
        }
        if dofs_per_vertex == 0 {
            vertex_dofs.iter_mut().for_each(|dof| *dof = None);
        }
        debug!("Distributed {} DoFs for {} on {} cells", n_dofs, fe.name(), tria.n_active_cells());

        Self {
            tria,
            fe,
            n_dofs,
            vertex_dofs,
            cell_dofs,
        }
    }

    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    pub fn fe(&self) -> &dyn FiniteElement<DIM> {
        self.fe.as_ref()
    }

    pub fn triangulation(&self) -> &'a Triangulation<DIM, SPACEDIM> {
        self.tria
    }

    /// Global indices of the local shape functions of an active cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is not active.
    pub fn cell_dof_indices(&self, cell: CellId) -> &[usize] {
        match self.tria.cell(cell).active_cell_index() {
            Some(index) => self.active_cell_dofs(index),
            None => panic!("Cell {} is not active", cell),
        }
    }

    /// Global indices for the active cell with the given active index.
    pub fn active_cell_dofs(&self, active_index: usize) -> &[usize] {
        let n = self.fe.dofs_per_cell();
        &self.cell_dofs[active_index * n..(active_index + 1) * n]
    }

    /// Active cells together with their DoF indices.
    pub fn active_cells(&self) -> impl '_ + Iterator<Item = (CellAccessor<'a, DIM, SPACEDIM>, &[usize])> {
        self.tria
            .active_cells()
            .enumerate()
            .map(move |(index, cell)| (cell, self.active_cell_dofs(index)))
    }

    /// The DoF of `component` at vertex `vertex`, if the element has vertex DoFs and the vertex is
    /// used by an active cell.
    pub fn vertex_dof_index(&self, vertex: usize, component: usize) -> Option<usize> {
        assert!(component < self.fe.n_components(), "Component out of bounds");
        self.vertex_dofs
            .get(vertex)
            .copied()
            .flatten()
            .map(|first| first + component)
    }

    /// Physical location of every DoF.
    pub fn support_points(&self, mapping: &dyn Mapping<DIM, SPACEDIM>) -> Vec<Point<f64, SPACEDIM>> {
        let mut points = vec![Point::origin(); self.n_dofs];
        for (cell, dofs) in self.active_cells() {
            let vertices = cell.vertices();
            for (i, &dof) in dofs.iter().enumerate() {
                points[dof] = mapping.map(&vertices, &self.fe.unit_support_point(i));
            }
        }
        points
    }
}
