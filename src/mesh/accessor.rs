use super::{BoundaryId, CellData, CellId, FaceData, FaceId, FaceMetadata, FaceTags, ManifoldId, Triangulation};
use crate::error::MeshError;
use crate::geometry::BoundingBox;
use crate::reference::{child_touches_face, children_per_cell, faces_per_cell};
use nalgebra::{Point, SVector};
use std::fmt;

/// Read-only view of a cell.
#[derive(Clone, Copy)]
pub struct CellAccessor<'a, const DIM: usize, const SPACEDIM: usize> {
    tria: &'a Triangulation<DIM, SPACEDIM>,
    id: CellId,
    data: &'a CellData,
}

impl<'a, const DIM: usize, const SPACEDIM: usize> CellAccessor<'a, DIM, SPACEDIM> {
    pub(crate) fn new(tria: &'a Triangulation<DIM, SPACEDIM>, id: CellId, data: &'a CellData) -> Self {
        Self { tria, id, data }
    }

    pub fn triangulation(&self) -> &'a Triangulation<DIM, SPACEDIM> {
        self.tria
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn level(&self) -> usize {
        self.id.level()
    }

    pub fn index(&self) -> usize {
        self.id.index()
    }

    pub fn is_active(&self) -> bool {
        self.data.first_child.is_none()
    }

    pub fn has_children(&self) -> bool {
        self.data.first_child.is_some()
    }

    pub fn n_children(&self) -> usize {
        if self.has_children() {
            children_per_cell(DIM)
        } else {
            0
        }
    }

    /// # Panics
    ///
    /// Panics if the cell is not refined or `i >= 2^DIM`.
    pub fn child(&self, i: usize) -> CellAccessor<'a, DIM, SPACEDIM> {
        assert!(i < children_per_cell(DIM), "Child index out of bounds");
        match self.data.first_child {
            Some(first) => self.tria.cell(CellId::new(self.level() + 1, first + i)),
            None => panic!("Cell {} has no children", self.id),
        }
    }

    pub fn children(&self) -> impl 'a + Iterator<Item = CellAccessor<'a, DIM, SPACEDIM>> {
        let this = *self;
        (0..self.n_children()).map(move |i| this.child(i))
    }

    pub fn parent(&self) -> Option<CellAccessor<'a, DIM, SPACEDIM>> {
        self.data.parent.map(|parent| self.tria.cell(parent))
    }

    /// Position among the children of the parent.
    pub fn child_index(&self) -> Option<usize> {
        let parent = self.parent()?;
        let first = parent.data.first_child?;
        Some(self.index() - first)
    }

    pub fn vertex_indices(&self) -> &'a [usize] {
        &self.data.vertices
    }

    pub fn vertex_index(&self, i: usize) -> usize {
        self.data.vertices[i]
    }

    pub fn vertex(&self, i: usize) -> &'a Point<f64, SPACEDIM> {
        self.tria.vertex(self.data.vertices[i])
    }

    pub fn vertices(&self) -> Vec<Point<f64, SPACEDIM>> {
        self.data
            .vertices
            .iter()
            .map(|&v| *self.tria.vertex(v))
            .collect()
    }

    /// Average of the vertices, which is the image of the reference centre under the
    /// multilinear map.
    pub fn center(&self) -> Point<f64, SPACEDIM> {
        let sum = self
            .data
            .vertices
            .iter()
            .fold(SVector::<f64, SPACEDIM>::zeros(), |sum, &v| sum + self.tria.vertex(v).coords);
        Point::from(sum / self.data.vertices.len() as f64)
    }

    /// Largest distance between two vertices.
    pub fn diameter(&self) -> f64 {
        let vertices = self.vertices();
        let mut diameter: f64 = 0.0;
        for (i, a) in vertices.iter().enumerate() {
            for b in &vertices[i + 1..] {
                diameter = diameter.max((a - b).norm());
            }
        }
        diameter
    }

    pub fn bounding_box(&self) -> BoundingBox<SPACEDIM> {
        let first = *self.vertex(0);
        (1..self.data.vertices.len()).fold(BoundingBox::new(first, first), |bounds, i| {
            bounds.enclose_point(self.vertex(i))
        })
    }

    pub fn face_index(&self, f: usize) -> FaceId {
        self.data.faces[f]
    }

    pub fn face(&self, f: usize) -> FaceAccessor<'a, DIM, SPACEDIM> {
        self.tria.face(self.data.faces[f])
    }

    pub fn faces(&self) -> impl 'a + Iterator<Item = FaceAccessor<'a, DIM, SPACEDIM>> {
        let this = *self;
        (0..faces_per_cell(DIM)).map(move |f| this.face(f))
    }

    /// The cell across face `f`: a cell of the same level if there is one, otherwise the coarser
    /// cell adjacent to the part of the parent's face this cell lies on. `None` at the boundary.
    pub fn neighbor(&self, f: usize) -> Option<CellAccessor<'a, DIM, SPACEDIM>> {
        let face = &self.tria.faces[self.data.faces[f].0];
        let same_level = face
            .cells
            .iter()
            .find(|(cell, _)| *cell != self.id && cell.level() == self.level());
        if let Some(&(cell, _)) = same_level {
            return Some(self.tria.cell(cell));
        }
        let child = self.child_index()?;
        if child_touches_face(child, f) {
            self.parent()?.neighbor(f)
        } else {
            None
        }
    }

    pub fn at_boundary(&self, f: usize) -> bool {
        self.neighbor(f).is_none()
    }

    /// Orientation of a codimension-one cell relative to the volume it was extracted from.
    pub fn direction_flag(&self) -> bool {
        self.data.direction_flag
    }

    pub fn refine_flag_set(&self) -> bool {
        self.data.refine_flag
    }

    pub fn coarsen_flag_set(&self) -> bool {
        self.data.coarsen_flag
    }

    /// Position in the active cell ordering, `None` for refined cells.
    pub fn active_cell_index(&self) -> Option<usize> {
        self.data.active_index
    }
}

/// Read-only view of a face, with access to its tags.
#[derive(Clone, Copy)]
pub struct FaceAccessor<'a, const DIM: usize, const SPACEDIM: usize> {
    tria: &'a Triangulation<DIM, SPACEDIM>,
    id: FaceId,
    data: &'a FaceData,
}

impl<'a, const DIM: usize, const SPACEDIM: usize> FaceAccessor<'a, DIM, SPACEDIM> {
    pub(crate) fn new(tria: &'a Triangulation<DIM, SPACEDIM>, id: FaceId, data: &'a FaceData) -> Self {
        Self { tria, id, data }
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn n_vertices(&self) -> usize {
        self.data.vertices.len()
    }

    /// Vertices in the local order of the first cell the face was found on.
    pub fn vertex_indices(&self) -> &'a [usize] {
        &self.data.vertices
    }

    pub fn vertex_index(&self, i: usize) -> usize {
        self.data.vertices[i]
    }

    pub fn vertex(&self, i: usize) -> &'a Point<f64, SPACEDIM> {
        self.tria.vertex(self.data.vertices[i])
    }

    pub fn vertices(&self) -> Vec<Point<f64, SPACEDIM>> {
        self.data
            .vertices
            .iter()
            .map(|&v| *self.tria.vertex(v))
            .collect()
    }

    pub fn center(&self) -> Point<f64, SPACEDIM> {
        let sum = self
            .data
            .vertices
            .iter()
            .fold(SVector::<f64, SPACEDIM>::zeros(), |sum, &v| sum + self.tria.vertex(v).coords);
        Point::from(sum / self.data.vertices.len() as f64)
    }

    pub fn has_children(&self) -> bool {
        !self.data.children.is_empty()
    }

    pub fn n_children(&self) -> usize {
        self.data.children.len()
    }

    pub fn child_index(&self, i: usize) -> FaceId {
        self.data.children[i]
    }

    pub fn child(&self, i: usize) -> FaceAccessor<'a, DIM, SPACEDIM> {
        self.tria.face(self.data.children[i])
    }

    pub fn children(&self) -> impl 'a + Iterator<Item = FaceAccessor<'a, DIM, SPACEDIM>> {
        let tria = self.tria;
        self.data.children.iter().map(move |&child| tria.face(child))
    }

    pub fn parent(&self) -> Option<FaceAccessor<'a, DIM, SPACEDIM>> {
        self.data.parent.map(|parent| self.tria.face(parent))
    }

    /// Cells having this face, with the local index of the face in each of them.
    pub fn cells(&self) -> impl 'a + Iterator<Item = (CellAccessor<'a, DIM, SPACEDIM>, usize)> {
        let tria = self.tria;
        self.data.cells.iter().map(move |&(cell, f)| (tria.cell(cell), f))
    }

    /// Whether the face lies on the boundary of the domain, independent of its boundary id.
    pub fn at_boundary(&self) -> bool {
        match self.data.cells.first() {
            Some(&(cell, f)) => self.tria.cell(cell).at_boundary(f),
            None => true,
        }
    }

    pub fn tags(&self) -> FaceTags {
        self.metadata().tags(self.id)
    }

    pub fn boundary_id(&self) -> BoundaryId {
        self.tags().boundary_id
    }

    pub fn manifold_id(&self) -> ManifoldId {
        self.tags().manifold_id
    }

    pub fn metadata(&self) -> FaceMetadata<'a, DIM, SPACEDIM> {
        self.tria.metadata()
    }

    pub fn set_boundary_id(&self, id: BoundaryId) -> Result<(), MeshError> {
        self.metadata().set_boundary_id(self.id, id)
    }

    /// Sets the boundary id of the face and all of its descendants.
    pub fn set_all_boundary_ids(&self, id: BoundaryId) -> Result<(), MeshError> {
        self.metadata().set_all_boundary_ids(self.id, id)
    }

    pub fn set_manifold_id(&self, id: ManifoldId) -> Result<(), MeshError> {
        self.metadata().set_manifold_id(self.id, id)
    }

    pub fn set_all_manifold_ids(&self, id: ManifoldId) -> Result<(), MeshError> {
        self.metadata().set_all_manifold_ids(self.id, id)
    }
}

impl<'a, const DIM: usize, const SPACEDIM: usize> fmt::Debug for CellAccessor<'a, DIM, SPACEDIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellAccessor")
            .field("id", &self.id)
            .field("vertices", &self.data.vertices)
            .finish()
    }
}

impl<'a, const DIM: usize, const SPACEDIM: usize> fmt::Debug for FaceAccessor<'a, DIM, SPACEDIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceAccessor")
            .field("id", &self.id)
            .field("vertices", &self.data.vertices)
            .finish()
    }
}
