//! Hierarchical hypercube triangulations.
//!
//! Cells are stored in an arena of levels. Level 0 holds the coarse cells, and refining a cell on
//! level `l` allocates its `2^DIM` children as a contiguous block on level `l + 1`. Faces are
//! derived from the cells and rebuilt after every refinement pass, while their boundary and
//! manifold tags are carried over.
use crate::error::MeshError;
use crate::reference::{faces_per_cell, face_vertices, vertices_per_cell};
use nalgebra::Point;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

mod accessor;
mod boundary;
mod connectivity;
mod metadata;
pub mod procedural;
mod refinement;

pub use accessor::{CellAccessor, FaceAccessor};
pub use boundary::extract_boundary_mesh;
pub use metadata::{FaceMetadata, FaceTags};
pub use refinement::RefinementSummary;

pub type BoundaryId = u32;
pub type ManifoldId = u32;

/// Boundary id of faces in the interior of the domain.
pub const INTERNAL_FACE_BOUNDARY_ID: BoundaryId = u32::MAX;
/// Manifold id of faces without an attached manifold description.
pub const FLAT_MANIFOLD_ID: ManifoldId = u32::MAX;

/// Identifies a cell by its refinement level and its slot on that level.
///
/// Ids stay valid across refinement passes until the cell itself is removed by coarsening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId {
    level: usize,
    index: usize,
}

impl CellId {
    pub const fn new(level: usize, index: usize) -> Self {
        Self { level, index }
    }

    pub const fn level(&self) -> usize {
        self.level
    }

    pub const fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.level, self.index)
    }
}

/// Index of a face. Face ids are only valid until the next refinement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub usize);

#[derive(Debug, Clone)]
pub(crate) struct CellData {
    pub(crate) vertices: Vec<usize>,
    pub(crate) parent: Option<CellId>,
    /// Slot of the first child on the next level. Children occupy `2^DIM` consecutive slots.
    pub(crate) first_child: Option<usize>,
    pub(crate) direction_flag: bool,
    pub(crate) refine_flag: bool,
    pub(crate) coarsen_flag: bool,
    pub(crate) faces: Vec<FaceId>,
    pub(crate) active_index: Option<usize>,
}

impl CellData {
    fn new(vertices: Vec<usize>, parent: Option<CellId>, direction_flag: bool) -> Self {
        Self {
            vertices,
            parent,
            first_child: None,
            direction_flag,
            refine_flag: false,
            coarsen_flag: false,
            faces: Vec::new(),
            active_index: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Level {
    pub(crate) cells: Vec<Option<CellData>>,
    /// Start slots of child blocks released by coarsening.
    pub(crate) free_blocks: BTreeSet<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct FaceData {
    pub(crate) vertices: Vec<usize>,
    pub(crate) parent: Option<FaceId>,
    pub(crate) children: Vec<FaceId>,
    /// Cells having this face, together with the local face index.
    pub(crate) cells: Vec<(CellId, usize)>,
}

/// A hierarchical mesh of `DIM`-dimensional hypercubes embedded in `SPACEDIM` dimensions.
///
/// Supported are `1 <= DIM <= 3` with `SPACEDIM` equal to `DIM` or `DIM + 1`, at most 3.
#[derive(Debug)]
pub struct Triangulation<const DIM: usize, const SPACEDIM: usize> {
    vertices: Vec<Point<f64, SPACEDIM>>,
    vertex_used: Vec<bool>,
    levels: Vec<Level>,
    faces: Vec<FaceData>,
    face_lookup: FxHashMap<Vec<usize>, FaceId>,
    face_tags: RwLock<Vec<FaceTags>>,
    /// Vertices created by refinement, keyed by the sorted vertices of the entity they bisect.
    midpoints: FxHashMap<Vec<usize>, usize>,
    active_cells: Vec<CellId>,
}

impl<const DIM: usize, const SPACEDIM: usize> Clone for Triangulation<DIM, SPACEDIM> {
    fn clone(&self) -> Self {
        Self {
            vertices: self.vertices.clone(),
            vertex_used: self.vertex_used.clone(),
            levels: self.levels.clone(),
            faces: self.faces.clone(),
            face_lookup: self.face_lookup.clone(),
            face_tags: RwLock::new(self.face_tags.read().clone()),
            midpoints: self.midpoints.clone(),
            active_cells: self.active_cells.clone(),
        }
    }
}

impl<const DIM: usize, const SPACEDIM: usize> Default for Triangulation<DIM, SPACEDIM> {
    fn default() -> Self {
        Self::empty()
    }
}

pub(crate) fn sorted(mut indices: Vec<usize>) -> Vec<usize> {
    indices.sort_unstable();
    indices
}

impl<const DIM: usize, const SPACEDIM: usize> Triangulation<DIM, SPACEDIM> {
    const SUPPORTED: () = assert!(
        DIM >= 1 && DIM <= 3 && SPACEDIM <= 3 && (SPACEDIM == DIM || SPACEDIM == DIM + 1),
        "Unsupported combination of DIM and SPACEDIM"
    );

    pub fn empty() -> Self {
        let () = Self::SUPPORTED;
        Self {
            vertices: Vec::new(),
            vertex_used: Vec::new(),
            levels: Vec::new(),
            faces: Vec::new(),
            face_lookup: FxHashMap::default(),
            face_tags: RwLock::new(Vec::new()),
            midpoints: FxHashMap::default(),
            active_cells: Vec::new(),
        }
    }

    /// Creates a triangulation from coarse cells given as lists of `2^DIM` vertex indices in
    /// lexicographic order.
    ///
    /// Boundary faces receive boundary id 0, all manifold ids are flat.
    pub fn from_coarse_cells(vertices: Vec<Point<f64, SPACEDIM>>, cells: Vec<Vec<usize>>) -> Result<Self, MeshError> {
        let n_cell_vertices = vertices_per_cell(DIM);
        for (cell, cell_vertices) in cells.iter().enumerate() {
            if cell_vertices.len() != n_cell_vertices {
                return Err(MeshError::InvalidVertexCount {
                    cell,
                    expected: n_cell_vertices,
                    actual: cell_vertices.len(),
                });
            }
            for (i, &vertex) in cell_vertices.iter().enumerate() {
                if vertex >= vertices.len() {
                    return Err(MeshError::VertexIndexOutOfBounds {
                        cell,
                        vertex,
                        n_vertices: vertices.len(),
                    });
                }
                if cell_vertices[..i].contains(&vertex) {
                    return Err(MeshError::DuplicateVertex { cell, vertex });
                }
            }
        }

        let mut face_count = FxHashMap::<Vec<usize>, usize>::default();
        for cell_vertices in &cells {
            for f in 0..faces_per_cell(DIM) {
                let key = sorted(face_vertices(DIM, f).iter().map(|&v| cell_vertices[v]).collect());
                let count = face_count.entry(key).or_insert(0);
                *count += 1;
            }
        }
        if let Some((key, _)) = face_count.into_iter().find(|(_, count)| *count > 2) {
            return Err(MeshError::NonManifoldFace { vertices: key });
        }

        Ok(Self::from_valid_coarse_cells(vertices, cells))
    }

    pub(crate) fn from_valid_coarse_cells(vertices: Vec<Point<f64, SPACEDIM>>, cells: Vec<Vec<usize>>) -> Self {
        let mut tria = Self::empty();
        tria.vertex_used = vec![false; vertices.len()];
        tria.vertices = vertices;
        if !cells.is_empty() {
            tria.levels.push(Level {
                cells: cells
                    .into_iter()
                    .map(|cell_vertices| Some(CellData::new(cell_vertices, None, true)))
                    .collect(),
                free_blocks: BTreeSet::new(),
            });
        }
        tria.rebuild_connectivity();
        tria
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn n_active_cells(&self) -> usize {
        self.active_cells.len()
    }

    pub fn n_cells(&self) -> usize {
        self.levels
            .iter()
            .map(|level| level.cells.iter().flatten().count())
            .sum()
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of vertices belonging to at least one active cell.
    pub fn n_used_vertices(&self) -> usize {
        self.vertex_used.iter().filter(|used| **used).count()
    }

    pub fn vertices(&self) -> &[Point<f64, SPACEDIM>] {
        &self.vertices
    }

    pub fn vertex(&self, index: usize) -> &Point<f64, SPACEDIM> {
        &self.vertices[index]
    }

    pub fn vertex_used(&self, index: usize) -> bool {
        self.vertex_used[index]
    }

    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// Returns an accessor for the cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell does not exist (for example because it was removed by coarsening).
    pub fn cell(&self, id: CellId) -> CellAccessor<'_, DIM, SPACEDIM> {
        match self.try_cell(id) {
            Some(cell) => cell,
            None => panic!("Cell {} does not exist", id),
        }
    }

    pub fn try_cell(&self, id: CellId) -> Option<CellAccessor<'_, DIM, SPACEDIM>> {
        self.cell_data_opt(id).map(|data| CellAccessor::new(self, id, data))
    }

    /// Active cells, ordered level by level and by index within each level.
    pub fn active_cells(&self) -> impl '_ + ExactSizeIterator<Item = CellAccessor<'_, DIM, SPACEDIM>> {
        self.active_cells.iter().map(move |&id| self.cell(id))
    }

    pub fn active_cell_ids(&self) -> &[CellId] {
        &self.active_cells
    }

    pub fn cells_on_level(&self, level: usize) -> impl '_ + Iterator<Item = CellAccessor<'_, DIM, SPACEDIM>> {
        self.levels
            .get(level)
            .into_iter()
            .flat_map(move |l| {
                l.cells
                    .iter()
                    .enumerate()
                    .filter_map(move |(index, data)| {
                        data.as_ref()
                            .map(|data| CellAccessor::new(self, CellId::new(level, index), data))
                    })
            })
    }

    /// All cells, active or not, level by level.
    pub fn cells(&self) -> impl '_ + Iterator<Item = CellAccessor<'_, DIM, SPACEDIM>> {
        (0..self.n_levels()).flat_map(move |level| self.cells_on_level(level))
    }

    pub fn face(&self, id: FaceId) -> FaceAccessor<'_, DIM, SPACEDIM> {
        match self.faces.get(id.0) {
            Some(data) => FaceAccessor::new(self, id, data),
            None => panic!("Face {} does not exist", id.0),
        }
    }

    pub fn faces(&self) -> impl '_ + ExactSizeIterator<Item = FaceAccessor<'_, DIM, SPACEDIM>> {
        self.faces
            .iter()
            .enumerate()
            .map(move |(i, data)| FaceAccessor::new(self, FaceId(i), data))
    }

    /// Capability handle for changing boundary and manifold ids.
    pub fn metadata(&self) -> FaceMetadata<'_, DIM, SPACEDIM> {
        FaceMetadata::new(self)
    }

    /// The vertex at the centre of the entity spanned by `vertices`, if it has been created.
    pub fn midpoint_vertex(&self, vertices: &[usize]) -> Option<usize> {
        let key = sorted(vertices.to_vec());
        self.midpoints.get(&key).copied()
    }

    pub(crate) fn edge_midpoint(&self, a: usize, b: usize) -> Option<usize> {
        self.midpoints.get(&[a.min(b), a.max(b)][..]).copied()
    }

    pub fn set_refine_flag(&mut self, id: CellId) -> Result<(), MeshError> {
        self.active_cell_data_mut(id)?.refine_flag = true;
        Ok(())
    }

    pub fn clear_refine_flag(&mut self, id: CellId) -> Result<(), MeshError> {
        self.active_cell_data_mut(id)?.refine_flag = false;
        Ok(())
    }

    pub fn set_coarsen_flag(&mut self, id: CellId) -> Result<(), MeshError> {
        self.active_cell_data_mut(id)?.coarsen_flag = true;
        Ok(())
    }

    pub fn clear_coarsen_flag(&mut self, id: CellId) -> Result<(), MeshError> {
        self.active_cell_data_mut(id)?.coarsen_flag = false;
        Ok(())
    }

    /// Flags every active cell satisfying the predicate for refinement. Returns the number of
    /// cells flagged.
    pub fn mark_for_refinement(&mut self, predicate: impl Fn(&CellAccessor<DIM, SPACEDIM>) -> bool) -> usize {
        let marked: Vec<CellId> = self
            .active_cells()
            .filter(|cell| predicate(cell))
            .map(|cell| cell.id())
            .collect();
        for &id in &marked {
            self.cell_data_mut(id).refine_flag = true;
        }
        marked.len()
    }

    pub fn mark_for_coarsening(&mut self, predicate: impl Fn(&CellAccessor<DIM, SPACEDIM>) -> bool) -> usize {
        let marked: Vec<CellId> = self
            .active_cells()
            .filter(|cell| predicate(cell))
            .map(|cell| cell.id())
            .collect();
        for &id in &marked {
            self.cell_data_mut(id).coarsen_flag = true;
        }
        marked.len()
    }

    pub(crate) fn set_direction_flag(&mut self, id: CellId, flag: bool) {
        self.cell_data_mut(id).direction_flag = flag;
    }

    fn cell_data_opt(&self, id: CellId) -> Option<&CellData> {
        self.levels.get(id.level)?.cells.get(id.index)?.as_ref()
    }

    pub(crate) fn cell_data(&self, id: CellId) -> &CellData {
        match self.cell_data_opt(id) {
            Some(data) => data,
            None => panic!("Cell {} does not exist", id),
        }
    }

    pub(crate) fn cell_data_mut(&mut self, id: CellId) -> &mut CellData {
        match self
            .levels
            .get_mut(id.level)
            .and_then(|level| level.cells.get_mut(id.index))
            .and_then(Option::as_mut)
        {
            Some(data) => data,
            None => panic!("Cell {} does not exist", id),
        }
    }

    fn active_cell_data_mut(&mut self, id: CellId) -> Result<&mut CellData, MeshError> {
        let data = self
            .levels
            .get_mut(id.level)
            .and_then(|level| level.cells.get_mut(id.index))
            .and_then(Option::as_mut)
            .ok_or(MeshError::UnknownCell { cell: id })?;
        if data.first_child.is_some() {
            return Err(MeshError::CellNotActive { cell: id });
        }
        Ok(data)
    }

    pub(crate) fn children_of(&self, data: &CellData, level: usize) -> Option<impl Iterator<Item = CellId>> {
        data.first_child
            .map(|first| (first..first + vertices_per_cell(DIM)).map(move |index| CellId::new(level + 1, index)))
    }
}
