//! Point location in a triangulation, accelerated by an R-tree over cell bounding boxes.
use crate::geometry::BoundingBox;
use crate::mapping::{Mapping, MAPPING_Q1};
use crate::mesh::{CellAccessor, CellId, Triangulation};
use nalgebra::Point;
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points of up to three dimensions, padded with zeros.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RTreePoint([f64; 3]);

impl RTreePoint {
    fn from_point<const S: usize>(p: &Point<f64, S>) -> Self {
        let mut coords = [0.0; 3];
        coords[..S].copy_from_slice(p.coords.as_slice());
        Self(coords)
    }
}

impl rstar::Point for RTreePoint {
    type Scalar = f64;
    const DIMENSIONS: usize = 3;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self([generator(0), generator(1), generator(2)])
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        self.0[index]
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        &mut self.0[index]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RTreeAABB(AABB<RTreePoint>);

impl RTreeObject for RTreeAABB {
    type Envelope = AABB<RTreePoint>;

    fn envelope(&self) -> Self::Envelope {
        self.0
    }
}

/// Tolerances deciding whether a point belongs to a cell.
///
/// A point is inside a cell if its reference coordinates are within `reference` of the unit
/// hypercube and the image of the clamped coordinates is within `distance * diameter` of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLocationTolerance {
    pub reference: f64,
    pub distance: f64,
}

impl Default for PointLocationTolerance {
    fn default() -> Self {
        Self {
            reference: 1e-10,
            distance: 1e-10,
        }
    }
}

/// Cached spatial index over the active cells of a triangulation.
///
/// The cache borrows the triangulation, so it cannot be used after the mesh changed.
pub struct GridCache<'a, const DIM: usize, const SPACEDIM: usize> {
    tria: &'a Triangulation<DIM, SPACEDIM>,
    mapping: &'a dyn Mapping<DIM, SPACEDIM>,
    tolerance: PointLocationTolerance,
    tree: RTree<GeomWithData<RTreeAABB, usize>>,
}

impl<'a, const DIM: usize, const SPACEDIM: usize> fmt::Debug for GridCache<'a, DIM, SPACEDIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridCache")
            .field("n_cells", &self.tree.size())
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl<'a, const DIM: usize, const SPACEDIM: usize> GridCache<'a, DIM, SPACEDIM> {
    pub fn new(tria: &'a Triangulation<DIM, SPACEDIM>) -> Self {
        Self::with_options(tria, &MAPPING_Q1, PointLocationTolerance::default())
    }

    pub fn with_tolerance(tria: &'a Triangulation<DIM, SPACEDIM>, tolerance: PointLocationTolerance) -> Self {
        Self::with_options(tria, &MAPPING_Q1, tolerance)
    }

    pub fn with_options(
        tria: &'a Triangulation<DIM, SPACEDIM>,
        mapping: &'a dyn Mapping<DIM, SPACEDIM>,
        tolerance: PointLocationTolerance,
    ) -> Self {
        let boxes = tria
            .active_cells()
            .map(|cell| {
                let bounds = cell.bounding_box();
                let margin = tolerance.distance * bounds.diameter().max(f64::MIN_POSITIVE);
                let envelope = envelope(&bounds.inflate(margin));
                GeomWithData::new(RTreeAABB(envelope), cell.active_cell_index().unwrap_or_default())
            })
            .collect();
        Self {
            tria,
            mapping,
            tolerance,
            tree: RTree::bulk_load(boxes),
        }
    }

    pub fn triangulation(&self) -> &'a Triangulation<DIM, SPACEDIM> {
        self.tria
    }

    pub fn tolerance(&self) -> &PointLocationTolerance {
        &self.tolerance
    }

    /// Active indices of the cells whose (inflated) bounding box contains `p`, in increasing
    /// order.
    pub fn candidate_cells(&self, p: &Point<f64, SPACEDIM>) -> Vec<usize> {
        let query = AABB::from_point(RTreePoint::from_point(p));
        let mut candidates: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.data)
            .collect();
        candidates.sort_unstable();
        candidates
    }

    /// The active cell containing `p` and the reference coordinates of `p` in it.
    ///
    /// A point on the interface of several cells is assigned to the one with the lowest active
    /// cell index.
    pub fn locate_point(&self, p: &Point<f64, SPACEDIM>) -> Option<(CellId, Point<f64, DIM>)> {
        let active = self.tria.active_cell_ids();
        self.candidate_cells(p)
            .into_iter()
            .find_map(|index| {
                let cell = self.tria.cell(active[index]);
                self.reference_point_in(&cell, p)
                    .map(|xi| (cell.id(), xi))
            })
    }

    /// Locates every point in parallel.
    pub fn locate_points(&self, points: &[Point<f64, SPACEDIM>]) -> Vec<Option<(CellId, Point<f64, DIM>)>> {
        points.par_iter().map(|p| self.locate_point(p)).collect()
    }

    fn reference_point_in(&self, cell: &CellAccessor<DIM, SPACEDIM>, p: &Point<f64, SPACEDIM>) -> Option<Point<f64, DIM>> {
        let vertices = cell.vertices();
        let xi = self.mapping.inverse_map(&vertices, p)?;
        let tol = self.tolerance.reference;
        if xi.iter().any(|&x| x < -tol || x > 1.0 + tol) {
            return None;
        }
        let clamped = xi.map(|x| x.clamp(0.0, 1.0));
        let distance = (self.mapping.map(&vertices, &clamped) - p).norm();
        (distance <= self.tolerance.distance * cell.diameter()).then_some(clamped)
    }
}

fn envelope<const S: usize>(bounds: &BoundingBox<S>) -> AABB<RTreePoint> {
    AABB::from_corners(RTreePoint::from_point(bounds.min()), RTreePoint::from_point(bounds.max()))
}
