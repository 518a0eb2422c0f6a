//! Adaptive refinement and coarsening.
//!
//! A pass runs in a fixed order: level balance, coarsening eligibility, coarsening, refinement,
//! connectivity rebuild. New vertices of refined cells are shared through the midpoint map, so a
//! vertex bisecting an edge or face is created once no matter how many cells refine around it.
use super::{sorted, CellData, CellId, Level, Triangulation};
use crate::reference::{child_vertex_entity, children_per_cell, edges, vertices_per_cell};
use log::{debug, warn};
use nalgebra::{Point, SVector};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Statistics of one refinement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementSummary {
    /// Cells flagged for refinement by the caller.
    pub flagged: usize,
    /// Cells additionally flagged to keep the level difference across edges at most one.
    pub propagated: usize,
    /// Parents whose children were removed.
    pub coarsened: usize,
    /// Cells that were refined.
    pub refined: usize,
    /// Coarsening flags that were ignored.
    pub dropped_coarsen_flags: usize,
    pub n_active_cells: usize,
}

fn edge(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

impl<const DIM: usize, const SPACEDIM: usize> Triangulation<DIM, SPACEDIM> {
    /// Refines every active cell `times` times.
    pub fn refine_global(&mut self, times: usize) {
        for _ in 0..times {
            for id in self.active_cells.clone() {
                self.cell_data_mut(id).refine_flag = true;
            }
            self.execute_coarsening_and_refinement();
        }
    }

    /// Executes the refinement and coarsening flags of the active cells.
    ///
    /// Refinement flags are added where needed so that no active cell has an edge whose halves
    /// are split again. Coarsening flags are only honored if all siblings carry one and removing
    /// the children keeps this balance. All flags are cleared afterwards.
    pub fn execute_coarsening_and_refinement(&mut self) -> RefinementSummary {
        let flagged = self
            .active_cells
            .iter()
            .filter(|&&id| self.cell_data(id).refine_flag)
            .count();
        let propagated = if DIM > 1 { self.balance_refine_flags() } else { 0 };

        let (to_coarsen, dropped_coarsen_flags) = self.coarsening_candidates();
        if dropped_coarsen_flags > 0 {
            warn!(
                "Ignoring {} coarsening flags: siblings not flagged or level balance violated",
                dropped_coarsen_flags
            );
        }

        let to_refine: Vec<CellId> = self
            .active_cells
            .iter()
            .copied()
            .filter(|&id| self.cell_data(id).refine_flag)
            .collect();

        for &parent in &to_coarsen {
            self.coarsen_cell(parent);
        }
        for &id in &to_refine {
            self.refine_cell(id);
        }

        while self
            .levels
            .last()
            .map_or(false, |level| level.cells.iter().all(Option::is_none))
        {
            self.levels.pop();
        }
        for level in &mut self.levels {
            for data in level.cells.iter_mut().flatten() {
                data.refine_flag = false;
                data.coarsen_flag = false;
            }
        }

        self.rebuild_connectivity();

        let summary = RefinementSummary {
            flagged,
            propagated,
            coarsened: to_coarsen.len(),
            refined: to_refine.len(),
            dropped_coarsen_flags,
            n_active_cells: self.n_active_cells(),
        };
        debug!(
            "Refinement pass: {} flagged, {} propagated, {} coarsened, {} refined, {} active cells",
            summary.flagged, summary.propagated, summary.coarsened, summary.refined, summary.n_active_cells
        );
        summary
    }

    /// Edges of refine-flagged active cells, which will be split by this pass.
    fn edges_to_split(&self) -> FxHashSet<(usize, usize)> {
        let reference_edges = edges(DIM);
        let mut split = FxHashSet::default();
        for &id in &self.active_cells {
            let data = self.cell_data(id);
            if data.refine_flag {
                for &(a, b) in &reference_edges {
                    split.insert(edge(data.vertices[a], data.vertices[b]));
                }
            }
        }
        split
    }

    /// An edge is split after this pass if an active cell uses its midpoint or a flagged cell
    /// has it as an edge.
    fn is_split(&self, split: &FxHashSet<(usize, usize)>, (a, b): (usize, usize)) -> bool {
        split.contains(&(a, b))
            || self
                .edge_midpoint(a, b)
                .map_or(false, |m| self.vertex_used[m])
    }

    /// Whether one of the halves of the edge `(a, b)` is split.
    fn half_edge_split(&self, split: &FxHashSet<(usize, usize)>, a: usize, b: usize) -> bool {
        match self.edge_midpoint(a, b) {
            Some(m) => self.is_split(split, edge(a, m)) || self.is_split(split, edge(m, b)),
            None => false,
        }
    }

    fn balance_refine_flags(&mut self) -> usize {
        let reference_edges = edges(DIM);
        let mut propagated = 0;
        loop {
            let split = self.edges_to_split();
            let newly_flagged: Vec<CellId> = self
                .active_cells
                .iter()
                .copied()
                .filter(|&id| {
                    let data = self.cell_data(id);
                    !data.refine_flag
                        && reference_edges
                            .iter()
                            .any(|&(a, b)| self.half_edge_split(&split, data.vertices[a], data.vertices[b]))
                })
                .collect();
            if newly_flagged.is_empty() {
                return propagated;
            }
            propagated += newly_flagged.len();
            for id in newly_flagged {
                self.cell_data_mut(id).refine_flag = true;
            }
        }
    }

    /// Parents that will be coarsened, and the number of coarsening flags that are dropped.
    fn coarsening_candidates(&self) -> (Vec<CellId>, usize) {
        let mut parents = Vec::new();
        let mut flagged_children = 0;
        for &id in &self.active_cells {
            let data = self.cell_data(id);
            if data.coarsen_flag {
                flagged_children += 1;
                if let Some(parent) = data.parent {
                    parents.push(parent);
                }
            }
        }
        parents.sort_unstable();
        parents.dedup();

        let split = self.edges_to_split();
        let reference_edges = edges(DIM);
        let eligible: Vec<CellId> = parents
            .into_iter()
            .filter(|&parent| {
                let data = self.cell_data(parent);
                let children_flagged = self
                    .children_of(data, parent.level())
                    .into_iter()
                    .flatten()
                    .all(|child| {
                        let child = self.cell_data(child);
                        child.first_child.is_none() && child.coarsen_flag && !child.refine_flag
                    });
                // The parent's edges become unsplit, so their halves must stay unsplit as well.
                let balanced = DIM == 1
                    || reference_edges
                        .iter()
                        .all(|&(a, b)| !self.half_edge_split(&split, data.vertices[a], data.vertices[b]));
                children_flagged && balanced
            })
            .collect();

        let dropped = flagged_children - eligible.len() * children_per_cell(DIM);
        (eligible, dropped)
    }

    fn coarsen_cell(&mut self, parent: CellId) {
        let Some(first) = self.cell_data_mut(parent).first_child.take() else { return };
        let level = &mut self.levels[parent.level() + 1];
        for slot in &mut level.cells[first..first + children_per_cell(DIM)] {
            *slot = None;
        }
        level.free_blocks.insert(first);
    }

    fn refine_cell(&mut self, id: CellId) {
        let (parent_vertices, direction_flag) = {
            let data = self.cell_data(id);
            (data.vertices.clone(), data.direction_flag)
        };

        let n_children = children_per_cell(DIM);
        let mut children = Vec::with_capacity(n_children);
        for c in 0..n_children {
            let mut vertices = Vec::with_capacity(vertices_per_cell(DIM));
            for v in 0..vertices_per_cell(DIM) {
                let entity = child_vertex_entity(DIM, c, v);
                let vertex = if entity.free_axes == 0 {
                    parent_vertices[entity.fixed_bits]
                } else {
                    let spanned = entity
                        .vertices(DIM)
                        .into_iter()
                        .map(|local| parent_vertices[local])
                        .collect();
                    self.midpoint_or_insert(spanned)
                };
                vertices.push(vertex);
            }
            children.push(CellData::new(vertices, Some(id), direction_flag));
        }

        let first = self.allocate_children(id.level() + 1);
        let level = &mut self.levels[id.level() + 1];
        for (slot, child) in level.cells[first..first + n_children].iter_mut().zip(children) {
            *slot = Some(child);
        }
        self.cell_data_mut(id).first_child = Some(first);
    }

    fn midpoint_or_insert(&mut self, spanned: Vec<usize>) -> usize {
        let key = sorted(spanned);
        if let Some(&vertex) = self.midpoints.get(&key) {
            return vertex;
        }
        let sum = key
            .iter()
            .fold(SVector::<f64, SPACEDIM>::zeros(), |sum, &v| sum + self.vertices[v].coords);
        let vertex = self.vertices.len();
        self.vertices.push(Point::from(sum / key.len() as f64));
        self.vertex_used.push(false);
        self.midpoints.insert(key, vertex);
        vertex
    }

    /// Start slot of a free block of children on `level`, reusing released blocks first.
    fn allocate_children(&mut self, level: usize) -> usize {
        while self.levels.len() <= level {
            self.levels.push(Level::default());
        }
        let level = &mut self.levels[level];
        if let Some(first) = level.free_blocks.iter().next().copied() {
            level.free_blocks.remove(&first);
            first
        } else {
            let first = level.cells.len();
            level
                .cells
                .extend((0..children_per_cell(DIM)).map(|_| None));
            first
        }
    }
}
