use super::{BoundaryId, CellId, FaceAccessor, FaceId, Triangulation};
use crate::error::MeshError;
use crate::mapping::{Mapping, MAPPING_Q1};
use crate::reference::{faces_per_cell, unit_center};
use nalgebra::{Point, SVector};
use rustc_hash::FxHashMap;

struct CodimensionOne<const DIM: usize, const BDIM: usize>;

impl<const DIM: usize, const BDIM: usize> CodimensionOne<DIM, BDIM> {
    const OK: () = assert!(BDIM + 1 == DIM, "The boundary mesh must have dimension DIM - 1");
}

/// Whether the natural normal of a codimension-one cell points away from `interior`.
///
/// The natural normal is `t0 × t1` for surfaces in 3D and the tangent rotated clockwise for
/// curves in 2D, with tangents taken from the Jacobian at the cell centre.
fn points_outward<const BDIM: usize, const S: usize>(vertices: &[Point<f64, S>], interior: &Point<f64, S>) -> bool {
    let jacobian = MAPPING_Q1.jacobian(vertices, &unit_center::<BDIM>());
    let mut normal = SVector::<f64, S>::zeros();
    match (BDIM, S) {
        (1, 2) => {
            normal[0] = jacobian[(1, 0)];
            normal[1] = -jacobian[(0, 0)];
        }
        (2, 3) => {
            let t0 = jacobian.column(0);
            let t1 = jacobian.column(1);
            normal[0] = t0[1] * t1[2] - t0[2] * t1[1];
            normal[1] = t0[2] * t1[0] - t0[0] * t1[2];
            normal[2] = t0[0] * t1[1] - t0[1] * t1[0];
        }
        _ => unreachable!("Codimension-one cells have BDIM + 1 == S"),
    }
    let center = vertices
        .iter()
        .fold(SVector::<f64, S>::zeros(), |sum, v| sum + v.coords)
        / vertices.len() as f64;
    (center - interior.coords).dot(&normal) > 0.0
}

/// Extracts the boundary faces carrying one of `boundary_ids` (all boundary faces if empty) as a
/// mesh of dimension `DIM - 1`.
///
/// The surface is refined until its active cells coincide with the active boundary faces of the
/// volume. Returns the surface together with the volume face of every active surface cell, in
/// active cell order.
pub fn extract_boundary_mesh<const DIM: usize, const BDIM: usize, const S: usize>(
    volume: &Triangulation<DIM, S>,
    boundary_ids: &[BoundaryId],
) -> Result<(Triangulation<BDIM, S>, Vec<(CellId, FaceId)>), MeshError> {
    let () = CodimensionOne::<DIM, BDIM>::OK;
    let selected = |face: &FaceAccessor<DIM, S>| boundary_ids.is_empty() || boundary_ids.contains(&face.boundary_id());

    let mut vertex_map = FxHashMap::default();
    let mut vertices = Vec::new();
    let mut cells = Vec::new();
    let mut sources = Vec::new();
    for cell in volume.cells_on_level(0) {
        for f in 0..faces_per_cell(DIM) {
            let face = cell.face(f);
            if !face.at_boundary() || !selected(&face) {
                continue;
            }
            let surface_cell: Vec<usize> = face
                .vertex_indices()
                .iter()
                .map(|&v| {
                    *vertex_map.entry(v).or_insert_with(|| {
                        vertices.push(*volume.vertex(v));
                        vertices.len() - 1
                    })
                })
                .collect();
            cells.push(surface_cell);
            let outward = points_outward::<BDIM, S>(&face.vertices(), &cell.center());
            sources.push((face.id(), outward));
        }
    }

    let mut surface = Triangulation::<BDIM, S>::from_coarse_cells(vertices, cells)?;
    let mut face_of_cell = FxHashMap::default();
    for (index, (face, outward)) in sources.into_iter().enumerate() {
        let id = CellId::new(0, index);
        surface.set_direction_flag(id, outward);
        face_of_cell.insert(id, face);
    }

    loop {
        let to_refine: Vec<CellId> = surface
            .active_cell_ids()
            .iter()
            .copied()
            .filter(|id| {
                face_of_cell
                    .get(id)
                    .map_or(false, |&face| volume.face(face).has_children())
            })
            .collect();
        if to_refine.is_empty() {
            break;
        }
        for &id in &to_refine {
            surface.set_refine_flag(id)?;
        }
        surface.execute_coarsening_and_refinement();
        for id in to_refine {
            let face = volume.face(face_of_cell[&id]);
            let children: Vec<CellId> = surface.cell(id).children().map(|child| child.id()).collect();
            for (k, child) in children.into_iter().enumerate() {
                face_of_cell.insert(child, face.child_index(k));
            }
        }
    }

    let faces = surface
        .active_cell_ids()
        .iter()
        .filter_map(|id| face_of_cell.get(id).map(|&face| (*id, face)))
        .collect();
    Ok((surface, faces))
}
