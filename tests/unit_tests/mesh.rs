use nalgebra::{point, Point2};
use sprig::error::MeshError;
use sprig::mesh::procedural::{hyper_cube, hyper_rectangle, subdivided_hyper_cube, subdivided_hyper_rectangle};
use sprig::mesh::{CellId, FaceTags, Triangulation, FLAT_MANIFOLD_ID, INTERNAL_FACE_BOUNDARY_ID};

fn unit_square_vertices() -> Vec<Point2<f64>> {
    vec![point![0.0, 0.0], point![1.0, 0.0], point![0.0, 1.0], point![1.0, 1.0]]
}

#[test]
fn coarse_cells_are_validated() {
    let result = Triangulation::<2, 2>::from_coarse_cells(unit_square_vertices(), vec![vec![0, 1, 2]]);
    assert_eq!(
        result.unwrap_err(),
        MeshError::InvalidVertexCount {
            cell: 0,
            expected: 4,
            actual: 3
        }
    );

    let result = Triangulation::<2, 2>::from_coarse_cells(unit_square_vertices(), vec![vec![0, 1, 2, 4]]);
    assert_eq!(
        result.unwrap_err(),
        MeshError::VertexIndexOutOfBounds {
            cell: 0,
            vertex: 4,
            n_vertices: 4
        }
    );

    let result = Triangulation::<2, 2>::from_coarse_cells(unit_square_vertices(), vec![vec![0, 1, 1, 3]]);
    assert_eq!(result.unwrap_err(), MeshError::DuplicateVertex { cell: 0, vertex: 1 });
}

#[test]
fn faces_shared_by_three_cells_are_rejected() {
    let vertices = vec![
        point![0.0, 0.0],
        point![1.0, 0.0],
        point![0.0, 1.0],
        point![1.0, 1.0],
        point![0.0, -1.0],
        point![1.0, -1.0],
        point![0.0, -2.0],
        point![1.0, -2.0],
    ];
    let cells = vec![vec![0, 1, 2, 3], vec![4, 5, 0, 1], vec![6, 7, 0, 1]];
    let result = Triangulation::<2, 2>::from_coarse_cells(vertices, cells);
    assert_eq!(result.unwrap_err(), MeshError::NonManifoldFace { vertices: vec![0, 1] });
}

#[test]
fn single_cell_has_boundary_faces_only() {
    let tria: Triangulation<2, 2> = hyper_cube(-1.0, 1.0);
    assert_eq!(tria.n_levels(), 1);
    assert_eq!(tria.n_active_cells(), 1);
    assert_eq!(tria.n_vertices(), 4);
    assert_eq!(tria.n_used_vertices(), 4);
    assert_eq!(tria.n_faces(), 4);

    let cell = tria.cell(CellId::new(0, 0));
    assert!(cell.is_active());
    assert_eq!(cell.active_cell_index(), Some(0));
    assert!(cell.direction_flag());
    assert_eq!(cell.center(), point![0.0, 0.0]);
    assert!((cell.diameter() - 8.0f64.sqrt()).abs() < 1e-14);
    for f in 0..4 {
        assert!(cell.at_boundary(f));
        assert!(cell.neighbor(f).is_none());
        let face = cell.face(f);
        assert!(face.at_boundary());
        assert_eq!(face.tags(), FaceTags::BOUNDARY);
        assert_eq!(face.boundary_id(), 0);
        assert_eq!(face.manifold_id(), FLAT_MANIFOLD_ID);
    }
    assert_eq!(cell.face(0).vertices(), [point![-1.0, -1.0], point![-1.0, 1.0]]);
}

#[test]
fn subdivided_cube_numbering_and_faces() {
    let tria: Triangulation<2, 2> = subdivided_hyper_cube(3, 0.0, 3.0);
    assert_eq!(tria.n_active_cells(), 9);
    assert_eq!(tria.n_vertices(), 16);
    assert_eq!(tria.n_faces(), 24);

    // First axis runs fastest
    assert_eq!(tria.cell(CellId::new(0, 1)).vertex_indices(), [1, 2, 5, 6]);
    assert_eq!(tria.cell(CellId::new(0, 3)).center(), point![0.5, 1.5]);

    let interior = tria.faces().filter(|face| !face.at_boundary()).count();
    assert_eq!(interior, 12);
    for face in tria.faces() {
        let expected = if face.at_boundary() { 0 } else { INTERNAL_FACE_BOUNDARY_ID };
        assert_eq!(face.boundary_id(), expected);
        assert_eq!(face.cells().count(), if face.at_boundary() { 1 } else { 2 });
    }
}

#[test]
fn neighbors_are_symmetric_on_uniform_mesh() {
    let tria: Triangulation<3, 3> = subdivided_hyper_cube(2, 0.0, 1.0);
    for cell in tria.active_cells() {
        for f in 0..6 {
            if let Some(neighbor) = cell.neighbor(f) {
                let back = neighbor.neighbor(f ^ 1).map(|c| c.id());
                assert_eq!(back, Some(cell.id()));
                assert_eq!(cell.face_index(f), neighbor.face_index(f ^ 1));
            }
        }
    }
}

#[test]
fn codimension_one_meshes_live_in_the_first_axes() {
    let segment: Triangulation<1, 2> = hyper_cube(-0.5, 0.25);
    assert_eq!(segment.vertices(), [point![-0.5, 0.0], point![0.25, 0.0]]);

    let square: Triangulation<2, 3> = hyper_rectangle(&point![0.0, 1.0], &point![2.0, 3.0]);
    assert_eq!(square.vertex(3), &point![2.0, 3.0, 0.0]);

    let empty: Triangulation<2, 2> = subdivided_hyper_rectangle([2, 0], &point![0.0, 0.0], &point![1.0, 1.0]);
    assert_eq!(empty.n_active_cells(), 0);
    assert_eq!(empty.n_levels(), 0);
}

#[test]
fn flags_require_active_cells() {
    let mut tria: Triangulation<2, 2> = hyper_cube(0.0, 1.0);
    tria.refine_global(1);
    let root = CellId::new(0, 0);
    assert_eq!(tria.set_refine_flag(root), Err(MeshError::CellNotActive { cell: root }));
    assert_eq!(tria.set_coarsen_flag(root), Err(MeshError::CellNotActive { cell: root }));

    let missing = CellId::new(4, 0);
    assert_eq!(tria.set_refine_flag(missing), Err(MeshError::UnknownCell { cell: missing }));
    assert!(tria.try_cell(missing).is_none());

    let child = CellId::new(1, 2);
    tria.set_refine_flag(child).unwrap();
    assert!(tria.cell(child).refine_flag_set());
    tria.clear_refine_flag(child).unwrap();
    assert!(!tria.cell(child).refine_flag_set());
}

#[test]
#[should_panic(expected = "does not exist")]
fn accessing_removed_cell_panics() {
    let mut tria: Triangulation<1, 1> = hyper_cube(0.0, 1.0);
    tria.refine_global(1);
    tria.mark_for_coarsening(|_| true);
    tria.execute_coarsening_and_refinement();
    tria.cell(CellId::new(1, 0));
}

#[test]
fn cell_id_display() {
    assert_eq!(CellId::new(2, 17).to_string(), "2.17");
}
