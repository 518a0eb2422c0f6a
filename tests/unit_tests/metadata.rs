use sprig::error::MeshError;
use sprig::mesh::procedural::{hyper_cube, subdivided_hyper_cube};
use sprig::mesh::{CellId, FaceId, Triangulation, FLAT_MANIFOLD_ID, INTERNAL_FACE_BOUNDARY_ID};

#[test]
fn ids_set_during_traversal_are_visible_afterwards() {
    let tria: Triangulation<2, 2> = subdivided_hyper_cube(2, 0.0, 1.0);
    for cell in tria.active_cells() {
        for face in cell.faces() {
            if face.at_boundary() && face.center()[0] == 0.0 {
                face.set_boundary_id(7).unwrap();
            }
        }
    }
    for face in tria.faces() {
        let expected = match (face.at_boundary(), face.center()[0] == 0.0) {
            (true, true) => 7,
            (true, false) => 0,
            (false, _) => INTERNAL_FACE_BOUNDARY_ID,
        };
        assert_eq!(face.boundary_id(), expected);
    }
}

#[test]
fn internal_id_is_reserved() {
    let tria: Triangulation<3, 3> = hyper_cube(0.0, 1.0);
    let face = tria.cell(CellId::new(0, 0)).face(4);
    assert_eq!(face.set_boundary_id(INTERNAL_FACE_BOUNDARY_ID), Err(MeshError::ReservedBoundaryId));
    assert_eq!(face.set_all_boundary_ids(INTERNAL_FACE_BOUNDARY_ID), Err(MeshError::ReservedBoundaryId));
    assert_eq!(face.boundary_id(), 0);

    let metadata = tria.metadata();
    assert_eq!(
        metadata.set_boundary_id(FaceId(100), 1),
        Err(MeshError::UnknownFace { face: FaceId(100) })
    );
}

#[test]
fn interior_faces_accept_ids_but_stay_interior() {
    let tria: Triangulation<2, 2> = subdivided_hyper_cube(2, 0.0, 1.0);
    let face = tria.cell(CellId::new(0, 0)).face(1);
    assert!(!face.at_boundary());
    face.set_boundary_id(5).unwrap();
    assert_eq!(tria.face(face.id()).boundary_id(), 5);
    assert!(!tria.face(face.id()).at_boundary());
}

#[test]
fn tags_survive_refinement_and_are_inherited() {
    let mut tria: Triangulation<2, 2> = hyper_cube(0.0, 1.0);
    {
        let face = tria.cell(CellId::new(0, 0)).face(1);
        face.set_boundary_id(3).unwrap();
        face.set_manifold_id(11).unwrap();
    }
    tria.refine_global(2);

    let root_face = tria.cell(CellId::new(0, 0)).face(1);
    assert_eq!(root_face.boundary_id(), 3);
    assert_eq!(root_face.n_children(), 2);
    for face in tria.faces().filter(|face| face.at_boundary()) {
        let on_right = face.center()[0] == 1.0;
        assert_eq!(face.boundary_id(), if on_right { 3 } else { 0 });
        assert_eq!(face.manifold_id(), if on_right { 11 } else { FLAT_MANIFOLD_ID });
    }
}

#[test]
fn set_all_ids_reaches_every_descendant() {
    let mut tria: Triangulation<3, 3> = hyper_cube(0.0, 1.0);
    tria.refine_global(2);
    let root_face = tria.cell(CellId::new(0, 0)).face(0);
    root_face.set_all_boundary_ids(9).unwrap();
    root_face.set_all_manifold_ids(2).unwrap();

    let mut stack = vec![root_face];
    let mut n_faces = 0;
    while let Some(face) = stack.pop() {
        assert_eq!(face.boundary_id(), 9);
        assert_eq!(face.manifold_id(), 2);
        stack.extend(face.children());
        n_faces += 1;
    }
    assert_eq!(n_faces, 1 + 4 + 16);

    // Setting only the root leaves the sub-faces untouched
    root_face.set_boundary_id(4).unwrap();
    assert_eq!(root_face.boundary_id(), 4);
    assert_eq!(root_face.child(0).boundary_id(), 9);
}
