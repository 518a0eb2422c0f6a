use sprig::mesh::procedural::hyper_cube;
use sprig::mesh::Triangulation;

/// Tags every face through the cells that traverse it: all faces get id 2 first, then the
/// boundary faces are overwritten with 1.
fn tag_faces_during_traversal<const DIM: usize, const SPACEDIM: usize>(refinements: usize) -> eyre::Result<()> {
    let mut tria: Triangulation<DIM, SPACEDIM> = hyper_cube(0.0, 1.0);
    tria.refine_global(refinements);

    for cell in tria.active_cells() {
        for face in cell.faces() {
            face.set_all_boundary_ids(2)?;
            if face.at_boundary() {
                face.set_boundary_id(1)?;
            }
        }
    }

    for cell in tria.active_cells() {
        for face in cell.faces() {
            let expected = if face.at_boundary() { 1 } else { 2 };
            assert_eq!(face.boundary_id(), expected);
            assert_eq!(tria.face(face.id()).boundary_id(), expected);
        }
    }
    Ok(())
}

#[test]
fn boundary_ids_set_during_traversal() -> eyre::Result<()> {
    for refinements in [0, 1] {
        tag_faces_during_traversal::<1, 1>(refinements)?;
        tag_faces_during_traversal::<1, 2>(refinements)?;
        tag_faces_during_traversal::<2, 2>(refinements)?;
        tag_faces_during_traversal::<2, 3>(refinements)?;
        tag_faces_during_traversal::<3, 3>(refinements)?;
    }
    Ok(())
}
