use nalgebra::{point, Point3, Vector3};
use sprig::mesh::procedural::hyper_cube;
use sprig::mesh::{extract_boundary_mesh, CellId, Triangulation};

/// Whether `t0 × t1` of a surface cell points away from `interior`.
fn normal_points_away(vertices: &[Point3<f64>], interior: &Point3<f64>) -> bool {
    let t0: Vector3<f64> = vertices[1] - vertices[0];
    let t1: Vector3<f64> = vertices[2] - vertices[0];
    let center = vertices.iter().fold(Vector3::zeros(), |sum, v| sum + v.coords) / vertices.len() as f64;
    (center - interior.coords).dot(&t0.cross(&t1)) > 0.0
}

#[test]
fn open_cube_surface() -> eyre::Result<()> {
    let volume: Triangulation<3, 3> = hyper_cube(0.0, 1.0);
    volume.cell(CellId::new(0, 0)).face(0).set_all_boundary_ids(1)?;

    let (surface, faces) = extract_boundary_mesh::<3, 2, 3>(&volume, &[0])?;
    assert_eq!(surface.n_active_cells(), 5);
    assert_eq!(surface.n_levels(), 1);
    assert!(surface.active_cells().all(|cell| !cell.has_children()));
    assert_eq!(faces.len(), 5);
    assert!(faces.iter().all(|&(_, face)| volume.face(face).boundary_id() == 0));

    let flags: Vec<bool> = surface.active_cells().map(|cell| cell.direction_flag()).collect();
    assert_eq!(flags, [true, true, false, false, true]);

    // The four edges of the removed face are the only open edges
    let mut n_open = 0;
    for cell in surface.active_cells() {
        assert_eq!(
            normal_points_away(&cell.vertices(), &point![0.5, 0.5, 0.5]),
            cell.direction_flag()
        );
        for f in 0..4 {
            assert_eq!(cell.neighbor(f).is_none(), cell.at_boundary(f));
            assert!(!cell.face(f).has_children());
            if cell.at_boundary(f) {
                n_open += 1;
                assert_eq!(cell.face(f).center()[0], 0.0);
            }
        }
    }
    assert_eq!(n_open, 4);
    Ok(())
}

#[test]
fn refined_open_cube_surface() -> eyre::Result<()> {
    let mut volume: Triangulation<3, 3> = hyper_cube(0.0, 1.0);
    volume.cell(CellId::new(0, 0)).face(0).set_all_boundary_ids(1)?;
    volume.refine_global(1);

    let (surface, faces) = extract_boundary_mesh::<3, 2, 3>(&volume, &[0])?;
    assert_eq!(surface.n_active_cells(), 20);
    assert_eq!(faces.len(), 20);
    assert_eq!(surface.n_levels(), 2);
    for (cell, &(id, face)) in surface.active_cells().zip(&faces) {
        assert_eq!(cell.id(), id);
        assert!(!volume.face(face).has_children());
        let parent = cell.parent().unwrap();
        assert_eq!(cell.direction_flag(), parent.direction_flag());
        assert_eq!(
            normal_points_away(&cell.vertices(), &point![0.5, 0.5, 0.5]),
            cell.direction_flag()
        );
    }
    Ok(())
}

#[test]
fn open_square_boundary() -> eyre::Result<()> {
    let volume: Triangulation<2, 2> = hyper_cube(0.0, 1.0);
    volume.cell(CellId::new(0, 0)).face(0).set_all_boundary_ids(1)?;

    let (curve, _) = extract_boundary_mesh::<2, 1, 2>(&volume, &[0])?;
    assert_eq!(curve.n_active_cells(), 3);
    let flags: Vec<bool> = curve.active_cells().map(|cell| cell.direction_flag()).collect();
    assert_eq!(flags, [true, true, false]);
    let n_open = curve
        .active_cells()
        .map(|cell| (0..2).filter(|&f| cell.at_boundary(f)).count())
        .sum::<usize>();
    assert_eq!(n_open, 2);
    Ok(())
}
