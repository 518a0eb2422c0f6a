use matrixcompare::assert_scalar_eq;
use sprig::constraints::AffineConstraints;
use sprig::dof_tools::{
    extract_boundary_dofs, make_hanging_node_constraints, make_sparsity_pattern, make_zero_boundary_constraints,
};
use sprig::dofs::DofHandler;
use sprig::element::{ComponentMask, FeDgq0, FeQ1};
use sprig::mesh::procedural::hyper_cube;
use sprig::mesh::{CellId, Triangulation};
use sprig::sparse::DynamicSparsityPattern;

fn locally_refined<const DIM: usize>() -> Triangulation<DIM, DIM> {
    let mut tria = hyper_cube(0.0, 1.0);
    tria.refine_global(1);
    tria.set_refine_flag(CellId::new(1, 0)).unwrap();
    tria.execute_coarsening_and_refinement();
    tria
}

#[test]
fn hanging_nodes_in_2d() {
    let tria = locally_refined::<2>();
    let dh = DofHandler::distribute_dofs(&tria, FeQ1::new());
    let mut constraints = AffineConstraints::new();
    make_hanging_node_constraints(&dh, &mut constraints).unwrap();
    constraints.close().unwrap();

    assert_eq!(constraints.n_constraints(), 2);
    let support = dh.support_points(&sprig::mapping::MAPPING_Q1);
    for line in constraints.lines() {
        assert_eq!(line.entries.len(), 2);
        for &(_, weight) in &line.entries {
            assert_scalar_eq!(weight, 0.5, comp = abs, tol = 1e-15);
        }
        // The constrained point is the mean of its sources
        let mean = line
            .entries
            .iter()
            .fold(nalgebra::Vector2::zeros(), |sum, &(source, w)| sum + w * support[source].coords);
        assert!((mean - support[line.index].coords).norm() < 1e-14);
    }
}

#[test]
fn hanging_nodes_in_3d() {
    let tria = locally_refined::<3>();
    let dh = DofHandler::distribute_dofs(&tria, FeQ1::new());
    let mut constraints = AffineConstraints::new();
    make_hanging_node_constraints(&dh, &mut constraints).unwrap();
    constraints.close().unwrap();

    assert_eq!(constraints.n_constraints(), 12);
    let n_edge = constraints.lines().filter(|line| line.entries.len() == 2).count();
    let n_face = constraints.lines().filter(|line| line.entries.len() == 4).count();
    assert_eq!((n_edge, n_face), (9, 3));
    for line in constraints.lines() {
        let sum: f64 = line.entries.iter().map(|&(_, w)| w).sum();
        assert_scalar_eq!(sum, 1.0, comp = abs, tol = 1e-14);
    }
}

#[test]
fn vector_elements_constrain_each_component() {
    let tria = locally_refined::<2>();
    let dh = DofHandler::distribute_dofs(&tria, FeQ1::vector(2));
    let mut constraints = AffineConstraints::new();
    make_hanging_node_constraints(&dh, &mut constraints).unwrap();
    assert_eq!(constraints.n_constraints(), 4);

    // Piecewise constants have no hanging nodes
    let dh = DofHandler::distribute_dofs(&tria, FeDgq0::new());
    let mut constraints = AffineConstraints::new();
    make_hanging_node_constraints(&dh, &mut constraints).unwrap();
    assert_eq!(constraints.n_constraints(), 0);
}

#[test]
fn boundary_dofs_by_id_and_component() {
    let mut tria: Triangulation<2, 2> = hyper_cube(0.0, 1.0);
    tria.cell(CellId::new(0, 0)).face(1).set_boundary_id(1).unwrap();
    tria.refine_global(1);

    let dh = DofHandler::distribute_dofs(&tria, FeQ1::new());
    assert_eq!(extract_boundary_dofs(&dh, &ComponentMask::all(), &[]).len(), 8);
    let right = extract_boundary_dofs(&dh, &ComponentMask::all(), &[1]);
    assert_eq!(right.len(), 3);
    let support = dh.support_points(&sprig::mapping::MAPPING_Q1);
    assert!(right.iter().all(|&dof| support[dof][0] == 1.0));

    let dh = DofHandler::distribute_dofs(&tria, FeQ1::vector(2));
    let mask = ComponentMask::single(1, 2);
    let dofs = extract_boundary_dofs(&dh, &mask, &[1]);
    assert_eq!(dofs.len(), 3);
    assert!(dofs.iter().all(|dof| dof % 2 == 1));

    let mut constraints = AffineConstraints::new();
    constraints.add_entry(*dofs.iter().next().unwrap(), 0, 1.0).unwrap();
    make_zero_boundary_constraints(&dh, &mut constraints, &mask, &[1]);
    assert_eq!(constraints.n_constraints(), 3);
    // Existing lines are kept
    assert_eq!(constraints.constraint(*dofs.iter().next().unwrap()).unwrap().entries.len(), 1);
}

#[test]
fn sparsity_pattern_couples_dofs_sharing_a_cell() {
    let mut tria: Triangulation<2, 2> = hyper_cube(0.0, 1.0);
    tria.refine_global(1);
    let dh = DofHandler::distribute_dofs(&tria, FeQ1::new());
    let mut dsp = DynamicSparsityPattern::new(9, 9);
    make_sparsity_pattern(&dh, &mut dsp, &AffineConstraints::new(), false);
    assert_eq!(dsp.n_nonzero(), 49);
    let pattern = dsp.to_sparsity_pattern();
    assert_eq!(pattern.nnz(), 49);
}

#[test]
fn pattern_with_hanging_constraints() {
    let tria = locally_refined::<2>();
    let dh = DofHandler::distribute_dofs(&tria, FeQ1::new());
    let mut constraints = AffineConstraints::new();
    make_hanging_node_constraints(&dh, &mut constraints).unwrap();
    constraints.close().unwrap();

    let n = dh.n_dofs();
    let mut condensed = DynamicSparsityPattern::new(n, n);
    make_sparsity_pattern(&dh, &mut condensed, &constraints, false);
    let mut kept = DynamicSparsityPattern::new(n, n);
    make_sparsity_pattern(&dh, &mut kept, &constraints, true);

    for line in constraints.lines() {
        let dof = line.index;
        assert_eq!(condensed.row(dof).collect::<Vec<_>>(), [dof]);
        assert!(kept.row(dof).count() > 1);
    }
    for row in 0..n {
        for col in condensed.row(row) {
            assert!(kept.exists(row, col));
        }
    }
}
