use nalgebra::DVector;
use sprig::assembly::create_mass_matrix;
use sprig::constraints::AffineConstraints;
use sprig::coupling::{Coupling, GridCache};
use sprig::dof_tools::{make_hanging_node_constraints, make_zero_boundary_constraints};
use sprig::dofs::DofHandler;
use sprig::element::{ComponentMask, FeQ1};
use sprig::mapping::MAPPING_Q1;
use sprig::mesh::procedural::hyper_cube;
use sprig::mesh::Triangulation;
use sprig::quadrature::QGauss;
use sprig::solvers::{spmv_transpose, ConjugateGradient, RelativeResidualCriterion};
use sprig::sparse::DynamicSparsityPattern;

/// Projects the constant 1 from a locally refined background mesh onto a locally refined
/// immersed mesh and returns the l2 error on the immersed DoFs.
fn project_constant<const DIM0: usize, const DIM1: usize, const SPACEDIM: usize>() -> eyre::Result<f64> {
    let mut tria0: Triangulation<DIM0, SPACEDIM> = hyper_cube(-1.0, 1.0);
    let mut tria1: Triangulation<DIM1, SPACEDIM> = hyper_cube(-0.44444, 0.3333);
    tria0.refine_global(if DIM0 < 3 { 3 } else { 2 });
    tria1.refine_global(2);
    for _ in 0..2 {
        tria1.mark_for_refinement(|cell| cell.center()[0] < 0.0);
        tria1.execute_coarsening_and_refinement();
        tria0.mark_for_refinement(|cell| cell.center()[0] > 0.0);
        tria0.execute_coarsening_and_refinement();
    }

    let dh0 = DofHandler::distribute_dofs(&tria0, FeQ1::new());
    let dh1 = DofHandler::distribute_dofs(&tria1, FeQ1::new());

    let mut constraints0 = AffineConstraints::new();
    make_hanging_node_constraints(&dh0, &mut constraints0)?;
    make_zero_boundary_constraints(&dh0, &mut constraints0, &ComponentMask::all(), &[]);
    constraints0.close()?;
    let mut constraints1 = AffineConstraints::new();
    make_hanging_node_constraints(&dh1, &mut constraints1)?;
    constraints1.close()?;
    assert!(constraints0.n_constraints() > 0);
    if DIM1 > 1 {
        assert!(constraints1.n_constraints() > 0);
    }

    let quadrature1 = QGauss::new(2)?;
    let cache0 = GridCache::new(&tria0);
    let coupling = Coupling::new(&cache0, &dh0, &dh1, &quadrature1)
        .with_constraints0(&constraints0)
        .with_constraints1(&constraints1);
    let mut dsp = DynamicSparsityPattern::new(dh0.n_dofs(), dh1.n_dofs());
    coupling.create_sparsity_pattern(&mut dsp)?;
    let coupling_matrix = coupling.create_mass_matrix(&dsp.to_sparsity_pattern())?;

    let mass1 = create_mass_matrix(&dh1, &quadrature1, &MAPPING_Q1, &constraints1)?;

    let mut ones0 = DVector::from_element(dh0.n_dofs(), 1.0);
    constraints0.distribute(&mut ones0);
    let rhs = spmv_transpose(&coupling_matrix, &ones0);
    let mut ones1 = ConjugateGradient::new(&mass1)
        .with_stopping_criterion(RelativeResidualCriterion::new(1e-13))
        .solve(&rhs)?;
    constraints1.distribute(&mut ones1);

    let mut exact = DVector::from_element(dh1.n_dofs(), 1.0);
    constraints1.distribute(&mut exact);
    Ok((ones1 - exact).norm())
}

#[test]
fn constants_are_projected_exactly() -> eyre::Result<()> {
    assert!(project_constant::<1, 1, 1>()? < 1e-8);
    assert!(project_constant::<2, 1, 2>()? < 1e-8);
    assert!(project_constant::<2, 2, 2>()? < 1e-8);
    assert!(project_constant::<3, 2, 3>()? < 1e-8);
    assert!(project_constant::<3, 3, 3>()? < 1e-8);
    Ok(())
}
