use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector};
use proptest::collection::vec;
use proptest::prelude::*;
use sprig::constraints::AffineConstraints;
use sprig::error::ConstraintError;
use sprig::sparse::{zero_csr_from_pattern, DynamicSparsityPattern};
use util::assert_panics;

#[test]
fn three_link_chain_is_resolved() {
    // x0 = 0.5 x1 + 0.5 x2, x1 = 0.5 x2 + 0.5 x3, x2 = x4 + 1
    let mut c = AffineConstraints::new();
    c.add_entries(0, &[(1, 0.5), (2, 0.5)]).unwrap();
    c.add_entries(1, &[(2, 0.5), (3, 0.5)]).unwrap();
    c.add_entries(2, &[(4, 1.0)]).unwrap();
    c.set_inhomogeneity(2, 1.0);
    assert!(!c.is_closed());
    c.close().unwrap();
    assert!(c.is_closed());

    let line = c.constraint(0).unwrap();
    assert_eq!(line.entries.len(), 2);
    assert_eq!(line.entries[0].0, 3);
    assert_scalar_eq!(line.entries[0].1, 0.25, comp = abs, tol = 1e-15);
    assert_eq!(line.entries[1].0, 4);
    assert_scalar_eq!(line.entries[1].1, 0.75, comp = abs, tol = 1e-15);
    assert_scalar_eq!(line.inhomogeneity, 0.75, comp = abs, tol = 1e-15);
    assert_eq!(c.constraint(2).unwrap().entries, [(4, 1.0)]);
    for line in c.lines() {
        assert!(line.entries.iter().all(|&(source, _)| !c.is_constrained(source)));
    }
}

#[test]
fn cycles_are_reported() {
    let mut c = AffineConstraints::new();
    c.add_entry(0, 1, 1.0).unwrap();
    c.add_entry(1, 0, 1.0).unwrap();
    assert_eq!(c.close(), Err(ConstraintError::Cycle { chain: vec![0, 1, 0] }));

    let mut c = AffineConstraints::new();
    c.add_entry(3, 3, 0.5).unwrap();
    assert_eq!(c.close(), Err(ConstraintError::Cycle { chain: vec![3, 3] }));
}

#[test]
fn conflicting_entries_and_lines() {
    let mut c = AffineConstraints::new();
    c.add_entry(0, 1, 0.5).unwrap();
    c.add_entry(0, 1, 0.5).unwrap();
    assert_eq!(
        c.add_entry(0, 1, 0.25),
        Err(ConstraintError::ConflictingEntry {
            dof: 0,
            source: 1,
            existing: 0.5,
            new: 0.25
        })
    );

    let mut other = AffineConstraints::new();
    other.add_entry(0, 2, 1.0).unwrap();
    assert_eq!(c.merge(&other), Err(ConstraintError::InconsistentLine { dof: 0 }));

    let mut disjoint = AffineConstraints::new();
    disjoint.constrain_dof_to_zero(5);
    c.merge(&disjoint).unwrap();
    assert_eq!(c.n_constraints(), 2);
}

#[test]
fn distribute_and_set_zero() {
    let mut c = AffineConstraints::new();
    c.add_entries(1, &[(0, 0.5), (2, 0.5)]).unwrap();
    c.constrain_dof_to_zero(3);
    c.close().unwrap();

    let mut x = DVector::from_vec(vec![2.0, -1.0, 4.0, 7.0]);
    c.distribute(&mut x);
    assert_eq!(x.as_slice(), [2.0, 3.0, 4.0, 0.0]);

    let mut y = DVector::from_element(4, 1.0);
    c.set_zero(&mut y);
    assert_eq!(y.as_slice(), [1.0, 0.0, 1.0, 0.0]);
}

#[test]
fn applying_open_constraints_panics() {
    let mut c = AffineConstraints::new();
    c.add_entry(0, 1, 1.0).unwrap();
    assert_panics!({
        let mut x = DVector::zeros(2);
        c.distribute(&mut x)
    });
}

#[test]
fn condensed_matrix_keeps_constrained_diagonal() {
    // Two linear 1D elements, the middle DoF is the mean of its neighbours
    let mut c = AffineConstraints::new();
    c.add_entries(1, &[(0, 0.5), (2, 0.5)]).unwrap();
    c.close().unwrap();

    let mut dsp = DynamicSparsityPattern::new(3, 3);
    c.add_entries_local_to_global(&[0, 1], &mut dsp, false);
    c.add_entries_local_to_global(&[1, 2], &mut dsp, false);
    assert!(dsp.exists(0, 2));
    assert!(dsp.exists(1, 1));
    assert!(!dsp.exists(0, 1));

    let mut matrix = zero_csr_from_pattern(&dsp.to_sparsity_pattern());
    let mut rhs = DVector::zeros(3);
    let local = DMatrix::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 2.0]);
    let local_rhs = DVector::from_vec(vec![1.0, 1.0]);
    c.distribute_local_to_global(&local, Some(&local_rhs), &[0, 1], &mut matrix, Some(&mut rhs))
        .unwrap();
    c.distribute_local_to_global(&local, Some(&local_rhs), &[1, 2], &mut matrix, Some(&mut rhs))
        .unwrap();

    let expected = DMatrix::from_row_slice(3, 3, &[2.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 2.0]);
    assert_matrix_eq!(DMatrix::from(&matrix), expected, comp = abs, tol = 1e-14);
    assert_matrix_eq!(rhs, DVector::from_vec(vec![2.0, 0.0, 2.0]), comp = abs, tol = 1e-14);
}

#[test]
fn rectangular_condensation() {
    let mut rows = AffineConstraints::new();
    rows.constrain_dof_to_zero(0);
    rows.close().unwrap();
    let mut cols = AffineConstraints::new();
    cols.add_entries(1, &[(0, 1.0)]).unwrap();
    cols.close().unwrap();

    let mut dsp = DynamicSparsityPattern::new(2, 2);
    rows.add_entries_local_to_global_rectangular(&[0, 1], &cols, &[0, 1], &mut dsp, true);
    assert_eq!(dsp.n_nonzero(), 4);

    let mut matrix = zero_csr_from_pattern(&dsp.to_sparsity_pattern());
    let local = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    rows.distribute_local_to_global_rectangular(&cols, &local, &[0, 1], &[0, 1], &mut matrix)
        .unwrap();
    let expected = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 7.0, 0.0]);
    assert_matrix_eq!(DMatrix::from(&matrix), expected, comp = abs, tol = 1e-14);
}

fn chain_constraints() -> impl Strategy<Value = Vec<(usize, Vec<(usize, f64)>)>> {
    // Lines only reference higher DoFs, so there are no cycles
    vec((0..8usize, vec((1..6usize, -2.0..2.0f64), 0..4)), 0..8).prop_map(|lines| {
        lines
            .into_iter()
            .map(|(dof, sources)| {
                let sources = sources
                    .into_iter()
                    .map(|(offset, weight)| (dof + offset, weight))
                    .collect();
                (dof, sources)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn close_is_idempotent(lines in chain_constraints()) {
        let mut c = AffineConstraints::new();
        for (dof, sources) in &lines {
            c.add_line(*dof);
            for &(source, weight) in sources {
                // Conflicting duplicates are irrelevant here
                let _ = c.add_entry(*dof, source, weight);
            }
        }
        c.close().unwrap();
        let once = c.clone();
        c.close().unwrap();
        prop_assert_eq!(&once, &c);

        // Closing the resolved lines again changes nothing
        let mut rebuilt = AffineConstraints::new();
        for line in once.lines() {
            rebuilt.add_entries(line.index, &line.entries).unwrap();
            rebuilt.set_inhomogeneity(line.index, line.inhomogeneity);
        }
        rebuilt.close().unwrap();
        prop_assert_eq!(&once, &rebuilt);

        for line in c.lines() {
            prop_assert!(line.entries.iter().all(|&(source, _)| !c.is_constrained(source)));
            prop_assert!(line.entries.windows(2).all(|w| w[0].0 < w[1].0));
        }
    }
}
