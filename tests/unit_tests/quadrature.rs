use matrixcompare::assert_scalar_eq;
use nalgebra::point;
use sprig::mapping::{Mapping, MAPPING_Q1};
use sprig::quadrature::{QGauss, Quadrature, QuadratureError};

#[test]
fn gauss_rules_live_on_the_unit_cube() {
    let rule = QGauss::<3>::new(2).unwrap();
    assert_eq!(rule.len(), 8);
    assert_scalar_eq!(rule.weights().iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-14);
    assert!(rule
        .points()
        .iter()
        .all(|p| p.iter().all(|&x| x > 0.0 && x < 1.0)));
}

#[test]
fn gauss_rules_are_exact_for_tensor_polynomials() {
    let rule = QGauss::<2>::new(2).unwrap();
    let integral = rule.integrate(|p| p[0].powi(3) * p[1]);
    assert_scalar_eq!(integral, 0.125, comp = abs, tol = 1e-14);

    let rule = QGauss::<1>::new(3).unwrap();
    let integral = rule.integrate(|p| p[0].powi(5));
    assert_scalar_eq!(integral, 1.0 / 6.0, comp = abs, tol = 1e-14);
}

#[test]
fn empty_rule_is_an_error() {
    assert!(matches!(QGauss::<2>::new(0), Err(QuadratureError::NoRuleAvailable)));
}

#[test]
fn mapped_weights_sum_to_cell_measure() {
    // A parallelogram in the plane z = 1
    let vertices = [
        point![0.0, 0.0, 1.0],
        point![2.0, 0.0, 1.0],
        point![1.0, 1.0, 1.0],
        point![3.0, 1.0, 1.0],
    ];
    let rule = QGauss::<2>::new(1).unwrap();
    let measure: f64 = rule
        .weights()
        .iter()
        .zip(rule.points())
        .map(|(&w, xi)| MAPPING_Q1.jxw(&vertices, xi, w))
        .sum();
    assert_scalar_eq!(measure, 2.0, comp = abs, tol = 1e-14);
}
