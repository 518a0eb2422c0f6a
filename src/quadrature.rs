//! Quadrature rules on the reference hypercube `[0, 1]^DIM`.
use nalgebra::Point;

/// Errors returned by quadrature constructors.
pub use sprig_quadrature::Error as QuadratureError;

/// A quadrature rule consisting of weights and points.
pub trait Quadrature<const DIM: usize>: Send + Sync {
    fn weights(&self) -> &[f64];
    fn points(&self) -> &[Point<f64, DIM>];

    fn len(&self) -> usize {
        self.weights().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximates the integral of the given function over the reference cell.
    fn integrate<F>(&self, f: F) -> f64
    where
        Self: Sized,
        F: Fn(&Point<f64, DIM>) -> f64,
    {
        self.weights()
            .iter()
            .zip(self.points())
            .map(|(w, p)| w * f(p))
            .sum()
    }
}

/// Tensor-product Gauss-Legendre rule, exact for polynomials of degree `2n - 1` in each variable.
#[derive(Debug, Clone, PartialEq)]
pub struct QGauss<const DIM: usize> {
    weights: Vec<f64>,
    points: Vec<Point<f64, DIM>>,
}

impl<const DIM: usize> QGauss<DIM> {
    /// Gauss rule with `n` points per axis.
    pub fn new(n: usize) -> Result<Self, QuadratureError> {
        let (weights, points) = sprig_quadrature::tensor::gauss::<DIM>(n)?;
        let scale = 0.5f64.powi(DIM as i32);
        Ok(Self {
            weights: weights.into_iter().map(|w| w * scale).collect(),
            points: points
                .into_iter()
                .map(|p| Point::from(p.map(|x| 0.5 * (x + 1.0))))
                .collect(),
        })
    }
}

impl<const DIM: usize> Quadrature<DIM> for QGauss<DIM> {
    fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn points(&self) -> &[Point<f64, DIM>] {
        &self.points
    }
}
