//! Tensor-product rules for hypercubes.
//!
//! A rule on `[-1, 1]^D` is formed from the product of `D` copies of a one-dimensional rule.
//! Points are ordered lexicographically with the first coordinate running fastest.

use crate::univariate;
use crate::{Error, Rule};

/// Forms the `D`-fold tensor product of a one-dimensional rule.
pub fn tensor_product<const D: usize>(rule: &Rule<1>) -> Rule<D> {
    let (weights_1d, points_1d) = rule;
    let n = weights_1d.len();
    let total = n.pow(D as u32);

    let mut weights = Vec::with_capacity(total);
    let mut points = Vec::with_capacity(total);
    let mut multi_index = [0; D];
    for _ in 0..total {
        let mut weight = 1.0;
        let mut point = [0.0; D];
        for (axis, &i) in multi_index.iter().enumerate() {
            weight *= weights_1d[i];
            point[axis] = points_1d[i][0];
        }
        weights.push(weight);
        points.push(point);

        // Advance the odometer, first axis fastest
        for digit in multi_index.iter_mut() {
            *digit += 1;
            if *digit < n {
                break;
            }
            *digit = 0;
        }
    }

    (weights, points)
}

/// A Gauss rule on `[-1, 1]^D` with the given number of points per dimension.
///
/// Integrates polynomials of degree up to `2n - 1` in each variable exactly.
pub fn gauss<const D: usize>(num_points_per_dim: usize) -> Result<Rule<D>, Error> {
    let rule = univariate::gauss(num_points_per_dim)?;
    Ok(tensor_product::<D>(&rule))
}
