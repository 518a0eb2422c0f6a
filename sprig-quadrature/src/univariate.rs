//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::{Error, Rule};
use std::f64::consts::PI;

const NEWTON_TOLERANCE: f64 = 1e-15;
const MAX_NEWTON_ITERATIONS: usize = 100;

/// Value and derivative of the Legendre polynomial `P_n` at `x`.
///
/// The derivative formula is singular at `|x| == 1`, so this is only meant for the open
/// interval `(-1, 1)`, which is where the Gauss points live.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    // m P_m(x) = (2m - 1) x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
    let mut current = 1.0;
    let mut previous = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let next = ((2.0 * m - 1.0) * x * current - (m - 1.0) * previous) / m;
        previous = current;
        current = next;
    }
    let n = n as f64;
    let derivative = n * (x * current - previous) / (x * x - 1.0);
    (current, derivative)
}

/// Gauss–Legendre quadrature for the reference interval `[-1, 1]`.
///
/// With `n` points the rule integrates polynomials of degree up to `2n - 1` exactly.
/// Points are returned in increasing order.
///
/// Returns [`Error::NoRuleAvailable`] if zero points are requested.
pub fn gauss(num_points: usize) -> Result<Rule<1>, Error> {
    let n = num_points;
    if n == 0 {
        return Err(Error::NoRuleAvailable);
    }

    let mut points = vec![[0.0]; n];
    let mut weights = vec![0.0; n];

    // Roots come in pairs +-x, so only the upper half is computed.
    for i in 0..(n + 1) / 2 {
        // Tricomi's initial guess for the i-th largest root
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (p, dp) = legendre(n, x);
            let dx = -p / dp;
            x += dx;
            if dx.abs() <= NEWTON_TOLERANCE {
                break;
            }
        }

        let derivative = legendre(n, x).1;
        let w = 2.0 / ((1.0 - x * x) * derivative * derivative);
        points[n - 1 - i] = [x];
        weights[n - 1 - i] = w;
        points[i] = [-x];
        weights[i] = w;
    }

    // The middle root of an odd rule is exactly zero
    if n % 2 == 1 {
        points[n / 2] = [0.0];
    }

    Ok((weights, points))
}
