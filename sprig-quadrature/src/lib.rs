//! Quadrature rules for hypercube reference domains.
//!
//! Rules are defined on `[-1, 1]^D` and returned as plain arrays so that the crate can be used
//! independently of `sprig`, which maps them to its own reference cell.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod tensor;
pub mod univariate;

/// Errors returned by the rule constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No rule with the requested number of points exists, e.g. a Gauss rule with zero points.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => write!(f, "No quadrature rule with the requested number of points"),
        }
    }
}

impl std::error::Error for Error {}

/// Coordinates of a point in `[-1, 1]^D`.
pub type Point<const D: usize> = [f64; D];

/// Weights and points of a rule on `[-1, 1]^D`, with one weight per point.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);
