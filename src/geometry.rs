use nalgebra::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in `S` dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<const S: usize> {
    min: Point<f64, S>,
    max: Point<f64, S>,
}

impl<const S: usize> BoundingBox<S> {
    pub fn new(min: Point<f64, S>, max: Point<f64, S>) -> Self {
        Self { min, max }
    }

    /// Returns `None` for an empty set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point<f64, S>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(Self::new(first, first), |bounds, p| bounds.enclose_point(p)))
    }

    pub fn min(&self) -> &Point<f64, S> {
        &self.min
    }

    pub fn max(&self) -> &Point<f64, S> {
        &self.max
    }

    pub fn enclose_point(&self, p: &Point<f64, S>) -> Self {
        Self {
            min: self.min.inf(p),
            max: self.max.sup(p),
        }
    }

    /// Grows the box by `margin` along each axis in both directions.
    pub fn inflate(&self, margin: f64) -> Self {
        Self {
            min: self.min.map(|x| x - margin),
            max: self.max.map(|x| x + margin),
        }
    }

    pub fn contains_point(&self, p: &Point<f64, S>) -> bool {
        (0..S).all(|a| self.min[a] <= p[a] && p[a] <= self.max[a])
    }

    pub fn diameter(&self) -> f64 {
        (self.max - self.min).norm()
    }

    pub fn center(&self) -> Point<f64, S> {
        nalgebra::center(&self.min, &self.max)
    }
}
