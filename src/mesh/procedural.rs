//! Basic procedural triangulations.
//!
//! Meshes of codimension one live in the plane (or line) spanned by the first `DIM` axes; the
//! remaining coordinates are zero.
use super::Triangulation;
use crate::reference::vertices_per_cell;
use nalgebra::Point;

/// A single cell `[left, right]^DIM`.
pub fn hyper_cube<const DIM: usize, const SPACEDIM: usize>(left: f64, right: f64) -> Triangulation<DIM, SPACEDIM> {
    subdivided_hyper_cube(1, left, right)
}

/// The cube `[left, right]^DIM` divided into `repetitions` cells along each axis.
pub fn subdivided_hyper_cube<const DIM: usize, const SPACEDIM: usize>(
    repetitions: usize,
    left: f64,
    right: f64,
) -> Triangulation<DIM, SPACEDIM> {
    subdivided_hyper_rectangle([repetitions; DIM], &Point::from([left; DIM]), &Point::from([right; DIM]))
}

/// A single cell spanned by the opposite corners `p1` and `p2`.
pub fn hyper_rectangle<const DIM: usize, const SPACEDIM: usize>(
    p1: &Point<f64, DIM>,
    p2: &Point<f64, DIM>,
) -> Triangulation<DIM, SPACEDIM> {
    subdivided_hyper_rectangle([1; DIM], p1, p2)
}

/// The box spanned by `p1` and `p2` with `repetitions[a]` cells along axis `a`.
///
/// Returns an empty triangulation if any repetition count is zero.
pub fn subdivided_hyper_rectangle<const DIM: usize, const SPACEDIM: usize>(
    repetitions: [usize; DIM],
    p1: &Point<f64, DIM>,
    p2: &Point<f64, DIM>,
) -> Triangulation<DIM, SPACEDIM> {
    if repetitions.iter().any(|&n| n == 0) {
        return Triangulation::empty();
    }
    let min = p1.inf(p2);
    let max = p1.sup(p2);

    let n_vertices: Vec<usize> = repetitions.iter().map(|n| n + 1).collect();
    let vertex_index = |multi: &[usize]| {
        multi
            .iter()
            .zip(&n_vertices)
            .rev()
            .fold(0, |index, (&i, &n)| index * n + i)
    };

    // Odometer over multi-indices with the first axis running fastest
    let for_each_multi_index = |extents: &[usize], f: &mut dyn FnMut(&[usize])| {
        let mut multi = vec![0; extents.len()];
        loop {
            f(&multi);
            let mut axis = 0;
            loop {
                if axis == extents.len() {
                    return;
                }
                multi[axis] += 1;
                if multi[axis] < extents[axis] {
                    break;
                }
                multi[axis] = 0;
                axis += 1;
            }
        }
    };

    let mut vertices = Vec::new();
    for_each_multi_index(&n_vertices, &mut |multi| {
        let mut p = Point::<f64, SPACEDIM>::origin();
        for a in 0..DIM {
            let t = multi[a] as f64 / repetitions[a] as f64;
            p[a] = (1.0 - t) * min[a] + t * max[a];
        }
        vertices.push(p);
    });

    let mut cells = Vec::new();
    for_each_multi_index(&repetitions, &mut |multi| {
        let cell: Vec<usize> = (0..vertices_per_cell(DIM))
            .map(|v| {
                let corner: Vec<usize> = (0..DIM).map(|a| multi[a] + ((v >> a) & 1)).collect();
                vertex_index(&corner)
            })
            .collect();
        cells.push(cell);
    });

    Triangulation::from_valid_coarse_cells(vertices, cells)
}
