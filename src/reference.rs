//! Conventions of the reference hypercube `[0, 1]^dim`.
//!
//! Local vertex `v` sits at the corner whose coordinate along axis `a` is bit `a` of `v`.
//! Face `f = 2a + s` is the facet `ξ_a = s`, child `c` is the sub-box whose half along axis
//! `a` is bit `a` of `c`. Sub-entities (vertices, edges, faces, the cell itself) are described by
//! a mask of *free* axes together with the bits of the remaining *fixed* axes.
use nalgebra::Point;

pub const fn vertices_per_cell(dim: usize) -> usize {
    1 << dim
}

pub const fn children_per_cell(dim: usize) -> usize {
    1 << dim
}

pub const fn faces_per_cell(dim: usize) -> usize {
    2 * dim
}

pub const fn vertices_per_face(dim: usize) -> usize {
    1 << (dim - 1)
}

/// Number of sub-faces of a refined face, i.e. zero for the vertex faces of 1D cells.
pub const fn children_per_face(dim: usize) -> usize {
    if dim > 1 {
        1 << (dim - 1)
    } else {
        0
    }
}

pub const fn face_axis(face: usize) -> usize {
    face / 2
}

pub const fn face_side(face: usize) -> usize {
    face % 2
}

pub const fn opposite_face(face: usize) -> usize {
    face ^ 1
}

/// Local vertices of `face`, in increasing order.
pub fn face_vertices(dim: usize, face: usize) -> Vec<usize> {
    let (axis, side) = (face_axis(face), face_side(face));
    (0..vertices_per_cell(dim))
        .filter(|v| (v >> axis) & 1 == side)
        .collect()
}

/// Children touching `face`, in increasing order. The position in this list is the sub-face index.
pub fn face_children(dim: usize, face: usize) -> Vec<usize> {
    face_vertices(dim, face)
}

pub fn child_touches_face(child: usize, face: usize) -> bool {
    (child >> face_axis(face)) & 1 == face_side(face)
}

pub fn unit_vertex<const DIM: usize>(vertex: usize) -> Point<f64, DIM> {
    let mut p = Point::origin();
    for a in 0..DIM {
        p[a] = ((vertex >> a) & 1) as f64;
    }
    p
}

pub fn unit_center<const DIM: usize>() -> Point<f64, DIM> {
    Point::from([0.5; DIM])
}

/// A sub-entity of the reference cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubEntity {
    pub free_axes: usize,
    pub fixed_bits: usize,
}

impl SubEntity {
    pub fn dimension(&self) -> usize {
        self.free_axes.count_ones() as usize
    }

    /// Local vertices of the cell lying on this entity, in increasing order.
    pub fn vertices(&self, dim: usize) -> Vec<usize> {
        let fixed = !self.free_axes;
        (0..vertices_per_cell(dim))
            .filter(|v| v & fixed == self.fixed_bits & fixed)
            .collect()
    }

    pub fn center<const DIM: usize>(&self) -> Point<f64, DIM> {
        let mut p = Point::origin();
        for a in 0..DIM {
            p[a] = if (self.free_axes >> a) & 1 == 1 {
                0.5
            } else {
                ((self.fixed_bits >> a) & 1) as f64
            };
        }
        p
    }
}

/// All sub-entities of the given dimension.
pub fn sub_entities(dim: usize, entity_dim: usize) -> Vec<SubEntity> {
    let all_axes: usize = (1 << dim) - 1;
    let mut entities = Vec::new();
    for free_axes in 0..=all_axes {
        if free_axes.count_ones() as usize != entity_dim {
            continue;
        }
        for fixed_bits in 0..=all_axes {
            if fixed_bits & free_axes == 0 {
                entities.push(SubEntity { free_axes, fixed_bits });
            }
        }
    }
    entities
}

/// Edges of the reference cell as pairs of local vertices.
pub fn edges(dim: usize) -> Vec<(usize, usize)> {
    sub_entities(dim, 1)
        .into_iter()
        .map(|edge| (edge.fixed_bits, edge.fixed_bits | edge.free_axes))
        .collect()
}

/// The entity of the parent whose centre is vertex `vertex` of child `child`.
///
/// Along each axis the child vertex lies on the half-grid position `c_a + v_a ∈ {0, 1, 2}`;
/// position 1 is a free axis of the parent entity.
pub fn child_vertex_entity(dim: usize, child: usize, vertex: usize) -> SubEntity {
    let mut free_axes = 0;
    let mut fixed_bits = 0;
    for a in 0..dim {
        match ((child >> a) & 1) + ((vertex >> a) & 1) {
            0 => {}
            1 => free_axes |= 1 << a,
            _ => fixed_bits |= 1 << a,
        }
    }
    SubEntity { free_axes, fixed_bits }
}
