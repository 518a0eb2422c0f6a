//! Hierarchical quadrilateral and hexahedral meshes with adaptive refinement, together with the
//! finite element machinery needed to couple non-matching meshes.
pub mod assembly;
pub mod constraints;
pub mod coupling;
pub mod dof_tools;
pub mod dofs;
pub mod element;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod mesh;
pub mod quadrature;
pub mod reference;
pub mod sparse;

pub mod solvers {
    pub use sprig_sparse::*;
}

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
