//! Error types of the mesh engine, constraints and sparse structures.
use crate::mesh::{CellId, FaceId};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshError {
    InvalidVertexCount {
        cell: usize,
        expected: usize,
        actual: usize,
    },
    VertexIndexOutOfBounds {
        cell: usize,
        vertex: usize,
        n_vertices: usize,
    },
    DuplicateVertex {
        cell: usize,
        vertex: usize,
    },
    /// A face shared by more than two cells on the same level.
    NonManifoldFace {
        vertices: Vec<usize>,
    },
    CellNotActive {
        cell: CellId,
    },
    UnknownCell {
        cell: CellId,
    },
    UnknownFace {
        face: FaceId,
    },
    /// The internal face id cannot be assigned explicitly.
    ReservedBoundaryId,
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVertexCount { cell, expected, actual } => {
                write!(f, "Cell {} has {} vertices, expected {}", cell, actual, expected)
            }
            Self::VertexIndexOutOfBounds { cell, vertex, n_vertices } => write!(
                f,
                "Cell {} references vertex {}, but there are only {} vertices",
                cell, vertex, n_vertices
            ),
            Self::DuplicateVertex { cell, vertex } => {
                write!(f, "Cell {} references vertex {} more than once", cell, vertex)
            }
            Self::NonManifoldFace { vertices } => {
                write!(f, "Face with vertices {:?} is shared by more than two cells", vertices)
            }
            Self::CellNotActive { cell } => write!(f, "Cell {} is not active", cell),
            Self::UnknownCell { cell } => write!(f, "Cell {} does not exist", cell),
            Self::UnknownFace { face } => write!(f, "Face {} does not exist", face.0),
            Self::ReservedBoundaryId => write!(f, "The internal face boundary id is reserved"),
        }
    }
}

impl Error for MeshError {}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConstraintError {
    /// Closing the constraints would never terminate. The chain starts and ends with the same DoF.
    Cycle { chain: Vec<usize> },
    /// The same source was given two different weights in one line.
    ConflictingEntry {
        dof: usize,
        source: usize,
        existing: f64,
        new: f64,
    },
    /// Two constraint sets disagree on the line of a DoF.
    InconsistentLine { dof: usize },
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { chain } => write!(f, "Constraint cycle: {:?}", chain),
            Self::ConflictingEntry {
                dof,
                source,
                existing,
                new,
            } => write!(
                f,
                "DoF {} is already constrained to DoF {} with weight {}, cannot use weight {}",
                dof, source, existing, new
            ),
            Self::InconsistentLine { dof } => write!(f, "Inconsistent constraint lines for DoF {}", dof),
        }
    }
}

impl Error for ConstraintError {}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SparseError {
    EntryNotInPattern { row: usize, col: usize },
}

impl fmt::Display for SparseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryNotInPattern { row, col } => {
                write!(f, "Entry ({}, {}) is not in the sparsity pattern", row, col)
            }
        }
    }
}

impl Error for SparseError {}
