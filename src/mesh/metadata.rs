use super::{BoundaryId, FaceId, ManifoldId, Triangulation, FLAT_MANIFOLD_ID, INTERNAL_FACE_BOUNDARY_ID};
use crate::error::MeshError;
use serde::{Deserialize, Serialize};

/// Topological tags of a face. They never influence the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceTags {
    pub boundary_id: BoundaryId,
    pub manifold_id: ManifoldId,
}

impl FaceTags {
    pub const BOUNDARY: Self = Self {
        boundary_id: 0,
        manifold_id: FLAT_MANIFOLD_ID,
    };

    pub const INTERNAL: Self = Self {
        boundary_id: INTERNAL_FACE_BOUNDARY_ID,
        manifold_id: FLAT_MANIFOLD_ID,
    };
}

/// Mutable access to face tags through a shared reference to the triangulation.
///
/// Tags are metadata, so changing them is possible while cells and faces are being traversed.
#[derive(Clone, Copy)]
pub struct FaceMetadata<'a, const DIM: usize, const SPACEDIM: usize> {
    tria: &'a Triangulation<DIM, SPACEDIM>,
}

impl<'a, const DIM: usize, const SPACEDIM: usize> FaceMetadata<'a, DIM, SPACEDIM> {
    pub(crate) fn new(tria: &'a Triangulation<DIM, SPACEDIM>) -> Self {
        Self { tria }
    }

    fn check_face(&self, face: FaceId) -> Result<(), MeshError> {
        if face.0 < self.tria.faces.len() {
            Ok(())
        } else {
            Err(MeshError::UnknownFace { face })
        }
    }

    /// The face together with all of its descendant sub-faces.
    fn descendants(&self, face: FaceId) -> Vec<FaceId> {
        let mut result = Vec::new();
        let mut stack = vec![face];
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.tria.faces[current.0].children.iter().copied());
        }
        result
    }

    pub fn tags(&self, face: FaceId) -> FaceTags {
        self.tria.face_tags.read()[face.0]
    }

    pub fn boundary_id(&self, face: FaceId) -> BoundaryId {
        self.tags(face).boundary_id
    }

    pub fn manifold_id(&self, face: FaceId) -> ManifoldId {
        self.tags(face).manifold_id
    }

    pub fn set_boundary_id(&self, face: FaceId, id: BoundaryId) -> Result<(), MeshError> {
        if id == INTERNAL_FACE_BOUNDARY_ID {
            return Err(MeshError::ReservedBoundaryId);
        }
        self.check_face(face)?;
        self.tria.face_tags.write()[face.0].boundary_id = id;
        Ok(())
    }

    pub fn set_all_boundary_ids(&self, face: FaceId, id: BoundaryId) -> Result<(), MeshError> {
        if id == INTERNAL_FACE_BOUNDARY_ID {
            return Err(MeshError::ReservedBoundaryId);
        }
        self.check_face(face)?;
        let faces = self.descendants(face);
        let mut tags = self.tria.face_tags.write();
        for f in faces {
            tags[f.0].boundary_id = id;
        }
        Ok(())
    }

    pub fn set_manifold_id(&self, face: FaceId, id: ManifoldId) -> Result<(), MeshError> {
        self.check_face(face)?;
        self.tria.face_tags.write()[face.0].manifold_id = id;
        Ok(())
    }

    pub fn set_all_manifold_ids(&self, face: FaceId, id: ManifoldId) -> Result<(), MeshError> {
        self.check_face(face)?;
        let faces = self.descendants(face);
        let mut tags = self.tria.face_tags.write();
        for f in faces {
            tags[f.0].manifold_id = id;
        }
        Ok(())
    }
}
