//! Derives faces, sub-faces and the active cell numbering from the cell arena.
use super::{sorted, CellId, FaceData, FaceId, FaceTags, Triangulation};
use crate::reference::{face_children, face_vertices, faces_per_cell};
use std::mem;

impl<const DIM: usize, const SPACEDIM: usize> Triangulation<DIM, SPACEDIM> {
    pub(crate) fn rebuild_connectivity(&mut self) {
        let old_lookup = mem::take(&mut self.face_lookup);
        let old_tags = mem::take(self.face_tags.get_mut());
        self.faces.clear();

        let local_faces: Vec<Vec<usize>> = (0..faces_per_cell(DIM))
            .map(|f| face_vertices(DIM, f))
            .collect();

        let mut cell_faces = Vec::new();
        {
            let faces = &mut self.faces;
            let lookup = &mut self.face_lookup;
            for (level, cells) in self.levels.iter().enumerate() {
                for (index, data) in cells.cells.iter().enumerate() {
                    let Some(data) = data else { continue };
                    let id = CellId::new(level, index);
                    let mut ids = Vec::with_capacity(local_faces.len());
                    for (f, local) in local_faces.iter().enumerate() {
                        let global: Vec<usize> = local.iter().map(|&v| data.vertices[v]).collect();
                        let face = *lookup.entry(sorted(global.clone())).or_insert_with(|| {
                            faces.push(FaceData {
                                vertices: global,
                                parent: None,
                                children: Vec::new(),
                                cells: Vec::new(),
                            });
                            FaceId(faces.len() - 1)
                        });
                        faces[face.0].cells.push((id, f));
                        ids.push(face);
                    }
                    cell_faces.push((id, ids));
                }
            }
        }
        for (id, ids) in cell_faces {
            self.cell_data_mut(id).faces = ids;
        }

        // In 1D the faces of children coincide with the faces of their parent.
        if DIM > 1 {
            let mut links = Vec::new();
            for (level, cells) in self.levels.iter().enumerate() {
                for data in cells.cells.iter().flatten() {
                    let Some(first) = data.first_child else { continue };
                    for f in 0..faces_per_cell(DIM) {
                        let children: Vec<FaceId> = face_children(DIM, f)
                            .into_iter()
                            .map(|c| self.cell_data(CellId::new(level + 1, first + c)).faces[f])
                            .collect();
                        links.push((data.faces[f], children));
                    }
                }
            }
            for (parent, children) in links {
                for &child in &children {
                    self.faces[child.0].parent = Some(parent);
                }
                if self.faces[parent.0].children.is_empty() {
                    self.faces[parent.0].children = children;
                }
            }
        }

        self.active_cells.clear();
        self.vertex_used.clear();
        self.vertex_used.resize(self.vertices.len(), false);
        for (level, cells) in self.levels.iter_mut().enumerate() {
            for (index, data) in cells.cells.iter_mut().enumerate() {
                let Some(data) = data else { continue };
                if data.first_child.is_none() {
                    data.active_index = Some(self.active_cells.len());
                    self.active_cells.push(CellId::new(level, index));
                    for &v in &data.vertices {
                        self.vertex_used[v] = true;
                    }
                } else {
                    data.active_index = None;
                }
            }
        }

        // Parent faces always precede their children, so inherited tags are already known.
        let mut tags: Vec<FaceTags> = Vec::with_capacity(self.faces.len());
        for (i, face) in self.faces.iter().enumerate() {
            let key = sorted(face.vertices.clone());
            let face_tags = if let Some(old) = old_lookup.get(&key) {
                old_tags[old.0]
            } else if let Some(parent) = face.parent {
                tags[parent.0]
            } else if self.face(FaceId(i)).at_boundary() {
                FaceTags::BOUNDARY
            } else {
                FaceTags::INTERNAL
            };
            tags.push(face_tags);
        }
        *self.face_tags.get_mut() = tags;
    }
}
