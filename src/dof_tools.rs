//! Constraints and sparsity patterns derived from a [`DofHandler`].
use crate::constraints::AffineConstraints;
use crate::dofs::DofHandler;
use crate::element::ComponentMask;
use crate::error::ConstraintError;
use crate::mesh::BoundaryId;
use crate::reference::{face_vertices, faces_per_cell, sub_entities};
use crate::sparse::DynamicSparsityPattern;
use log::debug;
use std::collections::BTreeSet;

/// Constrains the vertex DoFs of hanging nodes.
///
/// A hanging node is a vertex of an active cell at the centre of an edge or face of another,
/// coarser active cell. Its DoFs are expressed through the shape functions of the coarse cell
/// evaluated at the centre. DoFs that are already constrained are left untouched.
pub fn make_hanging_node_constraints<const DIM: usize, const SPACEDIM: usize>(
    dof_handler: &DofHandler<DIM, SPACEDIM>,
    constraints: &mut AffineConstraints,
) -> Result<(), ConstraintError> {
    let fe = dof_handler.fe();
    if DIM < 2 || fe.dofs_per_vertex() == 0 {
        return Ok(());
    }
    let tria = dof_handler.triangulation();
    let n_components = fe.n_components();
    let entities: Vec<_> = (1..DIM).flat_map(|d| sub_entities(DIM, d)).collect();

    let mut n_hanging = 0;
    for (cell, dofs) in dof_handler.active_cells() {
        for entity in &entities {
            let spanned: Vec<usize> = entity
                .vertices(DIM)
                .into_iter()
                .map(|v| cell.vertex_index(v))
                .collect();
            let Some(hanging) = tria.midpoint_vertex(&spanned) else { continue };
            if !tria.vertex_used(hanging) {
                continue;
            }
            let center = entity.center::<DIM>();
            for component in 0..n_components {
                let Some(dof) = dof_handler.vertex_dof_index(hanging, component) else { continue };
                if constraints.is_constrained(dof) {
                    continue;
                }
                constraints.add_line(dof);
                for (i, &source) in dofs.iter().enumerate() {
                    if fe.system_to_component(i) != component {
                        continue;
                    }
                    let weight = fe.shape_value(i, &center);
                    if weight != 0.0 {
                        constraints.add_entry(dof, source, weight)?;
                    }
                }
                n_hanging += 1;
            }
        }
    }
    debug!("Constrained {} hanging node DoFs", n_hanging);
    Ok(())
}

/// Vertex DoFs on boundary faces with one of `boundary_ids` (any id if empty) whose component is
/// selected by `mask`.
pub fn extract_boundary_dofs<const DIM: usize, const SPACEDIM: usize>(
    dof_handler: &DofHandler<DIM, SPACEDIM>,
    mask: &ComponentMask,
    boundary_ids: &[BoundaryId],
) -> BTreeSet<usize> {
    let fe = dof_handler.fe();
    let n_components = fe.n_components();
    let mut boundary_dofs = BTreeSet::new();
    if fe.dofs_per_vertex() == 0 {
        return boundary_dofs;
    }
    for (cell, dofs) in dof_handler.active_cells() {
        for f in 0..faces_per_cell(DIM) {
            let face = cell.face(f);
            if !cell.at_boundary(f) || !(boundary_ids.is_empty() || boundary_ids.contains(&face.boundary_id())) {
                continue;
            }
            for v in face_vertices(DIM, f) {
                for component in 0..n_components {
                    if mask.selects(component) {
                        boundary_dofs.insert(dofs[v * n_components + component]);
                    }
                }
            }
        }
    }
    boundary_dofs
}

/// Constrains boundary DoFs to zero, see [`extract_boundary_dofs`] for the selection.
pub fn make_zero_boundary_constraints<const DIM: usize, const SPACEDIM: usize>(
    dof_handler: &DofHandler<DIM, SPACEDIM>,
    constraints: &mut AffineConstraints,
    mask: &ComponentMask,
    boundary_ids: &[BoundaryId],
) {
    for dof in extract_boundary_dofs(dof_handler, mask, boundary_ids) {
        if !constraints.is_constrained(dof) {
            constraints.constrain_dof_to_zero(dof);
        }
    }
}

/// Adds the couplings between DoFs sharing a cell to `pattern`.
pub fn make_sparsity_pattern<const DIM: usize, const SPACEDIM: usize>(
    dof_handler: &DofHandler<DIM, SPACEDIM>,
    pattern: &mut DynamicSparsityPattern,
    constraints: &AffineConstraints,
    keep_constrained: bool,
) {
    for (_, dofs) in dof_handler.active_cells() {
        constraints.add_entries_local_to_global(dofs, pattern, keep_constrained);
    }
}

pub fn count_dofs_per_component<const DIM: usize, const SPACEDIM: usize>(
    dof_handler: &DofHandler<DIM, SPACEDIM>,
) -> Vec<usize> {
    let fe = dof_handler.fe();
    let mut components = vec![None; dof_handler.n_dofs()];
    for (_, dofs) in dof_handler.active_cells() {
        for (i, &dof) in dofs.iter().enumerate() {
            components[dof] = Some(fe.system_to_component(i));
        }
    }
    let mut counts = vec![0; fe.n_components()];
    for component in components.into_iter().flatten() {
        counts[component] += 1;
    }
    counts
}
