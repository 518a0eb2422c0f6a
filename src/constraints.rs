//! Affine constraints `x_i = Σ_j w_ij x_j + b_i` between degrees of freedom.
use crate::error::{ConstraintError, SparseError};
use crate::sparse::{add_to_csr, DynamicSparsityPattern};
use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeMap;

/// The relation defining one constrained DoF.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintLine {
    pub index: usize,
    /// Source DoFs and weights. Sorted by source and free of constrained sources once closed.
    pub entries: Vec<(usize, f64)>,
    pub inhomogeneity: f64,
}

/// A set of affine constraints.
///
/// Lines may be added in any order and may reference other constrained DoFs. [`close`] resolves
/// such chains, after which the constraints can be applied to vectors and matrices.
///
/// [`close`]: AffineConstraints::close
#[derive(Debug, Clone, PartialEq)]
pub struct AffineConstraints {
    lines: BTreeMap<usize, ConstraintLine>,
    closed: bool,
}

impl Default for AffineConstraints {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl AffineConstraints {
    /// An empty set of constraints, which is trivially closed.
    pub const fn new() -> Self {
        Self {
            lines: BTreeMap::new(),
            closed: true,
        }
    }

    /// Adds an (initially homogeneous, source-free) line for `dof` unless it already exists.
    pub fn add_line(&mut self, dof: usize) {
        self.line_mut(dof);
    }

    fn line_mut(&mut self, dof: usize) -> &mut ConstraintLine {
        self.closed = false;
        self.lines.entry(dof).or_insert_with(|| ConstraintLine {
            index: dof,
            entries: Vec::new(),
            inhomogeneity: 0.0,
        })
    }

    /// Adds `weight * x_source` to the line of `dof`, creating the line if necessary.
    ///
    /// Adding an existing source again with the same weight has no effect.
    pub fn add_entry(&mut self, dof: usize, source: usize, weight: f64) -> Result<(), ConstraintError> {
        let line = self.line_mut(dof);
        match line.entries.iter().find(|(s, _)| *s == source) {
            Some(&(_, existing)) if existing == weight => Ok(()),
            Some(&(_, existing)) => Err(ConstraintError::ConflictingEntry {
                dof,
                source,
                existing,
                new: weight,
            }),
            None => {
                line.entries.push((source, weight));
                Ok(())
            }
        }
    }

    pub fn add_entries(&mut self, dof: usize, entries: &[(usize, f64)]) -> Result<(), ConstraintError> {
        self.add_line(dof);
        for &(source, weight) in entries {
            self.add_entry(dof, source, weight)?;
        }
        Ok(())
    }

    pub fn set_inhomogeneity(&mut self, dof: usize, value: f64) {
        self.line_mut(dof).inhomogeneity = value;
    }

    pub fn constrain_dof_to_zero(&mut self, dof: usize) {
        self.add_line(dof);
    }

    pub fn is_constrained(&self, dof: usize) -> bool {
        self.lines.contains_key(&dof)
    }

    pub fn n_constraints(&self) -> usize {
        self.lines.len()
    }

    pub fn constraint(&self, dof: usize) -> Option<&ConstraintLine> {
        self.lines.get(&dof)
    }

    /// Lines ordered by constrained DoF.
    pub fn lines(&self) -> impl '_ + Iterator<Item = &ConstraintLine> {
        self.lines.values()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Resolves chains so that no line has a constrained source.
    ///
    /// Sources of each line are merged, sorted, and exact zeros are dropped. Closing an already
    /// closed set leaves it unchanged.
    pub fn close(&mut self) -> Result<(), ConstraintError> {
        if self.closed {
            return Ok(());
        }
        let mut resolved = BTreeMap::new();
        let mut visits = BTreeMap::new();
        let mut chain = Vec::new();
        let mut n_chained = 0;
        for &dof in self.lines.keys() {
            self.resolve(dof, &mut resolved, &mut visits, &mut chain, &mut n_chained)?;
        }
        self.lines = resolved;
        self.closed = true;
        debug!(
            "Closed {} constraints, {} of them resolved through chains",
            self.lines.len(),
            n_chained
        );
        Ok(())
    }

    fn resolve(
        &self,
        dof: usize,
        resolved: &mut BTreeMap<usize, ConstraintLine>,
        visits: &mut BTreeMap<usize, Visit>,
        chain: &mut Vec<usize>,
        n_chained: &mut usize,
    ) -> Result<(), ConstraintError> {
        match visits.get(&dof) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = chain.iter().position(|&d| d == dof).unwrap_or(0);
                let mut cycle = chain[start..].to_vec();
                cycle.push(dof);
                return Err(ConstraintError::Cycle { chain: cycle });
            }
            None => {}
        }
        visits.insert(dof, Visit::InProgress);
        chain.push(dof);

        let line = &self.lines[&dof];
        let mut entries = BTreeMap::<usize, f64>::new();
        let mut inhomogeneity = line.inhomogeneity;
        let mut chained = false;
        for &(source, weight) in &line.entries {
            if self.lines.contains_key(&source) {
                chained = true;
                self.resolve(source, resolved, visits, chain, n_chained)?;
                let source_line = &resolved[&source];
                inhomogeneity += weight * source_line.inhomogeneity;
                for &(s, w) in &source_line.entries {
                    *entries.entry(s).or_insert(0.0) += weight * w;
                }
            } else {
                *entries.entry(source).or_insert(0.0) += weight;
            }
        }
        if chained {
            *n_chained += 1;
        }

        chain.pop();
        visits.insert(dof, Visit::Done);
        resolved.insert(
            dof,
            ConstraintLine {
                index: dof,
                entries: entries.into_iter().filter(|&(_, w)| w != 0.0).collect(),
                inhomogeneity,
            },
        );
        Ok(())
    }

    fn assert_closed(&self) {
        assert!(self.closed, "Constraints must be closed before they are applied");
    }

    /// Sets every constrained entry of `x` to the value implied by its line.
    pub fn distribute(&self, x: &mut DVector<f64>) {
        self.assert_closed();
        for line in self.lines.values() {
            x[line.index] = line.inhomogeneity + line.entries.iter().map(|&(s, w)| w * x[s]).sum::<f64>();
        }
    }

    pub fn set_zero(&self, x: &mut DVector<f64>) {
        for &dof in self.lines.keys() {
            x[dof] = 0.0;
        }
    }

    /// Adds the lines of `other`. A DoF constrained by both must have identical lines.
    pub fn merge(&mut self, other: &AffineConstraints) -> Result<(), ConstraintError> {
        for (&dof, line) in &other.lines {
            match self.lines.get(&dof) {
                Some(existing) if existing != line => return Err(ConstraintError::InconsistentLine { dof }),
                Some(_) => {}
                None => {
                    self.lines.insert(dof, line.clone());
                    self.closed = false;
                }
            }
        }
        Ok(())
    }

    /// Where a contribution to `dof` ends up after condensation, with weights.
    pub fn targets(&self, dof: usize) -> Vec<(usize, f64)> {
        match self.lines.get(&dof) {
            Some(line) => line.entries.clone(),
            None => vec![(dof, 1.0)],
        }
    }

    /// Global indices a contribution to `dof` touches in a sparsity pattern.
    pub fn pattern_targets(&self, dof: usize, keep_constrained: bool) -> Vec<usize> {
        match self.lines.get(&dof) {
            Some(line) => {
                let mut targets: Vec<usize> = line.entries.iter().map(|&(s, _)| s).collect();
                if keep_constrained {
                    targets.push(dof);
                }
                targets
            }
            None => vec![dof],
        }
    }

    /// Adds the couplings of the local DoFs to a square pattern as they appear after
    /// condensation. Constrained DoFs always keep their diagonal entry.
    pub fn add_entries_local_to_global(
        &self,
        dofs: &[usize],
        pattern: &mut DynamicSparsityPattern,
        keep_constrained: bool,
    ) {
        let targets: Vec<Vec<usize>> = dofs
            .iter()
            .map(|&dof| self.pattern_targets(dof, keep_constrained))
            .collect();
        for rows in &targets {
            for cols in &targets {
                for &i in rows {
                    pattern.add_entries(i, cols.iter().copied());
                }
            }
        }
        for &dof in dofs {
            if self.is_constrained(dof) {
                pattern.add(dof, dof);
            }
        }
    }

    /// Rectangular variant, with `self` acting on the rows and `col_constraints` on the columns.
    pub fn add_entries_local_to_global_rectangular(
        &self,
        row_dofs: &[usize],
        col_constraints: &AffineConstraints,
        col_dofs: &[usize],
        pattern: &mut DynamicSparsityPattern,
        keep_constrained: bool,
    ) {
        let col_targets: Vec<usize> = col_dofs
            .iter()
            .flat_map(|&dof| col_constraints.pattern_targets(dof, keep_constrained))
            .collect();
        for &row in row_dofs {
            for i in self.pattern_targets(row, keep_constrained) {
                pattern.add_entries(i, col_targets.iter().copied());
            }
        }
    }

    /// Adds a local matrix (and right-hand side) to the global system while eliminating the
    /// constrained DoFs.
    ///
    /// Each constrained DoF receives `|M_ii|` on its diagonal so that the condensed matrix stays
    /// invertible. Inhomogeneities are moved to the right-hand side when one is given.
    pub fn distribute_local_to_global(
        &self,
        local_matrix: &DMatrix<f64>,
        local_rhs: Option<&DVector<f64>>,
        dofs: &[usize],
        matrix: &mut CsrMatrix<f64>,
        mut rhs: Option<&mut DVector<f64>>,
    ) -> Result<(), SparseError> {
        self.assert_closed();
        assert_eq!(local_matrix.nrows(), dofs.len());
        assert_eq!(local_matrix.ncols(), dofs.len());
        let targets: Vec<Vec<(usize, f64)>> = dofs.iter().map(|&dof| self.targets(dof)).collect();

        for (i, row_targets) in targets.iter().enumerate() {
            for (j, col_targets) in targets.iter().enumerate() {
                let m_ij = local_matrix[(i, j)];
                if m_ij == 0.0 {
                    continue;
                }
                for &(gi, wi) in row_targets {
                    for &(gj, wj) in col_targets {
                        add_to_csr(matrix, gi, gj, wi * wj * m_ij)?;
                    }
                }
            }
        }

        if let Some(rhs) = rhs.as_deref_mut() {
            for (i, row_targets) in targets.iter().enumerate() {
                let mut value = local_rhs.map_or(0.0, |f| f[i]);
                for (j, &dof) in dofs.iter().enumerate() {
                    if let Some(line) = self.lines.get(&dof) {
                        value -= local_matrix[(i, j)] * line.inhomogeneity;
                    }
                }
                for &(gi, wi) in row_targets {
                    rhs[gi] += wi * value;
                }
            }
        }

        for (i, &dof) in dofs.iter().enumerate() {
            if self.is_constrained(dof) {
                add_to_csr(matrix, dof, dof, local_matrix[(i, i)].abs())?;
            }
        }
        Ok(())
    }

    /// Adds a local vector to the global one, moving contributions of constrained DoFs to their
    /// sources.
    pub fn distribute_local_vector_to_global(&self, local: &DVector<f64>, dofs: &[usize], global: &mut DVector<f64>) {
        self.assert_closed();
        for (i, &dof) in dofs.iter().enumerate() {
            for (gi, wi) in self.targets(dof) {
                global[gi] += wi * local[i];
            }
        }
    }

    /// Rectangular variant of [`distribute_local_to_global`], with `self` acting on the rows and
    /// `col_constraints` on the columns. Inhomogeneities are ignored.
    ///
    /// [`distribute_local_to_global`]: AffineConstraints::distribute_local_to_global
    pub fn distribute_local_to_global_rectangular(
        &self,
        col_constraints: &AffineConstraints,
        local_matrix: &DMatrix<f64>,
        row_dofs: &[usize],
        col_dofs: &[usize],
        matrix: &mut CsrMatrix<f64>,
    ) -> Result<(), SparseError> {
        self.assert_closed();
        col_constraints.assert_closed();
        assert_eq!(local_matrix.nrows(), row_dofs.len());
        assert_eq!(local_matrix.ncols(), col_dofs.len());
        let col_targets: Vec<Vec<(usize, f64)>> = col_dofs
            .iter()
            .map(|&dof| col_constraints.targets(dof))
            .collect();
        for (i, &row) in row_dofs.iter().enumerate() {
            let row_targets = self.targets(row);
            for (j, targets) in col_targets.iter().enumerate() {
                let m_ij = local_matrix[(i, j)];
                if m_ij == 0.0 {
                    continue;
                }
                for &(gi, wi) in &row_targets {
                    for &(gj, wj) in targets {
                        add_to_csr(matrix, gi, gj, wi * wj * m_ij)?;
                    }
                }
            }
        }
        Ok(())
    }
}
