use faer::sparse::{Pair, SparseColMat, SymbolicSparseColMat};
use faer::{Mat, MatRef};
use itertools::{chain, Itertools};

use crate::assembly::Assembly;
use crate::error::{AssemblyError, Result};
use crate::indices::SystemIndices;

/// Sparse matrix with a fixed sparsity pattern.
///
/// The pattern is built once from the system topology; assembly only
/// rewrites the stored values, so the same pattern is reused for every
/// Newton iteration. Writes outside the pattern are rejected.
#[derive(Clone, Debug)]
pub struct SparseJacobian {
    sp: SparseColMat<usize, f64>,
    /// Value positions of each row `[nrows][..]`
    row_slots: Vec<Vec<usize>>,
}

impl PartialEq for SparseJacobian {
    fn eq(&self, other: &Self) -> bool {
        self.same_pattern(other) && self.values() == other.values()
    }
}

impl SparseJacobian {
    /// Creates a zero matrix whose pattern contains the given `(row, col)`
    /// entries. Duplicates are merged.
    pub fn from_entries(
        nrows: usize,
        ncols: usize,
        entries: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self> {
        let pairs = entries
            .into_iter()
            .map(|(row, col)| {
                if row >= nrows || col >= ncols {
                    Err(AssemblyError::EntryOutsidePattern { row, col })
                } else {
                    Ok(Pair::new(row, col))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let (symbolic, _) = SymbolicSparseColMat::try_new_from_indices(nrows, ncols, &pairs)
            .map_err(|err| AssemblyError::PatternCreation(format!("{err:?}")))?;
        let data = vec![0.; symbolic.compute_nnz()];
        let sp = SparseColMat::<usize, f64>::new(symbolic, data);

        let mut row_slots = vec![Vec::new(); nrows];
        sp.symbolic()
            .row_idx()
            .iter()
            .enumerate()
            .for_each(|(slot, &row)| row_slots[row].push(slot));

        Ok(Self { sp, row_slots })
    }

    /// Creates the system Jacobian pattern.
    ///
    /// Point rows couple to the point's own block, every element attached to
    /// the point, and the far endpoint of those elements. Element rows couple
    /// to the element block and both endpoint blocks. Every row couples to the
    /// body acceleration columns and to its own diagonal.
    pub fn for_system(indices: &SystemIndices, assembly: &Assembly) -> Result<Self> {
        let n = indices.nstates;
        if indices.n_points() != assembly.n_points() {
            return Err(AssemblyError::VectorLength {
                name: "point indices",
                actual: indices.n_points(),
                expected: assembly.n_points(),
            });
        }
        if indices.n_elements() != assembly.n_elements() {
            return Err(AssemblyError::VectorLength {
                name: "element indices",
                actual: indices.n_elements(),
                expected: assembly.n_elements(),
            });
        }

        let body_cols = indices.icol_body.iter().flatten().copied().collect_vec();

        // Columns touched by the equations of each point
        let mut point_cols: Vec<Vec<usize>> = (0..indices.n_points())
            .map(|p| indices.point_columns(p).collect_vec())
            .collect_vec();
        assembly.elements.iter().enumerate().for_each(|(e, elem)| {
            let cols = chain!(
                indices.element_columns(e),
                indices.point_columns(elem.start),
                indices.point_columns(elem.stop)
            )
            .collect_vec();
            point_cols[elem.start].extend(cols.iter().copied());
            point_cols[elem.stop].extend(cols.iter().copied());
        });

        let point_entries = (0..indices.n_points()).flat_map(|p| {
            let cols =
                chain!(point_cols[p].iter().copied(), body_cols.iter().copied()).collect_vec();
            indices
                .point_rows(p)
                .cartesian_product(cols)
                .collect_vec()
        });

        let elem_entries = assembly.elements.iter().enumerate().flat_map(|(e, elem)| {
            let cols = chain!(
                indices.element_columns(e),
                indices.point_columns(elem.start),
                indices.point_columns(elem.stop),
                body_cols.iter().copied()
            )
            .collect_vec();
            indices
                .element_rows(e)
                .cartesian_product(cols)
                .collect_vec()
        });

        let diagonal = (0..n).map(|i| (i, i));

        Self::from_entries(n, n, chain!(point_entries, elem_entries, diagonal))
    }

    pub fn nrows(&self) -> usize {
        self.sp.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.sp.ncols()
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.sp.val().len()
    }

    pub fn values(&self) -> &[f64] {
        self.sp.val()
    }

    /// The underlying faer matrix, e.g. for factorization
    pub fn matrix(&self) -> &SparseColMat<usize, f64> {
        &self.sp
    }

    // Row indices are sorted within each column
    fn slot(&self, row: usize, col: usize) -> Option<usize> {
        if col >= self.ncols() {
            return None;
        }
        let symbolic = self.sp.symbolic();
        let (a, b) = (symbolic.col_ptr()[col], symbolic.col_ptr()[col + 1]);
        symbolic.row_idx()[a..b]
            .binary_search(&row)
            .ok()
            .map(|k| a + k)
    }

    fn slot_checked(&self, row: usize, col: usize) -> Result<usize> {
        self.slot(row, col)
            .ok_or(AssemblyError::EntryOutsidePattern { row, col })
    }

    /// Whether `(row, col)` is part of the pattern
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.slot(row, col).is_some()
    }

    /// Value at `(row, col)`, zero for entries outside the pattern
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.slot(row, col).map_or(0., |k| self.sp.val()[k])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let k = self.slot_checked(row, col)?;
        self.sp.val_mut()[k] = value;
        Ok(())
    }

    pub fn add(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let k = self.slot_checked(row, col)?;
        self.sp.val_mut()[k] += value;
        Ok(())
    }

    /// Adds `scale * block` with its top-left corner at `(row, col)`
    pub fn add_block(
        &mut self,
        row: usize,
        col: usize,
        block: MatRef<f64>,
        scale: f64,
    ) -> Result<()> {
        for j in 0..block.ncols() {
            for i in 0..block.nrows() {
                let v = block[(i, j)];
                if v != 0. {
                    self.add(row + i, col + j, scale * v)?;
                }
            }
        }
        Ok(())
    }

    /// Zeros every stored value, keeping the pattern
    pub fn fill_zero(&mut self) {
        self.sp.val_mut().iter_mut().for_each(|v| *v = 0.);
    }

    /// Zeros every stored value in a row
    pub fn zero_row(&mut self, row: usize) {
        if let Some(slots) = self.row_slots.get(row) {
            let values = self.sp.val_mut();
            slots.iter().for_each(|&k| values[k] = 0.);
        }
    }

    /// Replaces a row with the corresponding row of the identity matrix
    pub fn set_identity_row(&mut self, row: usize) -> Result<()> {
        let k = self.slot_checked(row, row)?;
        self.zero_row(row);
        self.sp.val_mut()[k] = 1.;
        Ok(())
    }

    /// Whether two matrices share shape and pattern
    pub fn same_pattern(&self, other: &SparseJacobian) -> bool {
        let (a, b) = (self.sp.symbolic(), other.sp.symbolic());
        a.nrows() == b.nrows()
            && a.ncols() == b.ncols()
            && a.col_ptr() == b.col_ptr()
            && a.row_idx() == b.row_idx()
    }

    /// Adds `scale * other` into this matrix. Patterns must match.
    pub fn add_scaled(&mut self, other: &SparseJacobian, scale: f64) -> Result<()> {
        if !self.same_pattern(other) {
            return Err(AssemblyError::PatternMismatch(format!(
                "{}x{} ({} nnz) vs {}x{} ({} nnz)",
                self.nrows(),
                self.ncols(),
                self.nnz(),
                other.nrows(),
                other.ncols(),
                other.nnz()
            )));
        }
        self.sp
            .val_mut()
            .iter_mut()
            .zip(other.sp.val().iter())
            .for_each(|(a, b)| *a += scale * b);
        Ok(())
    }

    pub fn to_dense(&self) -> Mat<f64> {
        let symbolic = self.sp.symbolic();
        let (col_ptr, row_idx, values) = (symbolic.col_ptr(), symbolic.row_idx(), self.sp.val());
        let mut m = Mat::<f64>::zeros(self.nrows(), self.ncols());
        (0..self.ncols()).for_each(|j| {
            (col_ptr[j]..col_ptr[j + 1]).for_each(|k| m[(row_idx[k], j)] = values[k]);
        });
        m
    }
}
