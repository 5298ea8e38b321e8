//! Restricts an analysis to the x-y plane.
//!
//! States are grouped in 6-wide blocks whose entries 2, 3 and 4 are the
//! out-of-plane components (z translation, x and y rotation). Row and column
//! blocks line up in every formulation because both cursors advance together
//! in multiples of 6.

use faer::{ColMut, ColRef};

use crate::error::Result;
use crate::sparse::SparseJacobian;

/// Offsets of the out-of-plane entries within each 6-wide block
const OUT_OF_PLANE: [usize; 3] = [2, 3, 4];

fn out_of_plane_rows(n: usize) -> impl Iterator<Item = usize> {
    (0..n)
        .step_by(6)
        .flat_map(|block| OUT_OF_PLANE.map(|k| block + k))
        .filter(move |&i| i < n)
}

/// Replaces out-of-plane residual entries with the matching states, which
/// drives those states to zero.
pub fn two_dimensional_residual(mut resid: ColMut<f64>, x: ColRef<f64>) {
    for i in out_of_plane_rows(resid.nrows()) {
        resid[i] = x[i];
    }
}

/// Replaces out-of-plane Jacobian rows with identity rows.
pub fn two_dimensional_jacobian(jacob: &mut SparseJacobian) -> Result<()> {
    out_of_plane_rows(jacob.nrows()).try_for_each(|i| jacob.set_identity_row(i))
}

/// Zeros out-of-plane rows of a state-rate Jacobian.
pub fn two_dimensional_mass(jacob: &mut SparseJacobian) {
    out_of_plane_rows(jacob.nrows()).for_each(|i| jacob.zero_row(i));
}
