use faer::ColRef;

use crate::body::check_body_accelerations;
use crate::context::{check_len, AssemblyContext};
use crate::error::{AssemblyError, Result};
use crate::indices::{Formulation, SystemIndices};
use crate::kernels::{Kernels, MassArgs};
use crate::planar::{two_dimensional_jacobian, two_dimensional_mass};
use crate::sparse::SparseJacobian;

#[derive(Clone, Copy, PartialEq)]
enum Accumulate {
    /// Zero the buffer and assemble with unit blend factor
    Replace,
    /// Add the scaled mass matrix to the buffer contents
    Add(f64),
}

#[allow(clippy::too_many_arguments)]
fn assemble_mass<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    x: Option<ColRef<f64>>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    force_scaling: f64,
    formulation: Formulation,
    accum: Accumulate,
    kernels: &K,
) -> Result<()> {
    if indices.formulation != formulation {
        return Err(AssemblyError::FormulationMismatch {
            mode: "mass matrix",
            expected: formulation,
            actual: indices.formulation,
        });
    }
    check_len("point indices", indices.n_points(), ctx.n_points())?;
    check_len("element indices", indices.n_elements(), ctx.n_elements())?;
    check_len("mass matrix rows", jacob.nrows(), indices.nstates)?;
    check_len("mass matrix columns", jacob.ncols(), indices.nstates)?;
    if let Some(x) = x {
        check_len("x", x.nrows(), indices.nstates)?;
    }
    check_body_accelerations(indices, &ctx.prescribed_conditions)?;

    let gamma = match accum {
        Accumulate::Replace => {
            jacob.fill_zero();
            1.
        }
        Accumulate::Add(gamma) => gamma,
    };

    let args = MassArgs {
        x,
        indices,
        ctx,
        force_scaling,
    };

    for point in 0..ctx.n_points() {
        kernels.point_mass_matrix(jacob, &args, point, gamma)?;
    }

    for elem in 0..ctx.n_elements() {
        kernels.element_mass_matrix(jacob, &args, elem, gamma)?;
    }

    if ctx.two_dimensional {
        match accum {
            Accumulate::Replace => two_dimensional_mass(jacob),
            // Restore the clamp the Jacobian override put on the combined matrix
            Accumulate::Add(_) => two_dimensional_jacobian(jacob)?,
        }
    }

    Ok(())
}

/// Assembles the state-rate Jacobian with explicit force scaling.
///
/// `gamma` of `None` overwrites the buffer; `Some(gamma)` adds
/// `gamma * M` to it.
pub fn system_mass_matrix_scaled<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    force_scaling: f64,
    gamma: Option<f64>,
    kernels: &K,
) -> Result<()> {
    let accum = gamma.map_or(Accumulate::Replace, Accumulate::Add);
    assemble_mass(
        jacob,
        Some(x),
        indices,
        ctx,
        force_scaling,
        Formulation::Dynamic,
        accum,
        kernels,
    )
}

/// Expanded counterpart of [`system_mass_matrix_scaled`]; the state is not
/// needed.
pub fn expanded_system_mass_matrix_scaled<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    force_scaling: f64,
    gamma: Option<f64>,
    kernels: &K,
) -> Result<()> {
    let accum = gamma.map_or(Accumulate::Replace, Accumulate::Add);
    assemble_mass(
        jacob,
        None,
        indices,
        ctx,
        force_scaling,
        Formulation::Expanded,
        accum,
        kernels,
    )
}

/// Overwrites `jacob` with the derivative of the residual with respect to
/// the state rates.
pub fn system_mass_matrix<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_mass_matrix_scaled(jacob, x, indices, ctx, ctx.force_scaling, None, kernels)
}

/// Adds `gamma` times the state-rate Jacobian to `jacob`, e.g. to form
/// `K + gamma * M` in place.
pub fn system_mass_matrix_add<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    gamma: f64,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_mass_matrix_scaled(jacob, x, indices, ctx, ctx.force_scaling, Some(gamma), kernels)
}

/// Overwrites `jacob` with the constant mass matrix of the expanded
/// formulation.
pub fn expanded_system_mass_matrix<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    expanded_system_mass_matrix_scaled(jacob, indices, ctx, ctx.force_scaling, None, kernels)
}

/// Adds `gamma` times the constant mass matrix of the expanded formulation
/// to `jacob`.
pub fn expanded_system_mass_matrix_add<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    gamma: f64,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    expanded_system_mass_matrix_scaled(jacob, indices, ctx, ctx.force_scaling, Some(gamma), kernels)
}
