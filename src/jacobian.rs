use faer::ColRef;

use crate::context::{check_len, AssemblyContext, InitialConditions, NewmarkHistory};
use crate::error::Result;
use crate::indices::SystemIndices;
use crate::kernels::{Analysis, KernelArgs, Kernels};
use crate::planar::two_dimensional_jacobian;
use crate::residual::{check_inputs, initial_substitutions, resolve_body_motion};
use crate::sparse::SparseJacobian;

/// Assembles the Jacobian of any analysis mode.
///
/// The buffer is zeroed first since kernels only add the entries they own.
/// Rows replaced during initialization become identity rows, matching the
/// acceleration constraint written by the residual.
pub fn system_jacobian<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    force_scaling: f64,
    analysis: Analysis,
    kernels: &K,
) -> Result<()> {
    check_inputs(x, indices, ctx, &analysis)?;
    check_len("jacobian rows", jacob.nrows(), indices.nstates)?;
    check_len("jacobian columns", jacob.ncols(), indices.nstates)?;

    jacob.fill_zero();

    let body = resolve_body_motion(x, indices, ctx, &analysis);
    let args = KernelArgs {
        x,
        indices,
        ctx,
        force_scaling,
        body: body.as_ref(),
        analysis,
    };

    for point in 0..ctx.n_points() {
        kernels.point_jacobian(jacob, &args, point)?;
    }

    for elem in 0..ctx.n_elements() {
        kernels.element_jacobian(jacob, &args, elem)?;
    }

    if let Analysis::Initial(ic) = analysis {
        for (point, i) in initial_substitutions(indices, ctx, ic) {
            jacob.set_identity_row(indices.irow_point[point] + i)?;
        }
    }

    if ctx.two_dimensional {
        two_dimensional_jacobian(jacob)?;
    }

    Ok(())
}

pub fn static_system_jacobian<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_jacobian(jacob, x, indices, ctx, ctx.force_scaling, Analysis::Static, kernels)
}

pub fn steady_system_jacobian<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_jacobian(jacob, x, indices, ctx, ctx.force_scaling, Analysis::Steady, kernels)
}

pub fn initial_system_jacobian<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    initial: &InitialConditions,
    kernels: &K,
) -> Result<()> {
    system_jacobian(
        jacob,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::Initial(initial),
        kernels,
    )
}

pub fn newmark_system_jacobian<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    history: &NewmarkHistory,
    kernels: &K,
) -> Result<()> {
    system_jacobian(
        jacob,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::Newmark(history),
        kernels,
    )
}

pub fn dynamic_system_jacobian<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    dx: ColRef<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_jacobian(
        jacob,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::Dynamic(dx),
        kernels,
    )
}

pub fn expanded_steady_system_jacobian<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_jacobian(
        jacob,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::ExpandedSteady,
        kernels,
    )
}

pub fn expanded_dynamic_system_jacobian<K: Kernels + ?Sized>(
    jacob: &mut SparseJacobian,
    dx: ColRef<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_jacobian(
        jacob,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::ExpandedDynamic(dx),
        kernels,
    )
}
