use faer::{ColMut, ColRef};
use itertools::Itertools;
use tracing::trace;

use crate::body::{body_accelerations, check_body_accelerations};
use crate::context::{check_len, AssemblyContext, BodyMotion, InitialConditions, NewmarkHistory};
use crate::error::{AssemblyError, Result};
use crate::indices::SystemIndices;
use crate::kernels::{Analysis, KernelArgs, Kernels};
use crate::planar::two_dimensional_residual;

/// Checks that the indices, context, state, and mode data agree.
pub(crate) fn check_inputs(
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    analysis: &Analysis,
) -> Result<()> {
    if indices.formulation != analysis.formulation() {
        return Err(AssemblyError::FormulationMismatch {
            mode: analysis.name(),
            expected: analysis.formulation(),
            actual: indices.formulation,
        });
    }
    check_len("point indices", indices.n_points(), ctx.n_points())?;
    check_len("element indices", indices.n_elements(), ctx.n_elements())?;
    check_len("x", x.nrows(), indices.nstates)?;
    if let Some(dx) = analysis.dx() {
        check_len("dx", dx.nrows(), indices.nstates)?;
    }
    // Static analyses never read body accelerations
    if !matches!(analysis, Analysis::Static) {
        check_body_accelerations(indices, &ctx.prescribed_conditions)?;
    }
    match analysis {
        Analysis::Initial(ic) => ic.validate(indices),
        Analysis::Newmark(history) => history.validate(indices),
        _ => Ok(()),
    }
}

/// Body motion seen by the kernels, `None` for static analyses.
pub(crate) fn resolve_body_motion(
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    analysis: &Analysis,
) -> Option<BodyMotion> {
    if let Analysis::Static = analysis {
        return None;
    }
    let (linear_acceleration, angular_acceleration) = body_accelerations(
        x,
        &indices.icol_body,
        ctx.body.linear_acceleration,
        ctx.body.angular_acceleration,
    );
    Some(BodyMotion {
        linear_acceleration,
        angular_acceleration,
        ..ctx.body
    })
}

/// Point DOFs whose equilibrium equation is replaced by an acceleration
/// constraint during initialization, as `(point, dof)` pairs.
///
/// A DOF is replaced when its displacement is not prescribed and the rate of
/// its velocity state is an unknown in the second pass but not the first.
pub(crate) fn initial_substitutions(
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    ic: &InitialConditions,
) -> Vec<(usize, usize)> {
    (0..indices.n_points())
        .cartesian_product(0..6)
        .filter(|&(point, i)| {
            let pd = ctx.prescribed(point).is_some_and(|pc| pc.pd[i]);
            let rate_col = indices.icol_point[point] + 6 + i;
            !pd && !ic.rate_vars1[rate_col] && ic.rate_vars2[rate_col]
        })
        .collect_vec()
}

/// Assembles the residual of any analysis mode.
///
/// Every row is assigned by the point and element kernels, then the
/// initialization substitution and the planar override are applied.
pub fn system_residual<K: Kernels + ?Sized>(
    mut resid: ColMut<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    force_scaling: f64,
    analysis: Analysis,
    kernels: &K,
) -> Result<()> {
    check_inputs(x, indices, ctx, &analysis)?;
    check_len("residual", resid.nrows(), indices.nstates)?;

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
        kernels.point_residual(resid.as_mut(), &args, point)?;
    }

    for elem in 0..ctx.n_elements() {
        kernels.element_residual(resid.as_mut(), &args, elem)?;
    }

    if let Analysis::Initial(ic) = analysis {
        for (point, i) in initial_substitutions(indices, ctx, ic) {
            let irow = indices.irow_point[point] + i;
            let icol = indices.icol_point[point] + i;
            resid[irow] = x[icol] - ic.target_acceleration(point, i);
            trace!(
                point,
                dof = i,
                row = irow,
                "acceleration constraint replaces equilibrium"
            );
        }
    }

    if ctx.two_dimensional {
        two_dimensional_residual(resid.as_mut(), x);
    }

    Ok(())
}

/// Static residual: no rates, no body motion.
pub fn static_system_residual<K: Kernels + ?Sized>(
    resid: ColMut<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_residual(resid, x, indices, ctx, ctx.force_scaling, Analysis::Static, kernels)
}

/// Steady-state residual under constant body motion.
pub fn steady_system_residual<K: Kernels + ?Sized>(
    resid: ColMut<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_residual(resid, x, indices, ctx, ctx.force_scaling, Analysis::Steady, kernels)
}

/// Residual for solving the initial state rates of a time-domain analysis.
pub fn initial_system_residual<K: Kernels + ?Sized>(
    resid: ColMut<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    initial: &InitialConditions,
    kernels: &K,
) -> Result<()> {
    system_residual(
        resid,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::Initial(initial),
        kernels,
    )
}

/// Residual of one Newmark step.
pub fn newmark_system_residual<K: Kernels + ?Sized>(
    resid: ColMut<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    history: &NewmarkHistory,
    kernels: &K,
) -> Result<()> {
    system_residual(
        resid,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::Newmark(history),
        kernels,
    )
}

/// Residual with explicit state rates.
pub fn dynamic_system_residual<K: Kernels + ?Sized>(
    resid: ColMut<f64>,
    dx: ColRef<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_residual(
        resid,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::Dynamic(dx),
        kernels,
    )
}

/// Steady-state residual of the constant mass matrix formulation.
pub fn expanded_steady_system_residual<K: Kernels + ?Sized>(
    resid: ColMut<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_residual(
        resid,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::ExpandedSteady,
        kernels,
    )
}

/// Residual of the constant mass matrix formulation with explicit rates.
pub fn expanded_dynamic_system_residual<K: Kernels + ?Sized>(
    resid: ColMut<f64>,
    dx: ColRef<f64>,
    x: ColRef<f64>,
    indices: &SystemIndices,
    ctx: &AssemblyContext,
    kernels: &K,
) -> Result<()> {
    system_residual(
        resid,
        x,
        indices,
        ctx,
        ctx.force_scaling,
        Analysis::ExpandedDynamic(dx),
        kernels,
    )
}
