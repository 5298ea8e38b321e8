//! Contract between the assemblers and the physics kernels.
//!
//! The assemblers own iteration order, buffer management, and the override
//! passes. Everything physical (internal forces, inertia, compatibility) is
//! delegated to a [`Kernels`] implementation, one call per point and per
//! element.
//!
//! Residual kernels write into the full residual vector. A point kernel
//! assigns the rows returned by [`SystemIndices::point_rows`]; an element
//! kernel assigns its own rows and adds its end forces into the rows of its
//! start and stop points. Points are always visited before elements, so the
//! residual needs no zeroing between calls. Jacobian and mass kernels only
//! add into the sparse buffers, which the assemblers zero as required.

use faer::{ColMut, ColRef};

use crate::context::{AssemblyContext, BodyMotion, InitialConditions, NewmarkHistory};
use crate::error::Result;
use crate::indices::{Formulation, SystemIndices};
use crate::sparse::SparseJacobian;

/// Analysis mode and the data specific to it.
#[derive(Clone, Copy, Debug)]
pub enum Analysis<'a> {
    Static,
    /// Constant body motion, no state rates
    Steady,
    /// Time-domain initialization
    Initial(&'a InitialConditions),
    /// Rates reconstructed from the Newmark history
    Newmark(&'a NewmarkHistory),
    /// Rates given explicitly
    Dynamic(ColRef<'a, f64>),
    /// Constant mass matrix formulation without rates
    ExpandedSteady,
    /// Constant mass matrix formulation with explicit rates
    ExpandedDynamic(ColRef<'a, f64>),
}

impl<'a> Analysis<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            Analysis::Static => "static",
            Analysis::Steady => "steady",
            Analysis::Initial(_) => "initial",
            Analysis::Newmark(_) => "newmark",
            Analysis::Dynamic(_) => "dynamic",
            Analysis::ExpandedSteady => "expanded steady",
            Analysis::ExpandedDynamic(_) => "expanded dynamic",
        }
    }

    /// State layout this mode operates on
    pub fn formulation(&self) -> Formulation {
        match self {
            Analysis::Static => Formulation::Static,
            Analysis::Steady
            | Analysis::Initial(_)
            | Analysis::Newmark(_)
            | Analysis::Dynamic(_) => Formulation::Dynamic,
            Analysis::ExpandedSteady | Analysis::ExpandedDynamic(_) => Formulation::Expanded,
        }
    }

    /// Explicit state rates, if the mode has them
    pub fn dx(&self) -> Option<ColRef<'a, f64>> {
        match self {
            Analysis::Dynamic(dx) | Analysis::ExpandedDynamic(dx) => Some(*dx),
            _ => None,
        }
    }
}

/// Arguments shared by every residual and Jacobian kernel call.
#[derive(Clone, Copy)]
pub struct KernelArgs<'a> {
    /// Current state
    pub x: ColRef<'a, f64>,
    pub indices: &'a SystemIndices,
    pub ctx: &'a AssemblyContext<'a>,
    /// Scale applied to force and moment states
    pub force_scaling: f64,
    /// Body motion with accelerations resolved, `None` for static analyses
    pub body: Option<&'a BodyMotion>,
    pub analysis: Analysis<'a>,
}

/// Arguments shared by every mass-matrix kernel call.
#[derive(Clone, Copy)]
pub struct MassArgs<'a> {
    /// Current state, `None` for the expanded formulation whose mass matrix
    /// does not depend on the state
    pub x: Option<ColRef<'a, f64>>,
    pub indices: &'a SystemIndices,
    pub ctx: &'a AssemblyContext<'a>,
    pub force_scaling: f64,
}

/// Per-point and per-element physics.
pub trait Kernels {
    /// Writes the equations of `point` into `resid`
    fn point_residual(&self, resid: ColMut<'_, f64>, args: &KernelArgs<'_>, point: usize)
        -> Result<()>;

    /// Adds the derivatives of the equations of `point` with respect to the state
    fn point_jacobian(
        &self,
        jacob: &mut SparseJacobian,
        args: &KernelArgs<'_>,
        point: usize,
    ) -> Result<()>;

    /// Adds `gamma` times the derivatives of the equations of `point` with
    /// respect to the state rates
    fn point_mass_matrix(
        &self,
        jacob: &mut SparseJacobian,
        args: &MassArgs<'_>,
        point: usize,
        gamma: f64,
    ) -> Result<()>;

    /// Writes the equations of `elem` and adds its end loads to its points
    fn element_residual(&self, resid: ColMut<'_, f64>, args: &KernelArgs<'_>, elem: usize)
        -> Result<()>;

    /// Adds the derivatives of the equations touched by `elem`
    fn element_jacobian(
        &self,
        jacob: &mut SparseJacobian,
        args: &KernelArgs<'_>,
        elem: usize,
    ) -> Result<()>;

    /// Adds `gamma` times the state-rate derivatives of the equations touched by `elem`
    fn element_mass_matrix(
        &self,
        jacob: &mut SparseJacobian,
        args: &MassArgs<'_>,
        elem: usize,
        gamma: f64,
    ) -> Result<()>;
}
