use std::collections::BTreeMap;

use faer::{Col, ColMut, ColRef};
use tracing::debug;

use crate::assembly::{default_force_scaling, Assembly};
use crate::conditions::PrescribedConditions;
use crate::context::{validate_force_scaling, AssemblyContext, InitialConditions, NewmarkHistory};
use crate::error::Result;
use crate::indices::{Formulation, SystemIndices};
use crate::jacobian::system_jacobian;
use crate::kernels::{Analysis, Kernels};
use crate::mass::{expanded_system_mass_matrix_scaled, system_mass_matrix_scaled};
use crate::residual::system_residual;
use crate::sparse::SparseJacobian;

/// Data shared by every system kind.
#[derive(Clone, Debug)]
pub struct SystemCore {
    pub indices: SystemIndices,
    /// Scale applied to force and moment states
    pub force_scaling: f64,
    /// Current time
    pub t: f64,
}

impl SystemCore {
    fn new(
        assembly: &Assembly,
        formulation: Formulation,
        prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
        force_scaling: Option<f64>,
    ) -> Result<Self> {
        let indices = SystemIndices::new(assembly, formulation)?
            .with_body_accelerations(prescribed_conditions)?;
        let force_scaling = match force_scaling {
            Some(s) => validate_force_scaling(s)?,
            None => default_force_scaling(assembly),
        };
        debug!(
            ?formulation,
            nstates = indices.nstates,
            force_scaling,
            "allocated system"
        );
        Ok(Self {
            indices,
            force_scaling,
            t: 0.,
        })
    }

    fn rebuild_body_indices(
        &mut self,
        prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
    ) -> Result<()> {
        self.indices.icol_body =
            crate::body::body_frame_acceleration_indices(&self.indices, prescribed_conditions)?;
        Ok(())
    }
}

/// System for static analyses.
#[derive(Clone, Debug)]
pub struct StaticSystem {
    /// State `[nstates]`
    pub x: Col<f64>,
    /// Residual `[nstates]`
    pub r: Col<f64>,
    /// Jacobian `[nstates][nstates]`
    pub k: SparseJacobian,
    pub core: SystemCore,
}

impl StaticSystem {
    pub fn new(
        assembly: &Assembly,
        prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
        force_scaling: Option<f64>,
    ) -> Result<Self> {
        let core = SystemCore::new(
            assembly,
            Formulation::Static,
            prescribed_conditions,
            force_scaling,
        )?;
        let n = core.indices.nstates;
        Ok(Self {
            x: Col::zeros(n),
            r: Col::zeros(n),
            k: SparseJacobian::for_system(&core.indices, assembly)?,
            core,
        })
    }

    /// Zeros the state, leaving residual and Jacobian untouched
    pub fn reset_state(&mut self) {
        self.x.fill(0.);
    }

    pub fn static_residual<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_residual(
            self.r.as_mut(),
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Analysis::Static,
            kernels,
        )
    }

    pub fn static_jacobian<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_jacobian(
            &mut self.k,
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Analysis::Static,
            kernels,
        )
    }
}

/// System for steady, initialization, Newmark, and general dynamic analyses.
#[derive(Clone, Debug)]
pub struct DynamicSystem {
    /// State `[nstates]`
    pub x: Col<f64>,
    /// State rates `[nstates]`
    pub dx: Col<f64>,
    /// Residual `[nstates]`
    pub r: Col<f64>,
    /// Jacobian `[nstates][nstates]`
    pub k: SparseJacobian,
    /// State-rate Jacobian `[nstates][nstates]`
    pub m: SparseJacobian,
    pub core: SystemCore,
}

impl DynamicSystem {
    pub fn new(
        assembly: &Assembly,
        prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
        force_scaling: Option<f64>,
    ) -> Result<Self> {
        let core = SystemCore::new(
            assembly,
            Formulation::Dynamic,
            prescribed_conditions,
            force_scaling,
        )?;
        let n = core.indices.nstates;
        let k = SparseJacobian::for_system(&core.indices, assembly)?;
        Ok(Self {
            x: Col::zeros(n),
            dx: Col::zeros(n),
            r: Col::zeros(n),
            m: k.clone(),
            k,
            core,
        })
    }

    /// Zeros the state and its rates, leaving residual and Jacobians untouched
    pub fn reset_state(&mut self) {
        self.x.fill(0.);
        self.dx.fill(0.);
    }

    fn residual<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        analysis: Analysis,
        kernels: &K,
    ) -> Result<()> {
        system_residual(
            self.r.as_mut(),
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            analysis,
            kernels,
        )
    }

    fn jacobian<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        analysis: Analysis,
        kernels: &K,
    ) -> Result<()> {
        system_jacobian(
            &mut self.k,
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            analysis,
            kernels,
        )
    }

    pub fn steady_residual<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        self.residual(ctx, Analysis::Steady, kernels)
    }

    pub fn steady_jacobian<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        self.jacobian(ctx, Analysis::Steady, kernels)
    }

    pub fn initial_residual<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        initial: &InitialConditions,
        kernels: &K,
    ) -> Result<()> {
        self.residual(ctx, Analysis::Initial(initial), kernels)
    }

    pub fn initial_jacobian<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        initial: &InitialConditions,
        kernels: &K,
    ) -> Result<()> {
        self.jacobian(ctx, Analysis::Initial(initial), kernels)
    }

    pub fn newmark_residual<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        history: &NewmarkHistory,
        kernels: &K,
    ) -> Result<()> {
        self.residual(ctx, Analysis::Newmark(history), kernels)
    }

    pub fn newmark_jacobian<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        history: &NewmarkHistory,
        kernels: &K,
    ) -> Result<()> {
        self.jacobian(ctx, Analysis::Newmark(history), kernels)
    }

    /// Residual using the stored state rates `dx`
    pub fn dynamic_residual<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_residual(
            self.r.as_mut(),
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Analysis::Dynamic(self.dx.as_ref()),
            kernels,
        )
    }

    /// Jacobian using the stored state rates `dx`
    pub fn dynamic_jacobian<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_jacobian(
            &mut self.k,
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Analysis::Dynamic(self.dx.as_ref()),
            kernels,
        )
    }

    /// Overwrites `m` with the state-rate Jacobian
    pub fn mass_matrix<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_mass_matrix_scaled(
            &mut self.m,
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            None,
            kernels,
        )
    }

    /// Adds `gamma` times the state-rate Jacobian into `k`
    pub fn add_mass_to_jacobian<K: Kernels + ?Sized>(
        &mut self,
        gamma: f64,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_mass_matrix_scaled(
            &mut self.k,
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Some(gamma),
            kernels,
        )
    }
}

/// System for the constant mass matrix formulation.
#[derive(Clone, Debug)]
pub struct ExpandedSystem {
    /// State `[nstates]`
    pub x: Col<f64>,
    /// State rates `[nstates]`
    pub dx: Col<f64>,
    /// Residual `[nstates]`
    pub r: Col<f64>,
    /// Jacobian `[nstates][nstates]`
    pub k: SparseJacobian,
    /// Constant state-rate Jacobian `[nstates][nstates]`
    pub m: SparseJacobian,
    pub core: SystemCore,
}

impl ExpandedSystem {
    pub fn new(
        assembly: &Assembly,
        prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
        force_scaling: Option<f64>,
    ) -> Result<Self> {
        let core = SystemCore::new(
            assembly,
            Formulation::Expanded,
            prescribed_conditions,
            force_scaling,
        )?;
        let n = core.indices.nstates;
        let k = SparseJacobian::for_system(&core.indices, assembly)?;
        Ok(Self {
            x: Col::zeros(n),
            dx: Col::zeros(n),
            r: Col::zeros(n),
            m: k.clone(),
            k,
            core,
        })
    }

    /// Zeros the state and its rates, leaving residual and Jacobians untouched
    pub fn reset_state(&mut self) {
        self.x.fill(0.);
        self.dx.fill(0.);
    }

    pub fn steady_residual<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_residual(
            self.r.as_mut(),
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Analysis::ExpandedSteady,
            kernels,
        )
    }

    pub fn steady_jacobian<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_jacobian(
            &mut self.k,
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Analysis::ExpandedSteady,
            kernels,
        )
    }

    pub fn dynamic_residual<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_residual(
            self.r.as_mut(),
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Analysis::ExpandedDynamic(self.dx.as_ref()),
            kernels,
        )
    }

    pub fn dynamic_jacobian<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        system_jacobian(
            &mut self.k,
            self.x.as_ref(),
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Analysis::ExpandedDynamic(self.dx.as_ref()),
            kernels,
        )
    }

    /// Overwrites `m` with the constant mass matrix
    pub fn mass_matrix<K: Kernels + ?Sized>(
        &mut self,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        expanded_system_mass_matrix_scaled(
            &mut self.m,
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            None,
            kernels,
        )
    }

    /// Adds `gamma` times the constant mass matrix into `k`
    pub fn add_mass_to_jacobian<K: Kernels + ?Sized>(
        &mut self,
        gamma: f64,
        ctx: &AssemblyContext,
        kernels: &K,
    ) -> Result<()> {
        expanded_system_mass_matrix_scaled(
            &mut self.k,
            &self.core.indices,
            ctx,
            self.core.force_scaling,
            Some(gamma),
            kernels,
        )
    }
}

/// A system of one kind, fixed at construction.
#[derive(Clone, Debug)]
pub enum System {
    Static(StaticSystem),
    Dynamic(DynamicSystem),
    Expanded(ExpandedSystem),
}

impl System {
    /// Allocates a system of the requested formulation.
    ///
    /// `force_scaling` of `None` selects [`default_force_scaling`].
    pub fn new(
        assembly: &Assembly,
        formulation: Formulation,
        prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
        force_scaling: Option<f64>,
    ) -> Result<Self> {
        Ok(match formulation {
            Formulation::Static => System::Static(StaticSystem::new(
                assembly,
                prescribed_conditions,
                force_scaling,
            )?),
            Formulation::Dynamic => System::Dynamic(DynamicSystem::new(
                assembly,
                prescribed_conditions,
                force_scaling,
            )?),
            Formulation::Expanded => System::Expanded(ExpandedSystem::new(
                assembly,
                prescribed_conditions,
                force_scaling,
            )?),
        })
    }

    pub fn formulation(&self) -> Formulation {
        self.indices().formulation
    }

    pub fn core(&self) -> &SystemCore {
        match self {
            System::Static(s) => &s.core,
            System::Dynamic(s) => &s.core,
            System::Expanded(s) => &s.core,
        }
    }

    fn core_mut(&mut self) -> &mut SystemCore {
        match self {
            System::Static(s) => &mut s.core,
            System::Dynamic(s) => &mut s.core,
            System::Expanded(s) => &mut s.core,
        }
    }

    pub fn indices(&self) -> &SystemIndices {
        &self.core().indices
    }

    pub fn force_scaling(&self) -> f64 {
        self.core().force_scaling
    }

    pub fn set_force_scaling(&mut self, force_scaling: f64) -> Result<()> {
        self.core_mut().force_scaling = validate_force_scaling(force_scaling)?;
        Ok(())
    }

    pub fn time(&self) -> f64 {
        self.core().t
    }

    pub fn set_time(&mut self, t: f64) {
        self.core_mut().t = t;
    }

    /// Recomputes the body acceleration columns and the sparsity patterns
    /// that depend on them.
    pub fn update_body_accelerations(
        &mut self,
        assembly: &Assembly,
        prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
    ) -> Result<()> {
        self.core_mut().rebuild_body_indices(prescribed_conditions)?;
        let pattern = SparseJacobian::for_system(self.indices(), assembly)?;
        match self {
            System::Static(s) => s.k = pattern,
            System::Dynamic(s) => {
                s.m = pattern.clone();
                s.k = pattern;
            }
            System::Expanded(s) => {
                s.m = pattern.clone();
                s.k = pattern;
            }
        }
        Ok(())
    }

    pub fn x(&self) -> ColRef<'_, f64> {
        match self {
            System::Static(s) => s.x.as_ref(),
            System::Dynamic(s) => s.x.as_ref(),
            System::Expanded(s) => s.x.as_ref(),
        }
    }

    pub fn x_mut(&mut self) -> ColMut<'_, f64> {
        match self {
            System::Static(s) => s.x.as_mut(),
            System::Dynamic(s) => s.x.as_mut(),
            System::Expanded(s) => s.x.as_mut(),
        }
    }

    /// State rates, `None` for static systems
    pub fn dx(&self) -> Option<ColRef<'_, f64>> {
        match self {
            System::Static(_) => None,
            System::Dynamic(s) => Some(s.dx.as_ref()),
            System::Expanded(s) => Some(s.dx.as_ref()),
        }
    }

    pub fn dx_mut(&mut self) -> Option<ColMut<'_, f64>> {
        match self {
            System::Static(_) => None,
            System::Dynamic(s) => Some(s.dx.as_mut()),
            System::Expanded(s) => Some(s.dx.as_mut()),
        }
    }

    pub fn residual(&self) -> ColRef<'_, f64> {
        match self {
            System::Static(s) => s.r.as_ref(),
            System::Dynamic(s) => s.r.as_ref(),
            System::Expanded(s) => s.r.as_ref(),
        }
    }

    pub fn jacobian(&self) -> &SparseJacobian {
        match self {
            System::Static(s) => &s.k,
            System::Dynamic(s) => &s.k,
            System::Expanded(s) => &s.k,
        }
    }

    /// State-rate Jacobian, `None` for static systems
    pub fn mass_matrix(&self) -> Option<&SparseJacobian> {
        match self {
            System::Static(_) => None,
            System::Dynamic(s) => Some(&s.m),
            System::Expanded(s) => Some(&s.m),
        }
    }

    /// Zeros the state (and rates), leaving residual and Jacobians untouched
    pub fn reset_state(&mut self) {
        match self {
            System::Static(s) => s.reset_state(),
            System::Dynamic(s) => s.reset_state(),
            System::Expanded(s) => s.reset_state(),
        }
    }
}
