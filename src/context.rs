use std::collections::BTreeMap;

use faer::ColRef;
use itertools::Itertools;

use crate::assembly::{default_force_scaling, Assembly};
use crate::conditions::{DistributedLoads, PointMass, PrescribedConditions};
use crate::error::{AssemblyError, Result};
use crate::indices::SystemIndices;

/// Motion of the body frame the assembly is attached to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyMotion {
    /// Linear velocity (xyz)
    pub linear_velocity: [f64; 3],
    /// Angular velocity (xyz)
    pub angular_velocity: [f64; 3],
    /// Linear acceleration (xyz)
    pub linear_acceleration: [f64; 3],
    /// Angular acceleration (xyz)
    pub angular_acceleration: [f64; 3],
}

/// Everything an assembler needs besides the state and output buffers.
#[derive(Clone, Debug)]
pub struct AssemblyContext<'a> {
    pub assembly: &'a Assembly,
    pub prescribed_conditions: BTreeMap<usize, PrescribedConditions>,
    pub distributed_loads: BTreeMap<usize, DistributedLoads>,
    pub point_masses: BTreeMap<usize, PointMass>,
    pub gravity: [f64; 3],
    /// Body velocities, and accelerations used where no state carries them
    pub body: BodyMotion,
    pub force_scaling: f64,
    /// Restrict the analysis to the x-y plane
    pub two_dimensional: bool,
}

impl<'a> AssemblyContext<'a> {
    pub fn builder(assembly: &'a Assembly) -> ContextBuilder<'a> {
        ContextBuilder::new(assembly)
    }

    pub fn n_points(&self) -> usize {
        self.assembly.n_points()
    }

    pub fn n_elements(&self) -> usize {
        self.assembly.n_elements()
    }

    /// Prescribed conditions for a point, `None` when the point is free
    pub fn prescribed(&self, point: usize) -> Option<&PrescribedConditions> {
        self.prescribed_conditions.get(&point)
    }
}

pub struct ContextBuilder<'a> {
    ctx: AssemblyContext<'a>,
    force_scaling: Option<f64>,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(assembly: &'a Assembly) -> Self {
        Self {
            ctx: AssemblyContext {
                assembly,
                prescribed_conditions: BTreeMap::new(),
                distributed_loads: BTreeMap::new(),
                point_masses: BTreeMap::new(),
                gravity: [0., 0., 0.],
                body: BodyMotion::default(),
                force_scaling: 1.,
                two_dimensional: false,
            },
            force_scaling: None,
        }
    }

    pub fn prescribed(mut self, point: usize, condition: PrescribedConditions) -> Self {
        self.ctx.prescribed_conditions.insert(point, condition);
        self
    }

    pub fn prescribed_conditions(
        mut self,
        conditions: BTreeMap<usize, PrescribedConditions>,
    ) -> Self {
        self.ctx.prescribed_conditions = conditions;
        self
    }

    pub fn distributed_load(mut self, elem: usize, load: DistributedLoads) -> Self {
        self.ctx.distributed_loads.insert(elem, load);
        self
    }

    pub fn point_mass(mut self, point: usize, mass: PointMass) -> Self {
        self.ctx.point_masses.insert(point, mass);
        self
    }

    /// Sets the gravity acceleration in each direction
    pub fn gravity(mut self, x: f64, y: f64, z: f64) -> Self {
        self.ctx.gravity = [x, y, z];
        self
    }

    pub fn linear_velocity(mut self, v: [f64; 3]) -> Self {
        self.ctx.body.linear_velocity = v;
        self
    }

    pub fn angular_velocity(mut self, w: [f64; 3]) -> Self {
        self.ctx.body.angular_velocity = w;
        self
    }

    pub fn linear_acceleration(mut self, a: [f64; 3]) -> Self {
        self.ctx.body.linear_acceleration = a;
        self
    }

    pub fn angular_acceleration(mut self, alpha: [f64; 3]) -> Self {
        self.ctx.body.angular_acceleration = alpha;
        self
    }

    /// Overrides the default force scaling of the assembly
    pub fn force_scaling(mut self, force_scaling: f64) -> Self {
        self.force_scaling = Some(force_scaling);
        self
    }

    pub fn two_dimensional(mut self, two_dimensional: bool) -> Self {
        self.ctx.two_dimensional = two_dimensional;
        self
    }

    /// Validates entity references and returns the context.
    pub fn build(mut self) -> Result<AssemblyContext<'a>> {
        let n_points = self.ctx.n_points();
        let n_elem = self.ctx.n_elements();
        check_keys("prescribed condition", "point", &self.ctx.prescribed_conditions, n_points)?;
        check_keys("point mass", "point", &self.ctx.point_masses, n_points)?;
        check_keys("distributed load", "element", &self.ctx.distributed_loads, n_elem)?;

        self.ctx.force_scaling = match self.force_scaling {
            Some(s) => validate_force_scaling(s)?,
            None => default_force_scaling(self.ctx.assembly),
        };
        Ok(self.ctx)
    }
}

fn check_keys<V>(
    kind: &'static str,
    entity: &'static str,
    map: &BTreeMap<usize, V>,
    count: usize,
) -> Result<()> {
    match map.range(count..).next() {
        Some((&id, _)) => Err(AssemblyError::EntityOutOfRange {
            kind,
            entity,
            id,
            count,
        }),
        None => Ok(()),
    }
}

pub(crate) fn validate_force_scaling(force_scaling: f64) -> Result<f64> {
    if force_scaling.is_finite() && force_scaling > 0. {
        Ok(force_scaling)
    } else {
        Err(AssemblyError::InvalidForceScaling(force_scaling))
    }
}

/// Targets and rate-variable classification for time-domain initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct InitialConditions {
    /// Initial displacement of each point
    pub u0: Vec<[f64; 3]>,
    /// Initial rotation parameters of each point
    pub theta0: Vec<[f64; 3]>,
    /// Initial linear velocity of each point
    pub v0: Vec<[f64; 3]>,
    /// Initial angular velocity of each point
    pub omega0: Vec<[f64; 3]>,
    /// Target linear acceleration of each point
    pub vdot0: Vec<[f64; 3]>,
    /// Target angular acceleration of each point
    pub omegadot0: Vec<[f64; 3]>,
    /// Whether the rate of each state is an unknown in the first pass `[nstates]`
    pub rate_vars1: Vec<bool>,
    /// Whether the rate of each state is an unknown in the second pass `[nstates]`
    pub rate_vars2: Vec<bool>,
}

impl InitialConditions {
    /// Zero initial conditions with no rate variables
    pub fn new(n_points: usize, nstates: usize) -> Self {
        Self {
            u0: vec![[0.; 3]; n_points],
            theta0: vec![[0.; 3]; n_points],
            v0: vec![[0.; 3]; n_points],
            omega0: vec![[0.; 3]; n_points],
            vdot0: vec![[0.; 3]; n_points],
            omegadot0: vec![[0.; 3]; n_points],
            rate_vars1: vec![false; nstates],
            rate_vars2: vec![false; nstates],
        }
    }

    /// Target acceleration of a point DOF (linear xyz then angular xyz)
    pub fn target_acceleration(&self, point: usize, dof: usize) -> f64 {
        if dof < 3 {
            self.vdot0[point][dof]
        } else {
            self.omegadot0[point][dof - 3]
        }
    }

    pub(crate) fn validate(&self, indices: &SystemIndices) -> Result<()> {
        let n_points = indices.n_points();
        [
            ("u0", self.u0.len(), n_points),
            ("theta0", self.theta0.len(), n_points),
            ("v0", self.v0.len(), n_points),
            ("omega0", self.omega0.len(), n_points),
            ("vdot0", self.vdot0.len(), n_points),
            ("omegadot0", self.omegadot0.len(), n_points),
            ("rate_vars1", self.rate_vars1.len(), indices.nstates),
            ("rate_vars2", self.rate_vars2.len(), indices.nstates),
        ]
        .into_iter()
        .try_for_each(|(name, actual, expected)| check_len(name, actual, expected))
    }
}

/// Rate history used by the Newmark scheme.
///
/// Each `*_init` term stores `2/dt * previous + previous_rate`, so the
/// current rate is `2/dt * current - init`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewmarkHistory {
    /// Time step
    pub dt: f64,
    /// Displacement rate history of each point
    pub udot_init: Vec<[f64; 3]>,
    /// Rotation parameter rate history of each point
    pub thetadot_init: Vec<[f64; 3]>,
    /// Linear velocity rate history of each point
    pub vdot_init: Vec<[f64; 3]>,
    /// Angular velocity rate history of each point
    pub omegadot_init: Vec<[f64; 3]>,
}

/// Previous-step values and rates of one point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointHistory {
    pub u: [f64; 3],
    pub theta: [f64; 3],
    pub v: [f64; 3],
    pub omega: [f64; 3],
    pub udot: [f64; 3],
    pub thetadot: [f64; 3],
    pub vdot: [f64; 3],
    pub omegadot: [f64; 3],
}

impl NewmarkHistory {
    /// Builds the history terms from the previous step's values and rates.
    pub fn from_previous(dt: f64, previous: &[PointHistory]) -> Self {
        let init = |value: [f64; 3], rate: [f64; 3]| {
            [0, 1, 2].map(|i| 2. / dt * value[i] + rate[i])
        };
        Self {
            dt,
            udot_init: previous.iter().map(|p| init(p.u, p.udot)).collect_vec(),
            thetadot_init: previous
                .iter()
                .map(|p| init(p.theta, p.thetadot))
                .collect_vec(),
            vdot_init: previous.iter().map(|p| init(p.v, p.vdot)).collect_vec(),
            omegadot_init: previous
                .iter()
                .map(|p| init(p.omega, p.omegadot))
                .collect_vec(),
        }
    }

    pub(crate) fn validate(&self, indices: &SystemIndices) -> Result<()> {
        let n_points = indices.n_points();
        [
            ("udot_init", self.udot_init.len()),
            ("thetadot_init", self.thetadot_init.len()),
            ("vdot_init", self.vdot_init.len()),
            ("omegadot_init", self.omegadot_init.len()),
        ]
        .into_iter()
        .try_for_each(|(name, actual)| check_len(name, actual, n_points))
    }
}

/// Current rate from the implicit Newmark relation.
#[inline]
pub fn newmark_rate(current: f64, init: f64, dt: f64) -> f64 {
    2. / dt * current - init
}

/// Current rates of a 3-vector from the implicit Newmark relation.
#[inline]
pub fn newmark_rates(current: [f64; 3], init: [f64; 3], dt: f64) -> [f64; 3] {
    [0, 1, 2].map(|i| newmark_rate(current[i], init[i], dt))
}

/// Reads three consecutive state entries.
#[inline]
pub fn state_vec3(x: ColRef<f64>, col: usize) -> [f64; 3] {
    [x[col], x[col + 1], x[col + 2]]
}

pub(crate) fn check_len(name: &'static str, actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(AssemblyError::VectorLength {
            name,
            actual,
            expected,
        })
    }
}
