use faer::Mat;
use serde::{Deserialize, Serialize};

/// Boundary condition applied at a point.
///
/// Each of the six degrees of freedom (xyz translation, xyz rotation) may be
/// displacement-prescribed (`pd`) and/or load-prescribed (`pl`). A DOF that
/// is both marks the body acceleration for that direction as an unknown
/// carried by this point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrescribedConditions {
    /// Displacement is prescribed
    pub pd: [bool; 6],
    /// Load (or acceleration) is prescribed
    pub pl: [bool; 6],
    /// Prescribed displacement or load values
    #[serde(default)]
    pub value: [f64; 6],
    /// Follower load values
    #[serde(default)]
    pub follower: [f64; 6],
}

impl PrescribedConditions {
    /// Every displacement and rotation held at zero
    pub fn fixed() -> Self {
        Self {
            pd: [true; 6],
            ..Default::default()
        }
    }

    /// Every load held at zero (free point)
    pub fn free() -> Self {
        Self {
            pl: [true; 6],
            ..Default::default()
        }
    }

    /// Prescribes displacement of a single DOF
    pub fn displacement(mut self, dof: usize, value: f64) -> Self {
        self.pd[dof] = true;
        self.value[dof] = value;
        self
    }

    /// Prescribes a load on a single DOF
    pub fn load(mut self, dof: usize, value: f64) -> Self {
        self.pl[dof] = true;
        self.value[dof] = value;
        self
    }

    /// Whether the DOF's body acceleration is carried by this point
    pub fn claims_body_acceleration(&self, dof: usize) -> bool {
        self.pd[dof] && self.pl[dof]
    }
}

/// Rigid mass attached to a point.
#[derive(Clone, Debug)]
pub struct PointMass {
    /// Mass matrix about the point `[6][6]`
    pub mass: Mat<f64>,
}

impl PointMass {
    /// Point mass with translational mass `m` and no rotary inertia
    pub fn translational(m: f64) -> Self {
        Self {
            mass: Mat::from_fn(6, 6, |i, j| if i == j && i < 3 { m } else { 0. }),
        }
    }
}

/// Distributed loads on an element, integrated over its length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributedLoads {
    /// Force per unit length (xyz)
    pub f: [f64; 3],
    /// Moment per unit length (xyz)
    pub m: [f64; 3],
    /// Follower force per unit length (xyz)
    pub f_follow: [f64; 3],
    /// Follower moment per unit length (xyz)
    pub m_follow: [f64; 3],
}
