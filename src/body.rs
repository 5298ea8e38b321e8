use std::collections::BTreeMap;

use faer::ColRef;
use tracing::debug;

use crate::conditions::PrescribedConditions;
use crate::error::{AssemblyError, Result};
use crate::indices::SystemIndices;

/// Resolves which state column carries each body acceleration component.
///
/// Component `i` (linear xyz then angular xyz) is claimed by the first point,
/// in point index order, whose DOF `i` is both displacement and load
/// prescribed. Its column is the point's first column plus `i`. Later
/// claimants are ignored. Components nobody claims are external constants.
pub fn body_frame_acceleration_indices(
    indices: &SystemIndices,
    prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
) -> Result<[Option<usize>; 6]> {
    let n_points = indices.n_points();
    if let Some((&point, _)) = prescribed_conditions.range(n_points..).next() {
        return Err(AssemblyError::EntityOutOfRange {
            kind: "prescribed condition",
            entity: "point",
            id: point,
            count: n_points,
        });
    }

    let mut icol: [Option<usize>; 6] = [None; 6];
    for (i, slot) in icol.iter_mut().enumerate() {
        let mut claimants = prescribed_conditions
            .iter()
            .filter(|(_, pc)| pc.claims_body_acceleration(i))
            .map(|(&point, _)| point);

        if let Some(point) = claimants.next() {
            *slot = Some(indices.icol_point[point] + i);
            debug!(
                component = i,
                point,
                col = indices.icol_point[point] + i,
                "body acceleration is a state"
            );
        }
        for point in claimants {
            debug!(component = i, point, "ignoring additional body acceleration claim");
        }
    }

    Ok(icol)
}

impl SystemIndices {
    /// Stores the body acceleration columns for the prescribed conditions.
    pub fn with_body_accelerations(
        mut self,
        prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
    ) -> Result<Self> {
        self.icol_body = body_frame_acceleration_indices(&self, prescribed_conditions)?;
        Ok(self)
    }
}

/// Checks that the stored body acceleration columns match the ones the
/// prescribed conditions resolve to.
pub(crate) fn check_body_accelerations(
    indices: &SystemIndices,
    prescribed_conditions: &BTreeMap<usize, PrescribedConditions>,
) -> Result<()> {
    let expected = body_frame_acceleration_indices(indices, prescribed_conditions)?;
    if expected == indices.icol_body {
        Ok(())
    } else {
        Err(AssemblyError::BodyAccelerationMismatch {
            expected,
            actual: indices.icol_body,
        })
    }
}

/// Returns the linear and angular body accelerations.
///
/// Components with a state column are read from `x`; the rest come from the
/// supplied defaults.
pub fn body_accelerations(
    x: ColRef<f64>,
    icol_body: &[Option<usize>; 6],
    default_linear: [f64; 3],
    default_angular: [f64; 3],
) -> ([f64; 3], [f64; 3]) {
    let value = |i: usize, default: f64| icol_body[i].map_or(default, |col| x[col]);
    (
        [0, 1, 2].map(|i| value(i, default_linear[i])),
        [0, 1, 2].map(|i| value(i + 3, default_angular[i])),
    )
}
