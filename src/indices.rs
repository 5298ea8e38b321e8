use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assembly::Assembly;
use crate::error::{AssemblyError, Result};

/// State layout used by the system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formulation {
    /// Points carry 6 states, elements carry 6 states
    Static,
    /// Points carry 12 states, elements carry 6 states
    Dynamic,
    /// Points carry 12 states, elements carry 18 states (constant mass matrix)
    Expanded,
}

impl Formulation {
    /// Width of each point's state block
    pub fn point_width(&self) -> usize {
        match self {
            Formulation::Static => 6,
            Formulation::Dynamic | Formulation::Expanded => 12,
        }
    }

    /// Width of each element's state block
    pub fn element_width(&self) -> usize {
        match self {
            Formulation::Static | Formulation::Dynamic => 6,
            Formulation::Expanded => 18,
        }
    }
}

/// Global row and column numbering of points, elements, and body
/// accelerations.
///
/// Row and column cursors advance together, so `irow_point == icol_point`
/// and `irow_elem == icol_elem`. All offsets are zero based.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemIndices {
    pub formulation: Formulation,
    /// Total number of states
    pub nstates: usize,
    /// First equilibrium row of each point
    pub irow_point: Vec<usize>,
    /// First compatibility row of each element
    pub irow_elem: Vec<usize>,
    /// First state column of each point
    pub icol_point: Vec<usize>,
    /// First state column of each element
    pub icol_elem: Vec<usize>,
    /// State column of each body acceleration component, `None` when supplied
    /// externally. Linear xyz followed by angular xyz.
    pub icol_body: [Option<usize>; 6],
}

impl SystemIndices {
    /// Numbers the states of an assembly.
    pub fn new(assembly: &Assembly, formulation: Formulation) -> Result<Self> {
        system_indices(
            &assembly.start(),
            &assembly.stop(),
            assembly.n_points(),
            formulation,
        )
    }

    pub fn n_points(&self) -> usize {
        self.icol_point.len()
    }

    pub fn n_elements(&self) -> usize {
        self.icol_elem.len()
    }

    /// Columns of every state block belonging to a point
    pub fn point_columns(&self, point: usize) -> std::ops::Range<usize> {
        let i = self.icol_point[point];
        i..i + self.formulation.point_width()
    }

    /// Columns of every state block belonging to an element
    pub fn element_columns(&self, elem: usize) -> std::ops::Range<usize> {
        let i = self.icol_elem[elem];
        i..i + self.formulation.element_width()
    }

    /// Rows of the equations owned by a point
    pub fn point_rows(&self, point: usize) -> std::ops::Range<usize> {
        let i = self.irow_point[point];
        i..i + self.formulation.point_width()
    }

    /// Rows of the equations owned by an element
    pub fn element_rows(&self, elem: usize) -> std::ops::Range<usize> {
        let i = self.irow_elem[elem];
        i..i + self.formulation.element_width()
    }
}

/// Builds the global state numbering from element connectivity.
///
/// Elements are visited in input order. Each element numbers its start point
/// (if not yet numbered), then itself, then its stop point (if not yet
/// numbered). Point blocks are therefore ordered by first appearance in the
/// element list, not by point index.
pub fn system_indices(
    start: &[usize],
    stop: &[usize],
    n_points: usize,
    formulation: Formulation,
) -> Result<SystemIndices> {
    if start.len() != stop.len() {
        return Err(AssemblyError::MismatchedConnectivity {
            n_start: start.len(),
            n_stop: stop.len(),
        });
    }

    let n_elem = start.len();
    let point_width = formulation.point_width();
    let elem_width = formulation.element_width();

    let mut irow_point: Vec<Option<usize>> = vec![None; n_points];
    let mut icol_point: Vec<Option<usize>> = vec![None; n_points];
    let mut irow_elem = Vec::with_capacity(n_elem);
    let mut icol_elem = Vec::with_capacity(n_elem);

    let mut irow = 0;
    let mut icol = 0;

    let mut assign_point =
        |elem: usize, point: usize, irow: &mut usize, icol: &mut usize| -> Result<()> {
            if point >= n_points {
                return Err(AssemblyError::PointOutOfRange {
                    elem,
                    point,
                    n_points,
                });
            }
            if icol_point[point].is_none() {
                irow_point[point] = Some(*irow);
                icol_point[point] = Some(*icol);
                *irow += point_width;
                *icol += point_width;
            }
            Ok(())
        };

    for (elem, (&p1, &p2)) in start.iter().zip(stop.iter()).enumerate() {
        assign_point(elem, p1, &mut irow, &mut icol)?;

        irow_elem.push(irow);
        icol_elem.push(icol);
        irow += elem_width;
        icol += elem_width;

        assign_point(elem, p2, &mut irow, &mut icol)?;
    }

    let unwrap_assigned = |offsets: Vec<Option<usize>>| -> Result<Vec<usize>> {
        offsets
            .into_iter()
            .enumerate()
            .map(|(point, offset)| offset.ok_or(AssemblyError::UnreferencedPoint(point)))
            .collect()
    };
    let irow_point = unwrap_assigned(irow_point)?;
    let icol_point = unwrap_assigned(icol_point)?;

    debug!(
        ?formulation,
        n_points,
        n_elem,
        nstates = icol,
        "built system indices"
    );

    Ok(SystemIndices {
        formulation,
        nstates: icol,
        irow_point,
        irow_elem,
        icol_point,
        icol_elem,
        icol_body: [None; 6],
    })
}
