#![allow(dead_code)]

use std::cell::RefCell;

use beamsys::context::{newmark_rates, state_vec3};
use beamsys::{Analysis, Assembly, KernelArgs, Kernels, MassArgs, Result, SparseJacobian};
use faer::ColMut;

/// Kernel invocation seen by [`LinearKernels`]
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Point(usize),
    Element(usize),
}

/// Kernels with linear contributions, so the residual is `A x + b` and the
/// Jacobian is `A`.
///
/// Point rows: `(point + 1) * x` on the matching point column.
/// Element rows: `x[elem] - x[start]` on the first six entries, `x[elem]` on
/// the rest. Each element adds `x[elem]` to the first row of its start point
/// and subtracts it from the first row of its stop point.
/// Mass: `2` on point diagonals, `3` on element diagonals.
#[derive(Default)]
pub struct LinearKernels {
    pub calls: RefCell<Vec<Call>>,
    /// Force scaling seen by each call
    pub scalings: RefCell<Vec<f64>>,
    /// Linear body acceleration seen by each residual call
    pub body_accelerations: RefCell<Vec<Option<[f64; 3]>>>,
    /// Explicit rates of the point's columns seen by each residual call
    pub rates: RefCell<Vec<Option<Vec<f64>>>>,
    /// Time step and displacement rate reconstructed by each Newmark
    /// residual call
    pub newmark: RefCell<Vec<Option<(f64, [f64; 3])>>>,
    /// Constant added to every point row
    pub offset: f64,
}

impl LinearKernels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(offset: f64) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    fn record(&self, call: Call, force_scaling: f64) {
        self.calls.borrow_mut().push(call);
        self.scalings.borrow_mut().push(force_scaling);
    }
}

impl Kernels for LinearKernels {
    fn point_residual(
        &self,
        mut resid: ColMut<'_, f64>,
        args: &KernelArgs<'_>,
        point: usize,
    ) -> Result<()> {
        self.record(Call::Point(point), args.force_scaling);
        self.body_accelerations
            .borrow_mut()
            .push(args.body.map(|b| b.linear_acceleration));
        let cols = args.indices.point_columns(point);
        self.rates
            .borrow_mut()
            .push(args.analysis.dx().map(|dx| cols.map(|c| dx[c]).collect()));
        let udot = match args.analysis {
            Analysis::Newmark(history) => {
                let u = state_vec3(args.x, args.indices.icol_point[point]);
                Some((history.dt, newmark_rates(u, history.udot_init[point], history.dt)))
            }
            _ => None,
        };
        self.newmark.borrow_mut().push(udot);
        let coeff = (point + 1) as f64;
        for (row, col) in args
            .indices
            .point_rows(point)
            .zip(args.indices.point_columns(point))
        {
            resid[row] = coeff * args.x[col] + self.offset;
        }
        Ok(())
    }

    fn point_jacobian(
        &self,
        jacob: &mut SparseJacobian,
        args: &KernelArgs<'_>,
        point: usize,
    ) -> Result<()> {
        self.record(Call::Point(point), args.force_scaling);
        let coeff = (point + 1) as f64;
        for (row, col) in args
            .indices
            .point_rows(point)
            .zip(args.indices.point_columns(point))
        {
            jacob.add(row, col, coeff)?;
        }
        Ok(())
    }

    fn point_mass_matrix(
        &self,
        jacob: &mut SparseJacobian,
        args: &MassArgs<'_>,
        point: usize,
        gamma: f64,
    ) -> Result<()> {
        self.record(Call::Point(point), args.force_scaling);
        for (row, col) in args
            .indices
            .point_rows(point)
            .zip(args.indices.point_columns(point))
        {
            jacob.add(row, col, 2. * gamma)?;
        }
        Ok(())
    }

    fn element_residual(
        &self,
        mut resid: ColMut<'_, f64>,
        args: &KernelArgs<'_>,
        elem: usize,
    ) -> Result<()> {
        self.record(Call::Element(elem), args.force_scaling);
        let indices = args.indices;
        let element = &args.ctx.assembly.elements[elem];
        let start_col = indices.icol_point[element.start];
        let elem_col = indices.icol_elem[elem];
        for (k, (row, col)) in indices
            .element_rows(elem)
            .zip(indices.element_columns(elem))
            .enumerate()
        {
            resid[row] = if k < 6 {
                args.x[col] - args.x[start_col + k]
            } else {
                args.x[col]
            };
        }
        resid[indices.irow_point[element.start]] += args.x[elem_col];
        resid[indices.irow_point[element.stop]] -= args.x[elem_col];
        Ok(())
    }

    fn element_jacobian(
        &self,
        jacob: &mut SparseJacobian,
        args: &KernelArgs<'_>,
        elem: usize,
    ) -> Result<()> {
        self.record(Call::Element(elem), args.force_scaling);
        let indices = args.indices;
        let element = &args.ctx.assembly.elements[elem];
        let start_col = indices.icol_point[element.start];
        let elem_col = indices.icol_elem[elem];
        for (k, (row, col)) in indices
            .element_rows(elem)
            .zip(indices.element_columns(elem))
            .enumerate()
        {
            jacob.add(row, col, 1.)?;
            if k < 6 {
                jacob.add(row, start_col + k, -1.)?;
            }
        }
        jacob.add(indices.irow_point[element.start], elem_col, 1.)?;
        jacob.add(indices.irow_point[element.stop], elem_col, -1.)?;
        Ok(())
    }

    fn element_mass_matrix(
        &self,
        jacob: &mut SparseJacobian,
        args: &MassArgs<'_>,
        elem: usize,
        gamma: f64,
    ) -> Result<()> {
        self.record(Call::Element(elem), args.force_scaling);
        for (row, col) in args
            .indices
            .element_rows(elem)
            .zip(args.indices.element_columns(elem))
        {
            jacob.add(row, col, 3. * gamma)?;
        }
        Ok(())
    }
}

/// Two elements in a line, listed stop-first so numbering differs from ids
pub fn chain() -> Assembly {
    Assembly::from_connectivity(
        vec![[0., 0., 0.], [1., 0., 0.], [2., 0., 0.]],
        &[1, 0],
        &[2, 1],
    )
    .unwrap()
}

/// Deterministic, non-trivial state vector
pub fn sample_state(n: usize) -> faer::Col<f64> {
    faer::Col::from_fn(n, |i| ((i * 7 + 3) % 11) as f64 / 10. - 0.4)
}
