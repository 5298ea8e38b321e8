mod common;

use approx::assert_relative_eq;
use beamsys::jacobian::*;
use beamsys::mass::*;
use beamsys::planar::{two_dimensional_jacobian, two_dimensional_residual};
use beamsys::residual::*;
use beamsys::{
    Assembly, AssemblyContext, AssemblyError, Formulation, InitialConditions, NewmarkHistory,
    PointHistory, PrescribedConditions, SparseJacobian, SystemIndices,
};
use common::{chain, sample_state, Call, LinearKernels};
use faer::Col;
use itertools::Itertools;

fn dense_product(jacob: &SparseJacobian, x: &Col<f64>) -> Vec<f64> {
    let m = jacob.to_dense();
    (0..m.nrows())
        .map(|i| (0..m.ncols()).map(|j| m[(i, j)] * x[j]).sum::<f64>())
        .collect_vec()
}

fn assert_identity_row(jacob: &SparseJacobian, row: usize) {
    let m = jacob.to_dense();
    for j in 0..m.ncols() {
        assert_eq!(m[(row, j)], if j == row { 1. } else { 0. }, "row {row} col {j}");
    }
}

/// Checks `R(x) - R(0) == K x` for kernels with affine residuals.
fn check_linear(
    assembly: &Assembly,
    indices: &SystemIndices,
    residual: &dyn Fn(&mut Col<f64>, &Col<f64>),
    jacobian: &dyn Fn(&mut SparseJacobian, &Col<f64>),
) {
    let n = indices.nstates;
    let x = sample_state(n);
    let mut r0 = Col::<f64>::zeros(n);
    let mut r1 = Col::<f64>::zeros(n);
    residual(&mut r0, &Col::<f64>::zeros(n));
    residual(&mut r1, &x);

    let mut k = SparseJacobian::for_system(indices, assembly).unwrap();
    jacobian(&mut k, &x);
    let kx = dense_product(&k, &x);
    for i in 0..n {
        assert_relative_eq!(r1[i] - r0[i], kx[i], epsilon = 1e-12);
    }
}

#[test]
fn test_points_visited_before_elements() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly).build().unwrap();
    let indices = SystemIndices::new(&assembly, Formulation::Static).unwrap();
    let x = Col::<f64>::zeros(indices.nstates);
    let kernels = LinearKernels::new();

    let mut r = Col::<f64>::zeros(indices.nstates);
    static_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
    let expected = vec![
        Call::Point(0),
        Call::Point(1),
        Call::Point(2),
        Call::Element(0),
        Call::Element(1),
    ];
    assert_eq!(*kernels.calls.borrow(), expected);

    kernels.calls.borrow_mut().clear();
    let mut k = SparseJacobian::for_system(&indices, &assembly).unwrap();
    static_system_jacobian(&mut k, x.as_ref(), &indices, &ctx, &kernels).unwrap();
    assert_eq!(*kernels.calls.borrow(), expected);
}

#[test]
fn test_residual_overwrites_stale_values() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly).build().unwrap();
    let indices = SystemIndices::new(&assembly, Formulation::Dynamic).unwrap();
    let x = sample_state(indices.nstates);

    let mut r = Col::from_fn(indices.nstates, |_| f64::NAN);
    steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &LinearKernels::new()).unwrap();
    assert!(r.as_ref().iter().all(|v| v.is_finite()));
}

#[test]
fn test_jacobian_zeroed_between_calls() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly).build().unwrap();
    let indices = SystemIndices::new(&assembly, Formulation::Static).unwrap();
    let x = sample_state(indices.nstates);
    let kernels = LinearKernels::new();

    let mut k = SparseJacobian::for_system(&indices, &assembly).unwrap();
    static_system_jacobian(&mut k, x.as_ref(), &indices, &ctx, &kernels).unwrap();
    let first = k.values().to_vec();
    static_system_jacobian(&mut k, x.as_ref(), &indices, &ctx, &kernels).unwrap();
    assert_eq!(k.values(), first.as_slice());
}

#[test]
fn test_jacobian_matches_residual_in_every_mode() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly).build().unwrap();
    let kernels = LinearKernels::with_offset(0.5);

    let indices = SystemIndices::new(&assembly, Formulation::Static).unwrap();
    check_linear(
        &assembly,
        &indices,
        &|r, x| static_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap(),
        &|k, x| static_system_jacobian(k, x.as_ref(), &indices, &ctx, &kernels).unwrap(),
    );

    let indices = SystemIndices::new(&assembly, Formulation::Dynamic).unwrap();
    let dx = sample_state(indices.nstates);
    let history = NewmarkHistory::from_previous(0.1, &[PointHistory::default(); 3]);
    let mut initial = InitialConditions::new(3, indices.nstates);
    initial.rate_vars2.fill(true);
    initial.vdot0[1] = [1., 2., 3.];
    check_linear(
        &assembly,
        &indices,
        &|r, x| steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap(),
        &|k, x| steady_system_jacobian(k, x.as_ref(), &indices, &ctx, &kernels).unwrap(),
    );
    check_linear(
        &assembly,
        &indices,
        &|r, x| {
            newmark_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &history, &kernels)
                .unwrap()
        },
        &|k, x| newmark_system_jacobian(k, x.as_ref(), &indices, &ctx, &history, &kernels).unwrap(),
    );
    check_linear(
        &assembly,
        &indices,
        &|r, x| {
            dynamic_system_residual(r.as_mut(), dx.as_ref(), x.as_ref(), &indices, &ctx, &kernels)
                .unwrap()
        },
        &|k, x| {
            dynamic_system_jacobian(k, dx.as_ref(), x.as_ref(), &indices, &ctx, &kernels).unwrap()
        },
    );
    check_linear(
        &assembly,
        &indices,
        &|r, x| {
            initial_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &initial, &kernels)
                .unwrap()
        },
        &|k, x| initial_system_jacobian(k, x.as_ref(), &indices, &ctx, &initial, &kernels).unwrap(),
    );

    let indices = SystemIndices::new(&assembly, Formulation::Expanded).unwrap();
    let dx = sample_state(indices.nstates);
    check_linear(
        &assembly,
        &indices,
        &|r, x| {
            expanded_steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels)
                .unwrap()
        },
        &|k, x| expanded_steady_system_jacobian(k, x.as_ref(), &indices, &ctx, &kernels).unwrap(),
    );
    check_linear(
        &assembly,
        &indices,
        &|r, x| {
            expanded_dynamic_system_residual(
                r.as_mut(),
                dx.as_ref(),
                x.as_ref(),
                &indices,
                &ctx,
                &kernels,
            )
            .unwrap()
        },
        &|k, x| {
            expanded_dynamic_system_jacobian(k, dx.as_ref(), x.as_ref(), &indices, &ctx, &kernels)
                .unwrap()
        },
    );
}

#[test]
fn test_initial_substitution_gate() {
    let assembly = chain();
    // Axes 0 and 2 of point 0 are displacement prescribed
    let partial = PrescribedConditions::default()
        .displacement(0, 0.)
        .displacement(2, 0.);
    let ctx = AssemblyContext::builder(&assembly)
        .prescribed(0, partial)
        .build()
        .unwrap();
    let indices = SystemIndices::new(&assembly, Formulation::Dynamic).unwrap();
    let n = indices.nstates;
    let x = sample_state(n);
    let kernels = LinearKernels::with_offset(0.5);

    let mut initial = InitialConditions::new(3, n);
    initial.rate_vars2.fill(true);
    // Not an unknown of the second pass
    initial.rate_vars2[indices.icol_point[1] + 6 + 2] = false;
    // Already solved in the first pass
    initial.rate_vars1[indices.icol_point[2] + 6 + 5] = true;
    initial.vdot0[1] = [1., 2., 3.];
    initial.omegadot0[0] = [-1., -2., -3.];
    initial.omegadot0[2] = [4., 5., 6.];

    let mut r = Col::<f64>::zeros(n);
    initial_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &initial, &kernels).unwrap();
    let mut k = SparseJacobian::for_system(&indices, &assembly).unwrap();
    initial_system_jacobian(&mut k, x.as_ref(), &indices, &ctx, &initial, &kernels).unwrap();

    let mut plain_r = Col::<f64>::zeros(n);
    steady_system_residual(plain_r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
    let mut plain_k = SparseJacobian::for_system(&indices, &assembly).unwrap();
    steady_system_jacobian(&mut plain_k, x.as_ref(), &indices, &ctx, &kernels).unwrap();

    let substituted = itertools::chain!(
        [1, 3, 4, 5].map(|i| (0, i)),
        [0, 1, 3, 4, 5].map(|i| (1, i)),
        (0..5).map(|i| (2, i))
    )
    .collect_vec();

    let dense = k.to_dense();
    let plain_dense = plain_k.to_dense();
    for (point, i) in (0..3).cartesian_product(0..6) {
        let row = indices.irow_point[point] + i;
        if substituted.contains(&(point, i)) {
            let col = indices.icol_point[point] + i;
            let target = initial.target_acceleration(point, i);
            assert_relative_eq!(r[row], x[col] - target);
            assert_identity_row(&k, row);
        } else {
            assert_relative_eq!(r[row], plain_r[row]);
            for j in 0..n {
                assert_eq!(dense[(row, j)], plain_dense[(row, j)], "row {row} col {j}");
            }
        }
    }
}

#[test]
fn test_rates_reach_kernels() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly).build().unwrap();
    let point_rates = |indices: &SystemIndices, dx: &Col<f64>| {
        (0..3)
            .map(|p| Some(indices.point_columns(p).map(|c| dx[c]).collect_vec()))
            .collect_vec()
    };

    let indices = SystemIndices::new(&assembly, Formulation::Dynamic).unwrap();
    let n = indices.nstates;
    let x = sample_state(n);
    let dx = Col::<f64>::from_fn(n, |i| 0.25 * i as f64);
    let mut r = Col::<f64>::zeros(n);
    let kernels = LinearKernels::new();
    dynamic_system_residual(r.as_mut(), dx.as_ref(), x.as_ref(), &indices, &ctx, &kernels)
        .unwrap();
    assert_eq!(*kernels.rates.borrow(), point_rates(&indices, &dx));
    assert!(kernels.newmark.borrow().iter().all(|v| v.is_none()));

    let kernels = LinearKernels::new();
    steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
    assert!(kernels.rates.borrow().iter().all(|v| v.is_none()));

    let previous = [0.5, 1., 1.5].map(|s| PointHistory {
        u: [s, 2. * s, 3. * s],
        udot: [1., 0., -1.],
        ..Default::default()
    });
    let history = NewmarkHistory::from_previous(0.1, &previous);
    let kernels = LinearKernels::new();
    newmark_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &history, &kernels).unwrap();
    assert!(kernels.rates.borrow().iter().all(|v| v.is_none()));
    for (point, seen) in kernels.newmark.borrow().iter().enumerate() {
        let (dt, udot) = seen.unwrap();
        assert_eq!(dt, 0.1);
        let col = indices.icol_point[point];
        for i in 0..3 {
            let init = 2. / 0.1 * previous[point].u[i] + previous[point].udot[i];
            assert_relative_eq!(udot[i], 2. / 0.1 * x[col + i] - init, epsilon = 1e-12);
        }
    }

    let indices = SystemIndices::new(&assembly, Formulation::Expanded).unwrap();
    let n = indices.nstates;
    let x = sample_state(n);
    let dx = Col::<f64>::from_fn(n, |i| 1. - 0.5 * i as f64);
    let mut r = Col::<f64>::zeros(n);
    let kernels = LinearKernels::new();
    expanded_dynamic_system_residual(
        r.as_mut(),
        dx.as_ref(),
        x.as_ref(),
        &indices,
        &ctx,
        &kernels,
    )
    .unwrap();
    assert_eq!(*kernels.rates.borrow(), point_rates(&indices, &dx));

    let kernels = LinearKernels::new();
    expanded_steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
    assert!(kernels.rates.borrow().iter().all(|v| v.is_none()));
}

#[test]
fn test_two_dimensional_override() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly)
        .two_dimensional(true)
        .build()
        .unwrap();
    let kernels = LinearKernels::with_offset(0.5);

    for formulation in [Formulation::Static, Formulation::Dynamic, Formulation::Expanded] {
        let indices = SystemIndices::new(&assembly, formulation).unwrap();
        let n = indices.nstates;
        let x = sample_state(n);

        let mut r = Col::<f64>::zeros(n);
        let mut k = SparseJacobian::for_system(&indices, &assembly).unwrap();
        match formulation {
            Formulation::Static => {
                static_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
                static_system_jacobian(&mut k, x.as_ref(), &indices, &ctx, &kernels).unwrap();
            }
            Formulation::Dynamic => {
                steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
                steady_system_jacobian(&mut k, x.as_ref(), &indices, &ctx, &kernels).unwrap();
            }
            Formulation::Expanded => {
                expanded_steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels)
                    .unwrap();
                expanded_steady_system_jacobian(&mut k, x.as_ref(), &indices, &ctx, &kernels)
                    .unwrap();
            }
        }

        for i in (0..n).filter(|i| [2, 3, 4].contains(&(i % 6))) {
            assert_eq!(r[i], x[i]);
            assert_identity_row(&k, i);
        }

        let (r_once, k_once) = (r.clone(), k.clone());
        two_dimensional_residual(r.as_mut(), x.as_ref());
        two_dimensional_jacobian(&mut k).unwrap();
        assert!(r.as_ref().iter().zip(r_once.as_ref().iter()).all(|(a, b)| a == b));
        assert_eq!(k, k_once);
    }
}

#[test]
fn test_mass_matrix_add() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly).build().unwrap();
    let indices = SystemIndices::new(&assembly, Formulation::Dynamic).unwrap();
    let x = sample_state(indices.nstates);
    let kernels = LinearKernels::new();

    let mut k = SparseJacobian::for_system(&indices, &assembly).unwrap();
    steady_system_jacobian(&mut k, x.as_ref(), &indices, &ctx, &kernels).unwrap();
    let mut m = SparseJacobian::for_system(&indices, &assembly).unwrap();
    m.set(0, 0, 99.).unwrap();
    system_mass_matrix(&mut m, x.as_ref(), &indices, &ctx, &kernels).unwrap();
    assert_eq!(m.get(0, 0), 2.);

    let gamma = 0.25;
    let mut combined = k.clone();
    system_mass_matrix_add(&mut combined, gamma, x.as_ref(), &indices, &ctx, &kernels).unwrap();

    let mut expected = k.clone();
    expected.add_scaled(&m, gamma).unwrap();
    for (a, b) in combined.values().iter().zip(expected.values()) {
        assert_relative_eq!(a, b, epsilon = 1e-14);
    }
}

#[test]
fn test_expanded_mass_matrix() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly).build().unwrap();
    let indices = SystemIndices::new(&assembly, Formulation::Expanded).unwrap();
    let kernels = LinearKernels::new();

    let mut m = SparseJacobian::for_system(&indices, &assembly).unwrap();
    expanded_system_mass_matrix(&mut m, &indices, &ctx, &kernels).unwrap();
    let e0 = indices.irow_elem[0];
    assert_eq!(m.get(e0 + 17, indices.icol_elem[0] + 17), 3.);
    let p0 = indices.irow_point[0];
    assert_eq!(m.get(p0 + 11, indices.icol_point[0] + 11), 2.);

    let mut k = m.clone();
    expanded_system_mass_matrix_add(&mut k, 2., &indices, &ctx, &kernels).unwrap();
    assert_eq!(k.get(e0, indices.icol_elem[0]), 9.);

    // The standard assembler rejects the expanded layout
    let x = Col::<f64>::zeros(indices.nstates);
    let err = system_mass_matrix(&mut m, x.as_ref(), &indices, &ctx, &kernels).unwrap_err();
    assert!(matches!(err, AssemblyError::FormulationMismatch { .. }));
}

#[test]
fn test_two_dimensional_mass_matrix() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly)
        .two_dimensional(true)
        .build()
        .unwrap();
    let indices = SystemIndices::new(&assembly, Formulation::Dynamic).unwrap();
    let x = sample_state(indices.nstates);
    let kernels = LinearKernels::new();

    let mut m = SparseJacobian::for_system(&indices, &assembly).unwrap();
    system_mass_matrix(&mut m, x.as_ref(), &indices, &ctx, &kernels).unwrap();
    let mut k = SparseJacobian::for_system(&indices, &assembly).unwrap();
    steady_system_jacobian(&mut k, x.as_ref(), &indices, &ctx, &kernels).unwrap();
    system_mass_matrix_add(&mut k, 0.5, x.as_ref(), &indices, &ctx, &kernels).unwrap();

    let dense = m.to_dense();
    for i in (0..indices.nstates).filter(|i| [2, 3, 4].contains(&(i % 6))) {
        assert!((0..indices.nstates).all(|j| dense[(i, j)] == 0.));
        assert_identity_row(&k, i);
    }
    assert_eq!(m.get(indices.irow_point[0], indices.icol_point[0]), 2.);
}

#[test]
fn test_force_scaling_from_context() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly)
        .force_scaling(4.)
        .build()
        .unwrap();
    let indices = SystemIndices::new(&assembly, Formulation::Static).unwrap();
    let x = Col::<f64>::zeros(indices.nstates);
    let kernels = LinearKernels::new();

    let mut r = Col::<f64>::zeros(indices.nstates);
    static_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
    assert!(kernels.scalings.borrow().iter().all(|&s| s == 4.));

    kernels.scalings.borrow_mut().clear();
    system_residual(
        r.as_mut(),
        x.as_ref(),
        &indices,
        &ctx,
        8.,
        beamsys::Analysis::Static,
        &kernels,
    )
    .unwrap();
    assert!(kernels.scalings.borrow().iter().all(|&s| s == 8.));
}

#[test]
fn test_body_acceleration_from_state() {
    let assembly = chain();
    let claim = PrescribedConditions::fixed().load(0, 0.);
    let ctx = AssemblyContext::builder(&assembly)
        .prescribed(2, claim)
        .linear_acceleration([9., 8., 7.])
        .build()
        .unwrap();
    let indices = SystemIndices::new(&assembly, Formulation::Dynamic)
        .unwrap()
        .with_body_accelerations(&ctx.prescribed_conditions)
        .unwrap();
    let col = indices.icol_point[2];
    assert_eq!(indices.icol_body[0], Some(col));

    let mut x = Col::<f64>::zeros(indices.nstates);
    x[col] = -1.5;
    let kernels = LinearKernels::new();
    let mut r = Col::<f64>::zeros(indices.nstates);
    steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
    assert!(kernels
        .body_accelerations
        .borrow()
        .iter()
        .all(|&a| a == Some([-1.5, 8., 7.])));

    // Body acceleration columns are part of every row's pattern
    let k = SparseJacobian::for_system(&indices, &assembly).unwrap();
    assert!((0..indices.nstates).all(|row| k.contains(row, col)));

    let indices = SystemIndices::new(&assembly, Formulation::Static).unwrap();
    let x = Col::<f64>::zeros(indices.nstates);
    let kernels = LinearKernels::new();
    let mut r = Col::<f64>::zeros(indices.nstates);
    static_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
    assert!(kernels.body_accelerations.borrow().iter().all(|a| a.is_none()));
}

#[test]
fn test_body_acceleration_columns_follow_context() {
    let assembly = chain();
    let claim = PrescribedConditions::fixed().load(0, 0.);
    let ctx = AssemblyContext::builder(&assembly)
        .prescribed(2, claim)
        .linear_acceleration([9., 8., 7.])
        .build()
        .unwrap();
    let kernels = LinearKernels::new();

    // Indices built without the claim would silently read the constant
    let indices = SystemIndices::new(&assembly, Formulation::Dynamic).unwrap();
    let x = Col::<f64>::zeros(indices.nstates);
    let mut r = Col::<f64>::zeros(indices.nstates);
    let err =
        steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap_err();
    let col = indices.icol_point[2];
    assert!(matches!(
        err,
        AssemblyError::BodyAccelerationMismatch { expected, actual }
            if expected[0] == Some(col) && actual == [None; 6]
    ));

    let mut k = SparseJacobian::for_system(&indices, &assembly).unwrap();
    let err = dynamic_system_jacobian(&mut k, x.as_ref(), x.as_ref(), &indices, &ctx, &kernels)
        .unwrap_err();
    assert!(matches!(err, AssemblyError::BodyAccelerationMismatch { .. }));

    let mut m = SparseJacobian::for_system(&indices, &assembly).unwrap();
    let err = system_mass_matrix(&mut m, x.as_ref(), &indices, &ctx, &kernels).unwrap_err();
    assert!(matches!(err, AssemblyError::BodyAccelerationMismatch { .. }));
    assert!(kernels.calls.borrow().is_empty());

    // Static analyses carry no body motion, so the claim is irrelevant
    let indices = SystemIndices::new(&assembly, Formulation::Static).unwrap();
    let x = Col::<f64>::zeros(indices.nstates);
    let mut r = Col::<f64>::zeros(indices.nstates);
    static_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap();
}

#[test]
fn test_rejects_mismatched_inputs() {
    let assembly = chain();
    let ctx = AssemblyContext::builder(&assembly).build().unwrap();
    let kernels = LinearKernels::new();

    let indices = SystemIndices::new(&assembly, Formulation::Static).unwrap();
    let x = Col::<f64>::zeros(indices.nstates);
    let mut r = Col::<f64>::zeros(indices.nstates);
    let err =
        steady_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &kernels).unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::FormulationMismatch {
            expected: Formulation::Dynamic,
            actual: Formulation::Static,
            ..
        }
    ));

    let short = Col::<f64>::zeros(indices.nstates - 1);
    let err =
        static_system_residual(r.as_mut(), short.as_ref(), &indices, &ctx, &kernels).unwrap_err();
    assert!(matches!(err, AssemblyError::VectorLength { name: "x", .. }));

    let mut small = SparseJacobian::from_entries(3, 3, [(0, 0)]).unwrap();
    let err = static_system_jacobian(&mut small, x.as_ref(), &indices, &ctx, &kernels).unwrap_err();
    assert!(matches!(err, AssemblyError::VectorLength { .. }));

    let indices = SystemIndices::new(&assembly, Formulation::Dynamic).unwrap();
    let x = Col::<f64>::zeros(indices.nstates);
    let mut r = Col::<f64>::zeros(indices.nstates);
    let initial = InitialConditions::new(2, indices.nstates);
    let err = initial_system_residual(r.as_mut(), x.as_ref(), &indices, &ctx, &initial, &kernels)
        .unwrap_err();
    assert!(matches!(err, AssemblyError::VectorLength { name: "u0", .. }));

    // No kernel ran on rejected input
    assert!(kernels.calls.borrow().is_empty());
}
