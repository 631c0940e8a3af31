use approx::assert_relative_eq;

use betr::cluster::{pick_cfd_points, pick_ffd_points, sample_l1_ball};
use betr::gradients::{
    estimate_gradients_cfd, estimate_gradients_ffd, estimate_gradients_rbf, GradientError,
    RbfGradientOptions,
};
use betr::rbf::RadialBasis;
use betr::sample::{Discretization, SampleSet};

/// Deterministic uniform stream for cluster generation.
fn lcg(mut state: u64) -> impl FnMut() -> f64 {
    move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Affine forward map R^2 -> R^3 used by the finite-difference tests.
fn affine_map(x: &[f64]) -> Vec<f64> {
    vec![
        3.0 * x[0] - 2.0 * x[1] + 1.0,
        1.0 * x[0] + 4.0 * x[1] - 1.0,
        0.5 * x[0] + 0.25 * x[1],
    ]
}

const AFFINE_ROWS: [[f64; 2]; 3] = [[3.0, -2.0], [1.0, 4.0], [0.5, 0.25]];

fn run_map(inputs: &SampleSet<f64>, map: impl Fn(&[f64]) -> Vec<f64>) -> Discretization<f64> {
    let rows: Vec<Vec<f64>> = inputs.values().iter().map(|x| map(x)).collect();
    let output_dim = rows[0].len();
    let outputs = SampleSet::from_values(output_dim, rows).unwrap();
    Discretization::new(inputs.clone(), outputs).unwrap()
}

fn centers() -> SampleSet<f64> {
    SampleSet::from_values(
        2,
        vec![vec![0.2, 0.4], vec![0.6, 0.1], vec![0.8, 0.9]],
    )
    .unwrap()
}

#[test]
fn ffd_is_exact_on_affine_maps() {
    let cluster = pick_ffd_points(&centers(), &[0.1, 0.05]);
    let disc = run_map(&cluster, |x| affine_map(x));
    let estimate = estimate_gradients_ffd(&disc, 3, false).unwrap();

    assert!(estimate.failures.is_empty());
    assert_eq!(estimate.jacobians.num_centers(), 3);
    for c in 0..3 {
        let jac = estimate.jacobians.center(c).unwrap();
        for (q, row) in jac.iter().enumerate() {
            for (i, &v) in row.iter().enumerate() {
                assert_relative_eq!(v, AFFINE_ROWS[q][i], max_relative = 1e-10);
            }
        }
    }
}

#[test]
fn cfd_is_exact_on_affine_maps() {
    let cluster = pick_cfd_points(&centers(), &[0.1, 0.05]);
    let disc = run_map(&cluster, |x| affine_map(x));
    let estimate = estimate_gradients_cfd(&disc, 3, false).unwrap();

    assert!(estimate.failures.is_empty());
    for c in 0..3 {
        let jac = estimate.jacobians.center(c).unwrap();
        for (q, row) in jac.iter().enumerate() {
            for (i, &v) in row.iter().enumerate() {
                assert_relative_eq!(v, AFFINE_ROWS[q][i], max_relative = 1e-10);
            }
        }
    }
}

#[test]
fn normalization_cancels_output_scaling() {
    // Scaling one QoI by a constant rescales its sample range by the
    // same constant; normalized Jacobians are unchanged.
    let cluster = pick_ffd_points(&centers(), &[0.1, 0.05]);
    let plain = run_map(&cluster, |x| affine_map(x));
    let scaled = run_map(&cluster, |x| {
        let mut out = affine_map(x);
        out[1] *= 10.0;
        out
    });

    let a = estimate_gradients_ffd(&plain, 3, true).unwrap();
    let b = estimate_gradients_ffd(&scaled, 3, true).unwrap();

    for c in 0..3 {
        let ja = a.jacobians.center(c).unwrap();
        let jb = b.jacobians.center(c).unwrap();
        for q in 0..3 {
            for i in 0..2 {
                assert_relative_eq!(ja[q][i], jb[q][i], max_relative = 1e-12);
            }
        }
    }
}

#[test]
fn rbf_differentiates_its_own_kernel_exactly() {
    // Data lying in the kernel's own span is reproduced by the
    // interpolant, so its derivative at the center matches the kernel
    // derivative up to solver rounding.
    let samples = vec![
        vec![0.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![-1.0, 0.2],
        vec![0.3, -1.0],
        vec![1.0, 1.0],
        vec![-0.7, -0.6],
        vec![0.5, 0.4],
    ];
    let kernel = RadialBasis::Gaussian;
    let shape = 1.5;
    let basis = samples[2].clone();

    let inputs = SampleSet::from_values(2, samples.clone()).unwrap();
    let disc = run_map(&inputs, |x| {
        let r = ((x[0] - basis[0]).powi(2) + (x[1] - basis[1]).powi(2)).sqrt();
        vec![kernel.eval(r, shape)]
    });

    let opts = RbfGradientOptions {
        num_neighbors: Some(8),
        kernel,
        shape,
        normalize: false,
    };
    let estimate = estimate_gradients_rbf(&disc, 1, &opts).unwrap();
    assert!(estimate.failures.is_empty());

    let center = &samples[0];
    let r = ((center[0] - basis[0]).powi(2) + (center[1] - basis[1]).powi(2)).sqrt();
    let jac = estimate.jacobians.center(0).unwrap();
    for i in 0..2 {
        let expected = kernel.eval_dxi(r, center[i] - basis[i], shape);
        assert_relative_eq!(jac[0][i], expected, max_relative = 1e-4, epsilon = 1e-8);
    }
}

#[test]
fn rbf_recovers_linear_map_gradients() {
    let one_center = SampleSet::from_values(2, vec![vec![0.0, 0.0]]).unwrap();
    let cluster = sample_l1_ball(&one_center, 30, &[1.0, 1.0], lcg(7));
    let disc = run_map(&cluster, |x| {
        vec![3.0 * x[0] - 2.0 * x[1] + 1.0, 0.5 * x[0] + x[1]]
    });

    let opts = RbfGradientOptions {
        num_neighbors: Some(31),
        kernel: RadialBasis::C4Matern,
        shape: 1.0,
        normalize: false,
    };
    let estimate = estimate_gradients_rbf(&disc, 1, &opts).unwrap();
    assert!(estimate.failures.is_empty());

    let jac = estimate.jacobians.center(0).unwrap();
    let expected = [[3.0, -2.0], [0.5, 1.0]];
    for q in 0..2 {
        for i in 0..2 {
            assert_relative_eq!(jac[q][i], expected[q][i], max_relative = 0.25);
        }
    }
}

#[test]
fn rbf_estimation_is_bit_for_bit_deterministic() {
    let one_center = SampleSet::from_values(2, vec![vec![0.1, -0.2]]).unwrap();
    let cluster = sample_l1_ball(&one_center, 20, &[0.8, 0.8], lcg(42));
    let disc = run_map(&cluster, |x| {
        vec![x[0] * x[0] - x[1], x[0] + x[1] * x[1], (x[0] + x[1]).sin()]
    });

    let opts = RbfGradientOptions::default();
    let a = estimate_gradients_rbf(&disc, 1, &opts).unwrap();
    let b = estimate_gradients_rbf(&disc, 1, &opts).unwrap();

    assert_eq!(a.jacobians, b.jacobians);
}

#[test]
fn every_sample_can_be_a_center() {
    let inputs = SampleSet::from_values(
        2,
        vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![0.5, 0.2],
            vec![0.2, 0.8],
        ],
    )
    .unwrap();
    let disc = run_map(&inputs, |x| vec![x[0] + 2.0 * x[1]]);

    let estimate = estimate_gradients_rbf(&disc, 6, &RbfGradientOptions::default()).unwrap();
    assert_eq!(
        estimate.jacobians.num_centers() + estimate.failures.len(),
        6
    );
    assert_eq!(
        estimate.centers.num_samples(),
        estimate.jacobians.num_centers()
    );
}

#[test]
fn too_few_samples_reports_insufficient_data() {
    let inputs = SampleSet::from_values(2, vec![vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
    let disc = run_map(&inputs, |x| vec![x[0]]);

    let err = estimate_gradients_rbf(&disc, 2, &RbfGradientOptions::default()).unwrap_err();
    match err {
        GradientError::NoValidCenters { failures } => {
            assert_eq!(failures.len(), 2);
            assert_eq!(
                failures[0],
                GradientError::InsufficientData {
                    center: 0,
                    needed: 3,
                    available: 2
                }
            );
        }
        other => panic!("expected NoValidCenters, got {:?}", other),
    }
}

#[test]
fn duplicate_stencil_points_report_degenerate_geometry() {
    let inputs = SampleSet::from_values(
        2,
        vec![
            vec![0.0, 0.0],
            vec![0.5, 0.5],
            vec![0.5, 0.5],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        ],
    )
    .unwrap();
    let disc = run_map(&inputs, |x| vec![x[0] - x[1]]);

    let err = estimate_gradients_rbf(&disc, 1, &RbfGradientOptions::default()).unwrap_err();
    match err {
        GradientError::NoValidCenters { failures } => {
            assert_eq!(
                failures[0],
                GradientError::DegenerateGeometry {
                    center: 0,
                    fit_size: 4
                }
            );
        }
        other => panic!("expected NoValidCenters, got {:?}", other),
    }
}

#[test]
fn source_discretization_is_not_mutated() {
    let cluster = pick_ffd_points(&centers(), &[0.1, 0.05]);
    let disc = run_map(&cluster, |x| affine_map(x));
    let before = disc.clone();
    let _ = estimate_gradients_ffd(&disc, 3, true).unwrap();
    assert_eq!(disc, before);
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_rbf_matches_serial_exactly() {
    use betr::parallel::estimate_gradients_rbf_par;

    let center_set = SampleSet::from_values(2, vec![vec![0.0, 0.0], vec![0.3, 0.3]]).unwrap();
    let cluster = sample_l1_ball(&center_set, 25, &[0.9, 0.9], lcg(3));
    let disc = run_map(&cluster, |x| {
        vec![x[0] * x[1], x[0] - x[1], x[0].cos() + x[1]]
    });

    let opts = RbfGradientOptions {
        num_neighbors: Some(10),
        ..RbfGradientOptions::default()
    };
    let serial = estimate_gradients_rbf(&disc, 2, &opts).unwrap();
    let parallel = estimate_gradients_rbf_par(&disc, 2, &opts).unwrap();

    assert_eq!(serial.jacobians, parallel.jacobians);
    assert_eq!(serial.failures, parallel.failures);
}
