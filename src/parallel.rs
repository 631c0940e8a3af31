//! Rayon-parallel variants of the gradient estimators.
//!
//! Centers are independent, so the per-center work is mapped across a
//! thread pool. Results are collected in center order and the per-center
//! failure policy is unchanged, so the output is bit-identical to the
//! serial [`crate::gradients::estimate_gradients_rbf`].

use num_traits::Float;
use rayon::prelude::*;

use crate::gradients::{
    collect_estimate, output_scales, rbf_center_jacobian, validate_centers, GradientError,
    GradientEstimate, RbfGradientOptions,
};
use crate::sample::Discretization;

/// Parallel RBF gradient estimation, one rayon task per center.
pub fn estimate_gradients_rbf_par<F: Float + Send + Sync>(
    disc: &Discretization<F>,
    num_centers: usize,
    opts: &RbfGradientOptions<F>,
) -> Result<GradientEstimate<F>, GradientError> {
    validate_centers(disc, num_centers)?;
    if !(opts.shape.is_finite() && opts.shape > F::zero()) {
        return Err(GradientError::InvalidShapeParameter);
    }

    let n = disc.num_samples();
    let input_dim = disc.input().dim();
    let output_dim = disc.output().dim();
    let samples = disc.input().values();
    let data = disc.output().values();
    let scales = output_scales(disc, opts.normalize);

    let knn_scales: Option<Vec<F>> = disc.input().domain().map(|bounds| {
        bounds
            .iter()
            .map(|&(lo, hi)| {
                let r = hi - lo;
                if r > F::zero() {
                    r.recip()
                } else {
                    F::one()
                }
            })
            .collect()
    });

    let m = opts.num_neighbors.unwrap_or(input_dim + 2).min(n);
    let needed = input_dim + 1;

    let results: Vec<Result<Vec<Vec<F>>, GradientError>> = (0..num_centers)
        .into_par_iter()
        .map(|c| {
            rbf_center_jacobian(
                c,
                &samples[c],
                samples,
                data,
                &scales,
                knn_scales.as_deref(),
                m,
                needed,
                opts,
            )
        })
        .collect();

    let mut successes = Vec::with_capacity(num_centers);
    let mut failures = Vec::new();
    for (c, result) in results.into_iter().enumerate() {
        match result {
            Ok(jac) => successes.push((c, jac)),
            Err(e) => failures.push(e),
        }
    }

    collect_estimate(disc, output_dim, input_dim, successes, failures)
}
