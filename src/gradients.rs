//! Local Jacobian estimation for the forward map.
//!
//! Given a discretization of parameter/data sample pairs, these estimators
//! approximate the derivative of the forward map at a set of cluster
//! centers. Centers are always the first `num_centers` input samples, so
//! a caller that wants randomized centers shuffles before building the
//! discretization; the estimators themselves are deterministic.
//!
//! Three schemes are provided:
//!
//! - [`estimate_gradients_rbf`] interpolates the data over a
//!   nearest-neighbor stencil with a radial basis kernel and
//!   differentiates the interpolant at the center. Works on any scattered
//!   discretization.
//! - [`estimate_gradients_ffd`] / [`estimate_gradients_cfd`] consume the
//!   structured clusters of [`crate::cluster::pick_ffd_points`] /
//!   [`crate::cluster::pick_cfd_points`] and apply forward / centered
//!   differences. Exact for affine maps.
//!
//! A failure at one center never aborts the others: per-center errors are
//! collected on the returned [`GradientEstimate`], and only an estimation
//! in which every center failed is reported as an error.

use std::fmt;

use num_traits::Float;

use crate::jacobian::Jacobians;
use crate::linalg::{lu_back_solve, lu_factor};
use crate::rbf::RadialBasis;
use crate::sample::Discretization;

/// Errors raised by the gradient estimators.
///
/// The first two variants describe per-center failures and appear in
/// [`GradientEstimate::failures`]; the remainder reject a whole request
/// before any center is attempted, except [`GradientError::NoValidCenters`]
/// which aggregates a run in which nothing succeeded.
#[derive(Clone, Debug, PartialEq)]
pub enum GradientError {
    /// A stencil had fewer samples than the local fit has free parameters.
    InsufficientData {
        center: usize,
        needed: usize,
        available: usize,
    },
    /// The local geometry is rank deficient (duplicate or collinear
    /// points), so no unique fit exists.
    DegenerateGeometry { center: usize, fit_size: usize },
    /// The discretization holds no samples.
    EmptyDiscretization,
    /// Zero centers were requested.
    NoCentersRequested,
    /// More centers were requested than samples exist.
    TooManyCenters { requested: usize, available: usize },
    /// The RBF shape parameter must be finite and positive.
    InvalidShapeParameter,
    /// A structured cluster does not have the sample count its layout
    /// implies.
    ClusterShape { expected: usize, got: usize },
    /// Every requested center failed; the per-center reasons are kept.
    NoValidCenters { failures: Vec<GradientError> },
}

impl fmt::Display for GradientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradientError::InsufficientData {
                center,
                needed,
                available,
            } => write!(
                f,
                "center {}: stencil has {} samples but the fit needs {}",
                center, available, needed
            ),
            GradientError::DegenerateGeometry { center, fit_size } => write!(
                f,
                "center {}: rank-deficient stencil of {} points",
                center, fit_size
            ),
            GradientError::EmptyDiscretization => write!(f, "discretization holds no samples"),
            GradientError::NoCentersRequested => write!(f, "zero centers requested"),
            GradientError::TooManyCenters {
                requested,
                available,
            } => write!(
                f,
                "{} centers requested but only {} samples available",
                requested, available
            ),
            GradientError::InvalidShapeParameter => {
                write!(f, "RBF shape parameter must be finite and positive")
            }
            GradientError::ClusterShape { expected, got } => write!(
                f,
                "cluster layout implies {} samples, discretization has {}",
                expected, got
            ),
            GradientError::NoValidCenters { failures } => write!(
                f,
                "no center produced a valid Jacobian ({} failures, first: {})",
                failures.len(),
                failures
                    .first()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "none".into())
            ),
        }
    }
}

impl std::error::Error for GradientError {}

/// Options for [`estimate_gradients_rbf`].
#[derive(Clone, Debug)]
pub struct RbfGradientOptions<F> {
    /// Stencil size per center. `None` selects `input_dim + 2`, capped at
    /// the sample count.
    pub num_neighbors: Option<usize>,
    /// Interpolation kernel.
    pub kernel: RadialBasis,
    /// Kernel shape parameter.
    pub shape: F,
    /// Scale output displacements by the reciprocal per-QoI sample range,
    /// making Jacobian entries dimensionless and comparable across QoIs
    /// with different physical units.
    pub normalize: bool,
}

impl<F: Float> Default for RbfGradientOptions<F> {
    fn default() -> Self {
        RbfGradientOptions {
            num_neighbors: None,
            kernel: RadialBasis::default(),
            shape: F::one(),
            normalize: true,
        }
    }
}

/// Result of a gradient estimation run.
#[derive(Clone, Debug)]
pub struct GradientEstimate<F> {
    /// One Jacobian per successful center, in center order.
    pub jacobians: Jacobians<F>,
    /// The successful centers as their own discretization, index-aligned
    /// with `jacobians`.
    pub centers: Discretization<F>,
    /// Per-center failures, in center order. Empty when every center
    /// succeeded.
    pub failures: Vec<GradientError>,
}

/// Reciprocal per-QoI sample ranges, with unit scale where a QoI has no
/// spread (its rows stay zero and drop out downstream).
pub(crate) fn output_scales<F: Float>(disc: &Discretization<F>, normalize: bool) -> Vec<F> {
    if !normalize {
        return vec![F::one(); disc.output().dim()];
    }
    disc.output()
        .value_ranges()
        .into_iter()
        .map(|r| if r > F::zero() { r.recip() } else { F::one() })
        .collect()
}

/// Indices of the `m` samples nearest to `center`, ties broken by index.
///
/// Distances use per-dimension scaled coordinates when `scales` is
/// provided, so parameters with very different units weight neighbor
/// selection evenly.
fn nearest_neighbors<F: Float>(
    values: &[Vec<F>],
    center: &[F],
    m: usize,
    scales: Option<&[F]>,
) -> Vec<usize> {
    let mut dists: Vec<(F, usize)> = values
        .iter()
        .enumerate()
        .map(|(j, row)| {
            let mut d2 = F::zero();
            for (i, (&a, &b)) in center.iter().zip(row.iter()).enumerate() {
                let mut diff = a - b;
                if let Some(s) = scales {
                    diff = diff * s[i];
                }
                d2 = d2 + diff * diff;
            }
            (d2, j)
        })
        .collect();
    dists.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .expect("distances are finite")
            .then(a.1.cmp(&b.1))
    });
    dists.truncate(m);
    dists.into_iter().map(|(_, j)| j).collect()
}

fn euclidean<F: Float>(a: &[F], b: &[F]) -> F {
    let mut d2 = F::zero();
    for (&x, &y) in a.iter().zip(b.iter()) {
        let diff = x - y;
        d2 = d2 + diff * diff;
    }
    d2.sqrt()
}

pub(crate) fn validate_centers<F: Float>(
    disc: &Discretization<F>,
    num_centers: usize,
) -> Result<(), GradientError> {
    let n = disc.num_samples();
    if n == 0 {
        return Err(GradientError::EmptyDiscretization);
    }
    if num_centers == 0 {
        return Err(GradientError::NoCentersRequested);
    }
    if num_centers > n {
        return Err(GradientError::TooManyCenters {
            requested: num_centers,
            available: n,
        });
    }
    Ok(())
}

pub(crate) fn collect_estimate<F: Float>(
    disc: &Discretization<F>,
    output_dim: usize,
    input_dim: usize,
    successes: Vec<(usize, Vec<Vec<F>>)>,
    failures: Vec<GradientError>,
) -> Result<GradientEstimate<F>, GradientError> {
    if successes.is_empty() {
        return Err(GradientError::NoValidCenters { failures });
    }
    let indices: Vec<usize> = successes.iter().map(|&(c, _)| c).collect();
    let mats: Vec<Vec<Vec<F>>> = successes.into_iter().map(|(_, m)| m).collect();

    let jacobians =
        Jacobians::new(output_dim, input_dim, mats).expect("matrices built with uniform shape");
    let input = disc
        .input()
        .select_rows(&indices)
        .expect("center indices lie inside the discretization");
    let output = disc
        .output()
        .select_rows(&indices)
        .expect("center indices lie inside the discretization");
    let centers = Discretization::new(input, output).expect("row selection preserves counts");

    Ok(GradientEstimate {
        jacobians,
        centers,
        failures,
    })
}

/// Estimate local Jacobians at the first `num_centers` input samples by
/// differentiating an RBF interpolant of the output data over each
/// center's nearest-neighbor stencil.
///
/// For each center, the kernel interpolation system over the stencil is
/// factored once and back-solved per input dimension for the derivative
/// weights; the Jacobian row for QoI `q` is the weighted combination of
/// that QoI's (optionally range-normalized) samples.
pub fn estimate_gradients_rbf<F: Float>(
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

    // Neighbor selection weighs dimensions evenly when domain bounds are
    // known; the kernel fit itself stays in raw coordinates.
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

    let mut successes = Vec::with_capacity(num_centers);
    let mut failures = Vec::new();

    for c in 0..num_centers {
        match rbf_center_jacobian(
            c,
            &samples[c],
            samples,
            data,
            &scales,
            knn_scales.as_deref(),
            m,
            needed,
            opts,
        ) {
            Ok(jac) => successes.push((c, jac)),
            Err(e) => failures.push(e),
        }
    }

    collect_estimate(disc, output_dim, input_dim, successes, failures)
}

/// One center of the RBF scheme; shared by the serial and parallel paths.
#[allow(clippy::too_many_arguments)]
pub(crate) fn rbf_center_jacobian<F: Float>(
    c: usize,
    center: &[F],
    samples: &[Vec<F>],
    data: &[Vec<F>],
    scales: &[F],
    knn_scales: Option<&[F]>,
    m: usize,
    needed: usize,
    opts: &RbfGradientOptions<F>,
) -> Result<Vec<Vec<F>>, GradientError> {
    if m < needed {
        return Err(GradientError::InsufficientData {
            center: c,
            needed,
            available: m,
        });
    }

    let neighbors = nearest_neighbors(samples, center, m, knn_scales);
    let input_dim = center.len();
    let output_dim = scales.len();

    // Kernel interpolation matrix over the stencil.
    let phi: Vec<Vec<F>> = neighbors
        .iter()
        .map(|&a| {
            neighbors
                .iter()
                .map(|&b| {
                    opts.kernel
                        .eval(euclidean(&samples[a], &samples[b]), opts.shape)
                })
                .collect()
        })
        .collect();

    let factors = lu_factor(&phi).ok_or(GradientError::DegenerateGeometry {
        center: c,
        fit_size: m,
    })?;

    // Distances and displacements from the center to its stencil.
    let radii: Vec<F> = neighbors
        .iter()
        .map(|&j| euclidean(center, &samples[j]))
        .collect();

    let mut jac = vec![vec![F::zero(); input_dim]; output_dim];
    for i in 0..input_dim {
        let rhs: Vec<F> = neighbors
            .iter()
            .zip(radii.iter())
            .map(|(&j, &r)| opts.kernel.eval_dxi(r, center[i] - samples[j][i], opts.shape))
            .collect();
        let weights = lu_back_solve(&factors, &rhs);

        for q in 0..output_dim {
            let mut acc = F::zero();
            for (w, &j) in weights.iter().zip(neighbors.iter()) {
                acc = acc + *w * data[j][q];
            }
            jac[q][i] = acc * scales[q];
        }
    }

    Ok(jac)
}

/// Estimate local Jacobians from a forward-difference cluster built by
/// [`crate::cluster::pick_ffd_points`].
///
/// The perturbation radii are recovered from the cluster geometry itself,
/// so the same discretization that ran the forward map is all that is
/// needed. Exact for affine forward maps up to rounding.
pub fn estimate_gradients_ffd<F: Float>(
    disc: &Discretization<F>,
    num_centers: usize,
    normalize: bool,
) -> Result<GradientEstimate<F>, GradientError> {
    validate_centers(disc, num_centers)?;

    let input_dim = disc.input().dim();
    let output_dim = disc.output().dim();
    let expected = num_centers * (input_dim + 1);
    if disc.num_samples() != expected {
        return Err(GradientError::ClusterShape {
            expected,
            got: disc.num_samples(),
        });
    }

    let samples = disc.input().values();
    let data = disc.output().values();
    let scales = output_scales(disc, normalize);

    let mut successes = Vec::with_capacity(num_centers);
    let mut failures = Vec::new();

    'centers: for c in 0..num_centers {
        let mut jac = vec![vec![F::zero(); input_dim]; output_dim];
        for i in 0..input_dim {
            let p = num_centers * (1 + i) + c;
            let delta = samples[p][i] - samples[c][i];
            if delta == F::zero() {
                failures.push(GradientError::DegenerateGeometry {
                    center: c,
                    fit_size: input_dim + 1,
                });
                continue 'centers;
            }
            for q in 0..output_dim {
                jac[q][i] = (data[p][q] - data[c][q]) * scales[q] / delta;
            }
        }
        successes.push((c, jac));
    }

    collect_estimate(disc, output_dim, input_dim, successes, failures)
}

/// Estimate local Jacobians from a centered-difference cluster built by
/// [`crate::cluster::pick_cfd_points`].
///
/// Second-order accurate; exact for affine forward maps up to rounding.
pub fn estimate_gradients_cfd<F: Float>(
    disc: &Discretization<F>,
    num_centers: usize,
    normalize: bool,
) -> Result<GradientEstimate<F>, GradientError> {
    validate_centers(disc, num_centers)?;

    let input_dim = disc.input().dim();
    let output_dim = disc.output().dim();
    let expected = num_centers * (2 * input_dim + 1);
    if disc.num_samples() != expected {
        return Err(GradientError::ClusterShape {
            expected,
            got: disc.num_samples(),
        });
    }

    let samples = disc.input().values();
    let data = disc.output().values();
    let scales = output_scales(disc, normalize);

    let mut successes = Vec::with_capacity(num_centers);
    let mut failures = Vec::new();

    'centers: for c in 0..num_centers {
        let mut jac = vec![vec![F::zero(); input_dim]; output_dim];
        for i in 0..input_dim {
            let plus = num_centers * (1 + i) + c;
            let minus = num_centers * (1 + input_dim + i) + c;
            let delta = samples[plus][i] - samples[minus][i];
            if delta == F::zero() {
                failures.push(GradientError::DegenerateGeometry {
                    center: c,
                    fit_size: 2 * input_dim + 1,
                });
                continue 'centers;
            }
            for q in 0..output_dim {
                jac[q][i] = (data[plus][q] - data[minus][q]) * scales[q] / delta;
            }
        }
        successes.push((c, jac));
    }

    collect_estimate(disc, output_dim, input_dim, successes, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleSet;

    #[test]
    fn nearest_neighbors_breaks_ties_by_index() {
        let values = vec![vec![1.0], vec![-1.0], vec![1.0], vec![0.5]];
        let nb = nearest_neighbors(&values, &[0.0], 3, None);
        assert_eq!(nb, vec![3, 0, 1]);
    }

    #[test]
    fn validate_rejects_bad_requests() {
        let set = SampleSet::from_values(1, vec![vec![0.0], vec![1.0]]).unwrap();
        let disc = Discretization::new(set.clone(), set).unwrap();
        assert_eq!(
            validate_centers(&disc, 0).unwrap_err(),
            GradientError::NoCentersRequested
        );
        assert_eq!(
            validate_centers(&disc, 3).unwrap_err(),
            GradientError::TooManyCenters {
                requested: 3,
                available: 2
            }
        );
    }

    #[test]
    fn rbf_rejects_nonpositive_shape() {
        let set = SampleSet::from_values(1, vec![vec![0.0], vec![1.0]]).unwrap();
        let disc = Discretization::new(set.clone(), set).unwrap();
        let opts = RbfGradientOptions {
            shape: 0.0,
            ..RbfGradientOptions::default()
        };
        assert_eq!(
            estimate_gradients_rbf(&disc, 1, &opts).unwrap_err(),
            GradientError::InvalidShapeParameter
        );
    }

    #[test]
    fn ffd_checks_cluster_shape() {
        let input = SampleSet::from_values(2, vec![vec![0.0, 0.0], vec![1.0, 0.0]]).unwrap();
        let output = SampleSet::from_values(1, vec![vec![0.0], vec![1.0]]).unwrap();
        let disc = Discretization::new(input, output).unwrap();
        assert_eq!(
            estimate_gradients_ffd(&disc, 1, false).unwrap_err(),
            GradientError::ClusterShape {
                expected: 3,
                got: 2
            }
        );
    }
}
