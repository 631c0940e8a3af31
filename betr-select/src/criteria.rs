//! Scoring criteria for candidate QoI subsets.
//!
//! A subset of `k` output rows restricts each local Jacobian to a
//! `k x input_dim` matrix; its singular values describe how a unit cell
//! in the selected data coordinates pulls back into parameter space.
//! Both criteria reduce those singular values to one scalar per center
//! and average across centers, so a subset that inverts well everywhere
//! beats one that is excellent at one center and useless at another.

use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use betr::jacobian::Jacobians;
use betr::linalg::singular_values;

/// Which scalar to minimize over candidate subsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Criterion {
    /// Expected inverse-volume scaling: the product of reciprocal
    /// singular values. Small values mean a unit data-space volume pulls
    /// back to a small parameter-space volume.
    #[default]
    Measure,
    /// Conditioning of the induced parameter-space cells: the ratio of
    /// largest to smallest singular value. Always at least 1; 1 means
    /// the selected QoIs act orthogonally.
    Skewness,
}

/// Singular values of one center's Jacobian restricted to the selected
/// rows, descending.
///
/// # Panics
///
/// Panics on structural misuse: empty selection, more rows than input
/// dimensions, repeated or out-of-range indices, or an out-of-range
/// center.
pub fn subset_singular_values<F: Float>(
    jacs: &Jacobians<F>,
    center: usize,
    indices: &[usize],
) -> Vec<F> {
    let mat = jacs.center(center).expect("center index in range");
    let rows: Vec<Vec<F>> = indices.iter().map(|&q| mat[q].clone()).collect();
    singular_values(&rows)
}

fn check_subset<F: Float>(jacs: &Jacobians<F>, indices: &[usize]) {
    assert!(jacs.num_centers() > 0, "no Jacobians to score against");
    assert!(!indices.is_empty(), "empty QoI subset");
    assert!(
        indices.len() <= jacs.input_dim(),
        "subset of {} QoIs cannot resolve more than {} input directions",
        indices.len(),
        jacs.input_dim()
    );
    for (i, &q) in indices.iter().enumerate() {
        assert!(
            q < jacs.output_dim(),
            "QoI index {} out of range for output dimension {}",
            q,
            jacs.output_dim()
        );
        assert!(
            !indices[..i].contains(&q),
            "QoI index {} selected twice",
            q
        );
    }
}

/// Score one candidate subset against every center and average.
///
/// The score is the arithmetic mean over centers of the per-center
/// criterion value; a numerically rank-deficient center makes the whole
/// subset inadmissible (infinite score). The selection is treated as a
/// set: any ordering of the same indices produces the same score.
///
/// # Panics
///
/// Panics on structural misuse, see [`subset_singular_values`].
pub fn score_subset<F: Float>(jacs: &Jacobians<F>, indices: &[usize], criterion: Criterion) -> F {
    check_subset(jacs, indices);

    let k = indices.len();
    let rank_dims = F::from(k.max(jacs.input_dim()))
        .expect("dimension count fits the float type");

    let mut total = F::zero();
    for center in 0..jacs.num_centers() {
        let sigma = subset_singular_values(jacs, center, indices);
        let largest = sigma[0];
        let smallest = sigma[k - 1];
        let tol = largest * F::epsilon() * rank_dims;

        if largest <= F::zero() || smallest <= tol {
            return F::infinity();
        }

        let value = match criterion {
            Criterion::Measure => sigma
                .iter()
                .fold(F::one(), |acc, &s| acc * s.recip()),
            Criterion::Skewness => largest / smallest,
        };
        total = total + value;
    }

    total / F::from(jacs.num_centers()).expect("center count fits the float type")
}
