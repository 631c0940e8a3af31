//! Cluster layouts for gradient stencils.
//!
//! The finite-difference estimators consume structured clusters built
//! around a set of centers: the centers come first, followed by one
//! perturbation block per input dimension (and, for centered differences,
//! a mirrored block per dimension). The RBF estimator has no layout
//! requirement; [`sample_l1_ball`] just provides a convenient scattered
//! cluster for it.
//!
//! None of these functions draw randomness themselves. [`sample_l1_ball`]
//! takes a caller-supplied generator of uniforms in `[0, 1)`, which keeps
//! the library deterministic under a caller-controlled seed.

use num_traits::Float;

use crate::sample::SampleSet;

/// Forward-difference stencil: centers, then for each dimension `i` a
/// block of `centers + radii[i] * e_i`.
///
/// The result holds `num_centers * (dim + 1)` samples and carries the
/// centers' domain bounds.
///
/// # Panics
///
/// Panics if `radii.len()` differs from the centers' dimension.
pub fn pick_ffd_points<F: Float>(centers: &SampleSet<F>, radii: &[F]) -> SampleSet<F> {
    let dim = centers.dim();
    assert_eq!(
        radii.len(),
        dim,
        "radii length {} does not match dimension {}",
        radii.len(),
        dim
    );

    let mut rows: Vec<Vec<F>> = centers.values().to_vec();
    for (i, &r) in radii.iter().enumerate() {
        for center in centers.values() {
            let mut p = center.clone();
            p[i] = p[i] + r;
            rows.push(p);
        }
    }
    SampleSet::from_rows_unchecked(dim, rows, centers.domain().map(|d| d.to_vec()))
}

/// Centered-difference stencil: centers, then for each dimension `i` a
/// block of `centers + radii[i] * e_i`, then for each dimension `i` a
/// block of `centers - radii[i] * e_i`.
///
/// The result holds `num_centers * (2 * dim + 1)` samples.
///
/// # Panics
///
/// Panics if `radii.len()` differs from the centers' dimension.
pub fn pick_cfd_points<F: Float>(centers: &SampleSet<F>, radii: &[F]) -> SampleSet<F> {
    let dim = centers.dim();
    assert_eq!(
        radii.len(),
        dim,
        "radii length {} does not match dimension {}",
        radii.len(),
        dim
    );

    let mut rows: Vec<Vec<F>> = centers.values().to_vec();
    for sign in [F::one(), -F::one()] {
        for (i, &r) in radii.iter().enumerate() {
            for center in centers.values() {
                let mut p = center.clone();
                p[i] = p[i] + sign * r;
                rows.push(p);
            }
        }
    }
    SampleSet::from_rows_unchecked(dim, rows, centers.domain().map(|d| d.to_vec()))
}

/// Scattered cluster for RBF stencils: centers, then `num_close` points
/// per center drawn uniformly from the axis-scaled L1 ball of the given
/// radii around that center.
///
/// `uniform` must return samples in `[0, 1)`; it is the only source of
/// randomness, so a seeded generator makes the output reproducible.
///
/// # Panics
///
/// Panics if `radii.len()` differs from the centers' dimension.
pub fn sample_l1_ball<F: Float>(
    centers: &SampleSet<F>,
    num_close: usize,
    radii: &[F],
    mut uniform: impl FnMut() -> F,
) -> SampleSet<F> {
    let dim = centers.dim();
    assert_eq!(
        radii.len(),
        dim,
        "radii length {} does not match dimension {}",
        radii.len(),
        dim
    );

    let half = F::from(0.5).expect("small constant fits the float type");
    let mut rows: Vec<Vec<F>> = centers.values().to_vec();
    for center in centers.values() {
        for _ in 0..num_close {
            // Gaps of sorted uniforms are Dirichlet(1,..,1); the first
            // `dim` gaps are uniform over the simplex sum(w) <= 1.
            let mut cuts: Vec<F> = (0..dim).map(|_| uniform()).collect();
            cuts.sort_by(|a, b| a.partial_cmp(b).expect("uniforms are finite"));

            let mut row = center.clone();
            let mut prev = F::zero();
            for i in 0..dim {
                let w = cuts[i] - prev;
                prev = cuts[i];
                let signed = if uniform() < half { -w } else { w };
                row[i] = row[i] + signed * radii[i];
            }
            rows.push(row);
        }
    }
    SampleSet::from_rows_unchecked(dim, rows, centers.domain().map(|d| d.to_vec()))
}
