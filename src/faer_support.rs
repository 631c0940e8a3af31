//! faer adapters for sample sets and Jacobian collections.
//!
//! Thin wrappers converting between this crate's row-major containers and
//! `faer::Mat<f64>`, for callers that post-process estimates with faer.

use faer::Mat;

use crate::jacobian::Jacobians;
use crate::sample::{SampleError, SampleSet};

/// Copy a sample set's values into an `N x d` matrix.
pub fn sample_values_to_mat(set: &SampleSet<f64>) -> Mat<f64> {
    Mat::from_fn(set.num_samples(), set.dim(), |i, j| set.values()[i][j])
}

/// Build a sample set from the rows of an `N x d` matrix.
pub fn sample_set_from_mat(mat: &Mat<f64>) -> SampleSet<f64> {
    let values = (0..mat.nrows())
        .map(|i| (0..mat.ncols()).map(|j| mat[(i, j)]).collect())
        .collect();
    SampleSet::from_values(mat.ncols(), values).expect("matrix rows share one length")
}

/// Copy each center's Jacobian into its own `output_dim x input_dim` matrix.
pub fn jacobians_to_mats(jacs: &Jacobians<f64>) -> Vec<Mat<f64>> {
    jacs.iter()
        .map(|mat| Mat::from_fn(jacs.output_dim(), jacs.input_dim(), |q, i| mat[q][i]))
        .collect()
}

/// Build a Jacobian collection from per-center matrices, which must all
/// share the shape of the first.
pub fn jacobians_from_mats(mats: &[Mat<f64>]) -> Result<Jacobians<f64>, SampleError> {
    let (output_dim, input_dim) = mats
        .first()
        .map(|m| (m.nrows(), m.ncols()))
        .unwrap_or((0, 0));
    let rows = mats
        .iter()
        .map(|m| {
            (0..m.nrows())
                .map(|q| (0..m.ncols()).map(|i| m[(q, i)]).collect())
                .collect()
        })
        .collect();
    Jacobians::new(output_dim, input_dim, rows)
}
