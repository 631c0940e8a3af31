//! Per-center Jacobian collections produced by the gradient estimators.

use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sample::SampleError;

/// Approximate local Jacobians of the forward map, one dense
/// `output_dim x input_dim` matrix per cluster center.
///
/// Center indices are stable: entry `c` corresponds to sample `c` of the
/// center discretization it was estimated with.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Jacobians<F> {
    mats: Vec<Vec<Vec<F>>>,
    output_dim: usize,
    input_dim: usize,
}

impl<F: Float> Jacobians<F> {
    /// Wrap a list of per-center matrices, checking that every matrix is
    /// `output_dim x input_dim`.
    pub fn new(
        output_dim: usize,
        input_dim: usize,
        mats: Vec<Vec<Vec<F>>>,
    ) -> Result<Self, SampleError> {
        for mat in &mats {
            if mat.len() != output_dim {
                return Err(SampleError::DimMismatch {
                    row: 0,
                    expected: output_dim,
                    got: mat.len(),
                });
            }
            for (q, row) in mat.iter().enumerate() {
                if row.len() != input_dim {
                    return Err(SampleError::DimMismatch {
                        row: q,
                        expected: input_dim,
                        got: row.len(),
                    });
                }
            }
        }
        Ok(Jacobians {
            mats,
            output_dim,
            input_dim,
        })
    }

    /// Number of cluster centers.
    pub fn num_centers(&self) -> usize {
        self.mats.len()
    }

    /// Number of output quantities (rows per matrix).
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Number of input parameters (columns per matrix).
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// The Jacobian estimated at one center.
    pub fn center(&self, c: usize) -> Result<&[Vec<F>], SampleError> {
        self.mats
            .get(c)
            .map(|m| m.as_slice())
            .ok_or(SampleError::IndexOutOfRange {
                index: c,
                len: self.mats.len(),
            })
    }

    /// Iterate over the per-center matrices.
    pub fn iter(&self) -> impl Iterator<Item = &Vec<Vec<F>>> {
        self.mats.iter()
    }

    /// A new collection keeping only the selected output rows, in the
    /// given order, at every center.
    pub fn restricted(&self, rows: &[usize]) -> Result<Jacobians<F>, SampleError> {
        for &q in rows {
            if q >= self.output_dim {
                return Err(SampleError::IndexOutOfRange {
                    index: q,
                    len: self.output_dim,
                });
            }
        }
        let mats = self
            .mats
            .iter()
            .map(|mat| rows.iter().map(|&q| mat[q].clone()).collect())
            .collect();
        Ok(Jacobians {
            mats,
            output_dim: rows.len(),
            input_dim: self.input_dim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_ragged_matrices() {
        let err = Jacobians::<f64>::new(2, 2, vec![vec![vec![1.0, 0.0], vec![0.0]]]).unwrap_err();
        assert_eq!(
            err,
            SampleError::DimMismatch {
                row: 1,
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn restricted_keeps_selection_order() {
        let jacs = Jacobians::new(
            3,
            2,
            vec![vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]],
        )
        .unwrap();
        let sub = jacs.restricted(&[2, 0]).unwrap();
        assert_eq!(sub.output_dim(), 2);
        assert_eq!(
            sub.center(0).unwrap(),
            &[vec![1.0, 1.0], vec![1.0, 0.0]]
        );
        // Source collection is unchanged.
        assert_eq!(jacs.output_dim(), 3);
    }
}
