//! ndarray adapters for sample sets and Jacobian collections.

use ndarray::Array2;

use crate::jacobian::Jacobians;
use crate::sample::{SampleError, SampleSet};

/// Copy a sample set's values into an `N x d` array.
pub fn sample_values_to_array(set: &SampleSet<f64>) -> Array2<f64> {
    Array2::from_shape_fn((set.num_samples(), set.dim()), |(i, j)| {
        set.values()[i][j]
    })
}

/// Build a sample set from the rows of an `N x d` array.
pub fn sample_set_from_array(arr: &Array2<f64>) -> SampleSet<f64> {
    let values = arr.rows().into_iter().map(|row| row.to_vec()).collect();
    SampleSet::from_values(arr.ncols(), values).expect("array rows share one length")
}

/// Copy each center's Jacobian into its own `output_dim x input_dim` array.
pub fn jacobians_to_arrays(jacs: &Jacobians<f64>) -> Vec<Array2<f64>> {
    jacs.iter()
        .map(|mat| {
            Array2::from_shape_fn((jacs.output_dim(), jacs.input_dim()), |(q, i)| mat[q][i])
        })
        .collect()
}

/// Build a Jacobian collection from per-center arrays, which must all
/// share the shape of the first.
pub fn jacobians_from_arrays(arrs: &[Array2<f64>]) -> Result<Jacobians<f64>, SampleError> {
    let (output_dim, input_dim) = arrs
        .first()
        .map(|a| (a.nrows(), a.ncols()))
        .unwrap_or((0, 0));
    let rows = arrs
        .iter()
        .map(|a| a.rows().into_iter().map(|row| row.to_vec()).collect())
        .collect();
    Jacobians::new(output_dim, input_dim, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sample_set_round_trips() {
        let arr = array![[1.0, 2.0], [3.0, 4.0]];
        let set = sample_set_from_array(&arr);
        assert_eq!(set.dim(), 2);
        assert_eq!(sample_values_to_array(&set), arr);
    }

    #[test]
    fn jacobians_round_trip() {
        let jacs =
            Jacobians::new(2, 2, vec![vec![vec![1.0, 0.0], vec![0.5, 2.0]]]).unwrap();
        let arrs = jacobians_to_arrays(&jacs);
        assert_eq!(arrs[0], array![[1.0, 0.0], [0.5, 2.0]]);
        assert_eq!(jacobians_from_arrays(&arrs).unwrap(), jacs);
    }
}
