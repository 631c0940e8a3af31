//! Radial basis functions for local interpolation of the forward map.
//!
//! Each kernel is a function of the distance `r` to a basis center, scaled
//! by a shape parameter `ep`. The derivative form [`RadialBasis::eval_dxi`]
//! is the partial derivative of `phi(|x - x_j|)` with respect to one
//! coordinate, expressed through the componentwise displacement `xi`, so
//! callers never divide by `r` and the `r = 0` sample contributes zero
//! slope.

use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Supported radial basis kernels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RadialBasis {
    /// `(1 + ep r + (ep r)^2 / 3) exp(-ep r)`, a C4 Matern kernel.
    #[default]
    C4Matern,
    /// `exp(-(ep r)^2)`.
    Gaussian,
    /// `sqrt(1 + (ep r)^2)`.
    Multiquadric,
    /// `1 / sqrt(1 + (ep r)^2)`.
    InverseMultiquadric,
}

impl RadialBasis {
    /// Kernel value at distance `r` with shape parameter `ep`.
    pub fn eval<F: Float>(self, r: F, ep: F) -> F {
        let er = ep * r;
        match self {
            RadialBasis::C4Matern => {
                let three = F::from(3.0).expect("small integer fits the float type");
                (F::one() + er + er * er / three) * (-er).exp()
            }
            RadialBasis::Gaussian => (-(er * er)).exp(),
            RadialBasis::Multiquadric => (F::one() + er * er).sqrt(),
            RadialBasis::InverseMultiquadric => (F::one() + er * er).sqrt().recip(),
        }
    }

    /// Partial derivative of `phi(|x - x_j|)` in one coordinate, where
    /// `r` is the distance to the basis center and `xi` the displacement
    /// component in that coordinate.
    pub fn eval_dxi<F: Float>(self, r: F, xi: F, ep: F) -> F {
        let er = ep * r;
        match self {
            RadialBasis::C4Matern => {
                let three = F::from(3.0).expect("small integer fits the float type");
                -(ep * ep * xi * (-er).exp() * (er + F::one())) / three
            }
            RadialBasis::Gaussian => {
                let two = F::one() + F::one();
                -two * ep * ep * xi * (-(er * er)).exp()
            }
            RadialBasis::Multiquadric => ep * ep * xi / (F::one() + er * er).sqrt(),
            RadialBasis::InverseMultiquadric => {
                let base = F::one() + er * er;
                -(ep * ep * xi) / (base * base.sqrt())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const KERNELS: [RadialBasis; 4] = [
        RadialBasis::C4Matern,
        RadialBasis::Gaussian,
        RadialBasis::Multiquadric,
        RadialBasis::InverseMultiquadric,
    ];

    #[test]
    fn unit_value_at_origin() {
        for k in KERNELS {
            assert_relative_eq!(k.eval(0.0, 1.7), 1.0, max_relative = 1e-14);
        }
    }

    #[test]
    fn zero_slope_at_origin() {
        for k in KERNELS {
            assert_eq!(k.eval_dxi(0.0, 0.0, 1.7), 0.0);
        }
    }

    #[test]
    fn derivative_matches_finite_difference() {
        // Displacement (x1, x2) from the basis center; differentiate in x1.
        let (x1, x2) = (0.4, -0.3);
        let ep = 1.3;
        let h = 1e-6;
        for k in KERNELS {
            let r = |a: f64, b: f64| (a * a + b * b).sqrt();
            let fd = (k.eval(r(x1 + h, x2), ep) - k.eval(r(x1 - h, x2), ep)) / (2.0 * h);
            let exact = k.eval_dxi(r(x1, x2), x1, ep);
            assert_relative_eq!(exact, fd, max_relative = 1e-6);
        }
    }

    #[test]
    fn kernels_decay_or_grow_as_expected() {
        assert!(RadialBasis::Gaussian.eval(2.0, 1.0) < RadialBasis::Gaussian.eval(1.0, 1.0));
        assert!(RadialBasis::C4Matern.eval(2.0, 1.0) < RadialBasis::C4Matern.eval(1.0, 1.0));
        assert!(
            RadialBasis::Multiquadric.eval(2.0, 1.0) > RadialBasis::Multiquadric.eval(1.0, 1.0)
        );
        assert!(
            RadialBasis::InverseMultiquadric.eval(2.0, 1.0)
                < RadialBasis::InverseMultiquadric.eval(1.0, 1.0)
        );
    }
}
