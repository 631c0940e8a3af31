//! Gradient-based sensitivity analysis for measure-theoretic stochastic
//! inverse problems.
//!
//! Given sampled parameter/output pairs of a forward map, this crate
//! estimates local Jacobians of the map at a set of cluster centers via
//! radial-basis-function interpolation or finite-difference stencils.
//! The companion crate `betr-select` consumes those Jacobians to pick the
//! output quantities of interest that best condition the inverse problem.
//!
//! The estimators are deterministic: centers are the leading samples of
//! the discretization, and the only randomness ([`cluster::sample_l1_ball`])
//! comes from a caller-supplied generator.

pub mod cluster;
pub mod comm;
pub mod gradients;
pub mod jacobian;
pub mod linalg;
pub mod rbf;
pub mod sample;

#[cfg(feature = "faer")]
pub mod faer_support;
#[cfg(feature = "ndarray")]
pub mod ndarray_support;
#[cfg(feature = "parallel")]
pub mod parallel;

pub use comm::{partition, Communicator, SerialComm};
pub use gradients::{
    estimate_gradients_cfd, estimate_gradients_ffd, estimate_gradients_rbf, GradientError,
    GradientEstimate, RbfGradientOptions,
};
pub use jacobian::Jacobians;
pub use rbf::RadialBasis;
pub use sample::{Discretization, SampleError, SampleSet};

#[cfg(feature = "parallel")]
pub use parallel::estimate_gradients_rbf_par;

/// Type alias for `f64` sample sets, the common instantiation.
pub type SampleSet64 = SampleSet<f64>;
/// Type alias for `f64` discretizations.
pub type Discretization64 = Discretization<f64>;
