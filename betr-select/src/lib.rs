//! Optimal QoI subset selection for stochastic inverse problems.
//!
//! Builds on the local Jacobians estimated by the `betr` crate: candidate
//! subsets of output quantities are scored by how well they condition the
//! inverse problem, either by expected inverse-volume scaling
//! ([`Criterion::Measure`]) or by conditioning of the induced
//! parameter-space cells ([`Criterion::Skewness`]), and a bounded
//! combinatorial search returns the best subsets of each size.

pub mod candidate;
pub mod criteria;
pub mod search;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use candidate::{merge_candidates, Candidate, RankedSets, RankedTable};
pub use criteria::{score_subset, subset_singular_values, Criterion};
pub use search::{
    choose_optimal_qois, find_unique_indices, grow_candidates, pair_candidates, score_candidates,
    SearchError, SearchOptions,
};

#[cfg(feature = "parallel")]
pub use parallel::{choose_optimal_qois_par, score_candidates_par};
