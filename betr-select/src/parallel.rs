//! Rayon-parallel variants of the subset scoring.
//!
//! Candidate subsets are independent, so scoring maps across a thread
//! pool. Order is preserved, so the search results are bit-identical to
//! the serial path.

use num_traits::Float;
use rayon::prelude::*;

use betr::comm::Communicator;
use betr::jacobian::Jacobians;

use crate::candidate::{Candidate, RankedTable};
use crate::criteria::{score_subset, Criterion};
use crate::search::{choose_with_scorer, SearchError, SearchOptions};

/// Score a list of candidate subsets across a thread pool, preserving
/// list order.
pub fn score_candidates_par<F: Float + Send + Sync>(
    jacs: &Jacobians<F>,
    sets: &[Vec<usize>],
    criterion: Criterion,
) -> Vec<Candidate<F>> {
    sets.par_iter()
        .map(|set| Candidate::new(set.clone(), score_subset(jacs, set, criterion)))
        .collect()
}

/// [`crate::search::choose_optimal_qois`] with rayon-parallel scoring of
/// this worker's share of each size's candidates.
pub fn choose_optimal_qois_par<F, C>(
    jacs: &Jacobians<F>,
    criterion: Criterion,
    opts: &SearchOptions<F>,
    comm: &C,
) -> Result<RankedTable<F>, SearchError>
where
    F: Float + Send + Sync,
    C: Communicator,
{
    choose_with_scorer(jacs, criterion, opts, comm, score_candidates_par)
}
