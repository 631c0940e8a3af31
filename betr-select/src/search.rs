//! Bounded combinatorial search for the best QoI subsets.
//!
//! Pairs are scored exhaustively after a redundancy filter shrinks the
//! candidate pool; larger sizes grow greedily from the surviving smaller
//! subsets. The growth is a heuristic: it bounds the work to roughly
//! `seeds * d_output` scorings per size instead of `C(d_output, k)`, at
//! the cost of not guaranteeing the global optimum for sizes above 2.
//!
//! The two tolerances are independent filters applied in sequence: the
//! similarity filter (`inner_prod_tol`) runs once over the columns before
//! any scoring, and the score cutoff (`score_tol`) selects which scored
//! subsets seed the next size.
//!
//! Work is partitioned over a [`Communicator`]; the reduction sorts by
//! score with index-lexicographic tie-breaking, so the result is
//! identical for any worker count.

use std::fmt;

use num_traits::Float;

use betr::comm::{partition, Communicator};
use betr::jacobian::Jacobians;
use betr::linalg::{dot, norm};

use crate::candidate::{merge_candidates, Candidate, RankedSets, RankedTable};
use crate::criteria::{score_subset, Criterion};

/// Options for [`choose_optimal_qois`].
#[derive(Clone, Debug)]
pub struct SearchOptions<F> {
    /// Largest subset size to search. `None` means the input dimension.
    /// Silently capped at the output dimension.
    pub max_subset_size: Option<usize>,
    /// How many best subsets to keep per size.
    pub num_optsets_return: usize,
    /// Columns whose mean absolute cosine similarity reaches this value
    /// are treated as redundant and only the lower index is kept. `1.0`
    /// prunes only exactly (anti)parallel columns.
    pub inner_prod_tol: F,
    /// Scored subsets above this value do not seed the next size.
    pub score_tol: F,
}

impl<F: Float> Default for SearchOptions<F> {
    fn default() -> Self {
        SearchOptions {
            max_subset_size: None,
            num_optsets_return: 10,
            inner_prod_tol: F::from(0.9).expect("small constant fits the float type"),
            score_tol: F::infinity(),
        }
    }
}

/// Configuration errors rejected before any scoring starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchError {
    /// The Jacobian collection holds no centers.
    NoJacobians,
    /// Subsets need at least two QoIs and two input dimensions.
    InputDimTooSmall { input_dim: usize },
    /// `max_subset_size` below 2 searches nothing.
    MaxSubsetTooSmall { got: usize },
    /// Subsets larger than the input dimension cannot be scored.
    MaxSubsetExceedsInput { got: usize, input_dim: usize },
    /// Tolerances must be nonnegative (and the similarity tolerance at
    /// most 1, a cosine bound).
    InvalidTolerance,
    /// Asking for zero result sets per size is a contradiction.
    NoOptsetsRequested,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::NoJacobians => write!(f, "no Jacobians supplied"),
            SearchError::InputDimTooSmall { input_dim } => {
                write!(f, "input dimension {} supports no size-2 subsets", input_dim)
            }
            SearchError::MaxSubsetTooSmall { got } => {
                write!(f, "max subset size {} is below 2", got)
            }
            SearchError::MaxSubsetExceedsInput { got, input_dim } => write!(
                f,
                "max subset size {} exceeds input dimension {}",
                got, input_dim
            ),
            SearchError::InvalidTolerance => {
                write!(f, "tolerances must be nonnegative, similarity at most 1")
            }
            SearchError::NoOptsetsRequested => write!(f, "zero result sets requested"),
        }
    }
}

impl std::error::Error for SearchError {}

/// Filter the candidate QoI pool down to columns that carry independent
/// directional information.
///
/// A QoI is dropped when its gradient vanishes at some center (it cannot
/// resolve a direction there), or when its mean cosine similarity with an
/// already-kept QoI reaches `inner_prod_tol` in absolute value.
pub fn find_unique_indices<F: Float>(jacs: &Jacobians<F>, inner_prod_tol: F) -> Vec<usize> {
    let centers = jacs.num_centers();

    // Normalized rows per center; None marks a QoI with a vanishing
    // gradient somewhere.
    let mut normalized: Vec<Option<Vec<Vec<F>>>> = Vec::with_capacity(jacs.output_dim());
    for q in 0..jacs.output_dim() {
        let mut rows = Vec::with_capacity(centers);
        let mut alive = true;
        for mat in jacs.iter() {
            let n = norm(&mat[q]);
            if n <= F::zero() {
                alive = false;
                break;
            }
            rows.push(mat[q].iter().map(|&v| v / n).collect());
        }
        normalized.push(if alive { Some(rows) } else { None });
    }

    let num_centers = F::from(centers).expect("center count fits the float type");
    let mut kept: Vec<usize> = Vec::new();
    'outer: for q in 0..jacs.output_dim() {
        let Some(rows_q) = normalized[q].as_ref() else {
            continue;
        };
        for &p in &kept {
            let rows_p = normalized[p].as_ref().expect("kept QoIs are alive");
            let mut cos = F::zero();
            for (a, b) in rows_p.iter().zip(rows_q.iter()) {
                cos = cos + dot(a, b);
            }
            cos = (cos / num_centers).max(-F::one()).min(F::one());
            if cos.abs() >= inner_prod_tol {
                continue 'outer;
            }
        }
        kept.push(q);
    }
    kept
}

/// All index pairs from the pool, in lexicographic order.
pub fn pair_candidates(indices: &[usize]) -> Vec<Vec<usize>> {
    let mut pairs = Vec::new();
    for (i, &a) in indices.iter().enumerate() {
        for &b in &indices[i + 1..] {
            pairs.push(vec![a.min(b), a.max(b)]);
        }
    }
    pairs
}

/// Extend every seed by one pool index it does not already contain,
/// deduplicated, in lexicographic order.
pub fn grow_candidates<F: Float>(seeds: &[Candidate<F>], pool: &[usize]) -> Vec<Vec<usize>> {
    let mut grown = std::collections::BTreeSet::new();
    for seed in seeds {
        for &q in pool {
            if seed.indices.contains(&q) {
                continue;
            }
            let mut set = seed.indices.clone();
            set.push(q);
            set.sort_unstable();
            grown.insert(set);
        }
    }
    grown.into_iter().collect()
}

/// Score a list of candidate subsets, preserving list order.
pub fn score_candidates<F: Float>(
    jacs: &Jacobians<F>,
    sets: &[Vec<usize>],
    criterion: Criterion,
) -> Vec<Candidate<F>> {
    sets.iter()
        .map(|set| Candidate::new(set.clone(), score_subset(jacs, set, criterion)))
        .collect()
}

fn validate<F: Float>(
    jacs: &Jacobians<F>,
    opts: &SearchOptions<F>,
) -> Result<usize, SearchError> {
    if jacs.num_centers() == 0 {
        return Err(SearchError::NoJacobians);
    }
    if jacs.input_dim() < 2 {
        return Err(SearchError::InputDimTooSmall {
            input_dim: jacs.input_dim(),
        });
    }
    if opts.num_optsets_return == 0 {
        return Err(SearchError::NoOptsetsRequested);
    }
    if !(opts.inner_prod_tol >= F::zero() && opts.inner_prod_tol <= F::one())
        || !(opts.score_tol >= F::zero())
    {
        return Err(SearchError::InvalidTolerance);
    }

    let max_k = opts.max_subset_size.unwrap_or_else(|| jacs.input_dim());
    if max_k < 2 {
        return Err(SearchError::MaxSubsetTooSmall { got: max_k });
    }
    if max_k > jacs.input_dim() {
        return Err(SearchError::MaxSubsetExceedsInput {
            got: max_k,
            input_dim: jacs.input_dim(),
        });
    }
    // Sizes beyond the output dimension have no candidates; cap quietly.
    Ok(max_k.min(jacs.output_dim()))
}

/// Shared search loop; `score` lets the parallel variant swap in a rayon
/// scorer without touching the control flow.
pub(crate) fn choose_with_scorer<F, C, S>(
    jacs: &Jacobians<F>,
    criterion: Criterion,
    opts: &SearchOptions<F>,
    comm: &C,
    score: S,
) -> Result<RankedTable<F>, SearchError>
where
    F: Float,
    C: Communicator,
    S: Fn(&Jacobians<F>, &[Vec<usize>], Criterion) -> Vec<Candidate<F>>,
{
    let max_k = validate(jacs, opts)?;
    let pool = find_unique_indices(jacs, opts.inner_prod_tol);

    let mut table = RankedTable {
        by_size: Vec::with_capacity(max_k.saturating_sub(1)),
    };
    let mut seeds: Vec<Candidate<F>> = Vec::new();

    for k in 2..=max_k {
        let sets = if k == 2 {
            pair_candidates(&pool)
        } else {
            grow_candidates(&seeds, &pool)
        };

        let share = partition(sets.len(), comm.rank(), comm.size());
        let local = score(jacs, &sets[share], criterion);
        let gathered = comm.all_gather(&local);

        let mut merged = merge_candidates(vec![gathered]);
        merged.retain(|c| c.score.is_finite());

        seeds = merged
            .iter()
            .filter(|c| c.score <= opts.score_tol)
            .cloned()
            .collect();

        merged.truncate(opts.num_optsets_return);
        table.by_size.push(RankedSets { size: k, sets: merged });

        if seeds.is_empty() {
            // Nothing admissible to grow from; the remaining sizes are
            // legitimately empty rather than an error.
            for size in (k + 1)..=max_k {
                table.by_size.push(RankedSets {
                    size,
                    sets: Vec::new(),
                });
            }
            break;
        }
    }

    Ok(table)
}

/// Search for the QoI subsets that best condition the inverse problem.
///
/// For each size from 2 up to `max_subset_size` (capped at the output
/// dimension), returns up to `num_optsets_return` lowest-scoring
/// admissible subsets under the given criterion. Sizes above 2 are found
/// by greedy growth from the previous size's seeds and are therefore
/// approximate.
///
/// Every worker of `comm` must call this with identical arguments; the
/// returned table is identical on all workers and for any worker count.
pub fn choose_optimal_qois<F: Float, C: Communicator>(
    jacs: &Jacobians<F>,
    criterion: Criterion,
    opts: &SearchOptions<F>,
    comm: &C,
) -> Result<RankedTable<F>, SearchError> {
    choose_with_scorer(jacs, criterion, opts, comm, score_candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use betr::comm::SerialComm;

    fn diag_jacobians() -> Jacobians<f64> {
        // Three QoIs over two parameters: two orthogonal, one redundant
        // with the first.
        Jacobians::new(
            3,
            2,
            vec![vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 0.0]]],
        )
        .unwrap()
    }

    #[test]
    fn redundant_column_is_pruned() {
        let pool = find_unique_indices(&diag_jacobians(), 0.9);
        assert_eq!(pool, vec![0, 1]);
    }

    #[test]
    fn tol_one_keeps_distinct_columns() {
        let jacs = Jacobians::new(
            3,
            2,
            vec![vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]],
        )
        .unwrap();
        let pool = find_unique_indices(&jacs, 1.0);
        assert_eq!(pool, vec![0, 1, 2]);
    }

    #[test]
    fn zero_gradient_qoi_is_dropped() {
        let jacs = Jacobians::new(
            2,
            2,
            vec![vec![vec![1.0, 0.0], vec![0.0, 0.0]]],
        )
        .unwrap();
        assert_eq!(find_unique_indices(&jacs, 1.0), vec![0]);
    }

    #[test]
    fn pairs_are_lexicographic() {
        assert_eq!(
            pair_candidates(&[0, 2, 5]),
            vec![vec![0, 2], vec![0, 5], vec![2, 5]]
        );
    }

    #[test]
    fn grow_skips_contained_indices_and_dedups() {
        let seeds = vec![
            Candidate::new(vec![0, 1], 1.0),
            Candidate::new(vec![0, 2], 2.0),
        ];
        let grown = grow_candidates(&seeds, &[0, 1, 2]);
        assert_eq!(grown, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn validate_rejects_bad_options() {
        let jacs = diag_jacobians();
        let mut opts = SearchOptions::<f64>::default();
        opts.num_optsets_return = 0;
        assert_eq!(
            choose_optimal_qois(&jacs, Criterion::Measure, &opts, &SerialComm).unwrap_err(),
            SearchError::NoOptsetsRequested
        );

        let mut opts = SearchOptions::<f64>::default();
        opts.inner_prod_tol = -0.1;
        assert_eq!(
            choose_optimal_qois(&jacs, Criterion::Measure, &opts, &SerialComm).unwrap_err(),
            SearchError::InvalidTolerance
        );

        let mut opts = SearchOptions::<f64>::default();
        opts.max_subset_size = Some(5);
        assert_eq!(
            choose_optimal_qois(&jacs, Criterion::Measure, &opts, &SerialComm).unwrap_err(),
            SearchError::MaxSubsetExceedsInput {
                got: 5,
                input_dim: 2
            }
        );
    }
}
