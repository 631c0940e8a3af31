//! Scored QoI subsets and the ranked tables the search returns.

use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One candidate QoI subset with its score.
///
/// Indices are kept sorted ascending; a candidate is a set, not a
/// sequence, and two candidates with the same indices are the same
/// candidate regardless of discovery order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate<F> {
    /// QoI indices, sorted ascending.
    pub indices: Vec<usize>,
    /// Criterion score, lower is better. Infinite means inadmissible
    /// (the subset cannot resolve enough independent directions).
    pub score: F,
}

impl<F: Float> Candidate<F> {
    /// Build a candidate, sorting the indices into canonical order.
    pub fn new(mut indices: Vec<usize>, score: F) -> Self {
        indices.sort_unstable();
        Candidate { indices, score }
    }
}

/// Canonical candidate order: ascending score, ties by index
/// lexicographic order.
///
/// This order is what makes the reduction in
/// [`merge_candidates`] independent of how candidates were split across
/// workers.
pub fn canonical_cmp<F: Float>(a: &Candidate<F>, b: &Candidate<F>) -> std::cmp::Ordering {
    a.score
        .partial_cmp(&b.score)
        .expect("candidate scores are never NaN")
        .then_with(|| a.indices.cmp(&b.indices))
}

/// Merge per-worker candidate lists into one canonically ordered list.
///
/// Duplicate subsets (same index set) collapse to a single entry; since a
/// subset's score is a pure function of the Jacobians, duplicates always
/// carry equal scores and the survivor is well defined.
pub fn merge_candidates<F: Float>(parts: Vec<Vec<Candidate<F>>>) -> Vec<Candidate<F>> {
    let mut by_indices = std::collections::BTreeMap::new();
    for part in parts {
        for cand in part {
            by_indices.entry(cand.indices.clone()).or_insert(cand);
        }
    }
    let mut merged: Vec<Candidate<F>> = by_indices.into_values().collect();
    merged.sort_by(canonical_cmp);
    merged
}

/// The ranked candidates of one subset size.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankedSets<F> {
    /// Subset size `k`.
    pub size: usize,
    /// Admissible candidates in canonical order, best first. May hold
    /// fewer entries than requested when fewer admissible subsets exist,
    /// and is empty when none do.
    pub sets: Vec<Candidate<F>>,
}

/// Ranked result table: for each target subset size, the best candidates
/// found.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankedTable<F> {
    /// One entry per subset size, ascending in `size` from 2.
    pub by_size: Vec<RankedSets<F>>,
}

impl<F: Float> RankedTable<F> {
    /// The ranked candidates of size `k`, if that size was searched.
    pub fn sets_of_size(&self, k: usize) -> Option<&[Candidate<F>]> {
        self.by_size
            .iter()
            .find(|r| r.size == k)
            .map(|r| r.sets.as_slice())
    }

    /// The best candidate of size `k`, if any admissible one was found.
    pub fn best(&self, k: usize) -> Option<&Candidate<F>> {
        self.sets_of_size(k).and_then(|sets| sets.first())
    }
}
