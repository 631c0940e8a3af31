//! Worker partitioning for single-program-multiple-data execution.
//!
//! The estimation and search workloads are embarrassingly parallel across
//! centers and candidate subsets. Rather than assuming a transport, the
//! core takes an explicit [`Communicator`]: a worker id, a worker count,
//! and an all-gather over ordered sequences. Every worker runs the same
//! code on its [`partition`] of the candidate list and sees the gathered
//! whole afterwards, so results cannot depend on scheduling order. The
//! default [`SerialComm`] makes everything testable in one thread.

use std::ops::Range;

/// Minimal collective interface the core needs from an execution backend.
///
/// `all_gather` must return every worker's contribution concatenated in
/// rank order, identically on all workers.
pub trait Communicator {
    /// This worker's id, in `0..size()`.
    fn rank(&self) -> usize;
    /// Total number of cooperating workers.
    fn size(&self) -> usize;
    /// Gather the local slices from all workers, concatenated by rank.
    fn all_gather<T: Clone>(&self, local: &[T]) -> Vec<T>;
}

/// The one-worker communicator: rank 0 of 1, gather is the identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather<T: Clone>(&self, local: &[T]) -> Vec<T> {
        local.to_vec()
    }
}

/// Contiguous share of `0..len` owned by `rank` out of `size` workers.
///
/// Shares differ in length by at most one, lower ranks take the longer
/// ones, and the union over all ranks is exactly `0..len`.
///
/// # Panics
///
/// Panics if `size` is zero or `rank >= size`.
pub fn partition(len: usize, rank: usize, size: usize) -> Range<usize> {
    assert!(size > 0, "worker count must be positive");
    assert!(rank < size, "rank {} out of range for {} workers", rank, size);

    let base = len / size;
    let rem = len % size;
    let start = rank * base + rank.min(rem);
    let extra = usize::from(rank < rem);
    start..start + base + extra
}
