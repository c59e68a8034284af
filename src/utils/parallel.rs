//! Parallel processing utilities.
//!
//! Internal parallelism is limited to independent per-index work: each index
//! writes exactly one output and no locks are taken. Random draws inside a
//! parallel sweep come from per-worker generators whose seeds are drawn
//! sequentially from the caller's generator beforehand.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Map `f` over `0..n` in parallel, preserving index order in the output.
pub fn par_map_indices<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..n).into_par_iter().map(f).collect()
}

/// Draw one seed per worker from a master generator.
///
/// The draws happen sequentially, so the seeds depend only on the master
/// generator's state and never on thread scheduling.
pub fn worker_seeds<R: Rng + ?Sized>(master: &mut R, workers: usize) -> Vec<u64> {
    (0..workers).map(|_| master.gen::<u64>()).collect()
}

/// Create an independent generator for one worker.
pub fn worker_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
