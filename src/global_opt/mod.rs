//! Population-based global optimization methods.
//!
//! This module provides two stochastic solvers that search a whole region
//! instead of following a local descent path: particle swarm optimization and
//! differential evolution. Both take their randomness from an explicit
//! generator, so a fixed seed reproduces a run exactly, including the batched
//! variants that evaluate candidates on the rayon thread pool.

use ndarray::Array1;
use rand::Rng;
use std::cmp::Ordering;

mod differential_evolution;
mod particle_swarm;

pub use differential_evolution::{
    DifferentialEvolutionConfig, DifferentialEvolutionOptimizer, GenerationUpdate,
};
pub use particle_swarm::{ParticleSwarmConfig, ParticleSwarmOptimizer, SwarmUpdate};

/// Generate a random point within the given bounds.
///
/// Infinite bounds fall back to a window of width 10 next to the finite side,
/// or `[-10, 10)` when both sides are infinite. A degenerate bound
/// (`lower == upper`) yields that value.
///
/// # Arguments
///
/// * `bounds` - Lower and upper bounds for each coordinate
/// * `rng` - Random number generator
pub fn random_point<R: Rng + ?Sized>(bounds: &[(f64, f64)], rng: &mut R) -> Array1<f64> {
    bounds
        .iter()
        .map(|&(min, max)| {
            if min.is_finite() && max.is_finite() {
                if min < max {
                    rng.gen_range(min..max)
                } else {
                    min
                }
            } else if min.is_finite() {
                min + rng.gen::<f64>() * 10.0
            } else if max.is_finite() {
                max - rng.gen::<f64>() * 10.0
            } else {
                rng.gen_range(-10.0..10.0)
            }
        })
        .collect()
}

/// Create a population of random points within the given bounds.
///
/// Useful for seeding a [`DifferentialEvolutionOptimizer`].
pub fn create_population<R: Rng + ?Sized>(
    bounds: &[(f64, f64)],
    size: usize,
    rng: &mut R,
) -> Vec<Array1<f64>> {
    (0..size).map(|_| random_point(bounds, rng)).collect()
}

/// Index of the lowest value, treating NaN as worse than anything else.
/// Ties keep the earliest index.
pub(crate) fn best_index(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|(i, a), (j, b)| match (a.is_nan(), b.is_nan()) {
            (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal).then(i.cmp(j)),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (true, true) => i.cmp(j),
        })
        .map_or(0, |(i, _)| i)
}
