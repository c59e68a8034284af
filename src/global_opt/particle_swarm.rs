//! Particle swarm optimization.
//!
//! Each particle keeps a position inside the bounds, a velocity and the best
//! position it has visited. One iteration moves every particle once:
//!
//! `v' = w v + c1 r1 (p_best - x) + c2 r2 (g_best - x)`, `x' = clamp(x + v')`
//!
//! with `r1` and `r2` drawn fresh for every coordinate. Two update orders are
//! available and they produce different trajectories for the same seed:
//!
//! * [`SwarmUpdate::Sequential`] moves the particles one after another and
//!   publishes a new global best immediately, so later particles in the same
//!   sweep are already attracted to it.
//! * [`SwarmUpdate::Batched`] moves all particles in parallel against the
//!   global best from the start of the sweep, each with its own generator,
//!   and reduces the new global best afterwards in index order.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

use crate::config::{validate_bounds, Bounds, OptimizationType};
use crate::end_criteria::EndCriteria;
use crate::error::{OptError, Result};
use crate::global_opt::{best_index, random_point};
use crate::objective::Objective;
use crate::solver::{Solver, SolverReport, SolverStatus};
use crate::utils::parallel::{par_map_indices, worker_rng, worker_seeds};
use crate::utils::vector_ops::clip_to_bounds;

type PositionGenerator = Box<dyn Fn(usize) -> Vec<Array1<f64>> + Send + Sync>;

/// Order in which particles move within one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SwarmUpdate {
    /// One particle at a time; the global best updates as soon as it improves.
    #[default]
    Sequential,

    /// All particles in parallel against a snapshot of the global best.
    Batched,
}

/// Configuration options for particle swarm optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSwarmConfig {
    /// Minimize or maximize. Default: Minimize
    pub optimization: OptimizationType,

    /// Number of particles, at least 2. Default: 30
    pub swarm_size: usize,

    /// Inertia weight `w`. Default: 0.729
    pub inertia: f64,

    /// Cognitive coefficient `c1` (pull towards the personal best). Default: 1.49445
    pub cognitive: f64,

    /// Social coefficient `c2` (pull towards the global best). Default: 1.49445
    pub social: f64,

    /// Initial velocities are drawn from `±velocity_scale * (upper - lower)`. Default: 0.1
    pub velocity_scale: f64,

    /// Particle update order. Default: Sequential
    pub update: SwarmUpdate,

    /// Stopping thresholds. Default: 200 iterations, 50-iteration plateau window
    pub end_criteria: EndCriteria,

    /// Seed used by [`ParticleSwarmOptimizer::optimize`]. Default: 42
    pub seed: u64,
}

impl Default for ParticleSwarmConfig {
    fn default() -> Self {
        Self {
            optimization: OptimizationType::default(),
            swarm_size: 30,
            inertia: 0.729,
            cognitive: 1.49445,
            social: 1.49445,
            velocity_scale: 0.1,
            update: SwarmUpdate::default(),
            end_criteria: EndCriteria::iterations(200).with_max_static_iterations(50),
            seed: 42,
        }
    }
}

impl ParticleSwarmConfig {
    pub fn with_optimization(mut self, optimization: OptimizationType) -> Self {
        self.optimization = optimization;
        self
    }

    pub fn with_swarm_size(mut self, size: usize) -> Self {
        self.swarm_size = size;
        self
    }

    pub fn with_coefficients(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia = inertia;
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    pub fn with_velocity_scale(mut self, scale: f64) -> Self {
        self.velocity_scale = scale;
        self
    }

    pub fn with_update(mut self, update: SwarmUpdate) -> Self {
        self.update = update;
        self
    }

    pub fn with_end_criteria(mut self, end_criteria: EndCriteria) -> Self {
        self.end_criteria = end_criteria;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.swarm_size < 2 {
            return Err(OptError::InvalidParameter(format!(
                "Swarm size must be at least 2, got {}",
                self.swarm_size
            )));
        }

        for (name, value) in [
            ("Inertia", self.inertia),
            ("Cognitive coefficient", self.cognitive),
            ("Social coefficient", self.social),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OptError::InvalidParameter(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        if !(self.velocity_scale > 0.0) || !self.velocity_scale.is_finite() {
            return Err(OptError::InvalidParameter(format!(
                "Velocity scale must be positive, got {}",
                self.velocity_scale
            )));
        }

        self.end_criteria.validate()
    }
}

#[derive(Debug, Clone)]
struct Particle {
    position: Array1<f64>,
    velocity: Array1<f64>,
    value: f64,
    best_position: Array1<f64>,
    best_value: f64,
}

#[derive(Debug, Clone)]
struct GlobalBest {
    position: Array1<f64>,
    value: f64,
}

/// Particle swarm optimizer over a box.
pub struct ParticleSwarmOptimizer<O: Objective> {
    objective: O,
    bounds: Bounds,
    config: ParticleSwarmConfig,
    generator: Option<PositionGenerator>,
    report: SolverReport,
}

impl<O: Objective> ParticleSwarmOptimizer<O> {
    /// Create an optimizer with the default configuration.
    ///
    /// # Errors
    ///
    /// * `OptError::BoundsError` if the bounds are invalid
    pub fn new(objective: O, bounds: Bounds) -> Result<Self> {
        Self::with_config(objective, bounds, ParticleSwarmConfig::default())
    }

    /// Create an optimizer with the given configuration.
    ///
    /// # Errors
    ///
    /// * `OptError::InvalidParameter` for a swarm of fewer than 2 particles or
    ///   negative coefficients
    /// * `OptError::BoundsError` if the bounds are invalid
    pub fn with_config(objective: O, bounds: Bounds, config: ParticleSwarmConfig) -> Result<Self> {
        config.validate()?;
        validate_bounds(&bounds)?;

        Ok(Self {
            objective,
            bounds,
            config,
            generator: None,
            report: SolverReport::not_run(Array1::zeros(0)),
        })
    }

    /// Use `generator` for the initial positions instead of uniform draws.
    ///
    /// The generator receives the swarm size and must return that many
    /// points of the bounds' dimension. Points are clamped into the bounds.
    pub fn with_generator<G>(mut self, generator: G) -> Self
    where
        G: Fn(usize) -> Vec<Array1<f64>> + Send + Sync + 'static,
    {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn config(&self) -> &ParticleSwarmConfig {
        &self.config
    }

    /// Run the swarm with a generator seeded from `config.seed`.
    pub fn optimize(&mut self) -> Result<&SolverReport> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.optimize_with_rng(&mut rng)
    }

    /// Run the swarm drawing all randomness from `rng`.
    ///
    /// # Errors
    ///
    /// * `OptError::DimensionMismatch` if a position generator returns the
    ///   wrong number of points or points of the wrong dimension
    pub fn optimize_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&SolverReport> {
        let optimization = self.config.optimization;
        let size = self.config.swarm_size;

        debug!(
            swarm_size = size,
            dimension = self.bounds.len(),
            update = ?self.config.update,
            "starting particle swarm"
        );

        let positions = self.initial_positions(rng)?;
        let velocities: Vec<Array1<f64>> = (0..size).map(|_| self.initial_velocity(rng)).collect();
        let values = par_map_indices(size, |i| self.oriented(&positions[i]));

        let mut swarm: Vec<Particle> = positions
            .into_iter()
            .zip(velocities)
            .zip(values)
            .map(|((position, velocity), value)| Particle {
                best_position: position.clone(),
                best_value: value,
                position,
                velocity,
                value,
            })
            .collect();

        let best = best_index(&swarm.iter().map(|p| p.best_value).collect::<Vec<_>>());
        let mut global = GlobalBest {
            position: swarm[best].best_position.clone(),
            value: swarm[best].best_value,
        };

        let mut report = SolverReport::not_run(global.position.clone());
        let mut history = vec![global.value];
        let mut evaluations = size;
        let mut iteration = 0;

        let status = loop {
            if let Some(status) = self.config.end_criteria.check(iteration, &history, None) {
                break status;
            }

            iteration += 1;
            match self.config.update {
                SwarmUpdate::Sequential => self.sequential_sweep(&mut swarm, &mut global, rng),
                SwarmUpdate::Batched => self.batched_sweep(&mut swarm, &mut global, rng),
            }
            evaluations += size;

            history.push(global.value);
            let actual = optimization.orient(global.value);
            report.record(iteration, actual);
            trace!(iteration, value = actual, "particle swarm iteration");
        };

        report.result = global.position;
        report.value = optimization.orient(global.value);
        report.status = status;
        report.iterations = iteration;
        report.evaluations = evaluations;

        debug!(
            status = ?report.status,
            iterations = report.iterations,
            value = report.value,
            "particle swarm finished"
        );

        self.report = report;
        Ok(&self.report)
    }

    /// Objective on the internal scale; NaN maps to +inf so it never wins.
    fn oriented(&self, x: &Array1<f64>) -> f64 {
        let value = self.config.optimization.orient(self.objective.value(x));
        if value.is_nan() {
            f64::INFINITY
        } else {
            value
        }
    }

    fn initial_positions<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Array1<f64>>> {
        let size = self.config.swarm_size;
        let n = self.bounds.len();

        let positions = match &self.generator {
            Some(generator) => generator(size),
            None => (0..size).map(|_| random_point(&self.bounds, rng)).collect(),
        };

        if positions.len() != size {
            return Err(OptError::DimensionMismatch(format!(
                "Position generator returned {} points for a swarm of {}",
                positions.len(),
                size
            )));
        }
        if let Some(bad) = positions.iter().find(|p| p.len() != n) {
            return Err(OptError::DimensionMismatch(format!(
                "Expected positions of dimension {}, got {}",
                n,
                bad.len()
            )));
        }

        Ok(positions
            .iter()
            .map(|p| clip_to_bounds(p, &self.bounds))
            .collect())
    }

    fn initial_velocity<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        self.bounds
            .iter()
            .map(|&(lower, upper)| {
                let span = self.config.velocity_scale * (upper - lower);
                if span > 0.0 {
                    rng.gen_range(-span..span)
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Move one particle towards its personal best and `global`.
    fn advance<R: Rng + ?Sized>(&self, particle: &Particle, global: &Array1<f64>, rng: &mut R) -> Particle {
        let n = particle.position.len();
        let mut velocity = Array1::zeros(n);

        for j in 0..n {
            let r1: f64 = rng.gen();
            let r2: f64 = rng.gen();
            let x = particle.position[j];
            velocity[j] = self.config.inertia * particle.velocity[j]
                + self.config.cognitive * r1 * (particle.best_position[j] - x)
                + self.config.social * r2 * (global[j] - x);
        }

        let position = clip_to_bounds(&(&particle.position + &velocity), &self.bounds);
        let value = self.oriented(&position);

        let (best_position, best_value) = if value < particle.best_value {
            (position.clone(), value)
        } else {
            (particle.best_position.clone(), particle.best_value)
        };

        Particle {
            position,
            velocity,
            value,
            best_position,
            best_value,
        }
    }

    fn sequential_sweep<R: Rng + ?Sized>(&self, swarm: &mut [Particle], global: &mut GlobalBest, rng: &mut R) {
        for particle in swarm.iter_mut() {
            *particle = self.advance(particle, &global.position, rng);

            if particle.best_value < global.value {
                global.position = particle.best_position.clone();
                global.value = particle.best_value;
            }
        }
    }

    fn batched_sweep<R: Rng + ?Sized>(&self, swarm: &mut Vec<Particle>, global: &mut GlobalBest, rng: &mut R) {
        let seeds = worker_seeds(rng, swarm.len());
        let snapshot = global.position.clone();

        let moved = {
            let current: &[Particle] = swarm;
            par_map_indices(current.len(), |i| {
                let mut worker = worker_rng(seeds[i]);
                self.advance(&current[i], &snapshot, &mut worker)
            })
        };
        *swarm = moved;

        for particle in swarm.iter() {
            if particle.best_value < global.value {
                global.position = particle.best_position.clone();
                global.value = particle.best_value;
            }
        }
    }
}

impl<O: Objective> Solver for ParticleSwarmOptimizer<O> {
    type Point = Array1<f64>;

    fn report(&self) -> &SolverReport {
        &self.report
    }
}

impl<O: Objective> fmt::Debug for ParticleSwarmOptimizer<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleSwarmOptimizer")
            .field("bounds", &self.bounds)
            .field("config", &self.config)
            .field("has_generator", &self.generator.is_some())
            .field("status", &self.report.status)
            .finish()
    }
}
