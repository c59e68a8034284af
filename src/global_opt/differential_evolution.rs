//! Differential Evolution algorithm for global optimization.
//!
//! This module implements the classic DE/rand/1/bin scheme over a caller
//! supplied population. For each member `k` a trial vector is built from three
//! other distinct members `a`, `b`, `c`:
//!
//! `y_i = a_i + F (b_i - c_i)` with probability `CR`, otherwise `y_i = k_i`
//!
//! Trials are resampled until the caller's feasibility predicate accepts
//! them, and replace `k` only on strict improvement. The run stops on the
//! iteration cap alone.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace, warn};

use crate::config::OptimizationType;
use crate::end_criteria::EndCriteria;
use crate::error::{OptError, Result};
use crate::global_opt::best_index;
use crate::objective::Objective;
use crate::solver::{Solver, SolverReport, SolverStatus};
use crate::utils::parallel::{par_map_indices, worker_rng, worker_seeds};

/// Smallest accepted population.
const MIN_POPULATION: usize = 5;

/// How a generation is applied to the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenerationUpdate {
    /// Members are replaced as soon as their trial wins, so later trials in
    /// the same generation may be built from already updated members.
    #[default]
    InPlace,

    /// All trials are built in parallel from the population as it was at the
    /// start of the generation, then selected in one pass.
    Batched,
}

/// Configuration options for differential evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferentialEvolutionConfig {
    /// Minimize or maximize. Default: Minimize
    pub optimization: OptimizationType,

    /// Differential weight (F) in range (0, 2]. Default: 0.8
    pub weight: f64,

    /// Crossover probability (CR) in range [0, 1]. Default: 0.9
    pub crossover: f64,

    /// Generation update order. Default: InPlace
    pub update: GenerationUpdate,

    /// Iteration cap; only `max_iterations` is consulted. Default: 100
    pub end_criteria: EndCriteria,

    /// Maximum number of rejected trials per member and generation. `None`
    /// resamples until a feasible trial appears. Default: 1000
    pub max_resamples: Option<usize>,

    /// Seed used by [`DifferentialEvolutionOptimizer::optimize`]. Default: 42
    pub seed: u64,
}

impl Default for DifferentialEvolutionConfig {
    fn default() -> Self {
        Self {
            optimization: OptimizationType::default(),
            weight: 0.8,
            crossover: 0.9,
            update: GenerationUpdate::default(),
            end_criteria: EndCriteria::iterations(100),
            max_resamples: Some(1000),
            seed: 42,
        }
    }
}

impl DifferentialEvolutionConfig {
    pub fn with_optimization(mut self, optimization: OptimizationType) -> Self {
        self.optimization = optimization;
        self
    }

    /// Set the differential weight (F).
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Set the crossover probability (CR).
    pub fn with_crossover(mut self, crossover: f64) -> Self {
        self.crossover = crossover;
        self
    }

    pub fn with_update(mut self, update: GenerationUpdate) -> Self {
        self.update = update;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.end_criteria = self.end_criteria.with_max_iterations(max_iterations);
        self
    }

    pub fn with_max_resamples(mut self, max_resamples: Option<usize>) -> Self {
        self.max_resamples = max_resamples;
        self
    }

    /// Set the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.weight > 0.0 && self.weight <= 2.0) {
            return Err(OptError::InvalidParameter(format!(
                "Differential weight must lie in (0, 2], got {}",
                self.weight
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover) {
            return Err(OptError::InvalidParameter(format!(
                "Crossover probability must lie in [0, 1], got {}",
                self.crossover
            )));
        }
        self.end_criteria.validate()
    }
}

/// Differential evolution over a caller-supplied population.
pub struct DifferentialEvolutionOptimizer<O, F>
where
    O: Objective,
    F: Fn(&Array1<f64>) -> bool + Sync,
{
    objective: O,
    feasible: F,
    population: Vec<Array1<f64>>,
    config: DifferentialEvolutionConfig,
    report: SolverReport,
}

impl<O, F> DifferentialEvolutionOptimizer<O, F>
where
    O: Objective,
    F: Fn(&Array1<f64>) -> bool + Sync,
{
    /// Create an optimizer with the default configuration.
    ///
    /// # Arguments
    ///
    /// * `objective` - The function to optimize
    /// * `population` - Initial members, copied; more than 4 are required
    /// * `feasible` - Predicate every member and accepted trial must satisfy
    ///
    /// # Errors
    ///
    /// * `OptError::InvalidParameter` if the population has 4 or fewer members
    /// * `OptError::DimensionMismatch` if the members differ in dimension
    /// * `OptError::InfeasiblePopulation` if a member fails `feasible`
    pub fn new(objective: O, population: Vec<Array1<f64>>, feasible: F) -> Result<Self> {
        Self::with_config(objective, population, feasible, DifferentialEvolutionConfig::default())
    }

    pub fn with_config(
        objective: O,
        population: Vec<Array1<f64>>,
        feasible: F,
        config: DifferentialEvolutionConfig,
    ) -> Result<Self> {
        config.validate()?;

        if population.len() < MIN_POPULATION {
            return Err(OptError::InvalidParameter(format!(
                "Population must have more than 4 members, got {}",
                population.len()
            )));
        }

        let n = population[0].len();
        if n == 0 {
            return Err(OptError::InvalidInput(
                "Population members must have at least one coordinate".to_string(),
            ));
        }
        if let Some((i, member)) = population.iter().enumerate().find(|(_, m)| m.len() != n) {
            return Err(OptError::DimensionMismatch(format!(
                "Member {} has dimension {}, expected {}",
                i,
                member.len(),
                n
            )));
        }
        if let Some(i) = population.iter().position(|m| !feasible(m)) {
            return Err(OptError::InfeasiblePopulation(format!(
                "Member {} of the initial population is not feasible",
                i
            )));
        }

        Ok(Self {
            objective,
            feasible,
            population,
            config,
            report: SolverReport::not_run(Array1::zeros(0)),
        })
    }

    pub fn config(&self) -> &DifferentialEvolutionConfig {
        &self.config
    }

    /// The initial population every run starts from.
    pub fn population(&self) -> &[Array1<f64>] {
        &self.population
    }

    /// Run with a generator seeded from `config.seed`.
    pub fn optimize(&mut self) -> Result<&SolverReport> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.optimize_with_rng(&mut rng)
    }

    /// Run drawing all randomness from `rng`.
    pub fn optimize_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&SolverReport> {
        let optimization = self.config.optimization;
        let size = self.population.len();

        debug!(
            population = size,
            dimension = self.population[0].len(),
            update = ?self.config.update,
            "starting differential evolution"
        );

        let mut population = self.population.clone();
        let mut values = par_map_indices(size, |k| self.oriented(&population[k]));
        let mut evaluations = size;
        let mut iteration = 0;
        let mut report = SolverReport::not_run(Array1::zeros(0));

        let status = loop {
            let best = values[best_index(&values)];
            if !best.is_finite() {
                break SolverStatus::Diverged;
            }
            if self.config.end_criteria.iteration_exceeded(iteration) {
                break SolverStatus::IterationExceeded;
            }

            iteration += 1;
            evaluations += match self.config.update {
                GenerationUpdate::InPlace => self.in_place_generation(&mut population, &mut values, rng),
                GenerationUpdate::Batched => self.batched_generation(&mut population, &mut values, rng),
            };

            let actual = optimization.orient(values[best_index(&values)]);
            report.record(iteration, actual);
            trace!(iteration, value = actual, "differential evolution generation");
        };

        let best = best_index(&values);
        report.result = population.swap_remove(best);
        report.value = optimization.orient(values[best]);
        report.status = status;
        report.iterations = iteration;
        report.evaluations = evaluations;

        debug!(
            status = ?report.status,
            iterations = report.iterations,
            evaluations = report.evaluations,
            value = report.value,
            "differential evolution finished"
        );

        self.report = report;
        Ok(&self.report)
    }

    fn oriented(&self, x: &Array1<f64>) -> f64 {
        self.config.optimization.orient(self.objective.value(x))
    }

    /// Build a feasible trial for member `k`, or `None` once the resample
    /// budget is spent.
    fn trial<R: Rng + ?Sized>(&self, k: usize, population: &[Array1<f64>], rng: &mut R) -> Option<Array1<f64>> {
        let size = population.len();
        let target = &population[k];
        let mut rejected = 0;

        loop {
            // Three distinct indices out of the other size - 1 members.
            let picks = sample(rng, size - 1, 3);
            let skip = |i: usize| if i >= k { i + 1 } else { i };
            let (a, b, c) = (
                &population[skip(picks.index(0))],
                &population[skip(picks.index(1))],
                &population[skip(picks.index(2))],
            );

            let trial = Array1::from_shape_fn(target.len(), |i| {
                if rng.gen::<f64>() < self.config.crossover {
                    a[i] + self.config.weight * (b[i] - c[i])
                } else {
                    target[i]
                }
            });

            if (self.feasible)(&trial) {
                return Some(trial);
            }

            rejected += 1;
            if self.config.max_resamples.map_or(false, |max| rejected > max) {
                warn!(member = k, rejected, "no feasible trial found, keeping member");
                return None;
            }
        }
    }

    fn in_place_generation<R: Rng + ?Sized>(
        &self,
        population: &mut [Array1<f64>],
        values: &mut [f64],
        rng: &mut R,
    ) -> usize {
        let mut evaluations = 0;

        for k in 0..population.len() {
            if let Some(trial) = self.trial(k, population, rng) {
                let value = self.oriented(&trial);
                evaluations += 1;

                if value < values[k] || (values[k].is_nan() && !value.is_nan()) {
                    population[k] = trial;
                    values[k] = value;
                }
            }
        }

        evaluations
    }

    fn batched_generation<R: Rng + ?Sized>(
        &self,
        population: &mut [Array1<f64>],
        values: &mut [f64],
        rng: &mut R,
    ) -> usize {
        let seeds = worker_seeds(rng, population.len());

        let trials = {
            let frozen: &[Array1<f64>] = population;
            par_map_indices(frozen.len(), |k| {
                let mut worker = worker_rng(seeds[k]);
                self.trial(k, frozen, &mut worker).map(|trial| {
                    let value = self.oriented(&trial);
                    (trial, value)
                })
            })
        };

        let mut evaluations = 0;
        for (k, outcome) in trials.into_iter().enumerate() {
            if let Some((trial, value)) = outcome {
                evaluations += 1;
                if value < values[k] || (values[k].is_nan() && !value.is_nan()) {
                    population[k] = trial;
                    values[k] = value;
                }
            }
        }

        evaluations
    }
}

impl<O, F> Solver for DifferentialEvolutionOptimizer<O, F>
where
    O: Objective,
    F: Fn(&Array1<f64>) -> bool + Sync,
{
    type Point = Array1<f64>;

    fn report(&self) -> &SolverReport {
        &self.report
    }
}

impl<O, F> fmt::Debug for DifferentialEvolutionOptimizer<O, F>
where
    O: Objective,
    F: Fn(&Array1<f64>) -> bool + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifferentialEvolutionOptimizer")
            .field("population", &self.population.len())
            .field("config", &self.config)
            .field("status", &self.report.status)
            .finish()
    }
}
