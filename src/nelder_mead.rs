//! Derivative-free Nelder-Mead simplex search over a box.
//!
//! The simplex holds `n + 1` vertices. Each iteration tries a reflection, an
//! expansion and an inside contraction of the worst vertex through the
//! centroid of the others, in that order, and shrinks the whole simplex
//! towards the best vertex only when none of them improves. Every candidate
//! vertex is clamped into the bounds.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, trace};

use crate::config::{validate_bounds, Bounds, OptimizationType};
use crate::end_criteria::EndCriteria;
use crate::error::{OptError, Result};
use crate::global_opt::random_point;
use crate::objective::Objective;
use crate::solver::{Solver, SolverReport, SolverStatus};
use crate::utils::parallel::par_map_indices;
use crate::utils::vector_ops::{centroid, clip_to_bounds, linear_combination};

/// Configuration options for Nelder-Mead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadConfig {
    /// Minimize or maximize. Default: Minimize
    pub optimization: OptimizationType,

    /// Stop once `|f(centroid) - f(best)|` falls below this. Default: 1e-10
    pub tolerance: f64,

    /// Iteration cap; only `max_iterations` is consulted. Default: 1000
    pub end_criteria: EndCriteria,

    /// Reflection coefficient (alpha). Default: 1.0
    pub reflection: f64,

    /// Expansion coefficient (gamma). Default: 2.0
    pub expansion: f64,

    /// Contraction coefficient (rho). Default: 0.5
    pub contraction: f64,

    /// Shrink coefficient (sigma). Default: 0.5
    pub shrink: f64,

    /// Edge length of the axis simplex built by [`NelderMead::optimize`], as a
    /// fraction of each bound's width. Default: 0.05
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            optimization: OptimizationType::default(),
            tolerance: 1e-10,
            end_criteria: EndCriteria::iterations(1000),
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
        }
    }
}

impl NelderMeadConfig {
    pub fn with_optimization(mut self, optimization: OptimizationType) -> Self {
        self.optimization = optimization;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.end_criteria = self.end_criteria.with_max_iterations(max_iterations);
        self
    }

    pub fn with_coefficients(mut self, reflection: f64, expansion: f64, contraction: f64, shrink: f64) -> Self {
        self.reflection = reflection;
        self.expansion = expansion;
        self.contraction = contraction;
        self.shrink = shrink;
        self
    }

    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance > 0.0) {
            return Err(OptError::InvalidParameter(format!(
                "Tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.reflection > 0.0) {
            return Err(OptError::InvalidParameter(format!(
                "Reflection coefficient must be positive, got {}",
                self.reflection
            )));
        }
        if !(self.expansion > 1.0) || self.expansion <= self.reflection {
            return Err(OptError::InvalidParameter(format!(
                "Expansion coefficient must exceed 1 and the reflection coefficient, got {}",
                self.expansion
            )));
        }
        for (name, value) in [("Contraction", self.contraction), ("Shrink", self.shrink)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(OptError::InvalidParameter(format!(
                    "{} coefficient must lie in (0, 1), got {}",
                    name, value
                )));
            }
        }
        if !(self.initial_step > 0.0 && self.initial_step <= 1.0) {
            return Err(OptError::InvalidParameter(format!(
                "Initial step must lie in (0, 1], got {}",
                self.initial_step
            )));
        }
        self.end_criteria.validate()
    }
}

/// A simplex vertex and its oriented value (lower is better).
#[derive(Debug, Clone)]
struct Vertex {
    point: Array1<f64>,
    value: f64,
}

/// Nelder-Mead simplex solver over a box.
pub struct NelderMead<O: Objective> {
    objective: O,
    bounds: Bounds,
    config: NelderMeadConfig,
    report: SolverReport,
}

impl<O: Objective> NelderMead<O> {
    /// Create a solver with the default configuration.
    ///
    /// # Errors
    ///
    /// * `OptError::BoundsError` if the bounds are empty, non-finite or unordered
    pub fn new(objective: O, bounds: Bounds) -> Result<Self> {
        Self::with_config(objective, bounds, NelderMeadConfig::default())
    }

    pub fn with_config(objective: O, bounds: Bounds, config: NelderMeadConfig) -> Result<Self> {
        validate_bounds(&bounds)?;
        config.validate()?;

        Ok(Self {
            objective,
            bounds,
            config,
            report: SolverReport::not_run(Array1::zeros(0)),
        })
    }

    pub fn config(&self) -> &NelderMeadConfig {
        &self.config
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn dimension(&self) -> usize {
        self.bounds.len()
    }

    /// Search from an axis-aligned simplex around `initial`.
    ///
    /// Vertex `i + 1` moves coordinate `i` by `initial_step` times the width of
    /// its bound, stepping downwards when an upward step would leave the box.
    pub fn optimize(&mut self, initial: &Array1<f64>) -> Result<&SolverReport> {
        let n = self.dimension();
        if initial.len() != n {
            return Err(OptError::DimensionMismatch(format!(
                "Expected a start point of dimension {}, got {}",
                n,
                initial.len()
            )));
        }

        let origin = clip_to_bounds(initial, &self.bounds);
        let mut vertices = Vec::with_capacity(n + 1);
        vertices.push(origin.clone());

        for (i, &(lower, upper)) in self.bounds.iter().enumerate() {
            let step = self.config.initial_step * (upper - lower);
            let mut vertex = origin.clone();
            vertex[i] = if origin[i] + step <= upper {
                origin[i] + step
            } else {
                origin[i] - step
            };
            vertices.push(vertex);
        }

        self.run(vertices)
    }

    /// Search from a simplex drawn uniformly inside the bounds.
    pub fn optimize_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&SolverReport> {
        let vertices = (0..=self.dimension())
            .map(|_| random_point(&self.bounds, rng))
            .collect();
        self.run(vertices)
    }

    /// Search from a simplex produced by `generator`, which receives the
    /// number of vertices to build.
    pub fn optimize_with<G>(&mut self, generator: G) -> Result<&SolverReport>
    where
        G: FnOnce(usize) -> Vec<Array1<f64>>,
    {
        let vertices = generator(self.dimension() + 1);
        self.optimize_from_simplex(&vertices)
    }

    /// Search from an explicit set of `n + 1` vertices.
    ///
    /// The vertices are copied and clamped into the bounds.
    pub fn optimize_from_simplex(&mut self, vertices: &[Array1<f64>]) -> Result<&SolverReport> {
        let n = self.dimension();
        if vertices.len() != n + 1 {
            return Err(OptError::DimensionMismatch(format!(
                "A simplex in {} dimensions needs {} vertices, got {}",
                n,
                n + 1,
                vertices.len()
            )));
        }
        if let Some(bad) = vertices.iter().find(|v| v.len() != n) {
            return Err(OptError::DimensionMismatch(format!(
                "Expected vertices of dimension {}, got {}",
                n,
                bad.len()
            )));
        }

        self.run(vertices.to_vec())
    }

    /// Objective on the internal scale; NaN maps to +inf so it sorts last.
    fn oriented(&self, x: &Array1<f64>) -> f64 {
        let value = self.config.optimization.orient(self.objective.value(x));
        if value.is_nan() {
            f64::INFINITY
        } else {
            value
        }
    }

    fn run(&mut self, points: Vec<Array1<f64>>) -> Result<&SolverReport> {
        let n = self.dimension();
        let optimization = self.config.optimization;

        debug!(dimension = n, optimization = ?optimization, "starting Nelder-Mead");

        let points: Vec<Array1<f64>> = points
            .iter()
            .map(|p| clip_to_bounds(p, &self.bounds))
            .collect();
        let values = par_map_indices(points.len(), |i| self.oriented(&points[i]));
        let mut simplex: Vec<Vertex> = points
            .into_iter()
            .zip(values)
            .map(|(point, value)| Vertex { point, value })
            .collect();

        let mut report = SolverReport::not_run(Array1::zeros(n));
        let mut evaluations = simplex.len();
        let mut iteration = 0;

        let status = loop {
            simplex.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

            if !simplex[0].value.is_finite() {
                break SolverStatus::Diverged;
            }

            let center = centroid(simplex[..n].iter().map(|v| &v.point), n);
            let center_value = self.oriented(&center);
            evaluations += 1;

            if (center_value - simplex[0].value).abs() < self.config.tolerance {
                break SolverStatus::Normal;
            }

            if self.config.end_criteria.iteration_exceeded(iteration) {
                break SolverStatus::IterationExceeded;
            }

            iteration += 1;
            evaluations += self.step(&mut simplex, &center);

            let best = simplex.iter().map(|v| v.value).fold(f64::INFINITY, f64::min);
            let actual = optimization.orient(best);
            report.record(iteration, actual);
            trace!(iteration, value = actual, "Nelder-Mead iteration");
        };

        let best = simplex
            .iter()
            .min_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
            .cloned();
        if let Some(best) = best {
            report.result = best.point;
            report.value = optimization.orient(best.value);
        }
        report.status = status;
        report.iterations = iteration;
        report.evaluations = evaluations;

        debug!(
            status = ?report.status,
            iterations = report.iterations,
            evaluations = report.evaluations,
            value = report.value,
            "Nelder-Mead finished"
        );

        self.report = report;
        Ok(&self.report)
    }

    /// Apply one reflection/expansion/contraction/shrink step to a sorted
    /// simplex and return the number of evaluations spent.
    fn step(&self, simplex: &mut [Vertex], center: &Array1<f64>) -> usize {
        let n = self.dimension();
        let best = simplex[0].value;
        let second_worst = simplex[n - 1].value;
        let worst = simplex[n].clone();

        let toward = |from: &Array1<f64>, coefficient: f64| {
            clip_to_bounds(&linear_combination(1.0 - coefficient, center, coefficient, from), &self.bounds)
        };

        let reflected = toward(&worst.point, -self.config.reflection);
        let reflected_value = self.oriented(&reflected);

        if reflected_value < best {
            let expanded = toward(&reflected, self.config.expansion);
            let expanded_value = self.oriented(&expanded);

            simplex[n] = if expanded_value < reflected_value {
                Vertex {
                    point: expanded,
                    value: expanded_value,
                }
            } else {
                Vertex {
                    point: reflected,
                    value: reflected_value,
                }
            };
            return 2;
        }

        if reflected_value < second_worst {
            simplex[n] = Vertex {
                point: reflected,
                value: reflected_value,
            };
            return 1;
        }

        let contracted = toward(&worst.point, self.config.contraction);
        let contracted_value = self.oriented(&contracted);

        if contracted_value < worst.value {
            simplex[n] = Vertex {
                point: contracted,
                value: contracted_value,
            };
            return 2;
        }

        let anchor = simplex[0].point.clone();
        let sigma = self.config.shrink;
        let shrunk: Vec<Array1<f64>> = simplex[1..]
            .iter()
            .map(|v| clip_to_bounds(&linear_combination(1.0 - sigma, &anchor, sigma, &v.point), &self.bounds))
            .collect();
        let values = par_map_indices(shrunk.len(), |i| self.oriented(&shrunk[i]));

        for (vertex, (point, value)) in simplex[1..].iter_mut().zip(shrunk.into_iter().zip(values)) {
            vertex.point = point;
            vertex.value = value;
        }

        2 + n
    }
}

impl<O: Objective> Solver for NelderMead<O> {
    type Point = Array1<f64>;

    fn report(&self) -> &SolverReport {
        &self.report
    }
}
