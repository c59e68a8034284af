//! Step-length selection along a search direction.
//!
//! Every method works on a function oriented so that lower values are better
//! and returns a non-negative step. A zero step means no acceptable step was
//! found within the iteration budget. NaN function values never count as an
//! improvement.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{OptError, Result};

/// Backtracking factor for the halving searches.
const BACKTRACK_FACTOR: f64 = 0.5;

/// Geometric factor of the grid used by [`LineSearchMethod::Lowest`].
const LOWEST_GRID_FACTOR: f64 = 0.8;

/// The function seen by a line search.
pub trait LineFunction {
    /// Value at `x`.
    fn value(&self, x: &Array1<f64>) -> f64;

    /// Gradient at `x`, given the already known `value` at `x`.
    fn gradient(&self, x: &Array1<f64>, value: f64) -> Array1<f64>;
}

/// Line search strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineSearchMethod {
    /// Halve the step until the value improves.
    Naive,

    /// Halve the step until the sufficient-decrease (Armijo) condition holds.
    #[default]
    Armijo,

    /// Armijo plus the weak curvature condition `∇f(x+αd)·d ≥ c2 ∇f(x)·d`.
    ArmijoGoldstein,

    /// Armijo plus the strong curvature condition `|∇f(x+αd)·d| ≤ c2 |∇f(x)·d|`.
    StrongWolfe,

    /// Sample a geometric grid of steps and keep the best improving one.
    Lowest,
}

/// Line search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSearch {
    /// Strategy. Default: Armijo
    pub method: LineSearchMethod,

    /// First trial step. Default: 1.0
    pub initial_step: f64,

    /// Largest step the search may try. Default: infinity
    pub max_step: f64,

    /// Maximum number of trial steps. Default: 50
    pub max_iterations: usize,

    /// Sufficient-decrease constant. Default: 1e-4
    pub c1: f64,

    /// Curvature constant. Default: 0.9
    pub c2: f64,
}

impl Default for LineSearch {
    fn default() -> Self {
        Self {
            method: LineSearchMethod::default(),
            initial_step: 1.0,
            max_step: f64::INFINITY,
            max_iterations: 50,
            c1: 1e-4,
            c2: 0.9,
        }
    }
}

/// Result of a line search.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSearchOutcome {
    /// Accepted step length, zero if none was found
    pub step: f64,

    /// `x + step * d`
    pub point: Array1<f64>,

    /// Function value at `point`
    pub value: f64,

    /// Gradient at `point` when the search already computed it
    pub gradient: Option<Array1<f64>>,
}

impl LineSearchOutcome {
    fn unchanged(x: &Array1<f64>, value: f64) -> Self {
        Self {
            step: 0.0,
            point: x.clone(),
            value,
            gradient: None,
        }
    }

    /// Returns true if the search found no acceptable step.
    pub fn is_zero(&self) -> bool {
        self.step == 0.0
    }
}

impl LineSearch {
    /// Create a line search with the given method and default constants.
    pub fn new(method: LineSearchMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }

    pub fn with_max_step(mut self, step: f64) -> Self {
        self.max_step = step;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_constants(mut self, c1: f64, c2: f64) -> Self {
        self.c1 = c1;
        self.c2 = c2;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_step > 0.0) || !self.initial_step.is_finite() {
            return Err(OptError::InvalidParameter(format!(
                "Line search initial step must be positive and finite, got {}",
                self.initial_step
            )));
        }
        if !(self.max_step > 0.0) {
            return Err(OptError::InvalidParameter(format!(
                "Line search max step must be positive, got {}",
                self.max_step
            )));
        }
        if self.max_iterations == 0 {
            return Err(OptError::InvalidParameter(
                "Line search needs at least one iteration".to_string(),
            ));
        }
        if !(0.0 < self.c1 && self.c1 < self.c2 && self.c2 < 1.0) {
            return Err(OptError::InvalidParameter(format!(
                "Line search constants must satisfy 0 < c1 < c2 < 1, got c1={}, c2={}",
                self.c1, self.c2
            )));
        }
        Ok(())
    }

    /// Choose a step along `direction` from `x`.
    ///
    /// # Arguments
    ///
    /// * `func` - The function, oriented so lower is better
    /// * `x` - Current point
    /// * `direction` - Search direction
    /// * `value` - Function value at `x`
    /// * `gradient` - Gradient at `x`
    pub fn search<L: LineFunction + ?Sized>(
        &self,
        func: &L,
        x: &Array1<f64>,
        direction: &Array1<f64>,
        value: f64,
        gradient: &Array1<f64>,
    ) -> LineSearchOutcome {
        if direction.iter().all(|d| *d == 0.0) {
            return LineSearchOutcome::unchanged(x, value);
        }

        let first = self.initial_step.min(self.max_step);

        match self.method {
            LineSearchMethod::Naive => self.backtrack(func, x, direction, value, first, |v, _| v < value),
            LineSearchMethod::Armijo => {
                let slope = gradient.dot(direction);
                if !(slope < 0.0) {
                    return LineSearchOutcome::unchanged(x, value);
                }
                let c1 = self.c1;
                self.backtrack(func, x, direction, value, first, |v, alpha| {
                    v <= value + c1 * alpha * slope
                })
            }
            LineSearchMethod::ArmijoGoldstein => self.wolfe(func, x, direction, value, gradient, first, false),
            LineSearchMethod::StrongWolfe => self.wolfe(func, x, direction, value, gradient, first, true),
            LineSearchMethod::Lowest => self.lowest(func, x, direction, value, first),
        }
    }

    fn backtrack<L, A>(
        &self,
        func: &L,
        x: &Array1<f64>,
        direction: &Array1<f64>,
        value: f64,
        first: f64,
        accept: A,
    ) -> LineSearchOutcome
    where
        L: LineFunction + ?Sized,
        A: Fn(f64, f64) -> bool,
    {
        let mut alpha = first;

        for _ in 0..self.max_iterations {
            let point = x + &(direction * alpha);
            let trial = func.value(&point);

            if accept(trial, alpha) {
                return LineSearchOutcome {
                    step: alpha,
                    point,
                    value: trial,
                    gradient: None,
                };
            }

            alpha *= BACKTRACK_FACTOR;
        }

        LineSearchOutcome::unchanged(x, value)
    }

    #[allow(clippy::too_many_arguments)]
    fn wolfe<L: LineFunction + ?Sized>(
        &self,
        func: &L,
        x: &Array1<f64>,
        direction: &Array1<f64>,
        value: f64,
        gradient: &Array1<f64>,
        first: f64,
        strong: bool,
    ) -> LineSearchOutcome {
        let slope = gradient.dot(direction);
        if !(slope < 0.0) {
            return LineSearchOutcome::unchanged(x, value);
        }

        let mut lower = 0.0;
        let mut upper = f64::INFINITY;
        let mut alpha = first;
        let mut best: Option<LineSearchOutcome> = None;

        for _ in 0..self.max_iterations {
            let point = x + &(direction * alpha);
            let trial = func.value(&point);

            if !(trial <= value + self.c1 * alpha * slope) {
                upper = alpha;
            } else {
                let trial_gradient = func.gradient(&point, trial);
                let trial_slope = trial_gradient.dot(direction);

                let curvature_ok = if strong {
                    trial_slope.abs() <= self.c2 * slope.abs()
                } else {
                    trial_slope >= self.c2 * slope
                };

                let outcome = LineSearchOutcome {
                    step: alpha,
                    point,
                    value: trial,
                    gradient: Some(trial_gradient),
                };

                if curvature_ok {
                    return outcome;
                }

                if strong && trial_slope > 0.0 {
                    upper = alpha;
                } else {
                    lower = alpha;
                }

                if best.as_ref().map_or(true, |b| trial < b.value) {
                    best = Some(outcome);
                }
            }

            alpha = if upper.is_finite() {
                0.5 * (lower + upper)
            } else if lower >= self.max_step {
                break;
            } else {
                (2.0 * alpha).min(self.max_step)
            };
        }

        best.unwrap_or_else(|| LineSearchOutcome::unchanged(x, value))
    }

    fn lowest<L: LineFunction + ?Sized>(
        &self,
        func: &L,
        x: &Array1<f64>,
        direction: &Array1<f64>,
        value: f64,
        first: f64,
    ) -> LineSearchOutcome {
        let mut best = LineSearchOutcome::unchanged(x, value);
        let mut alpha = first;

        for _ in 0..self.max_iterations {
            let point = x + &(direction * alpha);
            let trial = func.value(&point);

            if trial < best.value {
                best = LineSearchOutcome {
                    step: alpha,
                    point,
                    value: trial,
                    gradient: None,
                };
            }

            alpha *= LOWEST_GRID_FACTOR;
        }

        best
    }
}
