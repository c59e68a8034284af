//! Root finding on a bracket `[lower, upper]` containing a sign change of
//! `f(x) - target`.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::end_criteria::EndCriteria;
use crate::error::{OptError, Result};
use crate::solver::{Solver, SolverReport, SolverStatus};

/// How the next trial point inside the bracket is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BracketingMethod {
    /// Midpoint of the bracket (bisection).
    #[default]
    Dichotomy,

    /// Root of the secant through both endpoints (regula falsi).
    FalsePosition,
}

/// Configuration options for root bracketing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootBracketingConfig {
    /// Default: Dichotomy
    pub method: BracketingMethod,

    /// Value the function should reach. Default: 0.0
    pub target: f64,

    /// Converged once `|error|` or the bracket width drops below this. Default: 1e-10
    pub tolerance: f64,

    /// Iteration cap. Default: 100
    pub end_criteria: EndCriteria,
}

impl Default for RootBracketingConfig {
    fn default() -> Self {
        Self {
            method: BracketingMethod::default(),
            target: 0.0,
            tolerance: 1e-10,
            end_criteria: EndCriteria::iterations(100),
        }
    }
}

impl RootBracketingConfig {
    pub fn with_method(mut self, method: BracketingMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.target = target;
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

    pub fn validate(&self) -> Result<()> {
        if !self.target.is_finite() {
            return Err(OptError::InvalidParameter(format!(
                "Target must be finite, got {}",
                self.target
            )));
        }
        if !(self.tolerance > 0.0) {
            return Err(OptError::InvalidParameter(format!(
                "Tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        self.end_criteria.validate()
    }
}

/// Bracketing root finder (bisection or false position).
///
/// The report's `value` is the final error `f(x) - target`. Endpoints whose
/// errors share a sign end the run with [`SolverStatus::BadFunction`] before
/// any iteration.
pub struct RootBracketing<F> {
    function: F,
    config: RootBracketingConfig,
    report: SolverReport<f64>,
}

impl<F> RootBracketing<F>
where
    F: Fn(f64) -> f64,
{
    /// Create a bisection solver with the default configuration.
    pub fn new(function: F) -> Self {
        Self {
            function,
            config: RootBracketingConfig::default(),
            report: SolverReport::not_run(f64::NAN),
        }
    }

    /// Create a solver with the given configuration.
    ///
    /// # Errors
    ///
    /// * `OptError::InvalidParameter` for a non-positive tolerance or non-finite target
    pub fn with_config(function: F, config: RootBracketingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            function,
            config,
            report: SolverReport::not_run(f64::NAN),
        })
    }

    pub fn config(&self) -> &RootBracketingConfig {
        &self.config
    }

    fn error(&self, x: f64) -> f64 {
        (self.function)(x) - self.config.target
    }

    /// Narrow the bracket `[lower, upper]` onto a root.
    ///
    /// The endpoints may be given in either order.
    ///
    /// # Errors
    ///
    /// * `OptError::InvalidInput` if an endpoint is not finite
    pub fn solve(&mut self, lower: f64, upper: f64) -> Result<&SolverReport<f64>> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(OptError::InvalidInput(format!(
                "Bracket endpoints must be finite, got [{}, {}]",
                lower, upper
            )));
        }

        let (mut lo, mut hi) = if lower <= upper { (lower, upper) } else { (upper, lower) };
        let mut lo_error = self.error(lo);
        let mut hi_error = self.error(hi);
        let mut evaluations = 2;
        let mut iteration = 0;

        debug!(lower = lo, upper = hi, method = ?self.config.method, "starting root bracketing");

        let mut report = SolverReport::not_run(lo);
        report.value = lo_error;

        let status = if !lo_error.is_finite() || !hi_error.is_finite() {
            SolverStatus::Diverged
        } else if lo_error.abs() < self.config.tolerance {
            SolverStatus::Normal
        } else if hi_error.abs() < self.config.tolerance {
            report.result = hi;
            report.value = hi_error;
            SolverStatus::Normal
        } else if lo_error.signum() == hi_error.signum() {
            debug!(lo_error, hi_error, "bracket endpoints share a sign");
            SolverStatus::BadFunction
        } else {
            loop {
                let mid = match self.config.method {
                    BracketingMethod::Dichotomy => 0.5 * (lo + hi),
                    BracketingMethod::FalsePosition => hi - hi_error * (hi - lo) / (hi_error - lo_error),
                };
                let mid_error = self.error(mid);
                evaluations += 1;
                iteration += 1;

                report.result = mid;
                report.value = mid_error;
                report.record(iteration, mid_error);
                trace!(iteration, x = mid, error = mid_error, "bracketing iterate");

                if !mid_error.is_finite() {
                    break SolverStatus::Diverged;
                }

                if mid_error.signum() == lo_error.signum() {
                    lo = mid;
                    lo_error = mid_error;
                } else {
                    hi = mid;
                    hi_error = mid_error;
                }

                if mid_error.abs() < self.config.tolerance || hi - lo < self.config.tolerance {
                    break SolverStatus::Normal;
                }
                if self.config.end_criteria.iteration_exceeded(iteration) {
                    break SolverStatus::IterationExceeded;
                }
            }
        };

        report.status = status;
        report.iterations = iteration;
        report.evaluations = evaluations;

        debug!(status = ?report.status, iterations = iteration, root = report.result, "root bracketing finished");

        self.report = report;
        Ok(&self.report)
    }
}

impl<F> Solver for RootBracketing<F> {
    type Point = f64;

    fn report(&self) -> &SolverReport<f64> {
        &self.report
    }
}
