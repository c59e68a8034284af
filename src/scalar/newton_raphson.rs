//! Newton-Raphson iteration for `f(x) = target`.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::end_criteria::EndCriteria;
use crate::error::{OptError, Result};
use crate::solver::{Solver, SolverReport, SolverStatus};
use crate::utils::finite_difference::central_derivative;

/// Configuration options for Newton-Raphson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonRaphsonConfig {
    /// Value the function should reach. Default: 0.0
    pub target: f64,

    /// Stop once `|f(x) - target| <= tolerance`. Default: 1e-10
    pub tolerance: f64,

    /// Slopes with `|f'(x)| <= slope_tolerance` end the run as a bad function. Default: 1e-14
    pub slope_tolerance: f64,

    /// Iteration cap. Default: 100
    pub end_criteria: EndCriteria,

    /// Relative step of the central difference used without an analytic
    /// derivative. Default: None (library default)
    pub derivative_step: Option<f64>,
}

impl Default for NewtonRaphsonConfig {
    fn default() -> Self {
        Self {
            target: 0.0,
            tolerance: 1e-10,
            slope_tolerance: 1e-14,
            end_criteria: EndCriteria::iterations(100),
            derivative_step: None,
        }
    }
}

impl NewtonRaphsonConfig {
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = target;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_slope_tolerance(mut self, tolerance: f64) -> Self {
        self.slope_tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.end_criteria = self.end_criteria.with_max_iterations(max_iterations);
        self
    }

    pub fn with_derivative_step(mut self, step: f64) -> Self {
        self.derivative_step = Some(step);
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
        if !(self.slope_tolerance >= 0.0) {
            return Err(OptError::InvalidParameter(format!(
                "Slope tolerance must be non-negative, got {}",
                self.slope_tolerance
            )));
        }
        if let Some(step) = self.derivative_step {
            if !(step > 0.0) || !step.is_finite() {
                return Err(OptError::InvalidParameter(format!(
                    "Derivative step must be positive, got {}",
                    step
                )));
            }
        }
        self.end_criteria.validate()
    }
}

/// Newton-Raphson solver for a scalar equation.
///
/// The report's `value` is the final error `f(x) - target`, and the
/// convergence history holds one error per evaluated iterate, starting with
/// the initial guess at iteration 0.
///
/// # Example
///
/// ```
/// use numopt_rs::{NewtonRaphson, Solver, SolverStatus};
///
/// let mut solver = NewtonRaphson::new(|x: f64| x * x - 2.0);
/// solver.solve(1.0).unwrap();
///
/// assert_eq!(solver.status(), SolverStatus::Normal);
/// assert!((solver.result() - 2f64.sqrt()).abs() < 1e-10);
/// ```
pub struct NewtonRaphson<F, D = fn(f64) -> f64> {
    function: F,
    derivative: Option<D>,
    config: NewtonRaphsonConfig,
    report: SolverReport<f64>,
}

impl<F> NewtonRaphson<F>
where
    F: Fn(f64) -> f64,
{
    /// Create a solver that approximates the derivative by central differences.
    pub fn new(function: F) -> Self {
        Self {
            function,
            derivative: None,
            config: NewtonRaphsonConfig::default(),
            report: SolverReport::not_run(f64::NAN),
        }
    }
}

impl<F, D> NewtonRaphson<F, D>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    /// Create a solver with an analytic derivative.
    pub fn with_derivative(function: F, derivative: D) -> Self {
        Self {
            function,
            derivative: Some(derivative),
            config: NewtonRaphsonConfig::default(),
            report: SolverReport::not_run(f64::NAN),
        }
    }

    /// Replace the configuration.
    ///
    /// # Errors
    ///
    /// * `OptError::InvalidParameter` for a non-positive tolerance or step
    pub fn with_config(mut self, config: NewtonRaphsonConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &NewtonRaphsonConfig {
        &self.config
    }

    fn slope(&self, x: f64) -> f64 {
        match &self.derivative {
            Some(derivative) => derivative(x),
            None => central_derivative(&self.function, x, self.config.derivative_step),
        }
    }

    /// Iterate from `initial` until the error is within tolerance.
    ///
    /// # Errors
    ///
    /// * `OptError::InvalidInput` if `initial` is not finite
    pub fn solve(&mut self, initial: f64) -> Result<&SolverReport<f64>> {
        if !initial.is_finite() {
            return Err(OptError::InvalidInput(format!(
                "Initial guess must be finite, got {}",
                initial
            )));
        }

        debug!(initial, target = self.config.target, "starting Newton-Raphson");

        let mut report = SolverReport::not_run(initial);
        let mut x = initial;
        let mut iteration = 0;
        let mut evaluations = 0;

        let status = loop {
            let error = (self.function)(x) - self.config.target;
            evaluations += 1;
            report.result = x;
            report.value = error;
            report.record(iteration, error);
            trace!(iteration, x, error, "Newton-Raphson iterate");

            if !error.is_finite() {
                break SolverStatus::Diverged;
            }
            if error.abs() <= self.config.tolerance {
                break SolverStatus::Normal;
            }
            if self.config.end_criteria.iteration_exceeded(iteration) {
                break SolverStatus::IterationExceeded;
            }

            let slope = self.slope(x);
            if self.derivative.is_none() {
                evaluations += 2;
            }
            if !slope.is_finite() {
                break SolverStatus::Diverged;
            }
            if slope.abs() <= self.config.slope_tolerance {
                break SolverStatus::BadFunction;
            }

            x -= error / slope;
            iteration += 1;
        };

        report.status = status;
        report.iterations = iteration;
        report.evaluations = evaluations;

        debug!(status = ?report.status, iterations = iteration, root = report.result, "Newton-Raphson finished");

        self.report = report;
        Ok(&self.report)
    }
}

impl<F, D> Solver for NewtonRaphson<F, D> {
    type Point = f64;

    fn report(&self) -> &SolverReport<f64> {
        &self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_square_root_of_two() {
        let mut solver = NewtonRaphson::new(|x: f64| x * x - 2.0);
        assert_eq!(solver.status(), SolverStatus::NotRun);

        solver.solve(1.0).unwrap();
        assert_eq!(solver.status(), SolverStatus::Normal);
        assert_relative_eq!(solver.result(), 2f64.sqrt(), epsilon = 1e-10);
        assert!(solver.iterations() <= 10);
        assert!(solver.final_value().abs() <= 1e-10);
    }

    #[test]
    fn test_analytic_derivative_and_target() {
        let config = NewtonRaphsonConfig::default().with_target(8.0);
        let mut solver = NewtonRaphson::with_derivative(|x: f64| x.powi(3), |x: f64| 3.0 * x * x)
            .with_config(config)
            .unwrap();
        solver.solve(3.0).unwrap();

        assert_eq!(solver.status(), SolverStatus::Normal);
        assert_relative_eq!(solver.result(), 2.0, epsilon = 1e-10);
        assert_eq!(solver.convergence()[0].iteration, 0);
        assert_eq!(solver.convergence().len(), solver.iterations() + 1);
    }

    #[test]
    fn test_flat_slope_is_bad_function() {
        let mut solver = NewtonRaphson::with_derivative(|x: f64| x * x + 1.0, |x: f64| 2.0 * x);
        let report = solver.solve(0.0).unwrap();
        assert_eq!(report.status, SolverStatus::BadFunction);
        assert_eq!(report.result, 0.0);
    }

    #[test]
    fn test_iteration_cap() {
        // No real root: the iterates wander without converging.
        let config = NewtonRaphsonConfig::default().with_max_iterations(5);
        let mut solver = NewtonRaphson::new(|x: f64| x * x + 1.0).with_config(config).unwrap();
        let report = solver.solve(0.5).unwrap();
        assert_eq!(report.status, SolverStatus::IterationExceeded);
        assert_eq!(report.iterations, 5);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut solver = NewtonRaphson::new(|x: f64| x);
        assert!(solver.solve(f64::NAN).is_err());

        let config = NewtonRaphsonConfig::default().with_tolerance(0.0);
        assert!(NewtonRaphson::new(|x: f64| x).with_config(config).is_err());
    }
}
