//! Implementation of the gradient descent engine.
//!
//! One engine drives four direction strategies (momentum, BFGS, conjugate
//! gradient, box-constrained). Minimization and maximization share the same
//! loop: internally the engine always descends on `-sign * f`.

use ndarray::{Array1, Array2};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

use crate::config::OptimizationType;
use crate::error::{OptError, Result};
use crate::line_search::{LineFunction, LineSearch, LineSearchOutcome};
use crate::objective::Objective;
use crate::solver::{Solver, SolverReport, SolverStatus};
use crate::utils::finite_difference::forward_gradient;
use crate::utils::matrix_convert::inverse;
use crate::utils::vector_ops::{clamp_direction, clip_to_bounds, norm_l2, quadratic_form};

use super::bfgs::bfgs_update;
use super::config::{DescentMethod, GradientDescentConfig};

/// Oriented view of the objective that counts evaluations.
struct Evaluator<'a, O: Objective> {
    objective: &'a O,
    optimization: OptimizationType,
    fd_step: Option<f64>,
    evaluations: AtomicUsize,
}

impl<'a, O: Objective> Evaluator<'a, O> {
    fn new(objective: &'a O, optimization: OptimizationType, fd_step: Option<f64>) -> Self {
        Self {
            objective,
            optimization,
            fd_step,
            evaluations: AtomicUsize::new(0),
        }
    }

    fn hessian(&self, x: &Array1<f64>) -> Option<Array2<f64>> {
        let factor = -self.optimization.sign();
        self.objective.hessian(x).map(|h| h * factor)
    }

    fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl<O: Objective> LineFunction for Evaluator<'_, O> {
    fn value(&self, x: &Array1<f64>) -> f64 {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.optimization.orient(self.objective.value(x))
    }

    fn gradient(&self, x: &Array1<f64>, value: f64) -> Array1<f64> {
        match self.objective.gradient(x) {
            Some(g) => g * -self.optimization.sign(),
            None => forward_gradient(|p| self.value(p), x, value, self.fd_step),
        }
    }
}

/// Iterate, its oriented value and gradient.
struct Iterate {
    x: Array1<f64>,
    value: f64,
    gradient: Array1<f64>,
}

/// What one iteration of a direction strategy produced.
enum Step {
    /// The iterate moved.
    Moved,

    /// No acceptable step exists along any tried direction.
    Stalled,

    /// A numeric failure ends the run.
    Failed(SolverStatus),
}

/// Multi-mode gradient descent solver.
///
/// # Example
///
/// ```
/// use ndarray::{array, Array1};
/// use numopt_rs::{GradientDescent, Solver};
///
/// let target = array![3.0, -2.0];
/// let mut solver = GradientDescent::new(move |x: &Array1<f64>| (x - &target).mapv(|v| v * v).sum());
/// solver.optimize(&array![0.0, 0.0]).unwrap();
///
/// assert!(solver.status().is_converged());
/// assert!((solver.result()[0] - 3.0).abs() < 1e-6);
/// ```
pub struct GradientDescent<O: Objective> {
    objective: O,
    config: GradientDescentConfig,
    report: SolverReport,
}

impl<O: Objective> GradientDescent<O> {
    /// Create a solver with the default configuration (steepest descent,
    /// Armijo line search, minimization).
    pub fn new(objective: O) -> Self {
        Self {
            objective,
            config: GradientDescentConfig::default(),
            report: SolverReport::not_run(Array1::zeros(0)),
        }
    }

    /// Create a solver with the given configuration.
    ///
    /// # Errors
    ///
    /// * Any error from [`GradientDescentConfig::validate`]
    /// * `OptError::InvalidInput` if conjugate gradient is selected and the
    ///   objective has no analytic Hessian
    pub fn with_config(objective: O, config: GradientDescentConfig) -> Result<Self> {
        config.validate()?;

        if config.method == DescentMethod::ConjugateGradient && !objective.has_hessian() {
            return Err(OptError::InvalidInput(
                "Conjugate gradient descent needs an objective with an analytic Hessian"
                    .to_string(),
            ));
        }

        Ok(Self {
            objective,
            config,
            report: SolverReport::not_run(Array1::zeros(0)),
        })
    }

    pub fn config(&self) -> &GradientDescentConfig {
        &self.config
    }

    /// Run the descent from `initial`.
    ///
    /// The previous run's report is discarded. Numeric failures end the run
    /// with a non-converged status rather than an error.
    ///
    /// # Errors
    ///
    /// * `OptError::InvalidInput` if `initial` is empty
    /// * `OptError::DimensionMismatch` if the bounds do not match `initial`
    pub fn optimize(&mut self, initial: &Array1<f64>) -> Result<&SolverReport> {
        let n = initial.len();
        if n == 0 {
            return Err(OptError::InvalidInput(
                "Initial point must have at least one coordinate".to_string(),
            ));
        }
        if let Some(bounds) = &self.config.bounds {
            if bounds.len() != n {
                return Err(OptError::DimensionMismatch(format!(
                    "Expected {} bounds, got {}",
                    n,
                    bounds.len()
                )));
            }
        }

        debug!(
            method = ?self.config.method,
            optimization = ?self.config.optimization,
            dimension = n,
            analytic_gradient = self.objective.has_gradient(),
            "starting gradient descent"
        );

        let evaluator = Evaluator::new(
            &self.objective,
            self.config.optimization,
            self.config.finite_difference_step,
        );
        let mut report = SolverReport::not_run(initial.clone());

        let x = match &self.config.bounds {
            Some(bounds) if self.config.method == DescentMethod::BoxConstrained => {
                clip_to_bounds(initial, bounds)
            }
            _ => initial.clone(),
        };
        let value = evaluator.value(&x);
        let mut history = vec![value];

        let status = if !value.is_finite() {
            report.result = x;
            SolverStatus::Diverged
        } else {
            let gradient = evaluator.gradient(&x, value);
            let mut iterate = Iterate { x, value, gradient };
            let status = self.iterate(&evaluator, &mut iterate, &mut history, &mut report);
            report.result = iterate.x;
            status
        };

        report.value = self
            .config
            .optimization
            .orient(history.last().copied().unwrap_or(f64::NAN));
        report.status = status;
        report.iterations = report.convergence.len();
        report.evaluations = evaluator.evaluations();

        debug!(
            status = ?report.status,
            iterations = report.iterations,
            evaluations = report.evaluations,
            value = report.value,
            "gradient descent finished"
        );

        self.report = report;
        Ok(&self.report)
    }

    fn iterate(
        &self,
        evaluator: &Evaluator<'_, O>,
        iterate: &mut Iterate,
        history: &mut Vec<f64>,
        report: &mut SolverReport,
    ) -> SolverStatus {
        let line_search = self.line_search();

        if let Some(status) = self.stop_check(0, history, iterate) {
            return status;
        }

        let mut previous_direction: Option<Array1<f64>> = None;
        let mut curvature = Array2::eye(iterate.x.len());
        let mut iteration = 0;

        loop {
            iteration += 1;

            let step = match self.config.method {
                DescentMethod::Momentum | DescentMethod::BoxConstrained => {
                    self.gradient_step(evaluator, &line_search, iterate, &mut previous_direction)
                }
                DescentMethod::Bfgs => {
                    self.bfgs_step(evaluator, &line_search, iterate, &mut curvature)
                }
                DescentMethod::ConjugateGradient => {
                    self.conjugate_sweep(evaluator, &line_search, iterate)
                }
            };

            match step {
                Step::Moved => {}
                Step::Stalled => return SolverStatus::StationaryFunction,
                Step::Failed(status) => return status,
            }

            // orient is its own inverse
            let actual = self.config.optimization.orient(iterate.value);
            report.record(iteration, actual);
            history.push(iterate.value);
            trace!(iteration, value = actual, "gradient descent iteration");

            if let Some(status) = self.stop_check(iteration, history, iterate) {
                return status;
            }
        }
    }

    /// End criteria plus a finiteness check on the gradient, which the line
    /// searches would otherwise read as "no descent direction".
    fn stop_check(&self, iteration: usize, history: &[f64], iterate: &Iterate) -> Option<SolverStatus> {
        let norm = self.gradient_norm(iterate);
        if !norm.is_finite() {
            debug!(iteration, "gradient is not finite");
            return Some(SolverStatus::Diverged);
        }
        self.config.end_criteria.check(iteration, history, Some(norm))
    }

    fn line_search(&self) -> LineSearch {
        let line_search = self.config.line_search.clone();
        if self.config.method == DescentMethod::BoxConstrained {
            // A clamped direction stays inside the box for steps up to 1.
            let max_step = line_search.max_step.min(1.0);
            line_search.with_max_step(max_step)
        } else {
            line_search
        }
    }

    /// Gradient norm for the convergence test; projected onto the box in
    /// box-constrained mode.
    fn gradient_norm(&self, iterate: &Iterate) -> f64 {
        match (&self.config.method, &self.config.bounds) {
            (DescentMethod::BoxConstrained, Some(bounds)) => {
                norm_l2(&clamp_direction(&iterate.x, &-&iterate.gradient, bounds))
            }
            _ => norm_l2(&iterate.gradient),
        }
    }

    fn accept(&self, evaluator: &Evaluator<'_, O>, iterate: &mut Iterate, outcome: LineSearchOutcome) {
        let x = match (&self.config.method, &self.config.bounds) {
            (DescentMethod::BoxConstrained, Some(bounds)) => clip_to_bounds(&outcome.point, bounds),
            _ => outcome.point,
        };
        let gradient = match outcome.gradient {
            Some(g) => g,
            None => evaluator.gradient(&x, outcome.value),
        };

        iterate.x = x;
        iterate.value = outcome.value;
        iterate.gradient = gradient;
    }

    fn constrain(&self, x: &Array1<f64>, direction: Array1<f64>) -> Array1<f64> {
        match (&self.config.method, &self.config.bounds) {
            (DescentMethod::BoxConstrained, Some(bounds)) => clamp_direction(x, &direction, bounds),
            _ => direction,
        }
    }

    fn gradient_step(
        &self,
        evaluator: &Evaluator<'_, O>,
        line_search: &LineSearch,
        iterate: &mut Iterate,
        previous_direction: &mut Option<Array1<f64>>,
    ) -> Step {
        let steepest = self.constrain(&iterate.x, -&iterate.gradient);

        let mut direction = match previous_direction.as_ref() {
            Some(previous) if self.config.momentum > 0.0 => {
                self.constrain(&iterate.x, previous * self.config.momentum - &iterate.gradient)
            }
            _ => steepest.clone(),
        };

        if !(direction.dot(&iterate.gradient) < 0.0) {
            direction = steepest;
        }

        let outcome = line_search.search(evaluator, &iterate.x, &direction, iterate.value, &iterate.gradient);
        if outcome.is_zero() {
            return Step::Stalled;
        }

        *previous_direction = Some(direction);
        self.accept(evaluator, iterate, outcome);
        Step::Moved
    }

    fn bfgs_step(
        &self,
        evaluator: &Evaluator<'_, O>,
        line_search: &LineSearch,
        iterate: &mut Iterate,
        curvature: &mut Array2<f64>,
    ) -> Step {
        let inverse_curvature = match inverse(curvature) {
            Ok(inv) => inv,
            Err(_) => {
                debug!("BFGS curvature matrix is singular");
                return Step::Failed(SolverStatus::BadFunction);
            }
        };

        let mut direction = -inverse_curvature.dot(&iterate.gradient);
        let mut reset = false;

        if !(direction.dot(&iterate.gradient) < 0.0) {
            debug!("BFGS direction is not a descent direction, resetting curvature");
            *curvature = Array2::eye(iterate.x.len());
            direction = -&iterate.gradient;
            reset = true;
        }

        let mut outcome = line_search.search(evaluator, &iterate.x, &direction, iterate.value, &iterate.gradient);

        if outcome.is_zero() && !reset {
            debug!("BFGS line search failed, retrying along steepest descent");
            *curvature = Array2::eye(iterate.x.len());
            direction = -&iterate.gradient;
            outcome = line_search.search(evaluator, &iterate.x, &direction, iterate.value, &iterate.gradient);
        }

        if outcome.is_zero() {
            return Step::Stalled;
        }

        let previous_x = iterate.x.clone();
        let previous_gradient = iterate.gradient.clone();
        self.accept(evaluator, iterate, outcome);

        let s = &iterate.x - &previous_x;
        let y = &iterate.gradient - &previous_gradient;

        match bfgs_update(curvature, &s, &y) {
            Some(updated) => *curvature = updated,
            None => debug!("skipping BFGS update, secant denominator is not positive"),
        }

        Step::Moved
    }

    /// One outer conjugate-gradient iteration: an inner sweep of `n` steps with
    /// exact quadratic step lengths.
    fn conjugate_sweep(
        &self,
        evaluator: &Evaluator<'_, O>,
        line_search: &LineSearch,
        iterate: &mut Iterate,
    ) -> Step {
        let n = iterate.x.len();
        let mut direction = -&iterate.gradient;
        let mut moved = false;

        for _ in 0..n {
            if direction.iter().all(|d| *d == 0.0) {
                break;
            }

            let hessian = match evaluator.hessian(&iterate.x) {
                Some(h) => h,
                None => return Step::Failed(SolverStatus::BadFunction),
            };

            let curvature = quadratic_form(&direction, &hessian, &direction);
            let scale = direction.dot(&direction) * hessian.iter().fold(0.0, |m: f64, v| m.max(v.abs()));

            if curvature.abs() <= f64::EPSILON * scale {
                debug!(curvature, "conjugate gradient hit a singular Hessian");
                return Step::Failed(SolverStatus::BadFunction);
            }

            if curvature < 0.0 {
                debug!(curvature, "negative curvature, falling back to a line search");
                let outcome =
                    line_search.search(evaluator, &iterate.x, &direction, iterate.value, &iterate.gradient);
                if outcome.is_zero() {
                    break;
                }
                self.accept(evaluator, iterate, outcome);
                moved = true;
                direction = -&iterate.gradient;
                continue;
            }

            let alpha = -direction.dot(&iterate.gradient) / curvature;
            let x = &iterate.x + &(&direction * alpha);
            let value = evaluator.value(&x);
            let gradient = evaluator.gradient(&x, value);

            let beta = quadratic_form(&gradient, &hessian, &direction) / curvature;
            direction = &direction * beta - &gradient;

            iterate.x = x;
            iterate.value = value;
            iterate.gradient = gradient;
            moved = true;

            if !value.is_finite() {
                break;
            }
        }

        if moved {
            Step::Moved
        } else {
            Step::Stalled
        }
    }
}

impl<O: Objective> Solver for GradientDescent<O> {
    type Point = Array1<f64>;

    fn report(&self) -> &SolverReport {
        &self.report
    }
}
