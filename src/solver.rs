//! Run outcome types shared by every solver.
//!
//! Each solver owns a [`SolverReport`] that starts out as
//! [`SolverStatus::NotRun`], is reset at the start of every run and stays
//! readable afterwards until the next run.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal classification of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// The solver has not been run yet.
    NotRun,

    /// The run converged.
    Normal,

    /// The iteration cap was reached before any convergence test passed.
    IterationExceeded,

    /// The objective stopped improving over the static-iteration window.
    StationaryFunction,

    /// The gradient norm dropped below its threshold.
    GradientConvergence,

    /// The function is unusable at the current point (flat slope, singular
    /// curvature, or a bracket without a sign change).
    BadFunction,

    /// A non-finite objective value was produced.
    Diverged,
}

impl SolverStatus {
    /// Returns true once a run has finished, whatever the outcome.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SolverStatus::NotRun)
    }

    /// Returns true if the run ended on a convergence test.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            SolverStatus::Normal
                | SolverStatus::GradientConvergence
                | SolverStatus::StationaryFunction
        )
    }

    /// Returns a description of the status.
    pub fn description(&self) -> &'static str {
        match self {
            SolverStatus::NotRun => "Solver has not been run",
            SolverStatus::Normal => "Converged",
            SolverStatus::IterationExceeded => "Terminated: maximum iterations reached",
            SolverStatus::StationaryFunction => "Converged: objective is stationary",
            SolverStatus::GradientConvergence => "Converged: small gradient",
            SolverStatus::BadFunction => "Terminated: function cannot be handled at this point",
            SolverStatus::Diverged => "Terminated: non-finite objective value",
        }
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One entry of a convergence history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    /// Iteration at which the point was recorded.
    pub iteration: usize,

    /// Objective value (or error, for scalar solvers) at that iteration.
    pub value: f64,
}

impl ConvergencePoint {
    pub fn new(iteration: usize, value: f64) -> Self {
        Self { iteration, value }
    }
}

/// Outcome of a solver run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverReport<X = Array1<f64>> {
    /// Best point found
    pub result: X,

    /// Objective value at `result`; for scalar solvers `f(result) - target`
    pub value: f64,

    /// Terminal status
    pub status: SolverStatus,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of objective evaluations
    pub evaluations: usize,

    /// One entry per accepted iteration, in order
    pub convergence: Vec<ConvergencePoint>,
}

impl<X> SolverReport<X> {
    /// A report for a solver that has not run yet.
    pub fn not_run(result: X) -> Self {
        Self {
            result,
            value: f64::NAN,
            status: SolverStatus::NotRun,
            iterations: 0,
            evaluations: 0,
            convergence: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, iteration: usize, value: f64) {
        self.convergence.push(ConvergencePoint::new(iteration, value));
    }
}

impl<X: fmt::Debug> fmt::Display for SolverReport<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solver Report:")?;
        writeln!(f, "  Status: {:?} ({})", self.status, self.status)?;
        writeln!(f, "  Value: {:.6e}", self.value)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.evaluations)?;
        writeln!(f, "  Result: {:?}", self.result)?;
        Ok(())
    }
}

/// Uniform read access to the last run of a solver.
pub trait Solver {
    /// The type of point the solver produces.
    type Point: Clone;

    /// The report of the last run.
    fn report(&self) -> &SolverReport<Self::Point>;

    fn status(&self) -> SolverStatus {
        self.report().status
    }

    /// Best point of the last run, cloned so callers never alias solver state.
    fn result(&self) -> Self::Point {
        self.report().result.clone()
    }

    fn final_value(&self) -> f64 {
        self.report().value
    }

    fn convergence(&self) -> &[ConvergencePoint] {
        &self.report().convergence
    }

    fn iterations(&self) -> usize {
        self.report().iterations
    }

    fn evaluations(&self) -> usize {
        self.report().evaluations
    }
}
