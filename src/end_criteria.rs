//! Stopping criteria shared by every iterative solver.
//!
//! [`EndCriteria`] is the single place that decides why an iteration loop
//! stops. Each threshold is optional; an unset threshold never fires.

use serde::{Deserialize, Serialize};

use crate::error::{OptError, Result};
use crate::solver::SolverStatus;

/// Optional stopping thresholds and the logic that evaluates them.
///
/// Checks run in a fixed priority order:
///
/// 1. a non-finite current value stops with [`SolverStatus::Diverged`];
/// 2. gradient norm below `gradient_epsilon` gives
///    [`SolverStatus::GradientConvergence`];
/// 3. change between the last two values below `function_epsilon` gives
///    [`SolverStatus::Normal`];
/// 4. no improvement larger than `function_epsilon` (zero when unset) across
///    the trailing `max_static_iterations` iterations gives
///    [`SolverStatus::StationaryFunction`];
/// 5. reaching `max_iterations` gives [`SolverStatus::IterationExceeded`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndCriteria {
    /// Maximum number of iterations. Default: 1000
    pub max_iterations: Option<usize>,

    /// Length of the trailing plateau window. Default: unset
    pub max_static_iterations: Option<usize>,

    /// Tolerance on the change in objective value. Default: 1e-12
    pub function_epsilon: Option<f64>,

    /// Tolerance on the gradient norm. Default: 1e-8
    pub gradient_epsilon: Option<f64>,
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self {
            max_iterations: Some(1000),
            max_static_iterations: None,
            function_epsilon: Some(1e-12),
            gradient_epsilon: Some(1e-8),
        }
    }
}

impl EndCriteria {
    /// Create criteria from explicit optional thresholds.
    pub fn new(
        max_iterations: Option<usize>,
        max_static_iterations: Option<usize>,
        function_epsilon: Option<f64>,
        gradient_epsilon: Option<f64>,
    ) -> Self {
        Self {
            max_iterations,
            max_static_iterations,
            function_epsilon,
            gradient_epsilon,
        }
    }

    /// Criteria that only stop on the iteration cap.
    pub fn iterations(max_iterations: usize) -> Self {
        Self::new(Some(max_iterations), None, None, None)
    }

    /// Criteria with every threshold unset. Such a loop never stops on its own.
    pub fn unbounded() -> Self {
        Self::new(None, None, None, None)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_max_static_iterations(mut self, window: usize) -> Self {
        self.max_static_iterations = Some(window);
        self
    }

    pub fn with_function_epsilon(mut self, epsilon: f64) -> Self {
        self.function_epsilon = Some(epsilon);
        self
    }

    pub fn with_gradient_epsilon(mut self, epsilon: f64) -> Self {
        self.gradient_epsilon = Some(epsilon);
        self
    }

    /// Reject negative or non-finite tolerances and an empty plateau window.
    pub fn validate(&self) -> Result<()> {
        for (name, eps) in [
            ("function_epsilon", self.function_epsilon),
            ("gradient_epsilon", self.gradient_epsilon),
        ] {
            if let Some(eps) = eps {
                if !eps.is_finite() || eps < 0.0 {
                    return Err(OptError::InvalidParameter(format!(
                        "{} must be finite and non-negative, got {}",
                        name, eps
                    )));
                }
            }
        }

        if self.max_static_iterations == Some(0) {
            return Err(OptError::InvalidParameter(
                "max_static_iterations must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns true once `iteration` completed iterations reach the cap.
    pub fn iteration_exceeded(&self, iteration: usize) -> bool {
        self.max_iterations.map_or(false, |max| iteration >= max)
    }

    /// Classify whether the loop should stop.
    ///
    /// # Arguments
    ///
    /// * `iteration` - Number of completed iterations
    /// * `values` - Objective history oriented so that lower is better, the
    ///   current value last
    /// * `gradient_norm` - Norm of the current gradient, when available
    ///
    /// # Returns
    ///
    /// * `Some(status)` if the loop should stop, `None` to keep iterating
    pub fn check(
        &self,
        iteration: usize,
        values: &[f64],
        gradient_norm: Option<f64>,
    ) -> Option<SolverStatus> {
        if let Some(&current) = values.last() {
            if !current.is_finite() {
                return Some(SolverStatus::Diverged);
            }
        }

        if let (Some(eps), Some(norm)) = (self.gradient_epsilon, gradient_norm) {
            if norm < eps {
                return Some(SolverStatus::GradientConvergence);
            }
        }

        if let (Some(eps), [.., previous, current]) = (self.function_epsilon, values) {
            if (current - previous).abs() < eps {
                return Some(SolverStatus::Normal);
            }
        }

        if let Some(window) = self.max_static_iterations {
            if self.is_stationary(values, window) {
                return Some(SolverStatus::StationaryFunction);
            }
        }

        if self.iteration_exceeded(iteration) {
            return Some(SolverStatus::IterationExceeded);
        }

        None
    }

    fn is_stationary(&self, values: &[f64], window: usize) -> bool {
        if values.len() <= window {
            return false;
        }

        let trailing = &values[values.len() - window - 1..];
        let start = trailing[0];
        let best = trailing[1..].iter().copied().fold(f64::INFINITY, f64::min);
        let improvement = start - best;

        improvement <= self.function_epsilon.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let criteria = EndCriteria::new(Some(10), Some(3), Some(1e-6), Some(1e-8));

        // Non-finite wins over everything
        let status = criteria.check(20, &[1.0, f64::NAN], Some(0.0));
        assert_eq!(status, Some(SolverStatus::Diverged));

        // Gradient before function change
        let status = criteria.check(20, &[1.0, 1.0], Some(1e-9));
        assert_eq!(status, Some(SolverStatus::GradientConvergence));

        // Function change before iteration cap
        let status = criteria.check(20, &[1.0, 1.0 + 1e-7], Some(1.0));
        assert_eq!(status, Some(SolverStatus::Normal));

        // Iteration cap last
        let status = criteria.check(10, &[5.0, 4.0], Some(1.0));
        assert_eq!(status, Some(SolverStatus::IterationExceeded));

        let status = criteria.check(3, &[5.0, 4.0], Some(1.0));
        assert_eq!(status, None);
    }

    #[test]
    fn test_stationary_window() {
        let criteria = EndCriteria::new(None, Some(3), None, None);

        // Window not yet filled
        assert_eq!(criteria.check(2, &[3.0, 3.0, 3.0], None), None);

        // Oscillating without improving on the window start
        let history = [2.0, 2.5, 2.1, 2.0];
        assert_eq!(
            criteria.check(3, &history, None),
            Some(SolverStatus::StationaryFunction)
        );

        // Any strict improvement keeps it running
        let history = [2.0, 2.5, 1.9, 2.2];
        assert_eq!(criteria.check(3, &history, None), None);
    }

    #[test]
    fn test_unset_thresholds_never_fire() {
        let criteria = EndCriteria::unbounded();
        assert_eq!(criteria.check(1_000_000, &[1.0, 1.0, 1.0], Some(0.0)), None);
        assert!(!criteria.iteration_exceeded(usize::MAX));
    }

    #[test]
    fn test_validate() {
        assert!(EndCriteria::default().validate().is_ok());
        assert!(EndCriteria::default().with_function_epsilon(-1.0).validate().is_err());
        assert!(EndCriteria::default().with_gradient_epsilon(f64::NAN).validate().is_err());
        assert!(EndCriteria::default().with_max_static_iterations(0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let criteria: EndCriteria =
            crate::config::from_json(r#"{ "max_iterations": 50 }"#).unwrap();
        assert_eq!(criteria.max_iterations, Some(50));
        assert_eq!(criteria.gradient_epsilon, Some(1e-8));
        assert_eq!(criteria.max_static_iterations, None);
    }
}
