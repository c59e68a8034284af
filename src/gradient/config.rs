//! Configuration options for gradient descent.

use serde::{Deserialize, Serialize};

use crate::config::{validate_bounds, Bounds, OptimizationType};
use crate::end_criteria::EndCriteria;
use crate::error::{OptError, Result};
use crate::line_search::LineSearch;

/// How the search direction is built each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DescentMethod {
    /// Steepest descent with an optional momentum term.
    #[default]
    Momentum,

    /// BFGS quasi-Newton directions from a secant-updated curvature matrix.
    Bfgs,

    /// Nonlinear conjugate gradient using the objective's analytic Hessian.
    ConjugateGradient,

    /// Steepest descent with each direction clamped to stay inside `bounds`.
    BoxConstrained,
}

/// Configuration options for gradient descent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientDescentConfig {
    /// Direction strategy. Default: Momentum
    pub method: DescentMethod,

    /// Minimize or maximize. Default: Minimize
    pub optimization: OptimizationType,

    /// Weight of the previous direction in momentum mode, in [0, 1). Default: 0.0
    pub momentum: f64,

    /// Step-length selection. Default: Armijo
    pub line_search: LineSearch,

    /// Stopping thresholds. Default: `EndCriteria::default()`
    pub end_criteria: EndCriteria,

    /// Box bounds, required by `DescentMethod::BoxConstrained`. Default: None
    pub bounds: Option<Bounds>,

    /// Relative step for finite-difference gradients. Default: None (library default)
    pub finite_difference_step: Option<f64>,
}

impl Default for GradientDescentConfig {
    fn default() -> Self {
        Self {
            method: DescentMethod::default(),
            optimization: OptimizationType::default(),
            momentum: 0.0,
            line_search: LineSearch::default(),
            end_criteria: EndCriteria::default(),
            bounds: None,
            finite_difference_step: None,
        }
    }
}

impl GradientDescentConfig {
    pub fn with_method(mut self, method: DescentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_optimization(mut self, optimization: OptimizationType) -> Self {
        self.optimization = optimization;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_line_search(mut self, line_search: LineSearch) -> Self {
        self.line_search = line_search;
        self
    }

    pub fn with_end_criteria(mut self, end_criteria: EndCriteria) -> Self {
        self.end_criteria = end_criteria;
        self
    }

    /// Set box bounds and switch to box-constrained descent.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self.method = DescentMethod::BoxConstrained;
        self
    }

    pub fn with_finite_difference_step(mut self, step: f64) -> Self {
        self.finite_difference_step = Some(step);
        self
    }

    /// Check the configuration for contract violations.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(OptError::InvalidParameter(format!(
                "Momentum must lie in [0, 1), got {}",
                self.momentum
            )));
        }

        if let Some(step) = self.finite_difference_step {
            if !(step > 0.0) || !step.is_finite() {
                return Err(OptError::InvalidParameter(format!(
                    "Finite difference step must be positive, got {}",
                    step
                )));
            }
        }

        self.line_search.validate()?;
        self.end_criteria.validate()?;

        match (&self.method, &self.bounds) {
            (DescentMethod::BoxConstrained, None) => Err(OptError::BoundsError(
                "Box-constrained descent needs bounds".to_string(),
            )),
            (_, Some(bounds)) => validate_bounds(bounds),
            _ => Ok(()),
        }
    }
}
