//! Configuration types shared by every solver.
//!
//! Solver configurations are plain structs with `Default` values and
//! chained `with_*` setters. They all derive serde traits so a configuration
//! can be kept in a JSON document and loaded with [`from_json`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{OptError, Result};

/// Box bounds, one `(lower, upper)` pair per coordinate.
pub type Bounds = Vec<(f64, f64)>;

/// Whether a solver looks for a minimum or a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OptimizationType {
    /// Search for the smallest objective value.
    #[default]
    Minimize,

    /// Search for the largest objective value.
    Maximize,
}

impl OptimizationType {
    /// The sign flag: −1 for minimization, +1 for maximization.
    pub fn sign(self) -> f64 {
        match self {
            OptimizationType::Minimize => -1.0,
            OptimizationType::Maximize => 1.0,
        }
    }

    /// Map an objective value onto the internal "lower is better" scale.
    pub fn orient(self, value: f64) -> f64 {
        -self.sign() * value
    }

    /// Returns true if `candidate` is strictly better than `incumbent`.
    ///
    /// NaN never improves on anything.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        self.orient(candidate) < self.orient(incumbent)
    }
}

/// Parse any configuration type from a JSON document.
///
/// Missing fields fall back to the type's defaults.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

/// Check a set of box bounds.
///
/// Every bound must be finite and ordered (`lower <= upper`), and there must
/// be at least one coordinate.
pub fn validate_bounds(bounds: &[(f64, f64)]) -> Result<()> {
    if bounds.is_empty() {
        return Err(OptError::BoundsError(
            "At least one coordinate bound is required".to_string(),
        ));
    }

    for (i, &(lower, upper)) in bounds.iter().enumerate() {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(OptError::BoundsError(format!(
                "Bound {} is not finite: [{}, {}]",
                i, lower, upper
            )));
        }
        if lower > upper {
            return Err(OptError::BoundsError(format!(
                "Bound {} has lower {} greater than upper {}",
                i, lower, upper
            )));
        }
    }

    Ok(())
}
