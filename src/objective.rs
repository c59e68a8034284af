//! Objective function definition trait and adapters.
//!
//! This module defines the `Objective` trait, which represents a scalar
//! real-valued function to be minimized or maximized. Plain closures implement
//! it directly; the [`with_gradient`] and [`with_hessian`] adapters attach
//! analytic derivatives.

use ndarray::{Array1, Array2};

/// A scalar objective over real vectors.
///
/// Objectives are `Sync` because several solvers evaluate them from rayon
/// worker threads.
pub trait Objective: Sync {
    /// Evaluate the objective at `x`.
    ///
    /// A NaN or infinite return value is not an error; solvers classify it
    /// as a divergence or a non-improving candidate.
    fn value(&self, x: &Array1<f64>) -> f64;

    /// Evaluate the analytic gradient at `x`, if the objective provides one.
    ///
    /// # Default Implementation
    ///
    /// Returns `None`; solvers then fall back to finite differences.
    fn gradient(&self, _x: &Array1<f64>) -> Option<Array1<f64>> {
        None
    }

    /// Evaluate the analytic Hessian at `x`, if the objective provides one.
    fn hessian(&self, _x: &Array1<f64>) -> Option<Array2<f64>> {
        None
    }

    /// Check if this objective provides an analytic gradient.
    fn has_gradient(&self) -> bool {
        false
    }

    /// Check if this objective provides an analytic Hessian.
    fn has_hessian(&self) -> bool {
        false
    }
}

impl<F> Objective for F
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    fn value(&self, x: &Array1<f64>) -> f64 {
        self(x)
    }
}

/// An objective with an analytic gradient.
#[derive(Debug, Clone)]
pub struct WithGradient<F, G> {
    f: F,
    g: G,
}

impl<F, G> Objective for WithGradient<F, G>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
    G: Fn(&Array1<f64>) -> Array1<f64> + Sync,
{
    fn value(&self, x: &Array1<f64>) -> f64 {
        (self.f)(x)
    }

    fn gradient(&self, x: &Array1<f64>) -> Option<Array1<f64>> {
        Some((self.g)(x))
    }

    fn has_gradient(&self) -> bool {
        true
    }
}

/// An objective with analytic gradient and Hessian.
#[derive(Debug, Clone)]
pub struct WithHessian<F, G, H> {
    f: F,
    g: G,
    h: H,
}

impl<F, G, H> Objective for WithHessian<F, G, H>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
    G: Fn(&Array1<f64>) -> Array1<f64> + Sync,
    H: Fn(&Array1<f64>) -> Array2<f64> + Sync,
{
    fn value(&self, x: &Array1<f64>) -> f64 {
        (self.f)(x)
    }

    fn gradient(&self, x: &Array1<f64>) -> Option<Array1<f64>> {
        Some((self.g)(x))
    }

    fn hessian(&self, x: &Array1<f64>) -> Option<Array2<f64>> {
        Some((self.h)(x))
    }

    fn has_gradient(&self) -> bool {
        true
    }

    fn has_hessian(&self) -> bool {
        true
    }
}

/// Attach an analytic gradient to an objective closure.
pub fn with_gradient<F, G>(f: F, g: G) -> WithGradient<F, G>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
    G: Fn(&Array1<f64>) -> Array1<f64> + Sync,
{
    WithGradient { f, g }
}

/// Attach an analytic gradient and Hessian to an objective closure.
pub fn with_hessian<F, G, H>(f: F, g: G, h: H) -> WithHessian<F, G, H>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
    G: Fn(&Array1<f64>) -> Array1<f64> + Sync,
    H: Fn(&Array1<f64>) -> Array2<f64> + Sync,
{
    WithHessian { f, g, h }
}
