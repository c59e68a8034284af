//! Finite difference methods for numerical differentiation.
//!
//! This module provides the derivative approximations used when an objective
//! does not supply analytic derivatives.

use ndarray::Array1;

use super::parallel::par_map_indices;

/// Default relative step for forward differences (about sqrt of machine epsilon).
pub const FORWARD_EPSILON: f64 = 1.49e-8;

/// Default relative step for central differences (about cube root of machine epsilon).
pub const CENTRAL_EPSILON: f64 = 6.06e-6;

/// Adapt a step size to the scale of the coordinate.
fn scaled_step(value: f64, eps: f64) -> f64 {
    if value.abs() > 1.0 {
        value.abs() * eps
    } else {
        eps
    }
}

/// Compute the gradient of a scalar function using forward finite differences.
///
/// The value at `params` is already known, so each coordinate costs exactly one
/// extra evaluation. Components are computed in parallel; nothing is cached
/// between calls.
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `params` - The point at which to evaluate the gradient
/// * `value` - `f(params)`
/// * `epsilon` - The relative step size (optional)
pub fn forward_gradient<F>(f: F, params: &Array1<f64>, value: f64, epsilon: Option<f64>) -> Array1<f64>
where
    F: Fn(&Array1<f64>) -> f64 + Sync + Send,
{
    let eps = epsilon.unwrap_or(FORWARD_EPSILON);

    let components = par_map_indices(params.len(), |j| {
        let step = scaled_step(params[j], eps);
        let mut perturbed = params.clone();
        perturbed[j] += step;
        (f(&perturbed) - value) / step
    });

    Array1::from_vec(components)
}

/// Symmetric (central) finite-difference derivative of a scalar function.
pub fn central_derivative<F>(f: F, x: f64, epsilon: Option<f64>) -> f64
where
    F: Fn(f64) -> f64,
{
    let step = scaled_step(x, epsilon.unwrap_or(CENTRAL_EPSILON));
    (f(x + step) - f(x - step)) / (2.0 * step)
}
