//! Vector and matrix helpers used by the solvers.
//!
//! All helpers take their operands by reference and return new arrays, so
//! no caller-visible vector is ever mutated behind its owner's back.

use ndarray::{Array1, Array2};

/// Euclidean norm.
pub fn norm_l2(x: &Array1<f64>) -> f64 {
    x.dot(x).sqrt()
}

/// `a * x + b * y`.
pub fn linear_combination(a: f64, x: &Array1<f64>, b: f64, y: &Array1<f64>) -> Array1<f64> {
    x * a + y * b
}

/// The quadratic form `xᵀ A y`.
pub fn quadratic_form(x: &Array1<f64>, a: &Array2<f64>, y: &Array1<f64>) -> f64 {
    x.dot(&a.dot(y))
}

/// Outer product `x yᵀ`.
pub fn outer(x: &Array1<f64>, y: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((x.len(), y.len()), |(i, j)| x[i] * y[j])
}

/// Clip a point to the given bounds.
///
/// Coordinates beyond the number of bounds are left untouched.
pub fn clip_to_bounds(point: &Array1<f64>, bounds: &[(f64, f64)]) -> Array1<f64> {
    let mut clipped = point.clone();

    for (value, &(min, max)) in clipped.iter_mut().zip(bounds.iter()) {
        *value = value.max(min).min(max);
    }

    clipped
}

/// Clamp each direction component so that `x + d` stays inside the bounds:
/// `d_i = clamp(d_i, lower_i - x_i, upper_i - x_i)`.
pub fn clamp_direction(
    x: &Array1<f64>,
    direction: &Array1<f64>,
    bounds: &[(f64, f64)],
) -> Array1<f64> {
    let mut clamped = direction.clone();

    for ((d, &xi), &(lower, upper)) in clamped.iter_mut().zip(x.iter()).zip(bounds.iter()) {
        *d = d.max(lower - xi).min(upper - xi);
    }

    clamped
}

/// The centroid of a set of points.
pub fn centroid<'a, I>(points: I, dim: usize) -> Array1<f64>
where
    I: IntoIterator<Item = &'a Array1<f64>>,
{
    let mut sum = Array1::zeros(dim);
    let mut count = 0usize;

    for p in points {
        sum += p;
        count += 1;
    }

    if count > 0 {
        sum /= count as f64;
    }
    sum
}
