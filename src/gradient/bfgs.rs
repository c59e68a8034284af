//! BFGS secant update of the curvature approximation.

use ndarray::{Array1, Array2};

use crate::utils::vector_ops::outer;

/// Apply the rank-2 BFGS update to the curvature approximation `b`.
///
/// With `s = x_new - x` and `y = g_new - g`:
///
/// `B' = B + y yᵀ / (yᵀ s) - (B s)(B s)ᵀ / (sᵀ B s)`
///
/// Returns `None` when either denominator is not safely positive (within
/// machine epsilon of zero, or negative); the caller keeps the old matrix.
/// Skipping on `yᵀ s <= eps` also keeps `B` positive definite.
pub fn bfgs_update(b: &Array2<f64>, s: &Array1<f64>, y: &Array1<f64>) -> Option<Array2<f64>> {
    let ys = y.dot(s);
    let bs = b.dot(s);
    let sbs = s.dot(&bs);

    if !(ys > f64::EPSILON) || !(sbs > f64::EPSILON) {
        return None;
    }

    Some(b + &(outer(y, y) / ys) - &(outer(&bs, &bs) / sbs))
}
