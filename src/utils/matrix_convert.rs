//! Matrix conversion utilities for the numopt-rs library.
//!
//! Solvers keep their vectors and matrices as ndarray arrays. Dense
//! decompositions (LU inverse) are delegated to nalgebra, so
//! this module converts between the two representations.

use nalgebra::DMatrix;
use ndarray::Array2;

use crate::error::{OptError, Result};

/// Convert an ndarray Array2 to a nalgebra DMatrix.
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]])
}

/// Convert a nalgebra DMatrix to an ndarray Array2.
pub fn nalgebra_to_ndarray(mat: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

fn ensure_square(matrix: &Array2<f64>) -> Result<()> {
    if matrix.nrows() != matrix.ncols() {
        return Err(OptError::DimensionMismatch(format!(
            "Expected a square matrix, got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    Ok(())
}

/// Invert a square matrix using an LU decomposition.
///
/// # Errors
///
/// * `OptError::DimensionMismatch` if the matrix is not square
/// * `OptError::SingularMatrix` if the matrix cannot be inverted
pub fn inverse(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    ensure_square(matrix)?;

    let inv = ndarray_to_nalgebra(matrix)
        .try_inverse()
        .ok_or(OptError::SingularMatrix)?;

    if inv.iter().any(|v| !v.is_finite()) {
        return Err(OptError::SingularMatrix);
    }

    Ok(nalgebra_to_ndarray(&inv))
}
