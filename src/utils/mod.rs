//! Utility functions and helpers for the numopt-rs library.

pub mod finite_difference;
pub mod matrix_convert;
pub mod parallel;
pub mod vector_ops;

// Re-export commonly used utilities
pub use finite_difference::{central_derivative, forward_gradient};
pub use matrix_convert::inverse;
pub use parallel::{par_map_indices, worker_rng, worker_seeds};
pub use vector_ops::{
    centroid, clamp_direction, clip_to_bounds, linear_combination, norm_l2, outer, quadratic_form,
};
