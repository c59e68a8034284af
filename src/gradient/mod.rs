//! Gradient-based local optimization.
//!
//! A single [`GradientDescent`] engine covers steepest descent with momentum,
//! BFGS, conjugate gradient and box-constrained descent. The direction
//! strategy is chosen through [`DescentMethod`] in the configuration.

mod algorithm;
pub mod bfgs;
pub mod config;

pub use algorithm::GradientDescent;
pub use bfgs::bfgs_update;
pub use config::{DescentMethod, GradientDescentConfig};
