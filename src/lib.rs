//! # numopt-rs
//!
//! `numopt-rs` is a toolkit of iterative solvers for locating extrema and
//! roots of scalar real-valued functions.
//!
//! The library provides:
//! - A gradient descent engine with momentum, BFGS, conjugate gradient and
//!   box-constrained modes, backed by five line search strategies
//! - Derivative-free Nelder-Mead simplex search over a box
//! - Particle swarm optimization and differential evolution, each with a
//!   sequential and a batched (parallel) update order
//! - Newton-Raphson and bracketing root finders for scalar equations
//! - Shared stopping criteria ([`EndCriteria`]) and a uniform run report
//!   ([`SolverReport`]) exposed through the [`Solver`] trait
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::{array, Array1};
//! use numopt_rs::{NelderMead, Solver};
//!
//! let rosenbrock = |x: &Array1<f64>| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2);
//! let mut solver = NelderMead::new(rosenbrock, vec![(-5.0, 5.0), (-5.0, 5.0)]).unwrap();
//! solver.optimize(&array![-1.0, 2.0]).unwrap();
//!
//! println!("{}", solver.report());
//! ```
//!
//! Solvers log through `tracing`; install a subscriber in the application to
//! see run summaries (`debug`) or per-iteration progress (`trace`).

pub mod config;
pub mod end_criteria;
pub mod error;
pub mod global_opt;
pub mod gradient;
pub mod line_search;
pub mod nelder_mead;
pub mod objective;
pub mod scalar;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::{from_json, Bounds, OptimizationType};
pub use end_criteria::EndCriteria;
pub use error::{OptError, Result};
pub use global_opt::{
    DifferentialEvolutionConfig, DifferentialEvolutionOptimizer, GenerationUpdate,
    ParticleSwarmConfig, ParticleSwarmOptimizer, SwarmUpdate,
};
pub use gradient::{DescentMethod, GradientDescent, GradientDescentConfig};
pub use line_search::{LineSearch, LineSearchMethod};
pub use nelder_mead::{NelderMead, NelderMeadConfig};
pub use objective::{with_gradient, with_hessian, Objective};
pub use scalar::{
    BracketingMethod, NewtonRaphson, NewtonRaphsonConfig, RootBracketing, RootBracketingConfig,
};
pub use solver::{ConvergencePoint, Solver, SolverReport, SolverStatus};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
