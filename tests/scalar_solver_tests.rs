//! Tests for the single-variable solvers.

use approx::assert_relative_eq;
use numopt_rs::{
    BracketingMethod, NewtonRaphson, NewtonRaphsonConfig, Result, RootBracketing,
    RootBracketingConfig, Solver, SolverStatus,
};

fn cubic(x: f64) -> f64 {
    x.powi(3) - x - 2.0
}

#[test]
fn test_newton_square_root_of_two() -> Result<()> {
    let mut solver = NewtonRaphson::new(|x: f64| x * x - 2.0);
    assert_eq!(solver.status(), SolverStatus::NotRun);

    solver.solve(1.0)?;

    assert_eq!(solver.status(), SolverStatus::Normal);
    assert_relative_eq!(solver.result(), std::f64::consts::SQRT_2, epsilon = 1e-10);
    assert!(solver.iterations() <= 10);
    Ok(())
}

#[test]
fn test_newton_error_history_shrinks() -> Result<()> {
    let mut solver = NewtonRaphson::with_derivative(cubic, |x: f64| 3.0 * x * x - 1.0);
    solver.solve(2.0)?;

    assert_eq!(solver.status(), SolverStatus::Normal);
    assert_relative_eq!(solver.result(), 1.521_379_706_804_567_5, epsilon = 1e-10);

    // Quadratic convergence: each error is far below the previous one.
    let errors: Vec<f64> = solver.convergence().iter().map(|p| p.value.abs()).collect();
    assert!(errors.windows(2).all(|w| w[1] < w[0]));
    Ok(())
}

#[test]
fn test_newton_rerun_resets_report() -> Result<()> {
    let config = NewtonRaphsonConfig::default().with_target(9.0);
    let mut solver = NewtonRaphson::new(|x: f64| x * x).with_config(config)?;

    solver.solve(1.0)?;
    let first = solver.report().clone();
    solver.solve(-1.0)?;

    assert_relative_eq!(first.result, 3.0, epsilon = 1e-10);
    assert_relative_eq!(solver.result(), -3.0, epsilon = 1e-10);
    Ok(())
}

#[test]
fn test_dichotomy_cubic() -> Result<()> {
    let mut solver = RootBracketing::new(cubic);
    solver.solve(1.0, 2.0)?;

    assert_eq!(solver.status(), SolverStatus::Normal);
    assert_relative_eq!(solver.result(), 1.5213797, epsilon = 1e-7);
    Ok(())
}

#[test]
fn test_same_sign_bracket_is_bad_function() -> Result<()> {
    for method in [BracketingMethod::Dichotomy, BracketingMethod::FalsePosition] {
        let config = RootBracketingConfig::default().with_method(method);
        let mut solver = RootBracketing::with_config(cubic, config)?;
        solver.solve(3.0, 4.0)?;
        assert_eq!(solver.status(), SolverStatus::BadFunction, "{:?}", method);
    }
    Ok(())
}

#[test]
fn test_false_position_needs_fewer_iterations() -> Result<()> {
    let mut dichotomy = RootBracketing::new(cubic);
    dichotomy.solve(1.0, 2.0)?;

    let config = RootBracketingConfig::default().with_method(BracketingMethod::FalsePosition);
    let mut false_position = RootBracketing::with_config(cubic, config)?;
    false_position.solve(1.0, 2.0)?;

    assert_eq!(false_position.status(), SolverStatus::Normal);
    assert!(false_position.iterations() < dichotomy.iterations());
    assert_relative_eq!(false_position.result(), dichotomy.result(), epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_bracketing_iteration_cap() -> Result<()> {
    let config = RootBracketingConfig::default().with_max_iterations(5);
    let mut solver = RootBracketing::with_config(cubic, config)?;
    solver.solve(1.0, 2.0)?;

    assert_eq!(solver.status(), SolverStatus::IterationExceeded);
    assert_eq!(solver.convergence().len(), 5);
    Ok(())
}
