//! Property tests for the shared stopping criteria.

use numopt_rs::{EndCriteria, SolverStatus};
use proptest::prelude::*;

/// Histories with long flat stretches so the epsilon and plateau
/// conditions actually fire in a fair share of cases.
fn history_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(prop_oneof![Just(0.0), Just(1.0), -1e3f64..1e3], 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn test_never_stops_without_a_satisfied_condition(
        max_iterations in prop::option::of(1usize..50),
        window in prop::option::of(1usize..10),
        function_epsilon in prop::option::of(0.0f64..1e-3),
        gradient_epsilon in prop::option::of(0.0f64..1e-3),
        gradient_norm in prop::option::of(0.0f64..2e-3),
        values in history_strategy(),
        iteration in 0usize..60,
    ) {
        let criteria = EndCriteria::new(max_iterations, window, function_epsilon, gradient_epsilon);
        let n = values.len();

        match criteria.check(iteration, &values, gradient_norm) {
            None => prop_assert!(!criteria.iteration_exceeded(iteration)),
            Some(SolverStatus::IterationExceeded) => {
                prop_assert!(max_iterations.map_or(false, |max| iteration >= max));
            }
            Some(SolverStatus::GradientConvergence) => {
                prop_assert!(matches!((gradient_epsilon, gradient_norm), (Some(eps), Some(norm)) if norm < eps));
            }
            Some(SolverStatus::Normal) => {
                prop_assert!(n >= 2);
                let change = (values[n - 1] - values[n - 2]).abs();
                prop_assert!(function_epsilon.map_or(false, |eps| change < eps));
            }
            Some(SolverStatus::StationaryFunction) => {
                let window = window.unwrap_or(usize::MAX);
                prop_assert!(n > window);
                let trailing = &values[n - window - 1..];
                let best = trailing[1..].iter().copied().fold(f64::INFINITY, f64::min);
                prop_assert!(trailing[0] - best <= function_epsilon.unwrap_or(0.0));
            }
            Some(other) => prop_assert!(false, "unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_iteration_cap_alone_stops_exactly_at_cap(
        max_iterations in 1usize..100,
        values in history_strategy(),
    ) {
        let criteria = EndCriteria::iterations(max_iterations);

        for iteration in 0..max_iterations {
            prop_assert_eq!(criteria.check(iteration, &values, Some(0.0)), None);
        }
        prop_assert_eq!(
            criteria.check(max_iterations, &values, Some(0.0)),
            Some(SolverStatus::IterationExceeded)
        );
    }

    #[test]
    fn test_non_finite_value_diverges(values in history_strategy(), iteration in 0usize..10) {
        let mut values = values;
        values.push(f64::NAN);
        prop_assert_eq!(
            EndCriteria::default().check(iteration, &values, None),
            Some(SolverStatus::Diverged)
        );
    }
}
