//! Standard test functions shared by the integration tests.

#![allow(dead_code)]

use ndarray::{array, Array1, Array2};
use numopt_rs::Objective;
use std::f64::consts::PI;

/// Rosenbrock function: f(x) = sum[100(x_{i+1} - x_i^2)^2 + (1 - x_i)^2]
/// Global minimum at x_i = 1 for all i, with f(x) = 0
pub struct RosenbrockFunction {
    pub dimension: usize,
}

impl RosenbrockFunction {
    pub fn new(dimension: usize) -> Self {
        assert!(dimension >= 2, "Rosenbrock function requires at least 2 dimensions");
        Self { dimension }
    }
}

impl Objective for RosenbrockFunction {
    fn value(&self, x: &Array1<f64>) -> f64 {
        (0..self.dimension - 1)
            .map(|i| 100.0 * (x[i + 1] - x[i].powi(2)).powi(2) + (1.0 - x[i]).powi(2))
            .sum()
    }

    fn gradient(&self, x: &Array1<f64>) -> Option<Array1<f64>> {
        let mut g = Array1::zeros(self.dimension);
        for i in 0..self.dimension - 1 {
            let inner = x[i + 1] - x[i].powi(2);
            g[i] += -400.0 * x[i] * inner - 2.0 * (1.0 - x[i]);
            g[i + 1] += 200.0 * inner;
        }
        Some(g)
    }

    fn has_gradient(&self) -> bool {
        true
    }
}

/// Rastrigin function: f(x) = 10n + sum[x_i^2 - 10cos(2πx_i)]
/// Global minimum at x_i = 0 for all i, with f(x) = 0
pub fn rastrigin(x: &Array1<f64>) -> f64 {
    10.0 * x.len() as f64 + x.iter().map(|v| v * v - 10.0 * (2.0 * PI * v).cos()).sum::<f64>()
}

/// f(x) = ‖x - [3, -2]‖², minimum 0 at [3, -2]
pub fn shifted_bowl(x: &Array1<f64>) -> f64 {
    (x[0] - 3.0).powi(2) + (x[1] + 2.0).powi(2)
}

pub fn shifted_bowl_gradient(x: &Array1<f64>) -> Array1<f64> {
    array![2.0 * (x[0] - 3.0), 2.0 * (x[1] + 2.0)]
}

pub fn shifted_bowl_hessian(_x: &Array1<f64>) -> Array2<f64> {
    Array2::eye(2) * 2.0
}

/// Check if two arrays are approximately equal
pub fn array_approx_eq(a: &Array1<f64>, b: &Array1<f64>, tol: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < tol)
}
