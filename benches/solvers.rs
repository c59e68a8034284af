//! Benchmarks for the solver families.
//!
//! Each group runs a solver on a standard test function with a fixed seed so
//! timings are comparable between runs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{array, Array1};
use numopt_rs::global_opt::create_population;
use numopt_rs::{
    BracketingMethod, DescentMethod, DifferentialEvolutionConfig, DifferentialEvolutionOptimizer,
    EndCriteria, GenerationUpdate, GradientDescent, GradientDescentConfig, NelderMead, NelderMeadConfig,
    NewtonRaphson, ParticleSwarmConfig, ParticleSwarmOptimizer, RootBracketing,
    RootBracketingConfig, SwarmUpdate,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

// --- Standard Test Functions ---

/// Rosenbrock function: f(x) = sum[100(x_{i+1} - x_i^2)^2 + (1 - x_i)^2]
fn rosenbrock(x: &Array1<f64>) -> f64 {
    x.windows(2)
        .into_iter()
        .map(|w| 100.0 * (w[1] - w[0].powi(2)).powi(2) + (1.0 - w[0]).powi(2))
        .sum()
}

/// Rastrigin function: f(x) = 10n + sum[x_i^2 - 10cos(2*pi*x_i)]
fn rastrigin(x: &Array1<f64>) -> f64 {
    10.0 * x.len() as f64
        + x.iter()
            .map(|v| v.powi(2) - 10.0 * (2.0 * PI * v).cos())
            .sum::<f64>()
}

fn bench_gradient_descent(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient_descent_rosenbrock");

    for (name, method) in [
        ("steepest", DescentMethod::Momentum),
        ("bfgs", DescentMethod::Bfgs),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let config = GradientDescentConfig::default()
                    .with_method(method)
                    .with_end_criteria(EndCriteria::default().with_max_iterations(2000));
                let mut solver = GradientDescent::with_config(rosenbrock, config)
                    .expect("valid configuration");
                solver
                    .optimize(black_box(&array![-1.2, 1.0]))
                    .expect("optimization runs")
                    .value
            })
        });
    }

    group.finish();
}

fn bench_nelder_mead(c: &mut Criterion) {
    let mut group = c.benchmark_group("nelder_mead_rosenbrock");

    for dimension in [2, 5, 10] {
        group.bench_with_input(
            BenchmarkId::from_parameter(dimension),
            &dimension,
            |b, &dimension| {
                b.iter(|| {
                    let config = NelderMeadConfig::default().with_max_iterations(5000);
                    let mut solver =
                        NelderMead::with_config(rosenbrock, vec![(-5.0, 5.0); dimension], config)
                            .expect("valid configuration");
                    solver
                        .optimize(black_box(&Array1::zeros(dimension)))
                        .expect("optimization runs")
                        .value
                })
            },
        );
    }

    group.finish();
}

fn bench_particle_swarm(c: &mut Criterion) {
    let mut group = c.benchmark_group("particle_swarm_rastrigin");
    group.sample_size(20);

    for update in [SwarmUpdate::Sequential, SwarmUpdate::Batched] {
        group.bench_function(format!("{:?}", update), |b| {
            b.iter(|| {
                let config = ParticleSwarmConfig::default().with_update(update).with_seed(7);
                let mut pso = ParticleSwarmOptimizer::with_config(
                    rastrigin,
                    vec![(-5.12, 5.12); 5],
                    config,
                )
                .expect("valid configuration");
                pso.optimize().expect("optimization runs").value
            })
        });
    }

    group.finish();
}

fn bench_differential_evolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("differential_evolution_rastrigin");
    group.sample_size(20);

    let bounds = vec![(-5.12, 5.12); 5];
    let population = create_population(&bounds, 40, &mut ChaCha8Rng::seed_from_u64(11));
    let feasible = |x: &Array1<f64>| x.iter().all(|v| (-5.12..=5.12).contains(v));

    for update in [GenerationUpdate::InPlace, GenerationUpdate::Batched] {
        group.bench_function(format!("{:?}", update), |b| {
            b.iter(|| {
                let config = DifferentialEvolutionConfig::default()
                    .with_update(update)
                    .with_max_iterations(200);
                let mut de = DifferentialEvolutionOptimizer::with_config(
                    rastrigin,
                    population.clone(),
                    feasible,
                    config,
                )
                .expect("valid population");
                de.optimize().expect("optimization runs").value
            })
        });
    }

    group.finish();
}

fn bench_scalar(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar_roots");
    let cubic = |x: f64| x.powi(3) - x - 2.0;

    group.bench_function("newton_raphson", |b| {
        b.iter(|| {
            let mut solver = NewtonRaphson::with_derivative(cubic, |x: f64| 3.0 * x.powi(2) - 1.0);
            solver.solve(black_box(2.0)).expect("solve runs").value
        })
    });

    for method in [BracketingMethod::Dichotomy, BracketingMethod::FalsePosition] {
        group.bench_function(format!("{:?}", method), |b| {
            b.iter(|| {
                let config = RootBracketingConfig::default().with_method(method);
                let mut solver =
                    RootBracketing::with_config(cubic, config).expect("valid configuration");
                solver
                    .solve(black_box(1.0), black_box(2.0))
                    .expect("solve runs")
                    .value
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_gradient_descent,
    bench_nelder_mead,
    bench_particle_swarm,
    bench_differential_evolution,
    bench_scalar
);
criterion_main!(benches);
