//! Tests for the population-based global optimizers.
//!
//! These tests check determinism under a fixed seed, construction-time
//! validation and the behaviour of both update orders on standard test
//! functions with known global minima.

mod common;

use common::{array_approx_eq, rastrigin, RosenbrockFunction};
use ndarray::{array, Array1};
use numopt_rs::global_opt::create_population;
use numopt_rs::{
    DifferentialEvolutionConfig, DifferentialEvolutionOptimizer, EndCriteria, GenerationUpdate,
    OptError, ParticleSwarmConfig, ParticleSwarmOptimizer, Result, Solver, SolverStatus,
    SwarmUpdate,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn in_rastrigin_box(x: &Array1<f64>) -> bool {
    x.iter().all(|v| (-5.12..=5.12).contains(v))
}

fn rastrigin_population(seed: u64) -> Vec<Array1<f64>> {
    create_population(&[(-5.12, 5.12); 2], 30, &mut ChaCha8Rng::seed_from_u64(seed))
}

// --- Particle swarm ---

#[test]
fn test_pso_fixed_seed_is_deterministic() -> Result<()> {
    for update in [SwarmUpdate::Sequential, SwarmUpdate::Batched] {
        let config = ParticleSwarmConfig::default().with_update(update).with_seed(17);
        let mut a = ParticleSwarmOptimizer::with_config(rastrigin, vec![(-5.12, 5.12); 2], config.clone())?;
        let mut b = ParticleSwarmOptimizer::with_config(rastrigin, vec![(-5.12, 5.12); 2], config)?;

        a.optimize()?;
        b.optimize()?;

        assert_eq!(a.result(), b.result(), "{:?}", update);
        assert_eq!(a.convergence(), b.convergence(), "{:?}", update);
    }
    Ok(())
}

#[test]
fn test_pso_external_rng_is_deterministic() -> Result<()> {
    let mut a = ParticleSwarmOptimizer::new(rastrigin, vec![(-5.12, 5.12); 2])?;
    let mut b = ParticleSwarmOptimizer::new(rastrigin, vec![(-5.12, 5.12); 2])?;

    a.optimize_with_rng(&mut ChaCha8Rng::seed_from_u64(99))?;
    b.optimize_with_rng(&mut ChaCha8Rng::seed_from_u64(99))?;

    assert_eq!(a.convergence(), b.convergence());
    Ok(())
}

#[test]
fn test_pso_rosenbrock() -> Result<()> {
    let config = ParticleSwarmConfig::default()
        .with_swarm_size(40)
        .with_end_criteria(EndCriteria::iterations(500).with_max_static_iterations(100));
    let mut pso = ParticleSwarmOptimizer::with_config(RosenbrockFunction::new(2), vec![(-5.0, 5.0); 2], config)?;
    pso.optimize()?;

    println!("{}", pso.report());
    assert!(pso.status().is_terminal());
    assert!(array_approx_eq(&pso.result(), &array![1.0, 1.0], 0.05));
    Ok(())
}

#[test]
fn test_pso_generator_positions() -> Result<()> {
    // With no iterations the result is the best generated position.
    let config = ParticleSwarmConfig::default().with_end_criteria(EndCriteria::iterations(0));
    let mut pso = ParticleSwarmOptimizer::with_config(|x: &Array1<f64>| x.dot(x), vec![(-5.0, 5.0); 2], config)?
        .with_generator(|n| (0..n).map(|i| array![4.0 + 0.01 * i as f64, 4.0]).collect());
    pso.optimize()?;

    assert_eq!(pso.status(), SolverStatus::IterationExceeded);
    assert_eq!(pso.iterations(), 0);
    assert_eq!(pso.result(), array![4.0, 4.0]);
    assert_eq!(pso.final_value(), 32.0);
    Ok(())
}

#[test]
fn test_pso_construction_errors() {
    let config = ParticleSwarmConfig::default().with_swarm_size(1);
    let result = ParticleSwarmOptimizer::with_config(rastrigin, vec![(-1.0, 1.0)], config);
    assert!(matches!(result, Err(OptError::InvalidParameter(_))));

    let result = ParticleSwarmOptimizer::new(rastrigin, vec![(1.0, -1.0)]);
    assert!(matches!(result, Err(OptError::BoundsError(_))));
    assert!(result.is_err_and(|e| e.is_configuration_error()));
}

// --- Differential evolution ---

#[test]
fn test_de_fixed_seed_is_deterministic() -> Result<()> {
    for update in [GenerationUpdate::InPlace, GenerationUpdate::Batched] {
        let config = DifferentialEvolutionConfig::default().with_update(update).with_seed(3);
        let mut a = DifferentialEvolutionOptimizer::with_config(
            rastrigin,
            rastrigin_population(1),
            in_rastrigin_box,
            config.clone(),
        )?;
        let mut b =
            DifferentialEvolutionOptimizer::with_config(rastrigin, rastrigin_population(1), in_rastrigin_box, config)?;

        a.optimize()?;
        b.optimize()?;

        assert_eq!(a.result(), b.result(), "{:?}", update);
        assert_eq!(a.convergence(), b.convergence(), "{:?}", update);
    }
    Ok(())
}

#[test]
fn test_de_rastrigin() -> Result<()> {
    let config = DifferentialEvolutionConfig::default().with_max_iterations(300);
    let mut de =
        DifferentialEvolutionOptimizer::with_config(rastrigin, rastrigin_population(8), in_rastrigin_box, config)?;
    de.optimize()?;

    println!("{}", de.report());
    assert_eq!(de.status(), SolverStatus::IterationExceeded);
    assert!(array_approx_eq(&de.result(), &array![0.0, 0.0], 1e-2));
    Ok(())
}

#[test]
fn test_de_respects_feasibility() -> Result<()> {
    // Feasible region excludes the unconstrained minimum at the origin.
    let feasible = |x: &Array1<f64>| in_rastrigin_box(x) && x[0] >= 1.0;
    let population: Vec<Array1<f64>> = rastrigin_population(5)
        .into_iter()
        .map(|mut p| {
            p[0] = 1.0 + (p[0] + 5.12) / 10.24 * 4.0;
            p
        })
        .collect();

    let mut de = DifferentialEvolutionOptimizer::new(rastrigin, population, feasible)?;
    de.optimize()?;

    assert!(feasible(&de.result()));
    Ok(())
}

#[test]
fn test_de_construction_errors() {
    let result = DifferentialEvolutionOptimizer::new(rastrigin, rastrigin_population(1)[..4].to_vec(), in_rastrigin_box);
    assert!(matches!(result, Err(OptError::InvalidParameter(_))));

    let mut members = rastrigin_population(1);
    members[0] = array![6.0, 0.0];
    let result = DifferentialEvolutionOptimizer::new(rastrigin, members, in_rastrigin_box);
    assert!(matches!(result, Err(OptError::InfeasiblePopulation(_))));
}
