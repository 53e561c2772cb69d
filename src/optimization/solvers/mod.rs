mod particle;
pub mod traits;

pub use particle::ParticleOptimizer;
pub use traits::{
    constraint_violation, Candidate, OptimizationCallback, Problem, Solver, SolverKey,
    SolverResult,
};

use super::problem::OptimizationProblem;

/// Picks the default solver for a problem.
///
/// Sizing problems are small, noisy when simulated and non-convex, so this
/// is always the particle swarm; the swarm grows with the variable count.
pub fn select_solver(problem: &OptimizationProblem, seed: Option<u64>) -> (Box<dyn Solver>, String) {
    let n = problem.variable_count();
    let pop_size = (10 + n * 3).min(30); // Scale population: 10-30 particles
    let mut pso = ParticleOptimizer::new().with_population_size(pop_size);
    if let Some(seed) = seed {
        pso = pso.with_seed(seed);
    }
    (
        Box::new(pso),
        format!("Auto: {} params → PSO (pop={})", n, pop_size),
    )
}
