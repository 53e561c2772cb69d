use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::traits::{Candidate, OptimizationCallback, Problem, Solver, SolverKey, SolverResult};
use crate::core::ObjectiveConstraintResult;
use crate::error::{Error, Result};
use crate::optimization::budget::RunBudget;

/// Particle Swarm Optimization with feasibility-first ranking.
///
/// Stands in for the licensed black-box engine: it only sees the problem
/// through [`Problem::evaluate`] and stops on the evaluation or wall-clock
/// budget, whichever comes first.
pub struct ParticleOptimizer {
    population_size: usize,
    inertia: f64,   // w - velocity inertia weight
    cognitive: f64, // c1 - personal best influence
    social: f64,    // c2 - global best influence
    seed: Option<u64>,
}

impl ParticleOptimizer {
    pub fn new() -> Self {
        Self {
            population_size: 20,
            inertia: 0.7,
            cognitive: 1.5,
            social: 1.5,
            seed: None,
        }
    }

    /// Configure swarm size (default: 20)
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(1);
        self
    }

    /// Configure PSO parameters (defaults: w=0.7, c1=1.5, c2=1.5)
    pub fn with_pso_params(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia = inertia;
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    /// Fixes the random stream so runs are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Initialize particle positions uniformly within bounds
    fn initialize_particles(
        &self,
        rng: &mut StdRng,
        bounds: &[(f64, f64)],
        initial_params: &[f64],
    ) -> Vec<Vec<f64>> {
        let mut particles = Vec::with_capacity(self.population_size);

        // First particle is the provided initial guess
        particles.push(initial_params.to_vec());

        for _ in 1..self.population_size {
            particles.push(bounds.iter().map(|&(min, max)| rng.gen_range(min..=max)).collect());
        }

        particles
    }

    /// Initialize velocities (small random values)
    fn initialize_velocities(&self, rng: &mut StdRng, bounds: &[(f64, f64)]) -> Vec<Vec<f64>> {
        (0..self.population_size)
            .map(|_| {
                bounds
                    .iter()
                    .map(|&(min, max)| {
                        let range = (max - min) * 0.1;
                        if range > 0.0 { rng.gen_range(-range..=range) } else { 0.0 }
                    })
                    .collect()
            })
            .collect()
    }
}

impl Default for ParticleOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

fn evaluate_batch(
    problem: &dyn Problem,
    batch: &[Vec<f64>],
    pool: Option<&ThreadPool>,
) -> Result<Vec<ObjectiveConstraintResult>> {
    match pool {
        Some(pool) => pool.install(|| batch.par_iter().map(|x| problem.evaluate(x)).collect()),
        None => batch.iter().map(|x| problem.evaluate(x)).collect(),
    }
}

impl Solver for ParticleOptimizer {
    fn name(&self) -> &str {
        "PSO"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        budget: &RunBudget,
        _key: &SolverKey,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<SolverResult> {
        budget.validate()?;
        let start = Instant::now();
        let definition = problem.definition();
        let bounds = definition.bounds();
        let n = definition.variable_count();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let pool = if budget.parallel {
            let threads = budget.worker_threads();
            debug!("PSO evaluating on {threads} threads");
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::Solver {
                        solver: self.name().to_string(),
                        message: e.to_string(),
                    })?,
            )
        } else {
            None
        };

        // Initialize swarm
        let mut particles = self.initialize_particles(&mut rng, &bounds, definition.initial_point());
        let mut velocities = self.initialize_velocities(&mut rng, &bounds);
        let mut personal_best: Vec<Option<Candidate>> = vec![None; self.population_size];
        let mut global_best: Option<Candidate> = None;

        let mut evaluations = 0usize;
        let mut iteration = 0u32;

        let message = loop {
            let remaining = budget.max_evaluations - evaluations;
            let batch = &particles[..self.population_size.min(remaining)];
            let results = evaluate_batch(problem, batch, pool.as_ref())?;
            evaluations += results.len();
            iteration += 1;

            for (p, evaluation) in results.into_iter().enumerate() {
                let candidate = Candidate::new(definition, particles[p].clone(), evaluation);

                if personal_best[p]
                    .as_ref()
                    .is_none_or(|best| candidate.improves_on(best))
                {
                    personal_best[p] = Some(candidate.clone());
                }
                if global_best
                    .as_ref()
                    .is_none_or(|best| candidate.improves_on(best))
                {
                    global_best = Some(candidate);
                }
            }

            let Some(best) = global_best.as_ref() else {
                break "No candidate evaluated";
            };

            // Report progress using the global best
            callback.on_iteration(iteration, evaluations, best)?;

            if callback.should_stop() {
                break "Stopped by callback";
            }
            if evaluations >= budget.max_evaluations {
                break "Evaluation limit reached";
            }
            if start.elapsed() >= budget.max_wall_clock {
                break "Time limit reached";
            }

            let global_position = best.params.clone();

            // Update velocities and positions for all particles
            for p in 0..self.population_size {
                let own_best = match personal_best[p].as_ref() {
                    Some(candidate) => candidate.params.as_slice(),
                    None => particles[p].as_slice(),
                }
                .to_vec();

                for i in 0..n {
                    let r1 = rng.gen_range(0.0..1.0);
                    let r2 = rng.gen_range(0.0..1.0);

                    // PSO velocity update equation
                    velocities[p][i] = self.inertia * velocities[p][i]
                        + self.cognitive * r1 * (own_best[i] - particles[p][i])
                        + self.social * r2 * (global_position[i] - particles[p][i]);

                    // Clamp velocity to fraction of search space
                    let (min, max) = bounds[i];
                    let v_max = (max - min) * 0.2;
                    velocities[p][i] = velocities[p][i].clamp(-v_max, v_max);

                    particles[p][i] += velocities[p][i];
                }

                definition.clamp(&mut particles[p]);
            }
        };

        let best = global_best.ok_or_else(|| Error::Solver {
            solver: self.name().to_string(),
            message: message.to_string(),
        })?;
        info!(
            "PSO finished after {evaluations} evaluations ({message}); best objective {:.6}, feasible: {}",
            best.evaluation.objective,
            best.is_feasible()
        );

        Ok(best.into_result(iteration, evaluations, start.elapsed(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PerformanceEvaluator;
    use crate::optimization::problem::{InverterProblem, OptimizationProblem};
    use std::time::Duration;

    struct Counting {
        iterations: u32,
        last_evaluations: usize,
    }

    impl OptimizationCallback for Counting {
        fn on_iteration(&mut self, iteration: u32, evaluations: usize, _best: &Candidate) -> Result<()> {
            self.iterations = iteration;
            self.last_evaluations = evaluations;
            Ok(())
        }
    }

    fn inverter() -> InverterProblem {
        InverterProblem::new(OptimizationProblem::inverter(), PerformanceEvaluator::default()).unwrap()
    }

    #[test]
    fn respects_evaluation_cap() {
        let budget = RunBudget::new(45, Duration::from_secs(60)).unwrap();
        let mut callback = Counting {
            iterations: 0,
            last_evaluations: 0,
        };
        let result = ParticleOptimizer::new()
            .with_seed(7)
            .solve(&inverter(), &budget, &SolverKey::default(), &mut callback)
            .unwrap();

        assert_eq!(result.evaluations, 45);
        assert_eq!(callback.last_evaluations, 45);
        assert_eq!(callback.iterations, 3);
        assert_eq!(result.message, "Evaluation limit reached");
    }

    #[test]
    fn improves_on_the_initial_point_and_stays_feasible() {
        let problem = inverter();
        let start = problem.evaluate(&[2.0, 6.0, 0.35]).unwrap();
        let budget = RunBudget::new(2000, Duration::from_secs(60)).unwrap();
        let mut callback = Counting {
            iterations: 0,
            last_evaluations: 0,
        };
        let result = ParticleOptimizer::new()
            .with_seed(42)
            .solve(&problem, &budget, &SolverKey::default(), &mut callback)
            .unwrap();

        assert!(result.feasible);
        assert!(result.objective <= start.objective);
        let definition = OptimizationProblem::inverter();
        assert!(result
            .params
            .iter()
            .zip(definition.bounds())
            .all(|(&v, (lo, hi))| v >= lo && v <= hi));
    }

    #[test]
    fn parallel_and_sequential_agree_for_a_fixed_seed() {
        let problem = inverter();
        let sequential = RunBudget::new(200, Duration::from_secs(60)).unwrap();
        let parallel = sequential.clone().with_parallel(true);
        let run = |budget: &RunBudget| {
            let mut callback = Counting {
                iterations: 0,
                last_evaluations: 0,
            };
            ParticleOptimizer::new()
                .with_seed(3)
                .solve(&problem, budget, &SolverKey::default(), &mut callback)
                .unwrap()
        };
        let a = run(&sequential);
        let b = run(&parallel);
        assert_eq!(a.params, b.params);
        assert_eq!(a.objective, b.objective);
    }

}
