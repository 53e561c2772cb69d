pub mod budget;
pub mod callback;
pub mod driver;
pub mod problem;
pub mod solvers;

pub use budget::RunBudget;
pub use callback::{IterationResult, ProgressCallback};
pub use driver::{OptimizationDriver, OptimizationReport};
pub use problem::{InverterProblem, ObjectiveWeights, OptimizationProblem};
pub use solvers::{select_solver, ParticleOptimizer};
pub use solvers::{Candidate, OptimizationCallback, Problem, Solver, SolverKey, SolverResult};
