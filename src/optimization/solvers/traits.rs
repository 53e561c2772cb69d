use std::fmt;
use std::time::Duration;

use crate::core::ObjectiveConstraintResult;
use crate::error::Result;
use crate::optimization::budget::RunBudget;
use crate::optimization::problem::OptimizationProblem;

#[derive(Clone, Debug)]
pub struct SolverResult {
    pub params: Vec<f64>,
    pub objective: f64,
    pub constraints: Vec<f64>,
    pub feasible: bool,
    pub iterations: u32,
    pub evaluations: usize,
    pub elapsed: Duration,
    pub message: String,
}

/// One evaluated point together with its total constraint violation.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub params: Vec<f64>,
    pub evaluation: ObjectiveConstraintResult,
    pub violation: f64,
}

impl Candidate {
    pub fn new(problem: &OptimizationProblem, params: Vec<f64>, evaluation: ObjectiveConstraintResult) -> Self {
        let violation = constraint_violation(problem, &evaluation.constraints);
        Self {
            params,
            evaluation,
            violation,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.violation == 0.0
    }

    /// Feasibility-first ranking: less violation wins, then lower objective.
    pub fn improves_on(&self, other: &Candidate) -> bool {
        if self.violation != other.violation {
            return self.violation < other.violation;
        }
        self.evaluation.objective < other.evaluation.objective
    }

    pub fn into_result(
        self,
        iterations: u32,
        evaluations: usize,
        elapsed: Duration,
        message: impl Into<String>,
    ) -> SolverResult {
        let feasible = self.is_feasible();
        SolverResult {
            params: self.params,
            objective: self.evaluation.objective,
            constraints: self.evaluation.constraints,
            feasible,
            iterations,
            evaluations,
            elapsed,
            message: message.into(),
        }
    }
}

/// Sum of constraint violations. The first `equality_constraint_count`
/// residuals are equalities (`g == 0`), the rest inequalities (`g >= 0`).
pub fn constraint_violation(problem: &OptimizationProblem, constraints: &[f64]) -> f64 {
    let equalities = problem.equality_constraint_count();
    constraints
        .iter()
        .enumerate()
        .map(|(i, &g)| if i < equalities { g.abs() } else { (-g).max(0.0) })
        .sum()
}

/// Callback interface for optimization progress
pub trait OptimizationCallback {
    /// Called after each solver iteration with the incumbent so far
    fn on_iteration(&mut self, iteration: u32, evaluations: usize, best: &Candidate) -> Result<()>;

    /// Check if optimization should stop early
    fn should_stop(&self) -> bool {
        false
    }
}

/// Objective/constraint callback handed to a black-box solver.
///
/// Implementations must be callable from several threads at once; solvers may
/// evaluate a population in parallel.
pub trait Problem: Sync {
    fn definition(&self) -> &OptimizationProblem;

    /// Evaluates one point of the search space.
    fn evaluate(&self, x: &[f64]) -> Result<ObjectiveConstraintResult>;
}

/// Opaque activation credential some black-box engines require.
///
/// Never printed; `Debug` only tells whether a key is present.
#[derive(Clone, Default)]
pub struct SolverKey(Option<String>);

impl SolverKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Some(key.into()))
    }

    pub fn expose(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Debug for SolverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("SolverKey(<redacted>)"),
            None => f.write_str("SolverKey(None)"),
        }
    }
}

/// Solver interface: a constrained black-box minimizer.
///
/// Returns the best point found within the budget even when it is
/// infeasible; infeasibility is reported through `SolverResult::feasible`.
pub trait Solver {
    fn name(&self) -> &str;

    fn solve(
        &mut self,
        problem: &dyn Problem,
        budget: &RunBudget,
        key: &SolverKey,
        callback: &mut dyn OptimizationCallback,
    ) -> Result<SolverResult>;
}
