use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use super::budget::RunBudget;
use super::callback::ProgressCallback;
use super::problem::InverterProblem;
use super::solvers::traits::{Problem, Solver, SolverKey};
use crate::core::{BestResult, EvaluationSource, ObjectiveConstraintResult, ParameterVector, PerformanceRecord};
use crate::error::{Error, Result};

/// Outcome of one optimizer run, re-evaluated for reporting.
#[derive(Clone, Debug)]
pub struct OptimizationReport {
    pub best: BestResult,
    /// Full, unrescaled record at the returned point.
    pub performance: PerformanceRecord,
    /// Objective and residuals as the solver saw them.
    pub evaluation: ObjectiveConstraintResult,
    pub feasible: bool,
    pub evaluations: usize,
    pub iterations: u32,
    pub elapsed: Duration,
    pub solver: String,
    pub message: String,
}

/// Runs an injected black-box solver on the inverter problem.
pub struct OptimizationDriver {
    solver: Box<dyn Solver>,
    key: SolverKey,
    history_path: Option<PathBuf>,
    stop: Option<Arc<AtomicBool>>,
}

impl OptimizationDriver {
    pub fn new(solver: Box<dyn Solver>) -> Self {
        Self {
            solver,
            key: SolverKey::default(),
            history_path: None,
            stop: None,
        }
    }

    pub fn with_key(mut self, key: SolverKey) -> Self {
        self.key = key;
        self
    }

    /// Where the incumbent history goes when the budget asks for persistence.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn run(&mut self, problem: &InverterProblem, budget: &RunBudget) -> Result<OptimizationReport> {
        budget.validate()?;
        info!(
            "Optimizing with {} ({} evaluations, {:?} wall clock)",
            self.solver.name(),
            budget.max_evaluations,
            budget.max_wall_clock
        );

        let mut callback = ProgressCallback::new(budget.progress_report_interval);
        if let Some(flag) = &self.stop {
            callback = callback.with_stop_flag(flag.clone());
        }

        let result = self.solver.solve(problem, budget, &self.key, &mut callback)?;

        let params = ParameterVector::from_slice(&result.params).ok_or_else(|| Error::Solver {
            solver: self.solver.name().to_string(),
            message: format!("returned {} variables, expected 3", result.params.len()),
        })?;

        // Re-evaluate once for the report
        let performance = problem.evaluator().evaluate(&params);
        let evaluation = problem.evaluate(&result.params)?;

        if !result.feasible {
            warn!(
                "No feasible point within budget; reporting best infeasible point {} (residuals {:?})",
                params, result.constraints
            );
        }

        if budget.persist_history {
            if let Some(path) = &self.history_path {
                match callback.save_history(path) {
                    Ok(()) => info!("History written to {}", path.display()),
                    Err(e) => warn!("Failed to write history to {}: {}", path.display(), e),
                }
            }
        }

        let best = BestResult {
            parameters: params,
            delay_ns: performance.delay_ns(),
            source: EvaluationSource::Analytical,
        };

        Ok(OptimizationReport {
            best,
            performance,
            evaluation,
            feasible: result.feasible,
            evaluations: result.evaluations,
            iterations: result.iterations,
            elapsed: result.elapsed,
            solver: self.solver.name().to_string(),
            message: result.message,
        })
    }
}
