use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
use serde::Serialize;

use super::solvers::traits::{Candidate, OptimizationCallback};
use crate::error::Result;

/// Incumbent after one solver iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationResult {
    pub iteration: u32,
    pub evaluations: usize,
    pub params: Vec<f64>,
    pub objective: f64,
    pub violation: f64,
}

/// Logs progress every `report_interval` evaluations and keeps the
/// incumbent history for persistence.
pub struct ProgressCallback {
    report_interval: usize,
    next_report: usize,
    history: Vec<IterationResult>,
    stop: Option<Arc<AtomicBool>>,
}

impl ProgressCallback {
    /// `report_interval == 0` turns the progress log off.
    pub fn new(report_interval: usize) -> Self {
        Self {
            report_interval,
            next_report: report_interval,
            history: Vec::new(),
            stop: None,
        }
    }

    /// Stops the solver once `flag` is raised, e.g. from a Ctrl-C handler.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Get iteration history
    pub fn history(&self) -> &[IterationResult] {
        &self.history
    }

    pub fn save_history(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.history)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl OptimizationCallback for ProgressCallback {
    fn on_iteration(&mut self, iteration: u32, evaluations: usize, best: &Candidate) -> Result<()> {
        let improved = self
            .history
            .last()
            .is_none_or(|last| last.params != best.params);
        if improved {
            self.history.push(IterationResult {
                iteration,
                evaluations,
                params: best.params.clone(),
                objective: best.evaluation.objective,
                violation: best.violation,
            });
        }

        if self.report_interval > 0 && evaluations >= self.next_report {
            info!(
                "{:>6} evaluations: objective {:.6}, violation {:.3e}, x = {:?}",
                evaluations, best.evaluation.objective, best.violation, best.params
            );
            while self.next_report <= evaluations {
                self.next_report += self.report_interval;
            }
        }

        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
