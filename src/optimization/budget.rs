use std::time::Duration;

use crate::error::{Error, Result};

/// Run-time budget handed to a solver alongside the problem.
#[derive(Clone, Debug, PartialEq)]
pub struct RunBudget {
    pub max_evaluations: usize,
    pub max_wall_clock: Duration,
    /// Evaluations between two progress reports; 0 disables reporting.
    pub progress_report_interval: usize,
    /// Write the incumbent history to disk at the end of the run.
    pub persist_history: bool,
    /// Let the solver evaluate candidates on several threads.
    pub parallel: bool,
    /// Worker threads when `parallel` is set; defaults to the core count.
    pub workers: Option<usize>,
}

impl RunBudget {
    pub fn new(max_evaluations: usize, max_wall_clock: Duration) -> Result<Self> {
        let budget = Self {
            max_evaluations,
            max_wall_clock,
            ..Self::default()
        };
        budget.validate()?;
        Ok(budget)
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_report_interval = interval;
        self
    }

    pub fn with_persistence(mut self, persist: bool) -> Self {
        self.persist_history = persist;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_evaluations == 0 {
            return Err(Error::InvalidBudget("max_evaluations must be positive".into()));
        }
        if self.max_wall_clock.is_zero() {
            return Err(Error::InvalidBudget("max_wall_clock must be positive".into()));
        }
        if self.workers == Some(0) {
            return Err(Error::InvalidBudget("workers must be positive".into()));
        }
        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }
}

impl Default for RunBudget {
    /// 5000 evaluations or five minutes, a report every 500 evaluations.
    fn default() -> Self {
        Self {
            max_evaluations: 5000,
            max_wall_clock: Duration::from_secs(5 * 60),
            progress_report_interval: 500,
            persist_history: true,
            parallel: false,
            workers: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_budgets() {
        assert!(RunBudget::new(0, Duration::from_secs(1)).is_err());
        assert!(RunBudget::new(10, Duration::ZERO).is_err());
        assert!(RunBudget::new(10, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn worker_count_falls_back_to_cores() {
        let budget = RunBudget::default();
        assert!(budget.worker_threads() >= 1);
        let pinned = RunBudget {
            workers: Some(3),
            ..RunBudget::default()
        };
        assert_eq!(pinned.worker_threads(), 3);
    }
}
