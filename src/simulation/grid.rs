use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::evaluator::{CandidateEvaluator, SimulationEvaluator, SimulationOutcome};
use super::runner::SimulationRunner;
use crate::core::{BestResult, EvaluationSource, ParameterVector, PerformanceEvaluator, PerformanceRecord, RatioWindow};
use crate::error::{Error, Result};

/// One evaluated grid point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridTrial {
    pub params: ParameterVector,
    pub outcome: SimulationOutcome,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridOutcome {
    /// Evaluated points in visiting order; out-of-window pairs are absent.
    pub trials: Vec<GridTrial>,
    pub best: Option<BestResult>,
}

/// Exhaustive search over a small width grid at a fixed channel length.
pub struct GridSearch<'a, E: ?Sized> {
    evaluator: &'a E,
    window: RatioWindow,
}

impl<'a, E: CandidateEvaluator + ?Sized> GridSearch<'a, E> {
    pub fn new(evaluator: &'a E) -> Self {
        Self {
            evaluator,
            window: RatioWindow::default(),
        }
    }

    pub fn with_window(mut self, window: RatioWindow) -> Self {
        self.window = window;
        self
    }

    /// Best successful point, or `None` when no simulation succeeded.
    pub fn search(&self, wn_values: &[f64], wp_values: &[f64], l: f64) -> Option<BestResult> {
        self.run(wn_values, wp_values, l).best
    }

    /// Visits the Cartesian product, skipping pairs outside the ratio window.
    pub fn run(&self, wn_values: &[f64], wp_values: &[f64], l: f64) -> GridOutcome {
        let mut outcome = GridOutcome::default();

        for &wn in wn_values {
            for &wp in wp_values {
                if !self.window.contains(wp / wn) {
                    continue;
                }
                let params = ParameterVector::new(wn, wp, l);
                let result = self.evaluator.evaluate(&params);
                if result.success {
                    info!("  Simulation {}: tpd={:.2} ns", params, result.delay_ns);
                    BestResult::offer(&mut outcome.best, params, result.delay_ns, EvaluationSource::Simulated);
                } else {
                    info!("  Simulation {}: FAILED", params);
                }
                outcome.trials.push(GridTrial { params, outcome: result });
            }
        }

        outcome
    }
}

/// Grid workflow settings.
#[derive(Clone, Debug, PartialEq)]
pub struct GridStudy {
    pub wn_values: Vec<f64>,
    pub wp_values: Vec<f64>,
    pub l_value: f64,
    pub window: RatioWindow,
    pub results_file: PathBuf,
}

impl Default for GridStudy {
    fn default() -> Self {
        Self {
            wn_values: vec![1.0, 2.0, 3.0],
            wp_values: vec![3.0, 6.0, 9.0],
            l_value: 0.35,
            window: RatioWindow::default(),
            results_file: PathBuf::from("ltspice_optim_results.txt"),
        }
    }
}

/// Grid result plus the analytical area and power of the winner.
#[derive(Clone, Debug)]
pub struct GridReport {
    pub outcome: GridOutcome,
    pub analytical: Option<PerformanceRecord>,
    pub results_file: Option<PathBuf>,
}

/// Runs the grid through a simulator and persists the winner.
///
/// A missing simulator stops here with guidance instead of producing a grid of
/// penalties.
pub fn run_study<R: SimulationRunner>(
    evaluator: &SimulationEvaluator<R>,
    study: &GridStudy,
    analytical: &PerformanceEvaluator,
) -> Result<GridReport> {
    if !evaluator.runner().is_available() {
        return Err(Error::ToolchainUnavailable(evaluator.runner().program().to_string()));
    }

    let outcome = GridSearch::new(evaluator)
        .with_window(study.window)
        .run(&study.wn_values, &study.wp_values, study.l_value);

    let Some(best) = outcome.best.as_ref() else {
        warn!("No successful simulation; check the simulator installation and the circuit template");
        return Ok(GridReport {
            outcome,
            analytical: None,
            results_file: None,
        });
    };

    let record = analytical.evaluate(&best.parameters);
    write_results(&study.results_file, best)?;
    info!("Results written to {}", study.results_file.display());

    Ok(GridReport {
        analytical: Some(record),
        results_file: Some(study.results_file.clone()),
        outcome,
    })
}

/// `Wn=…\nWp=…\nL=…\ntpd_ns=…` with the delay to three decimals.
pub fn write_results(path: &Path, best: &BestResult) -> Result<()> {
    let p = &best.parameters;
    let text = format!(
        "Wn={:?}\nWp={:?}\nL={:?}\ntpd_ns={:.3}\n",
        p.wn, p.wp, p.l, best.delay_ns
    );
    fs::write(path, text)?;
    Ok(())
}
