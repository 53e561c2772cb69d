use std::time::Duration;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::{ParameterVector, PerformanceEvaluator, PerformanceRecord};
use crate::error::Error;
use crate::optimization::{
    select_solver, InverterProblem, OptimizationDriver, OptimizationProblem, OptimizationReport,
    Problem, RunBudget,
};

fn to_py_err(err: Error) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Analytical performance in the units the console report uses.
#[pyclass]
#[derive(Clone, Debug)]
pub struct Performance {
    #[pyo3(get)]
    pub delay_ns: f64,
    #[pyo3(get)]
    pub power_dyn_uw: f64,
    #[pyo3(get)]
    pub power_stat_uw: f64,
    #[pyo3(get)]
    pub power_total_uw: f64,
    #[pyo3(get)]
    pub area_um2: f64,
}

impl From<&PerformanceRecord> for Performance {
    fn from(record: &PerformanceRecord) -> Self {
        Self {
            delay_ns: record.delay_ns(),
            power_dyn_uw: record.power_dyn_uw(),
            power_stat_uw: record.power_stat_uw(),
            power_total_uw: record.power_total_uw(),
            area_um2: record.area_um2(),
        }
    }
}

#[pymethods]
impl Performance {
    fn __repr__(&self) -> String {
        format!(
            "Performance(delay_ns={:.6}, power_total_uw={:.3}, area_um2={:.2})",
            self.delay_ns, self.power_total_uw, self.area_um2
        )
    }
}

#[pyclass]
#[derive(Clone, Debug)]
pub struct OptimizationResult {
    #[pyo3(get)]
    pub success: bool,
    #[pyo3(get)]
    pub wn: f64,
    #[pyo3(get)]
    pub wp: f64,
    #[pyo3(get)]
    pub l: f64,
    #[pyo3(get)]
    pub objective: f64,
    #[pyo3(get)]
    pub constraints: Vec<f64>,
    #[pyo3(get)]
    pub evaluations: usize,
    #[pyo3(get)]
    pub message: String,
    #[pyo3(get)]
    pub performance: Performance,
}

impl From<OptimizationReport> for OptimizationResult {
    fn from(report: OptimizationReport) -> Self {
        let p = report.best.parameters;
        Self {
            success: report.feasible,
            wn: p.wn,
            wp: p.wp,
            l: p.l,
            objective: report.evaluation.objective,
            constraints: report.evaluation.constraints,
            evaluations: report.evaluations,
            message: report.message,
            performance: Performance::from(&report.performance),
        }
    }
}

#[pyfunction]
fn evaluate(wn: f64, wp: f64, l: f64) -> Performance {
    let record = PerformanceEvaluator::default().evaluate(&ParameterVector::new(wn, wp, l));
    Performance::from(&record)
}

#[pyfunction]
#[pyo3(signature = (max_evaluations=5000, max_time_s=300.0, seed=None, parallel=false))]
fn optimize(
    py: Python<'_>,
    max_evaluations: usize,
    max_time_s: f64,
    seed: Option<u64>,
    parallel: bool,
) -> PyResult<OptimizationResult> {
    let wall_clock = Duration::try_from_secs_f64(max_time_s)
        .map_err(|e| PyValueError::new_err(format!("max_time_s: {e}")))?;
    let budget = RunBudget::new(max_evaluations, wall_clock)
        .map_err(to_py_err)?
        .with_parallel(parallel)
        .with_persistence(false);

    let problem = InverterProblem::new(OptimizationProblem::inverter(), PerformanceEvaluator::default())
        .map_err(to_py_err)?;

    let report = py
        .allow_threads(|| {
            let (solver, _) = select_solver(problem.definition(), seed);
            OptimizationDriver::new(solver).run(&problem, &budget)
        })
        .map_err(to_py_err)?;
    Ok(report.into())
}

#[pymodule]
fn inverter_optimizer(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Performance>()?;
    m.add_class::<OptimizationResult>()?;
    m.add_function(wrap_pyfunction!(evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(optimize, m)?)?;
    Ok(())
}
