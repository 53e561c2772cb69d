use serde::{Deserialize, Serialize};
use uom::si::{area::square_micrometer, power::microwatt, time::nanosecond};

use super::solvers::traits::Problem;
use crate::core::*;
use crate::error::{Error, Result};

/// Problem shape handed to a black-box solver.
///
/// Built through [`OptimizationProblem::new`] (or the [`inverter`] preset) and
/// immutable afterwards.
///
/// [`inverter`]: OptimizationProblem::inverter
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizationProblem {
    objective_count: usize,
    variable_count: usize,
    integer_variable_count: usize,
    constraint_count: usize,
    equality_constraint_count: usize,
    lower_bounds: Vec<f64>,
    upper_bounds: Vec<f64>,
    initial_point: Vec<f64>,
}

impl OptimizationProblem {
    /// Continuous single-objective problem with inequality constraints only.
    pub fn new(
        lower_bounds: Vec<f64>,
        upper_bounds: Vec<f64>,
        initial_point: Vec<f64>,
        constraint_count: usize,
    ) -> Result<Self> {
        let n = lower_bounds.len();
        if n == 0 {
            return Err(Error::InvalidProblem("no variables".into()));
        }
        if upper_bounds.len() != n || initial_point.len() != n {
            return Err(Error::InvalidProblem(format!(
                "bounds and initial point lengths differ ({}, {}, {})",
                n,
                upper_bounds.len(),
                initial_point.len()
            )));
        }
        for (i, ((&lo, &hi), &x0)) in lower_bounds
            .iter()
            .zip(&upper_bounds)
            .zip(&initial_point)
            .enumerate()
        {
            if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                return Err(Error::InvalidProblem(format!(
                    "variable {i}: invalid bounds [{lo}, {hi}]"
                )));
            }
            if x0 < lo || x0 > hi {
                return Err(Error::InvalidProblem(format!(
                    "variable {i}: initial value {x0} outside [{lo}, {hi}]"
                )));
            }
        }

        Ok(Self {
            objective_count: 1,
            variable_count: n,
            integer_variable_count: 0,
            constraint_count,
            equality_constraint_count: 0,
            lower_bounds,
            upper_bounds,
            initial_point,
        })
    }

    /// Wn, Wp in [0.5, 50] / [0.5, 150] µm, L in [0.35, 1.0] µm, starting from
    /// the hand-sized (2, 6, 0.35) inverter with two ratio constraints.
    pub fn inverter() -> Self {
        Self {
            objective_count: 1,
            variable_count: ParameterVector::DIMENSION,
            integer_variable_count: 0,
            constraint_count: RatioWindow::CONSTRAINT_COUNT,
            equality_constraint_count: 0,
            lower_bounds: vec![0.5, 0.5, 0.35],
            upper_bounds: vec![50.0, 150.0, 1.0],
            initial_point: vec![2.0, 6.0, 0.35],
        }
    }

    /// Marks the first `count` constraint residuals as equalities (`g == 0`).
    pub fn with_equality_constraints(mut self, count: usize) -> Result<Self> {
        if count > self.constraint_count {
            return Err(Error::InvalidProblem(format!(
                "{count} equality constraints but only {} constraints",
                self.constraint_count
            )));
        }
        self.equality_constraint_count = count;
        Ok(self)
    }

    pub fn objective_count(&self) -> usize {
        self.objective_count
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn integer_variable_count(&self) -> usize {
        self.integer_variable_count
    }

    pub fn constraint_count(&self) -> usize {
        self.constraint_count
    }

    pub fn equality_constraint_count(&self) -> usize {
        self.equality_constraint_count
    }

    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower_bounds
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }

    pub fn initial_point(&self) -> &[f64] {
        &self.initial_point
    }

    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.lower_bounds
            .iter()
            .copied()
            .zip(self.upper_bounds.iter().copied())
            .collect()
    }

    #[inline]
    pub fn clamp(&self, x: &mut [f64]) {
        for (v, (&lo, &hi)) in x
            .iter_mut()
            .zip(self.lower_bounds.iter().zip(&self.upper_bounds))
        {
            *v = v.clamp(lo, hi);
        }
    }
}

/// Weights of the scalar objective, applied after rescaling delay to ns,
/// power to µW and area to µm².
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub delay: f64,
    pub power: f64,
    pub area: f64,
}

impl Default for ObjectiveWeights {
    /// Speed first, then power, then area.
    fn default() -> Self {
        Self {
            delay: 1.0,
            power: 0.01,
            area: 0.001,
        }
    }
}

/// Exposes the analytical inverter model to a constrained optimizer.
pub struct InverterProblem {
    definition: OptimizationProblem,
    evaluator: PerformanceEvaluator,
    weights: ObjectiveWeights,
    window: RatioWindow,
}

impl InverterProblem {
    pub fn new(definition: OptimizationProblem, evaluator: PerformanceEvaluator) -> Result<Self> {
        if definition.variable_count() != ParameterVector::DIMENSION {
            return Err(Error::InvalidProblem(format!(
                "inverter sizing has {} variables, problem declares {}",
                ParameterVector::DIMENSION,
                definition.variable_count()
            )));
        }
        if definition.constraint_count() != RatioWindow::CONSTRAINT_COUNT {
            return Err(Error::InvalidProblem(format!(
                "inverter sizing has {} constraints, problem declares {}",
                RatioWindow::CONSTRAINT_COUNT,
                definition.constraint_count()
            )));
        }
        Ok(Self {
            definition,
            evaluator,
            weights: ObjectiveWeights::default(),
            window: RatioWindow::default(),
        })
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_window(mut self, window: RatioWindow) -> Self {
        self.window = window;
        self
    }

    pub fn evaluator(&self) -> &PerformanceEvaluator {
        &self.evaluator
    }

    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    pub fn evaluate_for_optimizer(&self, params: &ParameterVector) -> ObjectiveConstraintResult {
        let perf = self.evaluator.evaluate(params);

        let objective = self.weights.delay * perf.delay.get::<nanosecond>()
            + self.weights.power * perf.power_total.get::<microwatt>()
            + self.weights.area * perf.area.get::<square_micrometer>();

        let ratio = guarded_ratio(params.wn, params.wp);

        ObjectiveConstraintResult {
            objective,
            constraints: self.window.residuals(ratio).to_vec(),
        }
    }
}

impl Problem for InverterProblem {
    fn definition(&self) -> &OptimizationProblem {
        &self.definition
    }

    fn evaluate(&self, x: &[f64]) -> Result<ObjectiveConstraintResult> {
        let params = ParameterVector::from_slice(x).ok_or_else(|| {
            Error::InvalidProblem(format!("expected 3 variables, got {}", x.len()))
        })?;
        Ok(self.evaluate_for_optimizer(&params))
    }
}
