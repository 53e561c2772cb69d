use serde::{Deserialize, Serialize};
use std::fmt;

// ===== DESIGN POINT =====

/// Inverter sizing in micrometers, ordered `(Wn, Wp, L)` wherever it is
/// flattened into a slice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    pub wn: f64,
    pub wp: f64,
    pub l: f64,
}

impl ParameterVector {
    pub const DIMENSION: usize = 3;

    pub fn new(wn: f64, wp: f64, l: f64) -> Self {
        Self { wn, wp, l }
    }

    /// Reads an optimizer vector; `None` unless it has exactly three entries.
    pub fn from_slice(x: &[f64]) -> Option<Self> {
        match x {
            [wn, wp, l] => Some(Self::new(*wn, *wp, *l)),
            _ => None,
        }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.wn, self.wp, self.l]
    }

    pub fn is_within(&self, lower: &[f64], upper: &[f64]) -> bool {
        self.to_array()
            .iter()
            .zip(lower.iter().zip(upper))
            .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }
}

impl From<[f64; 3]> for ParameterVector {
    fn from([wn, wp, l]: [f64; 3]) -> Self {
        Self::new(wn, wp, l)
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wn = {:.2} µm, Wp = {:.2} µm, L = {:.3} µm",
            self.wn, self.wp, self.l
        )
    }
}

// ===== EVALUATION RESULTS =====

/// What a constrained optimizer sees for one candidate: a scalar objective to
/// minimize and constraint residuals, where `g >= 0` means satisfied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveConstraintResult {
    pub objective: f64,
    pub constraints: Vec<f64>,
}

impl ObjectiveConstraintResult {
    pub fn is_feasible(&self) -> bool {
        self.constraints.iter().all(|&g| g >= 0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationSource {
    Analytical,
    Simulated,
}

/// Incumbent of one optimization or grid-search run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BestResult {
    pub parameters: ParameterVector,
    pub delay_ns: f64,
    pub source: EvaluationSource,
}

impl BestResult {
    /// Replaces the incumbent only when `delay_ns` is strictly smaller.
    pub fn offer(
        incumbent: &mut Option<BestResult>,
        parameters: ParameterVector,
        delay_ns: f64,
        source: EvaluationSource,
    ) -> bool {
        let improves = incumbent
            .as_ref()
            .is_none_or(|best| delay_ns < best.delay_ns);
        if improves {
            *incumbent = Some(BestResult {
                parameters,
                delay_ns,
                source,
            });
        }
        improves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_round_trip_keeps_order() {
        let p = ParameterVector::from_slice(&[1.0, 3.0, 0.35]).unwrap();
        assert_eq!(p, ParameterVector::new(1.0, 3.0, 0.35));
        assert!(ParameterVector::from_slice(&[1.0, 3.0]).is_none());
    }

    #[test]
    fn bounds_are_closed() {
        let p = ParameterVector::new(0.5, 150.0, 0.35);
        assert!(p.is_within(&[0.5, 0.5, 0.35], &[50.0, 150.0, 1.0]));
        let outside = ParameterVector::new(0.49, 150.0, 0.35);
        assert!(!outside.is_within(&[0.5, 0.5, 0.35], &[50.0, 150.0, 1.0]));
    }

    #[test]
    fn incumbent_needs_strict_improvement() {
        let mut best = None;
        let p = ParameterVector::new(1.0, 3.0, 0.35);
        assert!(BestResult::offer(&mut best, p, 5.0, EvaluationSource::Simulated));
        let q = ParameterVector::new(2.0, 6.0, 0.35);
        assert!(!BestResult::offer(&mut best, q, 5.0, EvaluationSource::Simulated));
        assert_eq!(best.as_ref().map(|b| b.parameters), Some(p));
        assert!(BestResult::offer(&mut best, q, 4.0, EvaluationSource::Simulated));
        assert_eq!(best.map(|b| b.parameters), Some(q));
    }
}
