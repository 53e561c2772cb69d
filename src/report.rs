//! Console reports. Each function returns the text; the binary prints it.

use crate::core::{ParameterVector, PerformanceRecord};
use crate::optimization::OptimizationReport;
use crate::simulation::GridReport;

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    format!("{}\n", "=".repeat(RULE_WIDTH))
}

/// Dimensions line plus the four performance figures.
pub fn performance(params: &ParameterVector, record: &PerformanceRecord) -> String {
    format!(
        "Dimensions: {}\n\
         Performance:\n\
         \x20 Delay:     {:.3} ns\n\
         \x20 P_dyn:     {:.3} µW\n\
         \x20 P_stat:    {:.6} µW\n\
         \x20 Area:      {:.2} µm²\n",
        params,
        record.delay_ns(),
        record.power_dyn_uw(),
        record.power_stat_uw(),
        record.area_um2()
    )
}

pub fn optimization(report: &OptimizationReport) -> String {
    let mut out = rule();
    out.push_str(&format!("Optimized solution ({})\n", report.solver));
    out.push_str(&rule());
    out.push_str(&performance(&report.best.parameters, &report.performance));
    out.push_str(&format!("Objective value: {:.6}\n", report.evaluation.objective));
    if !report.feasible {
        out.push_str(&format!(
            "Infeasible: ratio residuals {:?}\n",
            report.evaluation.constraints
        ));
    }
    out.push_str(&format!(
        "Stop reason: {} ({} evaluations, {:.1} s)\n",
        report.message,
        report.evaluations,
        report.elapsed.as_secs_f64()
    ));
    out
}

pub fn grid(report: &GridReport) -> String {
    let mut out = rule();
    let Some(best) = report.outcome.best.as_ref() else {
        out.push_str("No successful simulation. Check that the simulator is installed.\n");
        out.push_str(&rule());
        return out;
    };

    let p = &best.parameters;
    out.push_str("Best solution found:\n");
    out.push_str(&format!("  Wn={} µm, Wp={} µm, L={} µm\n", p.wn, p.wp, p.l));
    out.push_str(&format!("  Mean delay (simulated): {:.2} ns\n", best.delay_ns));
    if let Some(record) = &report.analytical {
        out.push_str(&format!("  Area (analytical): {:.2} µm²\n", record.area_um2()));
        out.push_str(&format!("  P_dyn (analytical): {:.2} µW\n", record.power_dyn_uw()));
    }
    if let Some(path) = &report.results_file {
        out.push_str(&format!("  Saved to {}\n", path.display()));
    }
    out.push_str(&rule());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::{BestResult, EvaluationSource, ObjectiveConstraintResult, PerformanceEvaluator};
    use crate::simulation::GridOutcome;

    #[test]
    fn performance_block_uses_fixed_precisions() {
        let params = ParameterVector::new(2.0, 6.0, 0.35);
        let record = PerformanceEvaluator::default().evaluate(&params);
        let text = performance(&params, &record);

        assert!(text.contains("Wn = 2.00 µm, Wp = 6.00 µm, L = 0.350 µm"));
        assert!(text.contains("Delay:     0.002 ns"));
        assert!(text.contains("P_dyn:     10.890 µW"));
        assert!(text.contains("P_stat:    0.033000 µW"));
        assert!(text.contains("Area:      8.40 µm²"));
        assert_eq!(text.lines().count(), 6);
        assert!(text.lines().skip(2).all(|line| line.starts_with("  ")));
    }

    #[test]
    fn infeasible_optimum_lists_residuals() {
        let params = ParameterVector::new(10.0, 0.5, 0.35);
        let report = OptimizationReport {
            best: BestResult {
                parameters: params,
                delay_ns: 0.01,
                source: EvaluationSource::Analytical,
            },
            performance: PerformanceEvaluator::default().evaluate(&params),
            evaluation: ObjectiveConstraintResult {
                objective: 1.5,
                constraints: vec![-1.15, 4.45],
            },
            feasible: false,
            evaluations: 45,
            iterations: 3,
            elapsed: Duration::from_millis(1500),
            solver: "pso".into(),
            message: "Evaluation limit reached".into(),
        };
        let text = optimization(&report);

        assert!(text.starts_with(&"=".repeat(60)));
        assert!(text.contains("Optimized solution (pso)\n"));
        assert!(text.contains("Objective value: 1.500000\n"));
        assert!(text.contains("Infeasible: ratio residuals [-1.15, 4.45]\n"));
        assert!(text.ends_with("Stop reason: Evaluation limit reached (45 evaluations, 1.5 s)\n"));
    }

    #[test]
    fn grid_without_success() {
        let report = GridReport {
            outcome: GridOutcome::default(),
            analytical: None,
            results_file: None,
        };
        let text = grid(&report);
        assert!(text.contains("No successful simulation"));
        assert_eq!(text.lines().filter(|line| *line == "=".repeat(60)).count(), 2);
    }

    #[test]
    fn grid_with_winner() {
        let params = ParameterVector::new(3.0, 9.0, 0.35);
        let report = GridReport {
            outcome: GridOutcome {
                trials: Vec::new(),
                best: Some(BestResult {
                    parameters: params,
                    delay_ns: 0.0312,
                    source: EvaluationSource::Simulated,
                }),
            },
            analytical: Some(PerformanceEvaluator::default().evaluate(&params)),
            results_file: None,
        };
        let text = grid(&report);
        assert!(text.contains("Wn=3 µm, Wp=9 µm, L=0.35 µm"));
        assert!(text.contains("Mean delay (simulated): 0.03 ns"));
        assert!(text.contains("Area (analytical): 12.60 µm²"));
    }
}
