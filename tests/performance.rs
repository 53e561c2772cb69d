use approx::assert_relative_eq;
use inverter_optimizer::{ParameterVector, PerformanceEvaluator, ProcessConstants};

fn sweep() -> impl Iterator<Item = ParameterVector> {
    let widths = [0.5, 1.0, 2.0, 7.5, 25.0, 50.0];
    let lengths = [0.35, 0.5, 1.0];
    widths.into_iter().flat_map(move |wn| {
        widths
            .into_iter()
            .flat_map(move |wp| lengths.into_iter().map(move |l| ParameterVector::new(wn, wp, l)))
    })
}

#[test]
fn records_are_positive_and_power_adds_up() {
    let evaluator = PerformanceEvaluator::default();
    for params in sweep() {
        let record = evaluator.evaluate(&params);
        for value in [
            record.delay.value,
            record.power_dyn.value,
            record.power_stat.value,
            record.power_total.value,
            record.area.value,
        ] {
            assert!(value.is_finite() && value > 0.0, "{params}: {value}");
        }
        assert_relative_eq!(
            record.power_total.value,
            record.power_dyn.value + record.power_stat.value,
            max_relative = 1e-12
        );
    }
}

#[test]
fn wider_nmos_pulls_down_faster() {
    let evaluator = PerformanceEvaluator::default();
    let mut previous = f64::INFINITY;
    for wn in [0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 50.0] {
        let fall = evaluator.evaluate(&ParameterVector::new(wn, 6.0, 0.35)).fall_delay.value;
        assert!(fall < previous);
        previous = fall;
    }
}

#[test]
fn degenerate_widths_are_slowest() {
    let evaluator = PerformanceEvaluator::default();
    let slowest_valid = sweep()
        .map(|p| evaluator.evaluate(&p).delay.value)
        .fold(0.0, f64::max);

    for params in [
        ParameterVector::new(0.0, 6.0, 0.35),
        ParameterVector::new(-1.0, 6.0, 0.35),
        ParameterVector::new(2.0, 0.0, 0.35),
    ] {
        let delay = evaluator.evaluate(&params).delay.value;
        assert!(delay.is_finite());
        assert!(delay > slowest_valid);
    }
}

#[test]
fn sizing_does_not_move_power() {
    let evaluator = PerformanceEvaluator::new(ProcessConstants::ams_035());
    let a = evaluator.evaluate(&ParameterVector::new(0.5, 0.5, 1.0));
    let b = evaluator.evaluate(&ParameterVector::new(50.0, 150.0, 0.35));
    assert_eq!(a.power_dyn, b.power_dyn);
    assert_eq!(a.power_stat, b.power_stat);
    assert_relative_eq!(a.power_dyn.value, 1.089e-5, max_relative = 1e-12);
    assert_relative_eq!(a.power_stat.value, 3.3e-8, max_relative = 1e-12);
}
