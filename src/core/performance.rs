use uom::si::{
    area::square_micrometer,
    f64::{Area, Length, Power, Time},
    length::micrometer,
    power::microwatt,
    time::nanosecond,
};

use super::process::{Polarity, ProcessConstants};
use super::types::ParameterVector;

/// Analytical performance of one inverter sizing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceRecord {
    /// Mean of the NMOS- and PMOS-limited estimates.
    pub delay: Time,
    /// High-to-low transition, limited by the NMOS pull-down.
    pub fall_delay: Time,
    /// Low-to-high transition, limited by the PMOS pull-up.
    pub rise_delay: Time,
    pub power_dyn: Power,
    pub power_stat: Power,
    pub power_total: Power,
    pub area: Area,
}

impl PerformanceRecord {
    pub fn delay_ns(&self) -> f64 {
        self.delay.get::<nanosecond>()
    }

    pub fn power_dyn_uw(&self) -> f64 {
        self.power_dyn.get::<microwatt>()
    }

    pub fn power_stat_uw(&self) -> f64 {
        self.power_stat.get::<microwatt>()
    }

    pub fn power_total_uw(&self) -> f64 {
        self.power_total.get::<microwatt>()
    }

    pub fn area_um2(&self) -> f64 {
        self.area.get::<square_micrometer>()
    }
}

/// Maps a sizing to delay, power and area with a first-order RC model.
///
/// Stateless apart from the read-only process constants, so one evaluator can
/// be shared across threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceEvaluator {
    process: ProcessConstants,
}

impl PerformanceEvaluator {
    pub fn new(process: ProcessConstants) -> Self {
        Self { process }
    }

    pub fn process(&self) -> &ProcessConstants {
        &self.process
    }

    /// Evaluates a sizing given in micrometers.
    pub fn evaluate(&self, params: &ParameterVector) -> PerformanceRecord {
        let p = &self.process;
        let wn = Length::new::<micrometer>(params.wn);
        let wp = Length::new::<micrometer>(params.wp);
        let l = Length::new::<micrometer>(params.l);

        let fall_delay: Time =
            p.equivalent_resistance(Polarity::Nmos, wn, l) * p.load_capacitance * p.delay_coefficient;
        let rise_delay: Time =
            p.equivalent_resistance(Polarity::Pmos, wp, l) * p.load_capacitance * p.delay_coefficient;
        let delay = (fall_delay + rise_delay) / 2.0;

        // Neither power term depends on sizing in this model.
        let power_dyn: Power =
            p.load_capacitance * p.supply_voltage * p.supply_voltage * p.switching_frequency;
        let power_stat: Power = p.leakage_current * p.supply_voltage;

        let area: Area = (wn + wp) * l * p.layout_factor;

        PerformanceRecord {
            delay,
            fall_delay,
            rise_delay,
            power_dyn,
            power_stat,
            power_total: power_dyn + power_stat,
            area,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uom::si::{power::watt, time::second};

    fn evaluate(wn: f64, wp: f64, l: f64) -> PerformanceRecord {
        PerformanceEvaluator::default().evaluate(&ParameterVector::new(wn, wp, l))
    }

    #[test]
    fn reference_sizing() {
        let perf = evaluate(2.0, 6.0, 0.35);
        assert_relative_eq!(perf.delay.get::<second>(), 2.1364328201128328e-12, max_relative = 1e-9);
        assert_relative_eq!(perf.fall_delay.get::<second>(), 1.9877846391864154e-12, max_relative = 1e-9);
        assert_relative_eq!(perf.rise_delay.get::<second>(), 2.2850810010392506e-12, max_relative = 1e-9);
        assert_relative_eq!(perf.power_dyn.get::<watt>(), 1.089e-5, max_relative = 1e-9);
        assert_relative_eq!(perf.power_stat.get::<watt>(), 3.3e-8, max_relative = 1e-9);
        assert_relative_eq!(perf.power_total.get::<watt>(), 1.0923e-5, max_relative = 1e-9);
        assert_relative_eq!(perf.area_um2(), 8.4, max_relative = 1e-9);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let a = evaluate(2.0, 6.0, 0.35);
        let b = evaluate(2.0, 6.0, 0.35);
        assert_eq!(a, b);
    }

    #[test]
    fn total_power_is_sum_of_parts() {
        for (wn, wp, l) in [(0.5, 0.5, 0.35), (10.0, 30.0, 0.6), (50.0, 150.0, 1.0)] {
            let perf = evaluate(wn, wp, l);
            assert_eq!(perf.power_total, perf.power_dyn + perf.power_stat);
        }
    }

    #[test]
    fn wider_nmos_is_faster_on_the_fall() {
        let mut previous = evaluate(0.5, 6.0, 0.35).fall_delay;
        for wn in [1.0, 2.0, 5.0, 20.0, 50.0] {
            let current = evaluate(wn, 6.0, 0.35).fall_delay;
            assert!(current < previous, "Wn = {wn}");
            previous = current;
        }
    }

    #[test]
    fn zero_width_dominates_every_valid_delay() {
        let degenerate = evaluate(0.0, 6.0, 0.35).delay;
        let negative = evaluate(-1.0, 6.0, 0.35).delay;
        assert!(degenerate.value.is_finite());
        assert_eq!(degenerate, negative);

        // Slowest valid corner of the default bounds.
        let slowest = evaluate(0.5, 0.5, 1.0).delay;
        assert!(degenerate > slowest);
    }
}
