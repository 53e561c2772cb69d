use uom::si::{
    area::square_centimeter,
    capacitance::{farad, femtofarad},
    electric_current::nanoampere,
    electric_potential::volt,
    f64::{
        Area, Capacitance, ElectricCurrent, ElectricPotential, ElectricalConductance,
        ElectricalResistance, Frequency, Length, Time,
    },
    electrical_resistance::ohm,
    frequency::megahertz,
    length::{meter, nanometer},
    time::second,
};

use super::quantities::{Mobility, OxideCapacitance, Permittivity, Transconductance};
use super::sentinels::DEGENERATE_RESISTANCE_OHMS;

/// Relative permittivity of SiO2.
const SIO2_RELATIVE_PERMITTIVITY: f64 = 3.9;
/// Vacuum permittivity (F/m), rounded the way the process deck uses it.
const VACUUM_PERMITTIVITY: f64 = 8.85e-12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    Nmos,
    Pmos,
}

/// Per-polarity device parameters extracted from a model card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Device {
    pub threshold_voltage: ElectricPotential,
    pub mobility: Mobility,
}

impl Device {
    /// Builds a device from a threshold in volts and a mobility in cm²/V·s, the
    /// units SPICE model cards carry (`VTH0`, `U0`).
    pub fn from_model_card(vth_volts: f64, u0_cm2_per_vs: f64) -> Self {
        Self {
            threshold_voltage: ElectricPotential::new::<volt>(vth_volts),
            mobility: mobility_from_cm2_per_vs(u0_cm2_per_vs),
        }
    }
}

/// Physical constants of one fabrication technology.
///
/// Fixed for the lifetime of a run and shared read-only by every evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessConstants {
    pub supply_voltage: ElectricPotential,
    pub nmos: Device,
    pub pmos: Device,
    pub oxide_thickness: Length,
    pub oxide_permittivity: Permittivity,
    pub load_capacitance: Capacitance,
    pub switching_frequency: Frequency,
    pub leakage_current: ElectricCurrent,
    /// RC-to-50% factor applied to `R_eq * C_load`.
    pub delay_coefficient: f64,
    /// Diffusion/contact overhead multiplier applied to the gate area.
    pub layout_factor: f64,
}

impl ProcessConstants {
    /// AMS 0.35 µm (`5827_035.lib`) driving a 10 fF load at 100 MHz.
    pub fn ams_035() -> Self {
        Self {
            supply_voltage: ElectricPotential::new::<volt>(3.3),
            nmos: Device::from_model_card(0.498, 475.8),
            pmos: Device::from_model_card(0.6915, 148.2),
            oxide_thickness: Length::new::<nanometer>(7.575),
            oxide_permittivity: permittivity_from_relative(SIO2_RELATIVE_PERMITTIVITY),
            load_capacitance: Capacitance::new::<femtofarad>(10.0),
            switching_frequency: Frequency::new::<megahertz>(100.0),
            leakage_current: ElectricCurrent::new::<nanoampere>(10.0),
            delay_coefficient: 0.69,
            layout_factor: 3.0,
        }
    }

    pub fn device(&self, polarity: Polarity) -> &Device {
        match polarity {
            Polarity::Nmos => &self.nmos,
            Polarity::Pmos => &self.pmos,
        }
    }

    /// Cox = eps_ox / t_ox
    pub fn oxide_capacitance(&self) -> OxideCapacitance {
        self.oxide_permittivity / self.oxide_thickness
    }

    /// k' = mobility * Cox
    pub fn transconductance(&self, polarity: Polarity) -> Transconductance {
        self.device(polarity).mobility * self.oxide_capacitance()
    }

    pub fn overdrive(&self, polarity: Polarity) -> ElectricPotential {
        self.supply_voltage - self.device(polarity).threshold_voltage
    }

    /// Saturation on-resistance `1 / (k' * (W/L) * (Vdd - Vth))`.
    ///
    /// A zero or negative width yields [`DEGENERATE_RESISTANCE_OHMS`] instead of
    /// dividing by zero, so an invalid geometry ranks as very slow.
    pub fn equivalent_resistance(
        &self,
        polarity: Polarity,
        width: Length,
        length: Length,
    ) -> ElectricalResistance {
        if width.value <= 0.0 {
            return ElectricalResistance::new::<ohm>(DEGENERATE_RESISTANCE_OHMS);
        }
        let conductance: ElectricalConductance =
            self.transconductance(polarity) * (width / length) * self.overdrive(polarity);
        conductance.recip()
    }
}

impl Default for ProcessConstants {
    fn default() -> Self {
        Self::ams_035()
    }
}

pub(crate) fn mobility_from_cm2_per_vs(value: f64) -> Mobility {
    Area::new::<square_centimeter>(value)
        / (ElectricPotential::new::<volt>(1.0) * Time::new::<second>(1.0))
}

pub(crate) fn permittivity_from_relative(relative: f64) -> Permittivity {
    Capacitance::new::<farad>(relative * VACUUM_PERMITTIVITY) / Length::new::<meter>(1.0)
}
