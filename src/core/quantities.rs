//! Derived quantities used by the square-law MOSFET model that `uom` does not
//! name.

use uom::{
    si::{Quantity, ISQ, SI},
    typenum::{N1, N2, N3, N4, P1, P2, P3, P4, P6, Z0},
};

/// Carrier mobility (m²/V·s).
pub type Mobility = Quantity<ISQ<Z0, N1, P2, P1, Z0, Z0, Z0>, SI<f64>, f64>;

/// Dielectric permittivity (F/m).
pub type Permittivity = Quantity<ISQ<N3, N1, P4, P2, Z0, Z0, Z0>, SI<f64>, f64>;

/// Gate-oxide capacitance per unit area (F/m²).
pub type OxideCapacitance = Quantity<ISQ<N4, N1, P4, P2, Z0, Z0, Z0>, SI<f64>, f64>;

/// Process transconductance parameter k' (A/V²).
pub type Transconductance = Quantity<ISQ<N4, N2, P6, P3, Z0, Z0, Z0>, SI<f64>, f64>;
