//! SPICE value literals for the three sizing parameters.

/// Width literal: `"2.00u"` from 1 µm up, whole nanometers below.
pub fn width_literal(um: f64) -> String {
    if um >= 1.0 {
        format!("{:.2}u", um)
    } else {
        format!("{:.0}n", um * 1000.0)
    }
}

/// Channel length literal: `"0.350u"` from 0.1 µm up, whole nanometers below.
pub fn length_literal(um: f64) -> String {
    if um >= 0.1 {
        format!("{:.3}u", um)
    } else {
        format!("{:.0}n", um * 1000.0)
    }
}
