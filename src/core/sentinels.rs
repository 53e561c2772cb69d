//! Every substitute value the crate uses in place of an invalid or missing
//! number lives here, so ranking code never sees NaN or an absent value.

/// Equivalent resistance assigned to a transistor whose width is zero or
/// negative. Large enough that the resulting delay dominates any delay of a
/// valid geometry inside the default bounds.
pub const DEGENERATE_RESISTANCE_OHMS: f64 = 1e12;

/// Below this NMOS width (µm) the sizing ratio is not computed.
pub const RATIO_EPSILON_UM: f64 = 0.01;

/// Ratio reported when the NMOS width is below [`RATIO_EPSILON_UM`]. Makes a
/// degenerate point look feasible to the ratio constraints.
pub const NEUTRAL_RATIO: f64 = 1.0;

/// Delay (ns) reported for every failed simulation attempt.
pub const SIMULATION_PENALTY_NS: f64 = 1e6;

/// Value (s) substituted for a single measurement that no extraction strategy
/// could find in a completed simulation log.
pub const MISSING_MEASUREMENT_S: f64 = 1e-6;
