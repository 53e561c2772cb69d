use serde::{Deserialize, Serialize};

use super::sentinels::{NEUTRAL_RATIO, RATIO_EPSILON_UM};

/// Target window for the PMOS/NMOS sizing ratio `Wp / Wn`.
///
/// The optimizer path treats it as two soft residuals; the grid search uses it
/// as a hard filter through [`RatioWindow::contains`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioWindow {
    pub min: f64,
    pub max: f64,
}

impl RatioWindow {
    pub const CONSTRAINT_COUNT: usize = 2;

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Residuals `[ratio - min, max - ratio]`; both `>= 0` inside the window.
    pub fn residuals(&self, ratio: f64) -> [f64; 2] {
        [ratio - self.min, self.max - ratio]
    }

    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.min && ratio <= self.max
    }
}

impl Default for RatioWindow {
    fn default() -> Self {
        Self::new(1.2, 4.5)
    }
}

/// `Wp / Wn` as the optimizer sees it.
///
/// For `Wn <= RATIO_EPSILON_UM` the ratio is pinned to `NEUTRAL_RATIO`
/// whatever `Wp` is, so a degenerate point reports as in-window for the lower
/// bound residual. Kept as-is: changing it moves optimization results.
pub fn guarded_ratio(wn: f64, wp: f64) -> f64 {
    if wn > RATIO_EPSILON_UM {
        wp / wn
    } else {
        NEUTRAL_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residuals_at_window_edges() {
        let window = RatioWindow::default();

        let [low, _] = window.residuals(guarded_ratio(1.0, 1.2));
        assert_eq!(low, 0.0);
        let [low, _] = window.residuals(guarded_ratio(1.0, 1.19));
        assert!(low < 0.0);

        let [_, high] = window.residuals(guarded_ratio(2.0, 9.0));
        assert_eq!(high, 0.0);
        let [_, high] = window.residuals(guarded_ratio(1.0, 4.51));
        assert!(high < 0.0);
    }

    #[test]
    fn tiny_nmos_pins_ratio() {
        for wn in [0.0, 0.005, 0.01, -3.0] {
            assert_eq!(guarded_ratio(wn, 100.0), NEUTRAL_RATIO);
        }
        assert_eq!(guarded_ratio(0.02, 0.04), 2.0);
    }

    #[test]
    fn window_is_closed() {
        let window = RatioWindow::default();
        assert!(window.contains(1.2));
        assert!(window.contains(4.5));
        assert!(!window.contains(1.0));
        assert!(!window.contains(9.0));
    }
}
