//! Left and right half-widths, with missing values filled around the loop.

use crate::waypoint::Waypoint;

/// Half-width used on a side when no waypoint specifies one.
pub const DEFAULT_HALF_WIDTH: f64 = 5.0;

/// Fully populated left/right half-widths, one entry per waypoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WidthProfile {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl WidthProfile {
    /// Gap-fills the optional widths of `waypoints` on each side.
    pub fn from_waypoints(waypoints: &[Waypoint]) -> Self {
        let left: Vec<Option<f64>> = waypoints.iter().map(|w| w.width_left).collect();
        let right: Vec<Option<f64>> = waypoints.iter().map(|w| w.width_right).collect();
        Self {
            left: fill_widths(&left, DEFAULT_HALF_WIDTH),
            right: fill_widths(&right, DEFAULT_HALF_WIDTH),
        }
    }
}

/// Replaces every missing value with the most recent known one, scanning the
/// sequence as a loop so leading gaps take the last known value.
///
/// Non-finite values count as missing. If nothing is known, every entry is
/// `default`.
pub fn fill_widths(values: &[Option<f64>], default: f64) -> Vec<f64> {
    let known = |v: &Option<f64>| v.filter(|w| w.is_finite());
    let Some(mut last) = values.iter().rev().find_map(known) else {
        return vec![default; values.len()];
    };
    values
        .iter()
        .map(|v| {
            if let Some(w) = known(v) {
                last = w;
            }
            last
        })
        .collect()
}
