//! Track waypoints and closed-loop handling.

use crate::geometry::{distance_squared, Point};

/// Squared distance below which the first and last waypoints are considered
/// the same point.
pub const CLOSURE_TOLERANCE: f64 = 1e-6;

/// A centerline sample of a track with optional half-width bounds.
///
/// `z`, `banking`, `friction` and `surface` are carried through but never
/// enter the racing line computation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_right: Option<f64>,
    #[serde(default)]
    pub banking: f64,
    #[serde(default = "default_friction")]
    pub friction: f64,
    #[serde(default = "default_surface")]
    pub surface: String,
}

fn default_friction() -> f64 {
    1.0
}

fn default_surface() -> String {
    "Asphalt".to_string()
}

impl Waypoint {
    /// Creates a waypoint without width information.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            width_left: None,
            width_right: None,
            banking: 0.0,
            friction: default_friction(),
            surface: default_surface(),
        }
    }

    /// Creates a waypoint with explicit left/right half-widths.
    pub fn with_widths(x: f64, y: f64, width_left: f64, width_right: f64) -> Self {
        Self {
            width_left: Some(width_left),
            width_right: Some(width_right),
            ..Self::new(x, y)
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Returns `true` when the first and last waypoints coincide within
/// `tolerance` (a squared distance).
pub fn is_closed(waypoints: &[Waypoint], tolerance: f64) -> bool {
    match (waypoints.first(), waypoints.last()) {
        (Some(first), Some(last)) if waypoints.len() > 1 => {
            distance_squared(first.point(), last.point()) < tolerance
        }
        _ => false,
    }
}

/// Returns the waypoints with a copy of the first one appended, unless the
/// sequence is already closed.
pub fn close_loop(waypoints: &[Waypoint]) -> Vec<Waypoint> {
    let mut closed = waypoints.to_vec();
    if !is_closed(waypoints, CLOSURE_TOLERANCE) {
        if let Some(first) = waypoints.first() {
            closed.push(first.clone());
        }
    }
    closed
}

/// Number of distinct positions along the loop. Zero-length steps and an
/// exact closing duplicate are not counted.
pub fn distinct_count(waypoints: &[Waypoint]) -> usize {
    let mut points: Vec<Point> = waypoints.iter().map(Waypoint::point).collect();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points.len()
}
