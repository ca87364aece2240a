//! Continuous centerline and width interpolants plus the sampled track frame.

use crate::arc_length::StationedLoop;
use crate::error::Result;
use crate::geometry::{left_normal, unit, Point};
use crate::spline::{Boundary, CubicSpline};
use crate::waypoint::{is_closed, Waypoint, CLOSURE_TOLERANCE};

/// Tangent magnitudes of exactly zero are replaced by this value.
pub const MIN_TANGENT_LENGTH: f64 = 1e-9;

/// Arc-length parameterized splines for the centerline and both half-widths.
#[derive(Debug, Clone)]
pub struct Centerline {
    pub x: CubicSpline,
    pub y: CubicSpline,
    pub width_left: CubicSpline,
    pub width_right: CubicSpline,
    total_length: f64,
}

impl Centerline {
    /// Closes, stations and interpolates raw waypoints.
    pub fn from_waypoints(raw: &[Waypoint]) -> Result<Self> {
        let stationed = StationedLoop::build(raw)?;
        Self::from_stationed(&stationed)
    }

    /// Builds the four interpolants from an already stationed loop.
    pub fn from_stationed(stationed: &StationedLoop) -> Result<Self> {
        let boundary = if is_closed(&stationed.waypoints, CLOSURE_TOLERANCE) {
            Boundary::Periodic
        } else {
            Boundary::Natural
        };
        let knots = &stationed.stations;
        let xs: Vec<f64> = stationed.waypoints.iter().map(|w| w.x).collect();
        let ys: Vec<f64> = stationed.waypoints.iter().map(|w| w.y).collect();
        let widths = &stationed.widths;
        log::debug!(
            "interpolating {} knots over {:.3} ({:?})",
            knots.len(),
            stationed.total_length(),
            boundary
        );
        Ok(Self {
            x: CubicSpline::new(knots, &xs, boundary)?,
            y: CubicSpline::new(knots, &ys, boundary)?,
            width_left: CubicSpline::new(knots, &widths.left, boundary)?,
            width_right: CubicSpline::new(knots, &widths.right, boundary)?,
            total_length: stationed.total_length(),
        })
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Position on the centerline at arc length `s`.
    pub fn point_at(&self, s: f64) -> Point {
        Point::new(self.x.eval(s), self.y.eval(s))
    }

    /// Unit tangent at arc length `s`.
    pub fn direction_at(&self, s: f64) -> (f64, f64) {
        unit(self.x.derivative(s), self.y.derivative(s), MIN_TANGENT_LENGTH)
    }

    /// `n` stations uniformly spaced over `[0, total_length)`.
    pub fn sample_grid(&self, n: usize) -> Vec<f64> {
        let step = self.total_length / n as f64;
        (0..n).map(|i| i as f64 * step).collect()
    }

    /// Evaluates centers, normals and half-widths at each station of `grid`.
    pub fn frame(&self, grid: &[f64]) -> TrackFrame {
        let mut frame = TrackFrame::with_capacity(grid.len());
        for &s in grid {
            let (tx, ty) = self.direction_at(s);
            let (nx, ny) = left_normal(tx, ty);
            frame.stations.push(s);
            frame.cx.push(self.x.eval(s));
            frame.cy.push(self.y.eval(s));
            frame.nx.push(nx);
            frame.ny.push(ny);
            frame.width_left.push(self.width_left.eval(s));
            frame.width_right.push(self.width_right.eval(s));
        }
        frame
    }
}

/// Centerline samples with their left normals and half-widths.
///
/// A positive lateral offset moves a point to the left of the direction of
/// travel, bounded by `width_left`; a negative one moves it right, bounded by
/// `width_right`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackFrame {
    pub stations: Vec<f64>,
    pub cx: Vec<f64>,
    pub cy: Vec<f64>,
    pub nx: Vec<f64>,
    pub ny: Vec<f64>,
    pub width_left: Vec<f64>,
    pub width_right: Vec<f64>,
}

impl TrackFrame {
    fn with_capacity(n: usize) -> Self {
        Self {
            stations: Vec::with_capacity(n),
            cx: Vec::with_capacity(n),
            cy: Vec::with_capacity(n),
            nx: Vec::with_capacity(n),
            ny: Vec::with_capacity(n),
            width_left: Vec::with_capacity(n),
            width_right: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Offset bounds `(lower, upper)` per sample.
    ///
    /// Negative interpolated widths (spline overshoot) collapse to zero so the
    /// box never inverts.
    pub fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        let lower = self.width_right.iter().map(|w| -w.max(0.0)).collect();
        let upper = self.width_left.iter().map(|w| w.max(0.0)).collect();
        (lower, upper)
    }

    /// Points displaced along the normals by `offsets`.
    pub fn displace(&self, offsets: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let xs = (0..self.len()).map(|i| self.cx[i] + self.nx[i] * offsets[i]).collect();
        let ys = (0..self.len()).map(|i| self.cy[i] + self.ny[i] * offsets[i]).collect();
        (xs, ys)
    }
}
