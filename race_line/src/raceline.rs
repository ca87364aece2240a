//! Ideal racing line: centerline offsets minimizing curvature within the track.

use nalgebra::DVector;

use crate::centerline::{Centerline, TrackFrame};
use crate::cost::OffsetObjective;
use crate::error::{RaceLineError, Result};
use crate::geometry::{Point, Polyline};
use crate::optimize::{BoundedMinimizer, ProjectedLbfgs, Scaling, DEFAULT_RIDGE};
use crate::waypoint::Waypoint;

pub const DEFAULT_NUM_SAMPLES: usize = 400;
pub const DEFAULT_SMOOTHNESS_WEIGHT: f64 = 2.0;
pub const DEFAULT_MAX_ITERATIONS: usize = 500;

/// Parameters of a racing line solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceLineParams {
    /// Number of output samples along the lap.
    pub num_samples: usize,
    /// Weight of the offset smoothness penalty relative to curvature.
    pub smoothness_weight: f64,
    /// Iteration cap of the optimizer.
    pub max_iterations: usize,
}

impl Default for RaceLineParams {
    fn default() -> Self {
        Self {
            num_samples: DEFAULT_NUM_SAMPLES,
            smoothness_weight: DEFAULT_SMOOTHNESS_WEIGHT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl RaceLineParams {
    pub fn validate(&self) -> Result<()> {
        if self.num_samples == 0 {
            return Err(RaceLineError::InvalidParameter(
                "num_samples must be positive".to_string(),
            ));
        }
        if !self.smoothness_weight.is_finite() || self.smoothness_weight < 0.0 {
            return Err(RaceLineError::InvalidParameter(format!(
                "smoothness_weight must be a finite non-negative number, got {}",
                self.smoothness_weight
            )));
        }
        if self.max_iterations == 0 {
            return Err(RaceLineError::InvalidParameter(
                "max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One sample of the racing line.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RaceLinePoint {
    /// Arc length along the centerline.
    pub s: f64,
    pub x: f64,
    pub y: f64,
    /// Signed distance from the centerline, positive to the left.
    pub offset: f64,
}

/// Solved racing line with solver diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceLine {
    pub points: Vec<RaceLinePoint>,
    pub iterations: usize,
    pub converged: bool,
    /// Objective value at the returned offsets.
    pub objective: f64,
}

impl RaceLine {
    /// Recombines the frame with `offsets` into absolute points.
    pub fn assemble(frame: &TrackFrame, offsets: &[f64]) -> Vec<RaceLinePoint> {
        let (xs, ys) = frame.displace(offsets);
        (0..frame.len())
            .map(|i| RaceLinePoint {
                s: frame.stations[i],
                x: xs[i],
                y: ys[i],
                offset: offsets[i],
            })
            .collect()
    }

    pub fn offsets(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.offset).collect()
    }

    pub fn polyline(&self) -> Polyline {
        Polyline::new(self.points.iter().map(|p| Point::new(p.x, p.y)).collect())
    }
}

/// Computes the racing line with the projected L-BFGS solver, scaled by the
/// second-difference model of consecutive offsets.
pub fn ideal_racing_line(waypoints: &[Waypoint], params: &RaceLineParams) -> Result<RaceLine> {
    let solver = ProjectedLbfgs::with_max_iterations(params.max_iterations).with_scaling(
        Scaling::SecondDifference {
            ridge: DEFAULT_RIDGE,
        },
    );
    ideal_racing_line_with(waypoints, params, &solver)
}

/// Computes the racing line using `minimizer` for the offset optimization.
pub fn ideal_racing_line_with(
    waypoints: &[Waypoint],
    params: &RaceLineParams,
    minimizer: &dyn BoundedMinimizer,
) -> Result<RaceLine> {
    params.validate()?;
    let centerline = Centerline::from_waypoints(waypoints)?;
    let grid = centerline.sample_grid(params.num_samples);
    let frame = centerline.frame(&grid);
    log::debug!(
        "solving {} offsets over a {:.3} long lap",
        frame.len(),
        centerline.total_length()
    );

    let (lower, upper) = frame.bounds();
    let lower = DVector::from_vec(lower);
    let upper = DVector::from_vec(upper);
    let objective = OffsetObjective::new(&frame, params.smoothness_weight);
    let minimum = minimizer.minimize(&objective, DVector::zeros(frame.len()), &lower, &upper);
    if !minimum.converged {
        log::warn!(
            "racing line optimizer stopped after {} iterations without converging (objective {:.6})",
            minimum.iterations,
            minimum.value
        );
    }

    Ok(RaceLine {
        points: RaceLine::assemble(&frame, minimum.x.as_slice()),
        iterations: minimum.iterations,
        converged: minimum.converged,
        objective: minimum.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Waypoint> {
        vec![
            Waypoint::with_widths(0.0, 0.0, 5.0, 5.0),
            Waypoint::with_widths(10.0, 0.0, 5.0, 5.0),
            Waypoint::with_widths(10.0, 10.0, 5.0, 5.0),
            Waypoint::with_widths(0.0, 10.0, 5.0, 5.0),
        ]
    }

    #[test]
    fn default_params() {
        let p = RaceLineParams::default();
        assert_eq!(p.num_samples, 400);
        assert_eq!(p.smoothness_weight, 2.0);
        assert_eq!(p.max_iterations, 500);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_params() {
        let bad = [
            RaceLineParams { num_samples: 0, ..Default::default() },
            RaceLineParams { smoothness_weight: -1.0, ..Default::default() },
            RaceLineParams { smoothness_weight: f64::NAN, ..Default::default() },
            RaceLineParams { max_iterations: 0, ..Default::default() },
        ];
        for p in bad {
            let err = ideal_racing_line(&square(), &p).unwrap_err();
            assert!(matches!(err, RaceLineError::InvalidParameter(_)));
        }
    }

    #[test]
    fn output_length_matches_samples() {
        let params = RaceLineParams { num_samples: 40, ..Default::default() };
        let line = ideal_racing_line(&square(), &params).unwrap();
        assert_eq!(line.points.len(), 40);
        assert_eq!(line.offsets().len(), 40);
        assert_eq!(line.polyline().vertices.len(), 40);
    }

    #[test]
    fn assemble_uses_normals() {
        let frame = TrackFrame {
            stations: vec![0.0, 1.0],
            cx: vec![0.0, 1.0],
            cy: vec![0.0, 0.0],
            nx: vec![0.0, 0.0],
            ny: vec![1.0, 1.0],
            width_left: vec![1.0, 1.0],
            width_right: vec![1.0, 1.0],
        };
        let pts = RaceLine::assemble(&frame, &[0.5, -0.25]);
        assert_eq!(pts[0], RaceLinePoint { s: 0.0, x: 0.0, y: 0.5, offset: 0.5 });
        assert_eq!(pts[1], RaceLinePoint { s: 1.0, x: 1.0, y: -0.25, offset: -0.25 });
    }
}
