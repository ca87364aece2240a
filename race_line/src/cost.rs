//! Curvature and smoothness penalties for a lateral offset profile.
//!
//! The curvature cost treats the samples as an open polyline: there is no
//! term for the segment from the last sample back to the first, even on a
//! closed track.

use nalgebra::DVector;

use crate::centerline::TrackFrame;
use crate::optimize::Objective;

/// Segment lengths of exactly zero are replaced by this value.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Sum of squared differences between consecutive unit segment directions.
pub fn curvature_cost(xs: &[f64], ys: &[f64]) -> f64 {
    let dirs = segment_directions(xs, ys);
    dirs.windows(2)
        .map(|w| (w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2))
        .sum()
}

/// Sum of squared second differences of `offsets`.
pub fn smoothness_cost(offsets: &[f64]) -> f64 {
    offsets
        .windows(3)
        .map(|w| (w[2] - 2.0 * w[1] + w[0]).powi(2))
        .sum()
}

struct Segment {
    ux: f64,
    uy: f64,
    len: f64,
}

fn segments(xs: &[f64], ys: &[f64]) -> Vec<Segment> {
    xs.windows(2)
        .zip(ys.windows(2))
        .map(|(x, y)| {
            let (dx, dy) = (x[1] - x[0], y[1] - y[0]);
            let mut len = dx.hypot(dy);
            if len == 0.0 {
                len = MIN_SEGMENT_LENGTH;
            }
            Segment {
                ux: dx / len,
                uy: dy / len,
                len,
            }
        })
        .collect()
}

fn segment_directions(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    segments(xs, ys).into_iter().map(|s| (s.ux, s.uy)).collect()
}

/// Gradient of [`curvature_cost`] with respect to every point coordinate.
///
/// Returns `(d/dx, d/dy)` per point.
pub fn curvature_gradient(xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = xs.len();
    let mut gx = vec![0.0; n];
    let mut gy = vec![0.0; n];
    let segs = segments(xs, ys);
    let m = segs.len();
    if m < 2 {
        return (gx, gy);
    }
    for j in 0..m {
        // dC/du_j
        let (mut ax, mut ay) = (0.0, 0.0);
        if j > 0 {
            ax += 2.0 * (segs[j].ux - segs[j - 1].ux);
            ay += 2.0 * (segs[j].uy - segs[j - 1].uy);
        }
        if j + 1 < m {
            ax -= 2.0 * (segs[j + 1].ux - segs[j].ux);
            ay -= 2.0 * (segs[j + 1].uy - segs[j].uy);
        }
        // project out the component along u_j: d u / d d = (I - u u^T) / len
        let s = &segs[j];
        let along = ax * s.ux + ay * s.uy;
        let ddx = (ax - along * s.ux) / s.len;
        let ddy = (ay - along * s.uy) / s.len;
        gx[j + 1] += ddx;
        gy[j + 1] += ddy;
        gx[j] -= ddx;
        gy[j] -= ddy;
    }
    (gx, gy)
}

/// Gradient of [`smoothness_cost`].
pub fn smoothness_gradient(offsets: &[f64]) -> Vec<f64> {
    let mut g = vec![0.0; offsets.len()];
    for k in 0..offsets.len().saturating_sub(2) {
        let d2 = offsets[k + 2] - 2.0 * offsets[k + 1] + offsets[k];
        g[k] += 2.0 * d2;
        g[k + 1] -= 4.0 * d2;
        g[k + 2] += 2.0 * d2;
    }
    g
}

/// `curvature_cost(displaced points) + weight * smoothness_cost(offsets)`.
pub struct OffsetObjective<'a> {
    frame: &'a TrackFrame,
    smoothness_weight: f64,
}

impl<'a> OffsetObjective<'a> {
    pub fn new(frame: &'a TrackFrame, smoothness_weight: f64) -> Self {
        Self {
            frame,
            smoothness_weight,
        }
    }
}

impl Objective for OffsetObjective<'_> {
    fn value(&self, x: &DVector<f64>) -> f64 {
        let (xs, ys) = self.frame.displace(x.as_slice());
        curvature_cost(&xs, &ys) + self.smoothness_weight * smoothness_cost(x.as_slice())
    }

    fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        let (xs, ys) = self.frame.displace(x.as_slice());
        let (gx, gy) = curvature_gradient(&xs, &ys);
        let gs = smoothness_gradient(x.as_slice());
        DVector::from_fn(x.len(), |i, _| {
            gx[i] * self.frame.nx[i] + gy[i] * self.frame.ny[i] + self.smoothness_weight * gs[i]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_has_no_curvature() {
        let xs = [0.0, 1.0, 2.0, 3.5];
        let ys = [0.0, 1.0, 2.0, 3.5];
        assert!(curvature_cost(&xs, &ys).abs() < 1e-15);
    }

    #[test]
    fn right_angle_cost_is_two() {
        let xs = [0.0, 1.0, 1.0];
        let ys = [0.0, 0.0, 1.0];
        assert!((curvature_cost(&xs, &ys) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_points_do_not_blow_up() {
        let xs = [0.0, 1.0, 1.0, 2.0];
        let ys = [0.0, 0.0, 0.0, 0.0];
        let c = curvature_cost(&xs, &ys);
        assert!(c.is_finite());
        let (gx, gy) = curvature_gradient(&xs, &ys);
        assert!(gx.iter().chain(&gy).all(|g| g.is_finite()));
    }

    #[test]
    fn smoothness_of_linear_ramp_is_zero() {
        assert_eq!(smoothness_cost(&[0.0, 1.0, 2.0, 3.0]), 0.0);
        assert_eq!(smoothness_cost(&[0.0, 1.0, 0.0]), 4.0);
        assert_eq!(smoothness_cost(&[1.0, 2.0]), 0.0);
    }

    #[test]
    fn curvature_gradient_matches_finite_differences() {
        let xs = vec![0.0, 1.0, 2.2, 2.9, 3.1];
        let ys = vec![0.0, 0.3, 0.1, 1.0, 2.2];
        let (gx, gy) = curvature_gradient(&xs, &ys);
        let h = 1e-6;
        for i in 0..xs.len() {
            let mut xp = xs.clone();
            let mut xm = xs.clone();
            xp[i] += h;
            xm[i] -= h;
            let fd = (curvature_cost(&xp, &ys) - curvature_cost(&xm, &ys)) / (2.0 * h);
            assert!((fd - gx[i]).abs() < 1e-6, "x{}: {} vs {}", i, fd, gx[i]);

            let mut yp = ys.clone();
            let mut ym = ys.clone();
            yp[i] += h;
            ym[i] -= h;
            let fd = (curvature_cost(&xs, &yp) - curvature_cost(&xs, &ym)) / (2.0 * h);
            assert!((fd - gy[i]).abs() < 1e-6, "y{}: {} vs {}", i, fd, gy[i]);
        }
    }

    #[test]
    fn smoothness_gradient_matches_finite_differences() {
        let o = vec![0.3, -1.0, 0.5, 2.0, 1.1];
        let g = smoothness_gradient(&o);
        let h = 1e-6;
        for i in 0..o.len() {
            let mut op = o.clone();
            let mut om = o.clone();
            op[i] += h;
            om[i] -= h;
            let fd = (smoothness_cost(&op) - smoothness_cost(&om)) / (2.0 * h);
            assert!((fd - g[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn objective_gradient_matches_finite_differences() {
        let frame = TrackFrame {
            stations: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            cx: vec![0.0, 1.0, 2.0, 3.0, 3.5],
            cy: vec![0.0, 0.2, 0.8, 1.5, 2.5],
            nx: vec![0.0, -0.2, -0.5, -0.6, -0.9],
            ny: vec![1.0, 0.98, 0.866, 0.8, 0.436],
            width_left: vec![2.0; 5],
            width_right: vec![2.0; 5],
        };
        let objective = OffsetObjective::new(&frame, 2.0);
        let x = DVector::from_vec(vec![0.1, -0.2, 0.4, 0.0, -0.3]);
        let g = objective.gradient(&x);
        let h = 1e-6;
        for i in 0..x.len() {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[i] += h;
            xm[i] -= h;
            let fd = (objective.value(&xp) - objective.value(&xm)) / (2.0 * h);
            assert!((fd - g[i]).abs() < 1e-5);
        }
    }
}
