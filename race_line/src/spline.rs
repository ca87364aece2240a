//! Interpolating cubic splines over strictly increasing knots.

use crate::error::{RaceLineError, Result};

/// Boundary behaviour at the first and last knot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Boundary {
    /// Value, slope and curvature match across the seam; evaluation wraps.
    Periodic,
    /// Zero second derivative at both ends; evaluation extrapolates.
    Natural,
}

/// C2 cubic spline stored as knot values and second derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    moments: Vec<f64>,
    boundary: Boundary,
}

impl CubicSpline {
    /// Fits a spline through `(knots[i], values[i])`.
    ///
    /// For a periodic spline the last value is replaced by the first one so
    /// the seam closes exactly.
    pub fn new(knots: &[f64], values: &[f64], boundary: Boundary) -> Result<Self> {
        if knots.len() != values.len() {
            return Err(RaceLineError::Interpolation(format!(
                "{} knots but {} values",
                knots.len(),
                values.len()
            )));
        }
        if knots.len() < 2 {
            return Err(RaceLineError::Interpolation(
                "a spline needs at least 2 knots".to_string(),
            ));
        }
        if let Some(pair) = knots.windows(2).find(|w| !(w[1] > w[0])) {
            return Err(RaceLineError::Interpolation(format!(
                "knots must be strictly increasing ({} then {})",
                pair[0], pair[1]
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RaceLineError::Interpolation(
                "spline values must be finite".to_string(),
            ));
        }

        let mut values = values.to_vec();
        if boundary == Boundary::Periodic {
            let n = values.len();
            values[n - 1] = values[0];
        }
        let moments = match boundary {
            Boundary::Periodic => periodic_moments(knots, &values)?,
            Boundary::Natural => natural_moments(knots, &values)?,
        };
        Ok(Self {
            knots: knots.to_vec(),
            values,
            moments,
            boundary,
        })
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Length of the knot span.
    pub fn period(&self) -> f64 {
        self.knots[self.knots.len() - 1] - self.knots[0]
    }

    /// Spline value at `s`.
    pub fn eval(&self, s: f64) -> f64 {
        let (i, s) = self.locate(s);
        let (x0, x1) = (self.knots[i], self.knots[i + 1]);
        let h = x1 - x0;
        let (a, b) = (x1 - s, s - x0);
        let (m0, m1) = (self.moments[i], self.moments[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }

    /// First derivative with respect to `s`.
    pub fn derivative(&self, s: f64) -> f64 {
        let (i, s) = self.locate(s);
        let (x0, x1) = (self.knots[i], self.knots[i + 1]);
        let h = x1 - x0;
        let (a, b) = (x1 - s, s - x0);
        let (m0, m1) = (self.moments[i], self.moments[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        -m0 * a * a / (2.0 * h) + m1 * b * b / (2.0 * h) + (y1 - y0) / h - (m1 - m0) * h / 6.0
    }

    /// Second derivative with respect to `s`.
    pub fn second_derivative(&self, s: f64) -> f64 {
        let (i, s) = self.locate(s);
        let (x0, x1) = (self.knots[i], self.knots[i + 1]);
        let h = x1 - x0;
        (self.moments[i] * (x1 - s) + self.moments[i + 1] * (s - x0)) / h
    }

    /// Interval index and the (possibly wrapped) evaluation position.
    fn locate(&self, s: f64) -> (usize, f64) {
        let first = self.knots[0];
        let s = match self.boundary {
            Boundary::Periodic => first + (s - first).rem_euclid(self.period()),
            Boundary::Natural => s,
        };
        let last_interval = self.knots.len() - 2;
        let i = self
            .knots
            .partition_point(|&k| k <= s)
            .saturating_sub(1)
            .min(last_interval);
        (i, s)
    }
}

fn slopes(knots: &[f64], values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let h: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
    let d: Vec<f64> = values
        .windows(2)
        .zip(&h)
        .map(|(w, h)| (w[1] - w[0]) / h)
        .collect();
    (h, d)
}

fn natural_moments(knots: &[f64], values: &[f64]) -> Result<Vec<f64>> {
    let n = knots.len();
    let mut moments = vec![0.0; n];
    if n < 3 {
        return Ok(moments);
    }
    let (h, d) = slopes(knots, values);
    let m = n - 2;
    let mut sub = vec![0.0; m];
    let mut diag = vec![0.0; m];
    let mut sup = vec![0.0; m];
    let mut rhs = vec![0.0; m];
    for k in 0..m {
        sub[k] = h[k];
        diag[k] = 2.0 * (h[k] + h[k + 1]);
        sup[k] = h[k + 1];
        rhs[k] = 6.0 * (d[k + 1] - d[k]);
    }
    let inner = solve_tridiagonal(&sub, &diag, &sup, &rhs)?;
    moments[1..n - 1].copy_from_slice(&inner);
    Ok(moments)
}

fn periodic_moments(knots: &[f64], values: &[f64]) -> Result<Vec<f64>> {
    let intervals = knots.len() - 1;
    let (h, d) = slopes(knots, values);
    let mut moments = match intervals {
        1 => vec![0.0],
        2 => {
            // both off-diagonal entries land on the other unknown
            let diag = 2.0 * (h[0] + h[1]);
            let off = h[0] + h[1];
            let r0 = 6.0 * (d[0] - d[1]);
            let r1 = 6.0 * (d[1] - d[0]);
            let det = diag * diag - off * off;
            if det.abs() < f64::EPSILON {
                return Err(RaceLineError::Interpolation(
                    "singular periodic spline system".to_string(),
                ));
            }
            vec![(r0 * diag - off * r1) / det, (diag * r1 - off * r0) / det]
        }
        n => {
            let mut sub = vec![0.0; n];
            let mut diag = vec![0.0; n];
            let mut sup = vec![0.0; n];
            let mut rhs = vec![0.0; n];
            for i in 0..n {
                let prev = (i + n - 1) % n;
                sub[i] = h[prev];
                diag[i] = 2.0 * (h[prev] + h[i]);
                sup[i] = h[i];
                rhs[i] = 6.0 * (d[i] - d[prev]);
            }
            // corners: row 0 couples to the last unknown and vice versa
            let top_right = h[n - 1];
            let bottom_left = h[n - 1];
            solve_cyclic_tridiagonal(&sub, &diag, &sup, bottom_left, top_right, &rhs)?
        }
    };
    moments.push(moments[0]);
    Ok(moments)
}

/// Thomas algorithm. `sub[0]` and `sup[n - 1]` are ignored.
pub fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Result<Vec<f64>> {
    let n = diag.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let mut c = vec![0.0; n];
    let mut x = vec![0.0; n];
    let mut beta = diag[0];
    if beta.abs() < f64::MIN_POSITIVE {
        return Err(singular());
    }
    x[0] = rhs[0] / beta;
    for i in 1..n {
        c[i] = sup[i - 1] / beta;
        beta = diag[i] - sub[i] * c[i];
        if beta.abs() < f64::MIN_POSITIVE {
            return Err(singular());
        }
        x[i] = (rhs[i] - sub[i] * x[i - 1]) / beta;
    }
    for i in (0..n - 1).rev() {
        x[i] -= c[i + 1] * x[i + 1];
    }
    Ok(x)
}

/// Cyclic tridiagonal solve via Sherman-Morrison. Needs at least 3 unknowns.
///
/// `bottom_left` is the entry at `(n - 1, 0)`, `top_right` at `(0, n - 1)`.
pub fn solve_cyclic_tridiagonal(
    sub: &[f64],
    diag: &[f64],
    sup: &[f64],
    bottom_left: f64,
    top_right: f64,
    rhs: &[f64],
) -> Result<Vec<f64>> {
    let n = diag.len();
    if n < 3 {
        return Err(RaceLineError::Interpolation(format!(
            "cyclic system needs at least 3 unknowns, got {}",
            n
        )));
    }
    let gamma = -diag[0];
    let mut bb = diag.to_vec();
    bb[0] = diag[0] - gamma;
    bb[n - 1] = diag[n - 1] - bottom_left * top_right / gamma;

    let mut x = solve_tridiagonal(sub, &bb, sup, rhs)?;
    let mut u = vec![0.0; n];
    u[0] = gamma;
    u[n - 1] = bottom_left;
    let z = solve_tridiagonal(sub, &bb, sup, &u)?;

    let denom = 1.0 + z[0] + top_right * z[n - 1] / gamma;
    if denom.abs() < f64::MIN_POSITIVE {
        return Err(singular());
    }
    let fact = (x[0] + top_right * x[n - 1] / gamma) / denom;
    for (xi, zi) in x.iter_mut().zip(&z) {
        *xi -= fact * zi;
    }
    Ok(x)
}

fn singular() -> RaceLineError {
    RaceLineError::Interpolation("singular spline system".to_string())
}
