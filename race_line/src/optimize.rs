//! Box-constrained local minimization.

use std::collections::VecDeque;

use nalgebra::DVector;

/// A differentiable scalar function of `n` variables.
pub trait Objective {
    fn value(&self, x: &DVector<f64>) -> f64;

    fn gradient(&self, x: &DVector<f64>) -> DVector<f64>;
}

/// Outcome of a bounded minimization. `x` is always the best iterate found,
/// whether or not the solver converged.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: DVector<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// A local minimizer over the box `lower <= x <= upper`.
pub trait BoundedMinimizer {
    fn minimize(
        &self,
        objective: &dyn Objective,
        x0: DVector<f64>,
        lower: &DVector<f64>,
        upper: &DVector<f64>,
    ) -> Minimum;
}

/// Ridge added to the second-difference model so it stays positive definite.
pub const DEFAULT_RIDGE: f64 = 1e-6;

/// Initial inverse Hessian model used by the two-loop recursion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scaling {
    /// `gamma * I`.
    Identity,
    /// `gamma * (DᵀD + ridge * I)⁻¹` restricted to the free variables, where
    /// `D` takes second differences of consecutive variables. Suited to
    /// values sampled in order along a curve, whose Hessian is dominated by
    /// such a term.
    SecondDifference { ridge: f64 },
}

/// Limited-memory BFGS on the free variables with gradient projection onto
/// the box and an Armijo backtracking search along the projected path.
///
/// Variables sitting on a bound with the gradient pushing outward are held
/// fixed while the search direction and the correction pairs are formed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedLbfgs {
    /// Number of correction pairs kept.
    pub memory: usize,
    pub max_iterations: usize,
    /// Stop once the largest projected gradient component is below this.
    pub pgtol: f64,
    /// Stop once the relative decrease falls below `factr * f64::EPSILON`.
    pub factr: f64,
    pub scaling: Scaling,
}

impl Default for ProjectedLbfgs {
    fn default() -> Self {
        Self {
            memory: 10,
            max_iterations: 500,
            pgtol: 1e-5,
            factr: 1e7,
            scaling: Scaling::Identity,
        }
    }
}

const ARMIJO_C1: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 40;
/// Distance from a bound below which a variable counts as on it.
const BOUND_TOLERANCE: f64 = 1e-10;
/// An accepted step shorter than this fraction of the trial step means the
/// quadratic model is poor; the history is dropped and no convergence is
/// declared from it.
const SHORT_STEP: f64 = 1e-3;

struct Correction {
    s: DVector<f64>,
    y: DVector<f64>,
    rho: f64,
}

impl ProjectedLbfgs {
    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    pub fn with_scaling(self, scaling: Scaling) -> Self {
        Self { scaling, ..self }
    }

    fn precondition(&self, v: &DVector<f64>, free: &[bool]) -> DVector<f64> {
        match self.scaling {
            Scaling::Identity => v.clone(),
            Scaling::SecondDifference { ridge } => {
                solve_second_difference(v, free, ridge).unwrap_or_else(|| masked(v, free))
            }
        }
    }

    /// Two-loop recursion over the free variables. Returns `-H g` and whether
    /// any correction pair took part.
    fn direction(
        &self,
        g: &DVector<f64>,
        history: &VecDeque<Correction>,
        free: &[bool],
    ) -> (DVector<f64>, bool) {
        let pairs: Vec<Correction> = history
            .iter()
            .filter_map(|c| {
                let s = masked(&c.s, free);
                let y = masked(&c.y, free);
                let sy = s.dot(&y);
                (sy > f64::EPSILON * y.dot(&y)).then(|| Correction { s, y, rho: 1.0 / sy })
            })
            .collect();

        let mut q = masked(g, free);
        let mut alphas = Vec::with_capacity(pairs.len());
        for c in pairs.iter().rev() {
            let a = c.rho * c.s.dot(&q);
            q.axpy(-a, &c.y, 1.0);
            alphas.push(a);
        }
        let mut r = self.precondition(&q, free);
        if let Some(last) = pairs.last() {
            let hy = self.precondition(&last.y, free);
            r *= last.s.dot(&last.y) / last.y.dot(&hy);
        }
        for (c, a) in pairs.iter().zip(alphas.iter().rev()) {
            let b = c.rho * c.y.dot(&r);
            r.axpy(a - b, &c.s, 1.0);
        }
        (-masked(&r, free), !pairs.is_empty())
    }
}

/// Clamps every component of `x` into `[lower, upper]`.
pub fn project(x: &mut DVector<f64>, lower: &DVector<f64>, upper: &DVector<f64>) {
    for i in 0..x.len() {
        x[i] = x[i].max(lower[i]).min(upper[i]);
    }
}

/// Infinity norm of the projected gradient step.
fn projected_gradient_norm(
    x: &DVector<f64>,
    g: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> f64 {
    (0..x.len())
        .map(|i| ((x[i] - g[i]).max(lower[i]).min(upper[i]) - x[i]).abs())
        .fold(0.0, f64::max)
}

fn at_lower(x: f64, lower: f64) -> bool {
    x <= lower + BOUND_TOLERANCE
}

fn at_upper(x: f64, upper: f64) -> bool {
    x >= upper - BOUND_TOLERANCE
}

/// Variables not held on a bound by the gradient.
fn free_variables(
    x: &DVector<f64>,
    g: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> Vec<bool> {
    (0..x.len())
        .map(|i| {
            let held_low = at_lower(x[i], lower[i]) && g[i] > 0.0;
            let held_high = at_upper(x[i], upper[i]) && g[i] < 0.0;
            !(held_low || held_high)
        })
        .collect()
}

fn masked(v: &DVector<f64>, free: &[bool]) -> DVector<f64> {
    DVector::from_fn(v.len(), |i, _| if free[i] { v[i] } else { 0.0 })
}

/// Zeroes direction components that would leave the box from a bound.
fn drop_blocked(
    d: &mut DVector<f64>,
    x: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) {
    for i in 0..d.len() {
        if (at_lower(x[i], lower[i]) && d[i] < 0.0) || (at_upper(x[i], upper[i]) && d[i] > 0.0) {
            d[i] = 0.0;
        }
    }
}

/// Entry `(i, j)` of `DᵀD + ridge * I` for `n` variables.
fn second_difference_gram(n: usize, i: usize, j: usize, ridge: f64) -> f64 {
    const STENCIL: [f64; 3] = [1.0, -2.0, 1.0];
    let mut value = if i == j { ridge } else { 0.0 };
    if n >= 3 {
        let first = i.max(j).saturating_sub(2);
        let last = i.min(j).min(n - 3);
        for k in first..=last {
            value += STENCIL[i - k] * STENCIL[j - k];
        }
    }
    value
}

/// Solves `(DᵀD + ridge * I) z = v` on the free variables with a banded
/// LDLᵀ factorization. Fixed variables get zero. `None` when a pivot is not
/// positive.
pub fn solve_second_difference(
    v: &DVector<f64>,
    free: &[bool],
    ridge: f64,
) -> Option<DVector<f64>> {
    let n = v.len();
    let idx: Vec<usize> = (0..n).filter(|&i| free[i]).collect();
    let m = idx.len();
    let mut l1 = vec![0.0; m];
    let mut l2 = vec![0.0; m];
    let mut diag = vec![0.0; m];
    for a in 0..m {
        let i = idx[a];
        if a >= 2 && i - idx[a - 2] <= 2 {
            l2[a] = second_difference_gram(n, i, idx[a - 2], ridge) / diag[a - 2];
        }
        if a >= 1 {
            let mut off = if i - idx[a - 1] <= 2 {
                second_difference_gram(n, i, idx[a - 1], ridge)
            } else {
                0.0
            };
            if a >= 2 {
                off -= l2[a] * diag[a - 2] * l1[a - 1];
            }
            l1[a] = off / diag[a - 1];
        }
        let mut pivot = second_difference_gram(n, i, i, ridge);
        if a >= 1 {
            pivot -= l1[a] * l1[a] * diag[a - 1];
        }
        if a >= 2 {
            pivot -= l2[a] * l2[a] * diag[a - 2];
        }
        if !(pivot > 0.0 && pivot.is_finite()) {
            return None;
        }
        diag[a] = pivot;
    }

    let mut z: Vec<f64> = idx.iter().map(|&i| v[i]).collect();
    for a in 0..m {
        if a >= 1 {
            z[a] -= l1[a] * z[a - 1];
        }
        if a >= 2 {
            z[a] -= l2[a] * z[a - 2];
        }
    }
    for a in 0..m {
        z[a] /= diag[a];
    }
    for a in (0..m).rev() {
        if a + 1 < m {
            z[a] -= l1[a + 1] * z[a + 1];
        }
        if a + 2 < m {
            z[a] -= l2[a + 2] * z[a + 2];
        }
    }

    let mut out = DVector::zeros(n);
    for (a, &i) in idx.iter().enumerate() {
        out[i] = z[a];
    }
    Some(out)
}

impl BoundedMinimizer for ProjectedLbfgs {
    fn minimize(
        &self,
        objective: &dyn Objective,
        x0: DVector<f64>,
        lower: &DVector<f64>,
        upper: &DVector<f64>,
    ) -> Minimum {
        let mut x = x0;
        project(&mut x, lower, upper);
        let mut f = objective.value(&x);
        let mut g = objective.gradient(&x);
        let mut history: VecDeque<Correction> = VecDeque::with_capacity(self.memory);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            if projected_gradient_norm(&x, &g, lower, upper) <= self.pgtol {
                converged = true;
                break;
            }

            let free = free_variables(&x, &g, lower, upper);
            let (mut d, used_history) = self.direction(&g, &history, &free);
            drop_blocked(&mut d, &x, lower, upper);
            let mut restart = !used_history;
            if g.dot(&d) >= 0.0 {
                history.clear();
                restart = true;
                d = -self.precondition(&masked(&g, &free), &free);
                drop_blocked(&mut d, &x, lower, upper);
                if g.dot(&d) >= 0.0 {
                    d = -masked(&g, &free);
                    drop_blocked(&mut d, &x, lower, upper);
                    if g.dot(&d) >= 0.0 {
                        converged = true;
                        break;
                    }
                }
            }

            let initial_step = if restart {
                (1.0 / d.amax()).min(1.0)
            } else {
                1.0
            };
            let mut alpha = initial_step;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let mut trial = &x + &d * alpha;
                project(&mut trial, lower, upper);
                let step = &trial - &x;
                let decrease = g.dot(&step);
                if decrease < 0.0 {
                    let f_trial = objective.value(&trial);
                    if f_trial <= f + ARMIJO_C1 * decrease {
                        accepted = Some((trial, f_trial, step));
                        break;
                    }
                }
                alpha *= 0.5;
            }

            let Some((x_new, f_new, s)) = accepted else {
                if history.is_empty() {
                    log::debug!("line search stalled after {} iterations", iterations);
                    break;
                }
                history.clear();
                continue;
            };

            let g_new = objective.gradient(&x_new);
            let y = &g_new - &g;
            let sy = s.dot(&y);
            if sy > f64::EPSILON * y.dot(&y) {
                if history.len() == self.memory {
                    history.pop_front();
                }
                history.push_back(Correction { s, y, rho: 1.0 / sy });
            }

            let reduction = f - f_new;
            let scale = f.abs().max(f_new.abs()).max(1.0);
            x = x_new;
            f = f_new;
            g = g_new;
            iterations += 1;

            if alpha < SHORT_STEP * initial_step {
                history.clear();
            } else if !restart && reduction <= self.factr * f64::EPSILON * scale {
                converged = true;
                break;
            }
        }

        Minimum {
            x,
            value: f,
            iterations,
            converged,
        }
    }
}
