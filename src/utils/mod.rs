/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Shared numerical utilities: root finding, least-squares parabola fits, and
// summary statistics for the distribution estimators.
//
// Created on: 02 Aug 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities
//!
//! Scalar and two-dimensional root finding, quadratic curve fitting, and the
//! small statistics helpers shared by the distribution models.

use faer::Mat;
use faer::prelude::Solve;

use crate::models::FitError;

/// Maximum Newton iterations for scalar and gradient root searches.
const MAX_ITER: usize = 100;

/// Convergence tolerance for Newton steps.
const TOL: f64 = 1e-10;

/// Relative step for numerical derivatives.
const DERIVATIVE_STEP: f64 = 1e-6;

/// Bracket expansions attempted before giving up on a root search.
const MAX_EXPANSIONS: usize = 40;

/// Bisection iterations once a sign change is bracketed.
const BISECT_ITERATIONS: usize = 200;

#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / usize_to_f64(values.len())
}

/// Population (maximum likelihood) standard deviation.
#[must_use]
pub fn population_std(values: &[f64], center: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - center) * (v - center)).sum();
    (sum_sq / usize_to_f64(values.len())).sqrt()
}

/// # Errors
///
/// Returns `FitError::SolveFailed` if the solve produces non-finite values.
pub fn solve_linear_system(a: &Mat<f64>, b: &Mat<f64>) -> Result<Mat<f64>, FitError> {
    let rhs = b.clone();
    let lu = a.full_piv_lu();
    let solution = lu.solve(rhs);
    for i in 0..solution.nrows() {
        for j in 0..solution.ncols() {
            if !solution[(i, j)].is_finite() {
                return Err(FitError::SolveFailed);
            }
        }
    }
    Ok(solution)
}

/// Newton-Raphson root of a scalar function with a numerical derivative.
///
/// Iterates from `start`, resetting onto `floor` whenever a step escapes the
/// admissible region. Returns `None` when the derivative degenerates or the
/// iteration fails to converge.
#[must_use]
pub fn newton_root(f: &dyn Fn(f64) -> f64, start: f64, floor: f64) -> Option<f64> {
    let mut x = start;
    for _ in 0..MAX_ITER {
        let h = DERIVATIVE_STEP * x.abs().max(1.0);
        let f_x = f(x);
        if !f_x.is_finite() {
            return None;
        }
        let derivative = (f(x + h) - f(x - h)) / (2.0 * h);
        if !derivative.is_finite() || derivative.abs() < 1e-30 {
            return None;
        }
        let delta = f_x / derivative;
        x -= delta;
        if x <= floor {
            x = floor + (start - floor).abs() * 0.01;
        }
        if delta.abs() < TOL * x.abs().max(1.0) {
            return Some(x);
        }
    }
    None
}

fn bisect(f: &dyn Fn(f64) -> f64, bracket_low: f64, bracket_high: f64) -> Option<f64> {
    // Invariant: f(bracket_low) <= 0 < f(bracket_high) or the reverse.
    let f_low = f(bracket_low);
    let f_high = f(bracket_high);
    let (mut neg, mut pos) = if f_low <= 0.0 && f_high > 0.0 {
        (bracket_low, bracket_high)
    } else if f_high <= 0.0 && f_low > 0.0 {
        (bracket_high, bracket_low)
    } else {
        return None;
    };
    for _ in 0..BISECT_ITERATIONS {
        let mid = 0.5 * (neg + pos);
        let f_mid = f(mid);
        if f_mid.is_nan() {
            return None;
        }
        if f_mid <= 0.0 {
            neg = mid;
        } else {
            pos = mid;
        }
        if (pos - neg).abs() <= 1e-12 * (1.0 + pos.abs()) {
            break;
        }
    }
    Some(0.5 * (neg + pos))
}

/// Root of `f` strictly below `point`, assuming `f(point) >= 0` and `f`
/// eventually negative toward `floor`. The probe descends multiplicatively
/// for non-negative floors (positive scale parameters) and linearly
/// otherwise, then bisects once a sign change is bracketed.
#[must_use]
pub fn root_below(f: &dyn Fn(f64) -> f64, point: f64, floor: f64) -> Option<f64> {
    let f_point = f(point);
    if f_point.is_nan() || f_point < 0.0 {
        return None;
    }
    let mut low = if floor >= 0.0 {
        (point / 10.0).max(floor)
    } else {
        point - point.abs().max(1.0)
    };
    for _ in 0..MAX_EXPANSIONS {
        let f_low = f(low);
        if f_low <= 0.0 {
            return bisect(f, low, point);
        }
        low = if floor >= 0.0 {
            low / 10.0
        } else {
            point - 2.0 * (point - low)
        };
        if low <= floor {
            return None;
        }
    }
    None
}

/// Root of `f` strictly above `point`, assuming `f(point) >= 0` and `f`
/// eventually negative for large arguments.
#[must_use]
pub fn root_above(f: &dyn Fn(f64) -> f64, point: f64) -> Option<f64> {
    let f_point = f(point);
    if f_point.is_nan() || f_point < 0.0 {
        return None;
    }
    let mut high = point + point.abs().max(1.0);
    for _ in 0..MAX_EXPANSIONS {
        let f_high = f(high);
        if f_high <= 0.0 {
            return bisect(f, point, high);
        }
        high = point + 2.0 * (high - point);
        if !high.is_finite() {
            return None;
        }
    }
    None
}

/// Simultaneous root of a two-component gradient via a damped Newton
/// iteration with a finite-difference Jacobian.
///
/// Steps are halved until they improve the gradient norm and respect the
/// per-component floors. Returns `None` when the Jacobian degenerates or the
/// iteration stalls.
#[must_use]
pub fn solve_gradient_pair(
    gradient: &dyn Fn(f64, f64) -> (f64, f64),
    start: (f64, f64),
    floors: (f64, f64),
) -> Option<(f64, f64)> {
    let (mut x, mut y) = start;
    for _ in 0..MAX_ITER {
        let (g0, g1) = gradient(x, y);
        if !g0.is_finite() || !g1.is_finite() {
            return None;
        }
        let norm = g0.hypot(g1);
        if norm < 1e-8 {
            return Some((x, y));
        }

        let hx = DERIVATIVE_STEP * x.abs().max(1.0);
        let hy = DERIVATIVE_STEP * y.abs().max(1.0);
        let (gx_p0, gx_p1) = gradient(x + hx, y);
        let (gx_m0, gx_m1) = gradient(x - hx, y);
        let (gy_p0, gy_p1) = gradient(x, y + hy);
        let (gy_m0, gy_m1) = gradient(x, y - hy);

        let jacobian = Mat::from_fn(2, 2, |i, j| match (i, j) {
            (0, 0) => (gx_p0 - gx_m0) / (2.0 * hx),
            (0, 1) => (gy_p0 - gy_m0) / (2.0 * hy),
            (1, 0) => (gx_p1 - gx_m1) / (2.0 * hx),
            _ => (gy_p1 - gy_m1) / (2.0 * hy),
        });
        let rhs = Mat::from_fn(2, 1, |i, _| if i == 0 { g0 } else { g1 });
        let step = solve_linear_system(&jacobian, &rhs).ok()?;

        let mut scale = 1.0;
        let mut accepted = false;
        for _ in 0..20 {
            let cand_x = x - scale * step[(0, 0)];
            let cand_y = y - scale * step[(1, 0)];
            if cand_x <= floors.0 || cand_y <= floors.1 {
                scale *= 0.5;
                continue;
            }
            let (c0, c1) = gradient(cand_x, cand_y);
            if c0.is_finite() && c1.is_finite() && c0.hypot(c1) < norm {
                x = cand_x;
                y = cand_y;
                accepted = true;
                break;
            }
            scale *= 0.5;
        }
        if !accepted {
            return None;
        }
        let step_size = (scale * step[(0, 0)]).hypot(scale * step[(1, 0)]);
        if step_size < TOL * (1.0 + x.abs() + y.abs()) {
            return Some((x, y));
        }
    }
    None
}

/// Least-squares fit of `y = a*x^2 + b*x + c`, returning `[a, b, c]`.
#[must_use]
pub fn fit_parabola(xs: &[f64], ys: &[f64]) -> Option<[f64; 3]> {
    if xs.len() != ys.len() || xs.len() < 3 {
        return None;
    }
    let design = Mat::from_fn(xs.len(), 3, |i, j| match j {
        0 => xs[i] * xs[i],
        1 => xs[i],
        _ => 1.0,
    });
    let response = Mat::from_fn(ys.len(), 1, |i, _| ys[i]);
    let normal = design.transpose() * &design;
    let moment = design.transpose() * &response;
    let coefficients = solve_linear_system(&normal, &moment).ok()?;
    Some([
        coefficients[(0, 0)],
        coefficients[(1, 0)],
        coefficients[(2, 0)],
    ])
}

/// Real roots of `a*x^2 + b*x + c = 0`, sorted ascending.
#[must_use]
pub fn quadratic_roots(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    if a.abs() < 1e-30 {
        if b.abs() < 1e-30 {
            return None;
        }
        let root = -c / b;
        return Some((root, root));
    }
    let discriminant = b.mul_add(b, -4.0 * a * c);
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_disc = discriminant.sqrt();
    let first = (-b - sqrt_disc) / (2.0 * a);
    let second = (-b + sqrt_disc) / (2.0 * a);
    if first <= second {
        Some((first, second))
    } else {
        Some((second, first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn newton_root_solves_a_cubic() {
        let f = |x: f64| x * x * x - 8.0;
        let root = newton_root(&f, 1.0, 0.0).expect("newton should converge");
        assert_relative_eq!(root, 2.0, epsilon = 1e-8);
    }

    #[test]
    fn newton_root_rejects_flat_functions() {
        let f = |_: f64| 1.0;
        assert!(newton_root(&f, 1.0, 0.0).is_none());
    }

    #[test]
    fn root_below_and_above_bracket_a_parabola() {
        // f(x) = 4 - (x - 3)^2 has roots at 1 and 5 with f(3) = 4 > 0.
        let f = |x: f64| 4.0 - (x - 3.0) * (x - 3.0);
        let lower = root_below(&f, 3.0, 0.0).expect("lower root");
        let upper = root_above(&f, 3.0).expect("upper root");
        assert_relative_eq!(lower, 1.0, epsilon = 1e-8);
        assert_relative_eq!(upper, 5.0, epsilon = 1e-8);
    }

    #[test]
    fn root_below_requires_nonnegative_start_value() {
        let f = |x: f64| -1.0 - x * x;
        assert!(root_below(&f, 2.0, 0.0).is_none());
    }

    #[test]
    fn solve_gradient_pair_finds_a_quadratic_minimum() {
        // Gradient of (x - 2)^2 + 2*(y - 5)^2.
        let gradient = |x: f64, y: f64| (2.0 * (x - 2.0), 4.0 * (y - 5.0));
        let (x, y) = solve_gradient_pair(&gradient, (1.0, 1.0), (f64::NEG_INFINITY, 0.0))
            .expect("newton should converge");
        assert_relative_eq!(x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(y, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn fit_parabola_recovers_exact_coefficients() {
        let xs: Vec<f64> = (0..6).map(usize_to_f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x * x - 3.0 * x + 1.5).collect();
        let [a, b, c] = fit_parabola(&xs, &ys).expect("fit");
        assert_relative_eq!(a, 2.0, epsilon = 1e-8);
        assert_relative_eq!(b, -3.0, epsilon = 1e-8);
        assert_relative_eq!(c, 1.5, epsilon = 1e-8);
    }

    #[test]
    fn fit_parabola_rejects_underdetermined_input() {
        assert!(fit_parabola(&[1.0, 2.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn quadratic_roots_are_sorted() {
        let (low, high) = quadratic_roots(1.0, -3.0, 2.0).expect("roots");
        assert_relative_eq!(low, 1.0, epsilon = 1e-12);
        assert_relative_eq!(high, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn quadratic_roots_rejects_negative_discriminant() {
        assert!(quadratic_roots(1.0, 0.0, 1.0).is_none());
    }

    #[test]
    fn population_std_matches_hand_computation() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let center = mean(&values);
        assert_relative_eq!(center, 5.0, epsilon = 1e-12);
        assert_relative_eq!(population_std(&values, center), 2.0, epsilon = 1e-12);
    }
}
