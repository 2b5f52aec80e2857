/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Profile-likelihood contour tracer shared by the two-parameter families.
//
// Created on: 02 Aug 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Profile-likelihood contour tracing
//!
//! Confidence bounds for a two-parameter family come from the contour where
//! the log-likelihood has dropped `chi2(confidence, 1) / 2` below its
//! maximum. The contour is only locally well behaved, so a naive
//! simultaneous root search for both parameters is ill-conditioned. The
//! tracer instead sweeps a grid of the second parameter, root-finds the
//! first parameter from a starting point below and above the estimate to
//! obtain the two branches of the contour, locates the grid values where
//! the branches meet (the tangency points of the contour), fits a parabola
//! to each branch restricted to that region, and intersects the two
//! parabolas to recover the second parameter's bounds. The first
//! parameter's bounds are the extreme branch values inside the same region.

use crate::models::FitError;
use crate::utils::{fit_parabola, quadratic_roots, root_above, root_below};

/// Tolerance at which the lower and upper branches are considered to meet.
const BRANCH_MEETING_TOLERANCE: f64 = 1.0e-6;

/// Bounds recovered from one traced contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ProfileBounds {
    /// `(lower, upper)` for the profiled (first) parameter.
    pub first: (f64, f64),
    /// `(lower, upper)` for the swept (second) parameter.
    pub second: (f64, f64),
}

/// Trace the likelihood-ratio contour of `ratio` around `estimate`.
///
/// `ratio(first, second)` must be the log-likelihood ratio already shifted
/// by the chi-square constant, so it is positive inside the confidence
/// region and negative outside. `grid` supplies the second-parameter sweep
/// and `first_floor` the admissible lower limit of the first parameter
/// (zero for scale parameters, unbounded for means).
///
/// # Errors
///
/// Returns `FitError::NumericDegeneracy` when too few grid points produce
/// roots on both branches for the parabola fits to be determined.
pub(crate) fn trace_contour(
    ratio: &dyn Fn(f64, f64) -> f64,
    estimate: (f64, f64),
    grid: &[f64],
    first_floor: f64,
) -> Result<ProfileBounds, FitError> {
    let mut lower_branch: Vec<(f64, f64)> = Vec::with_capacity(grid.len());
    let mut upper_branch: Vec<(f64, f64)> = Vec::with_capacity(grid.len());

    for &second in grid {
        let slice = |first: f64| ratio(first, second);
        if let Some(root) = root_below(&slice, estimate.0, first_floor) {
            lower_branch.push((second, root));
        }
        if let Some(root) = root_above(&slice, estimate.0) {
            upper_branch.push((second, root));
        }
    }

    if lower_branch.len() < 3 || upper_branch.len() < 3 {
        return Err(FitError::NumericDegeneracy);
    }

    let (meet_low, meet_high) = branch_meeting_keys(&lower_branch, &upper_branch, estimate.1)
        .ok_or(FitError::NumericDegeneracy)?;

    let kept_lower: Vec<(f64, f64)> = lower_branch
        .iter()
        .copied()
        .filter(|(key, _)| *key >= meet_low && *key <= meet_high)
        .collect();
    let kept_upper: Vec<(f64, f64)> = upper_branch
        .iter()
        .copied()
        .filter(|(key, _)| *key >= meet_low && *key <= meet_high)
        .collect();
    if kept_lower.len() < 3 || kept_upper.len() < 3 {
        return Err(FitError::NumericDegeneracy);
    }

    let first_lower = kept_lower
        .iter()
        .map(|(_, value)| *value)
        .fold(f64::INFINITY, f64::min);
    let first_upper = kept_upper
        .iter()
        .map(|(_, value)| *value)
        .fold(f64::NEG_INFINITY, f64::max);

    let second_bounds =
        parabola_intersection(&kept_lower, &kept_upper).unwrap_or((meet_low, meet_high));

    Ok(ProfileBounds {
        first: (first_lower.min(estimate.0), first_upper.max(estimate.0)),
        second: (
            second_bounds.0.min(estimate.1),
            second_bounds.1.max(estimate.1),
        ),
    })
}

/// Grid keys at which the two branches meet.
///
/// The branches meet where the lower and upper roots coincide at the same
/// grid value, which happens at the two tangency points of the contour.
/// Keys whose branch gap is below the meeting tolerance are taken directly;
/// a discrete grid rarely lands exactly on a tangency, so otherwise the
/// key with the smallest gap on each side of the estimate stands in.
fn branch_meeting_keys(
    lower: &[(f64, f64)],
    upper: &[(f64, f64)],
    estimate_second: f64,
) -> Option<(f64, f64)> {
    let mut gaps: Vec<(f64, f64)> = Vec::new();
    for (key_low, value_low) in lower {
        for (key_up, value_up) in upper {
            if key_low.to_bits() == key_up.to_bits() {
                gaps.push((*key_low, (value_up - value_low).abs()));
            }
        }
    }
    if gaps.len() < 2 {
        return None;
    }

    let meeting: Vec<f64> = gaps
        .iter()
        .filter(|(_, gap)| *gap < BRANCH_MEETING_TOLERANCE)
        .map(|(key, _)| *key)
        .collect();
    if meeting.len() >= 2 {
        let low = meeting.iter().copied().fold(f64::INFINITY, f64::min);
        let high = meeting.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if low < high {
            return Some((low, high));
        }
    }

    let below = gaps
        .iter()
        .filter(|(key, _)| *key <= estimate_second)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(gaps[0].0, |(key, _)| *key);
    let above = gaps
        .iter()
        .filter(|(key, _)| *key > estimate_second)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(gaps[gaps.len() - 1].0, |(key, _)| *key);

    if below < above {
        Some((below, above))
    } else {
        Some((gaps[0].0, gaps[gaps.len() - 1].0))
    }
}

/// Second-parameter values where the branch parabolas intersect: the real
/// roots of the quadratic difference between the upper and lower fits.
fn parabola_intersection(lower: &[(f64, f64)], upper: &[(f64, f64)]) -> Option<(f64, f64)> {
    let (lower_keys, lower_values): (Vec<f64>, Vec<f64>) = lower.iter().copied().unzip();
    let (upper_keys, upper_values): (Vec<f64>, Vec<f64>) = upper.iter().copied().unzip();

    let fit_lower = fit_parabola(&lower_keys, &lower_values)?;
    let fit_upper = fit_parabola(&upper_keys, &upper_values)?;

    quadratic_roots(
        fit_upper[0] - fit_lower[0],
        fit_upper[1] - fit_lower[1],
        fit_upper[2] - fit_lower[2],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::usize_to_f64;

    // An elliptical ratio surface with a known confidence region:
    // ratio = 1 - ((x - 10)/4)^2 - ((y - 2)/0.5)^2, positive inside the
    // ellipse centered at (10, 2) with semi-axes 4 and 0.5.
    fn elliptical_ratio(first: f64, second: f64) -> f64 {
        let dx = (first - 10.0) / 4.0;
        let dy = (second - 2.0) / 0.5;
        1.0 - dx * dx - dy * dy
    }

    #[test]
    fn tracer_recovers_elliptical_bounds() {
        let grid: Vec<f64> = (0..100).map(|i| 0.02f64.mul_add(usize_to_f64(i), 1.0)).collect();
        let bounds = trace_contour(&elliptical_ratio, (10.0, 2.0), &grid, 0.0)
            .expect("contour should close");

        // First-parameter extremes approach 10 +/- 4, second 2 +/- 0.5.
        assert!(bounds.first.0 < 7.0 && bounds.first.0 > 5.5);
        assert!(bounds.first.1 > 13.0 && bounds.first.1 < 14.5);
        assert!(bounds.second.0 < 2.0 && bounds.second.0 > 1.2);
        assert!(bounds.second.1 > 2.0 && bounds.second.1 < 2.8);
    }

    #[test]
    fn tracer_orders_bounds_around_the_estimate() {
        let grid: Vec<f64> = (0..60)
            .map(|i| 1.0 + usize_to_f64(i) / 30.0)
            .collect();
        let bounds = trace_contour(&elliptical_ratio, (10.0, 2.0), &grid, 0.0).expect("contour");
        assert!(bounds.first.0 <= 10.0 && 10.0 <= bounds.first.1);
        assert!(bounds.second.0 <= 2.0 && 2.0 <= bounds.second.1);
    }

    #[test]
    fn tracer_rejects_a_grid_outside_the_contour() {
        // Every grid value is far from the ellipse; no roots exist.
        let grid = vec![10.0, 11.0, 12.0, 13.0];
        let err = trace_contour(&elliptical_ratio, (10.0, 2.0), &grid, 0.0)
            .expect_err("no contour to trace");
        assert!(matches!(err, FitError::NumericDegeneracy));
    }

    #[test]
    fn meeting_keys_span_both_sides_of_the_estimate() {
        // Symmetric branches over a shared grid, closest at the ends.
        let keys = [1.6, 1.8, 2.0, 2.2, 2.4];
        let lower: Vec<(f64, f64)> = keys
            .iter()
            .map(|&k| (k, 10.0 - 4.0 * gap_profile(k)))
            .collect();
        let upper: Vec<(f64, f64)> = keys
            .iter()
            .map(|&k| (k, 10.0 + 4.0 * gap_profile(k)))
            .collect();
        let (low, high) = branch_meeting_keys(&lower, &upper, 2.0).expect("meeting keys");
        assert!(low <= 1.6 + 1e-12);
        assert!(high >= 2.4 - 1e-12);
    }

    fn gap_profile(key: f64) -> f64 {
        let dy = (key - 2.0) / 0.5;
        (1.0 - dy * dy).max(0.0).sqrt()
    }
}
