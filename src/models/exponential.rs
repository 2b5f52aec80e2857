/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Exponential lifetime model: censored-data MLE and likelihood-ratio bounds.
//
// Created on: 02 Aug 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Exponential distribution
//!
//! Single-parameter lifetime model with constant hazard. The scale
//! parameter `theta` is the failure rate; the location parameter is pinned
//! at zero.

use std::collections::BTreeMap;

use crate::inference::{DensityFamily, fisher_information, variance_from_information};
use crate::input::ObservationRecord;
use crate::models::{
    FitDiagnostics, FitError, FittedModel, ParamTriplet, ParameterBounds, chi_square_half_quantile,
    finite_or_zero, goodness_of_fit, time_steps,
};
use crate::preprocess::{
    PreparedData, STATUS_EVENT, STATUS_INTERVAL_CENSORED, STATUS_RIGHT_CENSORED, format_data_set,
};
use crate::utils::{mean, newton_root, root_above, root_below, usize_to_f64};

/// Log-likelihood of the data set at failure rate `theta`.
///
/// Three additive pieces over the status-partitioned rows: the exact
/// density for events, the accumulated hazard for suspensions (entering
/// with a minus sign), and the probability mass inside each censoring
/// interval.
#[must_use]
pub fn log_likelihood(theta: f64, data: &PreparedData) -> f64 {
    let events = data.rows_with_status(STATUS_EVENT);
    let event_ll: f64 = events
        .time
        .iter()
        .zip(&events.count)
        .map(|(&t, &n)| n * (theta * (-theta * t).exp()).ln())
        .sum();

    let suspended = data.rows_with_status(STATUS_RIGHT_CENSORED);
    let right_ll: f64 = suspended
        .time
        .iter()
        .zip(&suspended.count)
        .map(|(&t, &n)| n * theta * t)
        .sum();

    let intervals = data.rows_with_status(STATUS_INTERVAL_CENSORED);
    let interval_ll: f64 = intervals
        .left
        .iter()
        .zip(&intervals.time)
        .zip(&intervals.count)
        .map(|((&left, &right), &n)| n * ((-theta * left) - (-theta * right)))
        .sum();

    event_ll - right_ll + interval_ll
}

/// Objective for the likelihood-ratio bound search:
/// `log_likelihood(theta) - constant`.
#[must_use]
pub fn log_likelihood_ratio(theta: f64, data: &PreparedData, constant: f64) -> f64 {
    log_likelihood(theta, data) - constant
}

/// Derivative of the log-likelihood with respect to `theta`. The maximum
/// likelihood estimate is the root of this function.
#[must_use]
pub fn partial_derivatives(theta: f64, data: &PreparedData) -> f64 {
    let events = data.rows_with_status(STATUS_EVENT);
    let event_term: f64 = events
        .time
        .iter()
        .zip(&events.count)
        .map(|(&t, &n)| n * (1.0 / theta - t))
        .sum();

    let suspended = data.rows_with_status(STATUS_RIGHT_CENSORED);
    let right_term: f64 = suspended
        .time
        .iter()
        .zip(&suspended.count)
        .map(|(&t, &n)| n * t)
        .sum();

    let intervals = data.rows_with_status(STATUS_INTERVAL_CENSORED);
    let interval_term: f64 = intervals
        .left
        .iter()
        .zip(&intervals.time)
        .zip(&intervals.count)
        .map(|((&left, &right), &n)| {
            let numerator =
                left * (-theta * left).exp() - right * (-theta * right).exp();
            let denominator = (-theta * left).exp() - (-theta * right).exp();
            if denominator == 0.0 || !denominator.is_finite() {
                0.0
            } else {
                n * numerator / denominator
            }
        })
        .sum();

    event_term - right_term - interval_term
}

/// Fit the Exponential distribution to `records` truncated to
/// `[start, end]`.
///
/// The starting rate comes from the uncensored moment estimator
/// `1 / (mean - min)` with `1 / mean` as the secondary fallback, and is
/// refined by root-finding the score function. Variance comes from the
/// empirical Fisher information; numeric failures in either step are
/// recovered locally and flagged in the diagnostics.
///
/// # Errors
///
/// Returns `FitError::Prepare` for an invalid truncation window and
/// `FitError::InsufficientData` when no rows survive it.
pub fn maximum_likelihood_estimate(
    records: &[ObservationRecord],
    start: f64,
    end: f64,
) -> Result<FittedModel, FitError> {
    let data = format_data_set(records, start, end)?;
    if data.is_empty() {
        return Err(FitError::InsufficientData);
    }

    let mut diagnostics = FitDiagnostics::default();
    let times = &data.observed_times;
    let sample_mean = mean(times);
    let sample_min = times.iter().copied().fold(f64::INFINITY, f64::min);

    let mut theta = {
        let spread = sample_mean - sample_min;
        let primary = 1.0 / spread;
        if primary.is_finite() && primary > 0.0 {
            primary
        } else {
            // Secondary fallback: the reciprocal of the mean time to failure.
            let fallback = 1.0 / sample_mean;
            if fallback.is_finite() && fallback > 0.0 {
                fallback
            } else {
                diagnostics.starting_values_defaulted = true;
                0.0
            }
        }
    };

    if diagnostics.starting_values_defaulted {
        return Ok(FittedModel {
            parameters: vec![0.0, 0.0],
            variance: [0.0, 0.0, 0.0],
            goodness_of_fit: goodness_of_fit(0.0, 1, data.n_records),
            n_suspensions: data.n_suspensions,
            n_failures: data.n_failures,
            diagnostics,
        });
    }

    let score = |rate: f64| partial_derivatives(rate, &data);
    match newton_root(&score, theta, 0.0) {
        Some(refined) if refined > 0.0 => {
            theta = refined;
            diagnostics.gradient_converged = true;
        }
        _ => diagnostics.gradient_converged = false,
    }

    let information = fisher_information(DensityFamily::Exponential, &[theta, 0.0], times, 1.0);
    let variance = variance_from_information(&information, 1);
    diagnostics.variance_defaulted = variance.degenerate;

    let gof = goodness_of_fit(log_likelihood(theta, &data), 1, data.n_records);

    Ok(FittedModel {
        parameters: vec![theta, 0.0],
        variance: [variance.scale, 0.0, 0.0],
        goodness_of_fit: gof,
        n_suspensions: data.n_suspensions,
        n_failures: data.n_failures,
        diagnostics,
    })
}

/// Likelihood-ratio confidence bounds for `theta`.
///
/// The bound equation is `log L(theta) = log L(theta_hat) -
/// chi2(confidence, 1) / 2`; the two roots are bracketed below and above
/// the point estimate.
///
/// # Errors
///
/// Returns `FitError::NumericDegeneracy` when either root search fails to
/// bracket a sign change.
pub fn likelihood_bounds(
    theta: f64,
    confidence: f64,
    data: &PreparedData,
) -> Result<ParameterBounds, FitError> {
    let constant = log_likelihood(theta, data) - chi_square_half_quantile(confidence);
    let ratio = |rate: f64| log_likelihood_ratio(rate, data, constant);

    let lower = root_below(&ratio, theta, 0.0).ok_or(FitError::NumericDegeneracy)?;
    let upper = root_above(&ratio, theta).ok_or(FitError::NumericDegeneracy)?;

    Ok(ParameterBounds {
        scale: (lower.min(theta), upper.max(theta)),
        shape: None,
    })
}

/// Fitted cumulative distribution evaluated at the sorted observation
/// times, for probability plotting.
#[must_use]
pub fn theoretical_distribution(times: &[f64], params: &[f64]) -> Vec<f64> {
    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
        .into_iter()
        .map(|t| 1.0 - (-params[0] * t).exp())
        .collect()
}

/// Constant hazard table over `[start_time, end_time)`.
#[must_use]
pub fn hazard_function(
    scale: &ParamTriplet,
    start_time: f64,
    end_time: f64,
    step_time: f64,
) -> BTreeMap<i64, ParamTriplet> {
    let mut hazard = BTreeMap::new();
    for time in time_steps(start_time, end_time, step_time) {
        hazard.insert(time, *scale);
    }
    hazard
}

/// Mean time to failure table; the reciprocal rate flips the bound order.
#[must_use]
pub fn mean_time_table(
    scale: &ParamTriplet,
    start_time: f64,
    end_time: f64,
    step_time: f64,
) -> BTreeMap<i64, ParamTriplet> {
    let mut table = BTreeMap::new();
    for time in time_steps(start_time, end_time, step_time) {
        table.insert(
            time,
            [
                finite_or_zero(1.0 / scale[2]),
                finite_or_zero(1.0 / scale[1]),
                finite_or_zero(1.0 / scale[0]),
            ],
        );
    }
    table
}

/// Survival probability table `R(t) = exp(-theta * t)`.
#[must_use]
pub fn reliability_function(
    scale: &ParamTriplet,
    start_time: f64,
    end_time: f64,
    step_time: f64,
) -> BTreeMap<i64, ParamTriplet> {
    let mut reliability = BTreeMap::new();
    for time in time_steps(start_time, end_time, step_time) {
        let t = usize_to_f64(usize::try_from(time).unwrap_or(0));
        reliability.insert(
            time,
            [
                finite_or_zero((-scale[0] * t).exp()),
                finite_or_zero((-scale[1] * t).exp()),
                finite_or_zero((-scale[2] * t).exp()),
            ],
        );
    }
    reliability
}
