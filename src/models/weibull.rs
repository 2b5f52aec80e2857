/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Weibull lifetime model: censored-data MLE and profile-likelihood bounds.
//
// Created on: 02 Aug 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Weibull distribution
//!
//! Two-parameter lifetime model with characteristic life `eta` and shape
//! `beta`. Starting values come from the uncensored profile-likelihood
//! equation solved by Newton-Raphson; the censored gradient then refines
//! both parameters simultaneously.

use std::collections::BTreeMap;

use statrs::function::gamma::gamma;

use crate::inference::{DensityFamily, fisher_information, variance_from_information};
use crate::input::ObservationRecord;
use crate::models::profile::trace_contour;
use crate::models::{
    FitDiagnostics, FitError, FittedModel, ParamTriplet, ParameterBounds, adjusted_times,
    chi_square_half_quantile, finite_or_zero, goodness_of_fit, time_steps,
};
use crate::preprocess::{
    PreparedData, STATUS_EVENT, STATUS_INTERVAL_CENSORED, STATUS_RIGHT_CENSORED, format_data_set,
};
use crate::utils::{solve_gradient_pair, usize_to_f64};

/// Offset keeping the interval-censored gradient terms away from a zero
/// base before exponentiation.
const INTERVAL_OFFSET: f64 = 0.000001;

/// Grid steps swept over `beta` when tracing the likelihood contour.
const CONTOUR_STEPS: usize = 200;

/// Newton iterations for the uncensored profile-likelihood equation.
const PROFILE_MAX_ITER: usize = 100;

/// Newton convergence tolerance for the profile equation.
const PROFILE_TOL: f64 = 1e-10;

/// Log-likelihood at `pars = [eta, beta]`.
#[must_use]
pub fn log_likelihood(pars: [f64; 2], data: &PreparedData) -> f64 {
    let [eta, beta] = pars;

    let events = data.rows_with_status(STATUS_EVENT);
    let event_ll: f64 = events
        .time
        .iter()
        .zip(&events.count)
        .map(|(&t, &n)| {
            let ratio = t / eta;
            n * ((beta / eta) * ratio.powf(beta - 1.0) * (-ratio.powf(beta)).exp()).ln()
        })
        .sum();

    let suspended = data.rows_with_status(STATUS_RIGHT_CENSORED);
    let right_ll: f64 = suspended
        .time
        .iter()
        .zip(&suspended.count)
        .map(|(&t, &n)| n * (t / eta).powf(beta))
        .sum();

    let intervals = data.rows_with_status(STATUS_INTERVAL_CENSORED);
    let interval_ll: f64 = intervals
        .left
        .iter()
        .zip(&intervals.time)
        .zip(&intervals.count)
        .map(|((&left, &right), &n)| {
            n * ((-(left / eta).powf(beta)).exp() - (-(right / eta).powf(beta)).exp()).ln()
        })
        .sum();

    event_ll - right_ll + interval_ll
}

/// Objective for the bound search: `log_likelihood(pars) - constant`.
#[must_use]
pub fn log_likelihood_ratio(pars: [f64; 2], data: &PreparedData, constant: f64) -> f64 {
    log_likelihood(pars, data) - constant
}

/// Gradient of the log-likelihood with respect to `eta` and `beta`,
/// returned in that order. The MLE is the simultaneous root.
#[must_use]
pub fn partial_derivatives(pars: [f64; 2], data: &PreparedData) -> (f64, f64) {
    let [eta, beta] = pars;

    let events = data.rows_with_status(STATUS_EVENT);
    let mut event_count = 0.0;
    let mut event_beta = 0.0;
    let mut event_eta_sum = 0.0;
    for (&t, &n) in events.time.iter().zip(&events.count) {
        let ratio = t / eta;
        event_count += n;
        event_beta += n * ratio.ln() - n * ratio.powf(beta) * ratio.ln();
        event_eta_sum += n * ratio.powf(beta);
    }
    event_beta += event_count / beta;
    let event_eta = (-beta / eta) * event_count + (beta / eta) * event_eta_sum;

    let suspended = data.rows_with_status(STATUS_RIGHT_CENSORED);
    let mut right_beta = 0.0;
    let mut right_eta_sum = 0.0;
    for (&t, &n) in suspended.time.iter().zip(&suspended.count) {
        let ratio = t / eta;
        right_beta += n * ratio.powf(beta) * ratio.ln();
        right_eta_sum += n * ratio.powf(beta);
    }
    let right_eta = (beta / eta) * right_eta_sum;

    let intervals = data.rows_with_status(STATUS_INTERVAL_CENSORED);
    let mut interval_beta = 0.0;
    let mut interval_eta = 0.0;
    for ((&left, &right), &n) in intervals
        .left
        .iter()
        .zip(&intervals.time)
        .zip(&intervals.count)
    {
        let base_right = (right / eta + INTERVAL_OFFSET).powf(beta);
        let exp_right = (-base_right).exp();
        let base_left = (left / eta + INTERVAL_OFFSET).powf(beta);
        let exp_left = (-base_left).exp();
        let denominator = exp_left - exp_right;
        if denominator == 0.0 || !denominator.is_finite() {
            continue;
        }
        let beta_numerator = (-base_left * base_left.ln()).mul_add(exp_left, base_right * base_right.ln() * exp_right);
        interval_beta += n * beta_numerator / denominator;
        let eta_numerator = (beta / eta) * base_left * exp_left - (beta / eta) * base_right * exp_right;
        interval_eta += n * eta_numerator / denominator;
    }

    (
        event_eta + right_eta + interval_eta,
        event_beta - right_beta + interval_beta,
    )
}

/// Uncensored profile-likelihood starting estimate.
///
/// Solves `n/beta + sum(ln t) - n * S1/S0 = 0` by Newton-Raphson, where
/// `S0 = sum(t^beta)` and `S1 = sum(t^beta ln t)`, then recovers `eta`
/// from the closed form `(S0 / n)^(1/beta)`.
fn starting_estimate(times: &[f64]) -> Option<(f64, f64)> {
    let n = times.len();
    if n < 2 || !times.iter().all(|&t| t.is_finite() && t > 0.0) {
        return None;
    }
    let ln_t: Vec<f64> = times.iter().map(|t| t.ln()).collect();
    let sum_ln_t: f64 = ln_t.iter().sum();
    let n_f = usize_to_f64(n);

    let mut beta = 1.2f64;
    for _ in 0..PROFILE_MAX_ITER {
        let mut s0 = 0.0;
        let mut s1 = 0.0;
        let mut s2 = 0.0;
        for (&t, &lt) in times.iter().zip(&ln_t) {
            let t_beta = t.powf(beta);
            s0 += t_beta;
            s1 += t_beta * lt;
            s2 += t_beta * lt * lt;
        }
        if s0 == 0.0 {
            return None;
        }
        let value = n_f / beta + sum_ln_t - n_f * s1 / s0;
        let slope = -n_f / (beta * beta) - n_f * (s2 * s0 - s1 * s1) / (s0 * s0);
        if slope.abs() < 1e-30 {
            return None;
        }
        let delta = value / slope;
        beta -= delta;
        if beta <= 0.0 {
            beta = 0.01;
        }
        if delta.abs() < PROFILE_TOL {
            let s0: f64 = times.iter().map(|t| t.powf(beta)).sum();
            let eta = (s0 / n_f).powf(1.0 / beta);
            if eta.is_finite() && eta > 0.0 {
                return Some((eta, beta));
            }
            return None;
        }
    }
    None
}

/// Fit the Weibull distribution to `records` truncated to `[start, end]`.
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
    let times = adjusted_times(&data);

    let Some((mut eta, mut beta)) = starting_estimate(&times) else {
        diagnostics.starting_values_defaulted = true;
        return Ok(FittedModel {
            parameters: vec![0.0, 0.0, 0.0],
            variance: [0.0, 0.0, 0.0],
            goodness_of_fit: goodness_of_fit(0.0, 2, data.n_records),
            n_suspensions: data.n_suspensions,
            n_failures: data.n_failures,
            diagnostics,
        });
    };

    let gradient = |e: f64, b: f64| partial_derivatives([e, b], &data);
    match solve_gradient_pair(&gradient, (eta, beta), (0.0, 0.0)) {
        Some((e, b)) => {
            eta = e;
            beta = b;
            diagnostics.gradient_converged = true;
        }
        None => diagnostics.gradient_converged = false,
    }

    let information = fisher_information(DensityFamily::Weibull, &[eta, beta], &times, 1.0);
    let variance = variance_from_information(&information, 2);
    diagnostics.variance_defaulted = variance.degenerate;

    let gof = goodness_of_fit(log_likelihood([eta, beta], &data), 2, data.n_records);

    Ok(FittedModel {
        parameters: vec![eta, beta, 0.0],
        variance: [variance.scale, variance.shape, variance.covariance],
        goodness_of_fit: gof,
        n_suspensions: data.n_suspensions,
        n_failures: data.n_failures,
        diagnostics,
    })
}

/// Profile-likelihood confidence bounds for `eta` and `beta`.
///
/// Sweeps `beta` over `beta_hat * (0.5 .. 2.0)` and traces the contour
/// through the shared tracer.
///
/// # Errors
///
/// Returns `FitError::NumericDegeneracy` when the contour cannot be traced
/// at the requested confidence.
pub fn likelihood_bounds(
    pars: [f64; 2],
    confidence: f64,
    data: &PreparedData,
) -> Result<ParameterBounds, FitError> {
    let constant = log_likelihood(pars, data) - chi_square_half_quantile(confidence);
    let ratio = |eta: f64, beta: f64| log_likelihood_ratio([eta, beta], data, constant);

    let grid: Vec<f64> = (0..CONTOUR_STEPS)
        .map(|i| pars[1] * 1.5f64.mul_add(usize_to_f64(i) / usize_to_f64(CONTOUR_STEPS), 0.5))
        .collect();
    let bounds = trace_contour(&ratio, (pars[0], pars[1]), &grid, 0.0)?;

    Ok(ParameterBounds {
        scale: bounds.first,
        shape: Some(bounds.second),
    })
}

/// Fitted cumulative distribution at the sorted observation times.
#[must_use]
pub fn theoretical_distribution(times: &[f64], params: &[f64]) -> Vec<f64> {
    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
        .into_iter()
        .map(|t| 1.0 - (-(t / params[0]).powf(params[1])).exp())
        .collect()
}

/// Hazard table `(beta/eta) * (t/eta)^(beta-1)` per bound level.
#[must_use]
pub fn hazard_function(
    scale: &ParamTriplet,
    shape: &ParamTriplet,
    start_time: f64,
    end_time: f64,
    step_time: f64,
) -> BTreeMap<i64, ParamTriplet> {
    let mut hazard = BTreeMap::new();
    for time in time_steps(start_time, end_time, step_time) {
        let t = usize_to_f64(usize::try_from(time).unwrap_or(0));
        let mut values = [0.0; 3];
        for (slot, value) in values.iter_mut().enumerate() {
            *value = finite_or_zero(
                (shape[slot] / scale[slot]) * (t / scale[slot]).powf(shape[slot] - 1.0),
            );
        }
        hazard.insert(time, values);
    }
    hazard
}

/// Mean table `eta * gamma(1/beta + 1)` per bound level.
#[must_use]
pub fn mean_time_table(
    scale: &ParamTriplet,
    shape: &ParamTriplet,
    start_time: f64,
    end_time: f64,
    step_time: f64,
) -> BTreeMap<i64, ParamTriplet> {
    let mut table = BTreeMap::new();
    for time in time_steps(start_time, end_time, step_time) {
        let mut values = [0.0; 3];
        for (slot, value) in values.iter_mut().enumerate() {
            *value = finite_or_zero(scale[slot] * gamma(1.0 / shape[slot] + 1.0));
        }
        table.insert(time, values);
    }
    table
}

/// Survival probability table; the bound order flips because a larger
/// characteristic life means later failure.
#[must_use]
pub fn reliability_function(
    scale: &ParamTriplet,
    shape: &ParamTriplet,
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
                finite_or_zero((-(t / scale[2]).powf(shape[2])).exp()),
                finite_or_zero((-(t / scale[1]).powf(shape[1])).exp()),
                finite_or_zero((-(t / scale[0]).powf(shape[0])).exp()),
            ],
        );
    }
    reliability
}
