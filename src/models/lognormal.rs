/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Lognormal lifetime model: censored-data MLE and profile-likelihood bounds.
//
// Created on: 02 Aug 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Lognormal distribution
//!
//! Two-parameter lifetime model on the log scale: `mu` is the log-median,
//! `sigma` the log spread. The suspension term accumulates the survival
//! probability itself rather than its logarithm, matching the legacy
//! estimator; see DESIGN notes.

use std::collections::BTreeMap;

use crate::inference::{DensityFamily, fisher_information, variance_from_information};
use crate::input::ObservationRecord;
use crate::models::profile::trace_contour;
use crate::models::{
    FitDiagnostics, FitError, FittedModel, ParamTriplet, ParameterBounds, adjusted_times,
    chi_square_half_quantile, finite_or_zero, goodness_of_fit, norm_cdf, norm_pdf, time_steps,
};
use crate::preprocess::{
    PreparedData, STATUS_EVENT, STATUS_INTERVAL_CENSORED, STATUS_RIGHT_CENSORED, format_data_set,
};
use crate::utils::{mean, population_std, solve_gradient_pair, usize_to_f64};

/// Guard keeping the suspension survival denominator away from zero.
const SURVIVAL_GUARD: f64 = 1.000000001;

/// Grid steps swept over `sigma` when tracing the likelihood contour.
const CONTOUR_STEPS: usize = 100;

/// Offset applied before taking logs in the plotting CDF, so a zero
/// observation time stays finite.
const PLOTTING_OFFSET: f64 = 0.01;

/// Log-likelihood at `pars = [mu, sigma]`.
#[must_use]
pub fn log_likelihood(pars: [f64; 2], data: &PreparedData) -> f64 {
    let [mu, sigma] = pars;

    let events = data.rows_with_status(STATUS_EVENT);
    let event_ll: f64 = events
        .time
        .iter()
        .zip(&events.count)
        .map(|(&t, &n)| n * ((1.0 / (t * sigma)) * norm_pdf((t.ln() - mu) / sigma)).ln())
        .sum();

    // Survival probability, not its logarithm.
    let suspended = data.rows_with_status(STATUS_RIGHT_CENSORED);
    let right_ll: f64 = suspended
        .time
        .iter()
        .zip(&suspended.count)
        .map(|(&t, &n)| n * (1.0 - norm_cdf((t.ln() - mu) / sigma)))
        .sum();

    let intervals = data.rows_with_status(STATUS_INTERVAL_CENSORED);
    let interval_ll: f64 = intervals
        .left
        .iter()
        .zip(&intervals.time)
        .zip(&intervals.count)
        .map(|((&left, &right), &n)| {
            n * (norm_cdf((right.ln() - mu) / sigma) - norm_cdf((left.ln() - mu) / sigma)).ln()
        })
        .sum();

    event_ll - right_ll + interval_ll
}

/// Objective for the bound search: `log_likelihood(pars) - constant`.
#[must_use]
pub fn log_likelihood_ratio(pars: [f64; 2], data: &PreparedData, constant: f64) -> f64 {
    log_likelihood(pars, data) - constant
}

/// Gradient of the log-likelihood with respect to `mu` and `sigma` on the
/// log-time scale.
#[must_use]
pub fn partial_derivatives(pars: [f64; 2], data: &PreparedData) -> (f64, f64) {
    let [mu, sigma] = pars;

    let events = data.rows_with_status(STATUS_EVENT);
    let event_mu: f64 = events
        .time
        .iter()
        .zip(&events.count)
        .map(|(&t, &n)| n * (t.ln() - mu))
        .sum::<f64>()
        / (sigma * sigma);
    let event_sigma: f64 = events
        .time
        .iter()
        .zip(&events.count)
        .map(|(&t, &n)| {
            let centered = t.ln() - mu;
            n * (centered * centered / sigma.powi(3) - 1.0 / sigma)
        })
        .sum();

    let suspended = data.rows_with_status(STATUS_RIGHT_CENSORED);
    let mut right_mu = 0.0;
    let mut right_sigma = 0.0;
    for (&t, &n) in suspended.time.iter().zip(&suspended.count) {
        let z = (t.ln() - mu) / sigma;
        let tail = SURVIVAL_GUARD - norm_cdf(z);
        right_mu += n * norm_pdf(z) / tail;
        right_sigma += n * z * norm_pdf(z) / tail;
    }
    right_mu /= sigma;
    right_sigma /= sigma;

    let intervals = data.rows_with_status(STATUS_INTERVAL_CENSORED);
    let mut interval_mu = 0.0;
    let mut interval_sigma = 0.0;
    for ((&left, &right), &n) in intervals
        .left
        .iter()
        .zip(&intervals.time)
        .zip(&intervals.count)
    {
        let z_right = (right.ln() - mu) / sigma;
        let z_left = (left.ln() - mu) / sigma;
        let mass = norm_cdf(z_right) - norm_cdf(z_left);
        if mass == 0.0 || !mass.is_finite() {
            continue;
        }
        interval_mu += n * (norm_pdf(z_right) - norm_pdf(z_left)) / mass;
        interval_sigma += n * (z_right * norm_pdf(z_right) - z_left * norm_pdf(z_left)) / mass;
    }
    interval_mu /= sigma;
    interval_sigma /= sigma;

    (
        event_mu + right_mu - interval_mu,
        event_sigma + right_sigma - interval_sigma,
    )
}

/// Fit the Lognormal distribution to `records` truncated to `[start, end]`.
///
/// Starting values are the mean and population standard deviation of the
/// logarithms of the adjusted fitting times, refined by driving the
/// gradient to zero.
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
    let log_times: Vec<f64> = times.iter().filter(|&&t| t > 0.0).map(|&t| t.ln()).collect();

    let mu_start = mean(&log_times);
    let sigma_start = population_std(&log_times, mu_start);
    let (mut mu, mut sigma) = (mu_start, sigma_start);
    if log_times.is_empty() || !sigma.is_finite() || sigma <= 0.0 || !mu.is_finite() {
        diagnostics.starting_values_defaulted = true;
        return Ok(zeroed_fit(&data, diagnostics));
    }

    let gradient = |m: f64, s: f64| partial_derivatives([m, s], &data);
    match solve_gradient_pair(&gradient, (mu, sigma), (f64::NEG_INFINITY, 0.0)) {
        Some((m, s)) => {
            mu = m;
            sigma = s;
            diagnostics.gradient_converged = true;
        }
        None => diagnostics.gradient_converged = false,
    }

    let information = fisher_information(DensityFamily::LogNormal, &[mu, sigma], &times, 1.0);
    let variance = variance_from_information(&information, 2);
    diagnostics.variance_defaulted = variance.degenerate;

    let gof = goodness_of_fit(log_likelihood([mu, sigma], &data), 2, data.n_records);

    Ok(FittedModel {
        parameters: vec![mu, sigma],
        variance: [variance.scale, variance.covariance, variance.shape],
        goodness_of_fit: gof,
        n_suspensions: data.n_suspensions,
        n_failures: data.n_failures,
        diagnostics,
    })
}

fn zeroed_fit(data: &PreparedData, diagnostics: FitDiagnostics) -> FittedModel {
    FittedModel {
        parameters: vec![0.0, 0.0],
        variance: [0.0, 0.0, 0.0],
        goodness_of_fit: goodness_of_fit(0.0, 2, data.n_records),
        n_suspensions: data.n_suspensions,
        n_failures: data.n_failures,
        diagnostics,
    }
}

/// Profile-likelihood confidence bounds for `mu` and `sigma`.
///
/// Sweeps `sigma` over `sigma_hat * (confidence + i * confidence / 50)`,
/// the confidence-scaled grid the legacy estimator used for this family.
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
    let ratio = |mu: f64, sigma: f64| log_likelihood_ratio([mu, sigma], data, constant);

    let step = confidence / 50.0;
    let grid: Vec<f64> = (0..CONTOUR_STEPS)
        .map(|i| pars[1] * usize_to_f64(i).mul_add(step, confidence))
        .collect();
    let bounds = trace_contour(&ratio, (pars[0], pars[1]), &grid, f64::NEG_INFINITY)?;

    Ok(ParameterBounds {
        scale: bounds.first,
        shape: Some(bounds.second),
    })
}

/// Fitted cumulative distribution at the sorted observation times, with a
/// small offset so zero times stay plottable.
#[must_use]
pub fn theoretical_distribution(times: &[f64], params: &[f64]) -> Vec<f64> {
    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
        .into_iter()
        .map(|t| norm_cdf(((t + PLOTTING_OFFSET).ln() - params[0]) / params[1]))
        .collect()
}

/// Hazard table reproducing the legacy standardization `ln t - mu / sigma`.
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
            let z = t.ln() - scale[slot] / shape[slot];
            *value = finite_or_zero(
                (-0.5 * z * z).exp() / (t * shape[slot] * std::f64::consts::TAU.sqrt()),
            );
        }
        hazard.insert(time, values);
    }
    hazard
}

/// Mean table `exp(mu + sigma^2 / 2)` per bound level.
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
            *value = finite_or_zero((0.5f64.mul_add(shape[slot] * shape[slot], scale[slot])).exp());
        }
        table.insert(time, values);
    }
    table
}

/// Survival probability table on the log-time scale; the bound order flips.
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
                finite_or_zero(1.0 - norm_cdf((t.ln() - scale[2]) / shape[2])),
                finite_or_zero(1.0 - norm_cdf((t.ln() - scale[1]) / shape[1])),
                finite_or_zero(1.0 - norm_cdf((t.ln() - scale[0]) / shape[0])),
            ],
        );
    }
    reliability
}
