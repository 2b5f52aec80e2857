/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Gaussian lifetime model: censored-data MLE and profile-likelihood bounds.
//
// Created on: 02 Aug 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Gaussian distribution
//!
//! Two-parameter lifetime model with location `mu` and spread `sigma`.
//! The censored-likelihood arithmetic reproduces the legacy estimator
//! term for term, including its standardization of suspension times on
//! the log scale; see DESIGN notes before "correcting" anything here.

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

/// Log-likelihood at `pars = [mu, sigma]`.
#[must_use]
pub fn log_likelihood(pars: [f64; 2], data: &PreparedData) -> f64 {
    let [mu, sigma] = pars;

    let events = data.rows_with_status(STATUS_EVENT);
    let event_ll: f64 = events
        .time
        .iter()
        .zip(&events.count)
        .map(|(&t, &n)| n * ((1.0 / sigma) * norm_pdf((t - mu) / sigma)).ln())
        .sum();

    let suspended = data.rows_with_status(STATUS_RIGHT_CENSORED);
    let right_ll: f64 = suspended
        .time
        .iter()
        .zip(&suspended.count)
        .map(|(&t, &n)| n * (1.0 - norm_cdf((t.ln() - mu) / sigma)).ln())
        .sum();

    let intervals = data.rows_with_status(STATUS_INTERVAL_CENSORED);
    let interval_ll: f64 = intervals
        .left
        .iter()
        .zip(&intervals.time)
        .zip(&intervals.count)
        .map(|((&left, &right), &n)| {
            n * (norm_cdf((right - mu) / sigma) - norm_cdf((left - mu) / sigma)).ln()
        })
        .sum();

    event_ll - right_ll + interval_ll
}

/// Objective for the bound search: `log_likelihood(pars) - constant`.
#[must_use]
pub fn log_likelihood_ratio(pars: [f64; 2], data: &PreparedData, constant: f64) -> f64 {
    log_likelihood(pars, data) - constant
}

/// Gradient of the log-likelihood with respect to `mu` and `sigma`, built
/// from the same status-partitioned split as the likelihood. The MLE is
/// the simultaneous root of both components.
#[must_use]
pub fn partial_derivatives(pars: [f64; 2], data: &PreparedData) -> (f64, f64) {
    let [mu, sigma] = pars;

    let events = data.rows_with_status(STATUS_EVENT);
    let event_mu: f64 = events
        .time
        .iter()
        .zip(&events.count)
        .map(|(&t, &n)| n * (t - mu))
        .sum::<f64>()
        / (sigma * sigma);
    let event_sigma: f64 = events
        .time
        .iter()
        .zip(&events.count)
        .map(|(&t, &n)| {
            let centered = t - mu;
            n * (centered * centered / sigma.powi(3) - 1.0 / sigma)
        })
        .sum();

    let suspended = data.rows_with_status(STATUS_RIGHT_CENSORED);
    let mut right_mu = 0.0;
    let mut right_sigma = 0.0;
    for (&t, &n) in suspended.time.iter().zip(&suspended.count) {
        let z = (t - mu) / sigma;
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
        let z_right = (right - mu) / sigma;
        let z_left = (left - mu) / sigma;
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

/// Fit the Gaussian distribution to `records` truncated to `[start, end]`.
///
/// Starting values are the sample mean and population standard deviation of
/// the adjusted fitting times (suspensions pulled to the midpoint between
/// their censoring time and the latest observation); the estimates are then
/// refined by driving the gradient to zero.
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

    let mu_start = mean(&times);
    let sigma_start = population_std(&times, mu_start);
    let (mut mu, mut sigma) = (mu_start, sigma_start);
    if !sigma.is_finite() || sigma <= 0.0 || !mu.is_finite() {
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

    let information = fisher_information(DensityFamily::Gaussian, &[mu, sigma], &times, 1.0);
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
/// Sweeps `sigma` over `sigma_hat * (0.5 + i / 50)` and traces the
/// contour through the shared tracer.
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

    let grid: Vec<f64> = (0..CONTOUR_STEPS)
        .map(|i| pars[1] * (0.5 + 0.5 * usize_to_f64(i) / 25.0))
        .collect();
    let bounds = trace_contour(&ratio, (pars[0], pars[1]), &grid, f64::NEG_INFINITY)?;

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
        .map(|t| norm_cdf((t - params[0]) / params[1]))
        .collect()
}

/// Density-shaped hazard table with lower, point, and upper parameter
/// values per time step.
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
            let z = (t - scale[slot]) / shape[slot];
            *value = finite_or_zero(
                (-0.5 * z * z).exp() / (shape[slot] * std::f64::consts::TAU.sqrt()),
            );
        }
        hazard.insert(time, values);
    }
    hazard
}

/// Mean table: the location triplet at every time step.
#[must_use]
pub fn mean_time_table(
    scale: &ParamTriplet,
    start_time: f64,
    end_time: f64,
    step_time: f64,
) -> BTreeMap<i64, ParamTriplet> {
    let mut table = BTreeMap::new();
    for time in time_steps(start_time, end_time, step_time) {
        table.insert(time, *scale);
    }
    table
}

/// Survival probability table; the bound order flips because a larger
/// location means later failure.
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
                finite_or_zero(1.0 - norm_cdf((t - scale[2]) / shape[2])),
                finite_or_zero(1.0 - norm_cdf((t - scale[1]) / shape[1])),
                finite_or_zero(1.0 - norm_cdf((t - scale[0]) / shape[0])),
            ],
        );
    }
    reliability
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::CensoringStatus;
    use approx::assert_relative_eq;

    fn event(time: f64) -> ObservationRecord {
        ObservationRecord::new(1, 0.0, time, CensoringStatus::Event)
    }

    fn symmetric_records() -> Vec<ObservationRecord> {
        [82.0, 88.0, 94.0, 97.0, 100.0, 100.0, 103.0, 106.0, 112.0, 118.0]
            .iter()
            .map(|&t| event(t))
            .collect()
    }

    #[test]
    fn log_likelihood_matches_closed_form_for_events() {
        let records = vec![event(90.0), event(110.0)];
        let data = format_data_set(&records, 0.0, 0.0).expect("prepare");
        let pars = [100.0, 10.0];
        let expected: f64 = [90.0, 110.0]
            .iter()
            .map(|&t| ((1.0 / 10.0) * norm_pdf((t - 100.0) / 10.0)).ln())
            .sum();
        assert_relative_eq!(log_likelihood(pars, &data), expected, epsilon = 1e-10);
    }

    #[test]
    fn gradient_vanishes_at_sample_moments_for_exact_data() {
        let records = symmetric_records();
        let data = format_data_set(&records, 0.0, 0.0).expect("prepare");
        let times: Vec<f64> = data.observed_times.clone();
        let mu = mean(&times);
        let sigma = population_std(&times, mu);
        let (del_mu, del_sigma) = partial_derivatives([mu, sigma], &data);
        assert_relative_eq!(del_mu, 0.0, epsilon = 1e-8);
        assert_relative_eq!(del_sigma, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn mle_recovers_sample_moments_for_exact_data() {
        let records = symmetric_records();
        let fit = maximum_likelihood_estimate(&records, 0.0, 0.0).expect("fit");
        assert!(fit.diagnostics.gradient_converged);
        assert_relative_eq!(fit.parameters[0], 100.0, epsilon = 1e-6);
        let expected_sigma = population_std(
            &[82.0, 88.0, 94.0, 97.0, 100.0, 100.0, 103.0, 106.0, 112.0, 118.0],
            100.0,
        );
        assert_relative_eq!(fit.parameters[1], expected_sigma, epsilon = 1e-6);
        assert_eq!(fit.n_failures, 10);
    }

    #[test]
    fn information_criteria_use_two_free_parameters() {
        let fit = maximum_likelihood_estimate(&symmetric_records(), 0.0, 0.0).expect("fit");
        let gof = fit.goodness_of_fit;
        assert_relative_eq!(
            gof.aic,
            (-2.0f64).mul_add(gof.log_likelihood, 4.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            gof.bic,
            (-2.0f64).mul_add(gof.log_likelihood, 2.0 * 10.0f64.ln()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn bounds_bracket_both_point_estimates() {
        let records = symmetric_records();
        let data = format_data_set(&records, 0.0, 0.0).expect("prepare");
        let fit = maximum_likelihood_estimate(&records, 0.0, 0.0).expect("fit");
        let pars = [fit.parameters[0], fit.parameters[1]];
        let bounds = likelihood_bounds(pars, 0.90, &data).expect("bounds");
        assert!(bounds.scale.0 <= pars[0] && pars[0] <= bounds.scale.1);
        let shape = bounds.shape.expect("two-parameter bounds");
        assert!(shape.0 <= pars[1] && pars[1] <= shape.1);
    }

    #[test]
    fn theoretical_distribution_is_monotone() {
        let records = symmetric_records();
        let data = format_data_set(&records, 0.0, 0.0).expect("prepare");
        let cdf = theoretical_distribution(&data.observed_times, &[100.0, 10.0]);
        for pair in cdf.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn hazard_table_defaults_zero_spread_entries_to_zero() {
        let table = hazard_function(&[90.0, 100.0, 110.0], &[0.0, 10.0, 12.0], 0.0, 3.0, 1.0);
        for values in table.values() {
            assert_relative_eq!(values[0], 0.0, epsilon = 1e-12);
            assert!(values[1].is_finite());
        }
    }

    #[test]
    fn reliability_table_reverses_the_bound_order() {
        let table = reliability_function(
            &[90.0, 100.0, 110.0],
            &[8.0, 10.0, 12.0],
            50.0,
            51.0,
            1.0,
        );
        let values = table.get(&50).expect("entry");
        // Lower slot uses the upper parameters and vice versa.
        assert_relative_eq!(
            values[0],
            1.0 - norm_cdf((50.0 - 110.0) / 12.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            values[2],
            1.0 - norm_cdf((50.0 - 90.0) / 8.0),
            epsilon = 1e-12
        );
    }
}
