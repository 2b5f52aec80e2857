//! # Models
//!
//! Distribution models for censored failure-time data: Exponential,
//! Gaussian, Lognormal, and Weibull maximum likelihood estimation,
//! profile-likelihood confidence bounds, and time-indexed
//! hazard/mean/reliability tables, plus a comparison workflow ranking the
//! candidate families.

pub mod comparison;
pub mod exponential;
pub mod gaussian;
pub mod lognormal;
mod profile;
pub mod weibull;

use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::function::erf::erf;
use thiserror::Error;

use crate::preprocess::{PrepareError, PreparedData, STATUS_RIGHT_CENSORED};
use crate::utils::usize_to_f64;

/// Lower, point, and upper values of one parameter, in that order.
pub type ParamTriplet = [f64; 3];

/// Errors returned by the fitting and bound-estimation routines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("invalid data preparation: {0}")]
    Prepare(#[from] PrepareError),
    #[error("no observations remain after truncation")]
    InsufficientData,
    #[error("linear solve failed")]
    SolveFailed,
    #[error("profile likelihood contour could not be traced")]
    NumericDegeneracy,
}

/// Log-likelihood and the information criteria derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoodnessOfFit {
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
}

/// Per-fit indicators for numeric failures that were recovered locally
/// rather than propagated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitDiagnostics {
    /// False when the gradient refinement stalled and the starting values
    /// were kept.
    pub gradient_converged: bool,
    /// True when a singular information matrix forced zero variances.
    pub variance_defaulted: bool,
    /// True when the closed-form starting estimator failed and the
    /// parameters were defaulted.
    pub starting_values_defaulted: bool,
}

/// Output of a distribution's maximum likelihood fit. Created fresh on
/// every call; nothing is cached between fits.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    /// Point estimates in the family's parameter order (scale first).
    pub parameters: Vec<f64>,
    /// Variances in the family's slot convention (see DESIGN notes).
    pub variance: [f64; 3],
    pub goodness_of_fit: GoodnessOfFit,
    pub n_suspensions: usize,
    pub n_failures: usize,
    pub diagnostics: FitDiagnostics,
}

impl FittedModel {
    /// Scale-parameter triplet `[lower, point, upper]` built from a bound
    /// pair, for the hazard/mean/reliability generators.
    #[must_use]
    pub fn scale_triplet(&self, bounds: &ParameterBounds) -> ParamTriplet {
        [bounds.scale.0, self.parameters[0], bounds.scale.1]
    }

    /// Shape-parameter triplet, if the family has a second free parameter.
    #[must_use]
    pub fn shape_triplet(&self, bounds: &ParameterBounds) -> Option<ParamTriplet> {
        bounds
            .shape
            .map(|(lower, upper)| [lower, self.parameters[1], upper])
    }
}

/// Profile-likelihood confidence bounds for a fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterBounds {
    /// `(lower, upper)` for the scale parameter.
    pub scale: (f64, f64),
    /// `(lower, upper)` for the shape parameter, for two-parameter families.
    pub shape: Option<(f64, f64)>,
}

/// `chi2(confidence, 1) / 2`, the log-likelihood drop that defines the
/// profile-likelihood bound.
#[must_use]
pub(crate) fn chi_square_half_quantile(confidence: f64) -> f64 {
    ChiSquared::new(1.0).map_or(f64::NAN, |chi| chi.inverse_cdf(confidence) / 2.0)
}

/// Standard normal density.
#[must_use]
pub(crate) fn norm_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / std::f64::consts::TAU.sqrt()
}

/// Standard normal distribution function via the error function.
#[must_use]
pub(crate) fn norm_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Goodness-of-fit block: `AIC = -2ll + 2k`, `BIC = -2ll + k ln n`.
#[must_use]
pub(crate) fn goodness_of_fit(
    log_likelihood: f64,
    free_parameters: usize,
    n_records: usize,
) -> GoodnessOfFit {
    let k = usize_to_f64(free_parameters);
    let n = usize_to_f64(n_records);
    GoodnessOfFit {
        log_likelihood,
        aic: (-2.0f64).mul_add(log_likelihood, 2.0 * k),
        bic: (-2.0f64).mul_add(log_likelihood, k * n.ln()),
    }
}

/// Fitting-time vector with suspension times pulled toward the latest
/// observation: a right-censored time `t` becomes `(max + t) / 2` where
/// `max` is the largest finite fitting time. Used by the two-parameter
/// starting estimators and the information matrix.
#[must_use]
pub(crate) fn adjusted_times(data: &PreparedData) -> Vec<f64> {
    let max_time = data
        .observed_times
        .iter()
        .copied()
        .filter(|t| t.is_finite())
        .fold(0.0f64, f64::max);
    (0..data.n_records)
        .map(|i| {
            let time = data.observed_times[i];
            if (data.matrix[(i, 3)] - STATUS_RIGHT_CENSORED).abs() < f64::EPSILON {
                (max_time + time) / 2.0
            } else {
                time
            }
        })
        .collect()
}

/// Integer time steps `[start, end)` for the table generators.
#[must_use]
pub(crate) fn time_steps(start_time: f64, end_time: f64, step_time: f64) -> Vec<i64> {
    use num_traits::ToPrimitive;
    let start = start_time.to_i64().unwrap_or(0);
    let end = end_time.to_i64().unwrap_or(0);
    let step = step_time.to_i64().unwrap_or(1).max(1);
    let stride = usize::try_from(step).unwrap_or(1);
    (start..end).step_by(stride).collect()
}

/// Non-finite table entries collapse to zero instead of aborting the table.
#[must_use]
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn chi_square_half_quantile_matches_tabulated_value() {
        // chi2(0.90, 1) = 2.7055; half is 1.3528.
        assert_relative_eq!(chi_square_half_quantile(0.90), 1.3528, epsilon = 1e-3);
    }

    #[test]
    fn norm_cdf_is_symmetric_about_zero() {
        assert_relative_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(norm_cdf(1.5) + norm_cdf(-1.5), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn goodness_of_fit_uses_parameter_count() {
        let gof = goodness_of_fit(-100.0, 2, 50);
        assert_relative_eq!(gof.aic, 204.0, epsilon = 1e-12);
        assert_relative_eq!(gof.bic, 200.0 + 2.0 * 50.0f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn time_steps_respect_stride() {
        assert_eq!(time_steps(0.0, 10.0, 3.0), vec![0, 3, 6, 9]);
        assert!(time_steps(5.0, 5.0, 1.0).is_empty());
    }

    #[test]
    fn finite_or_zero_replaces_non_finite_values() {
        assert_relative_eq!(finite_or_zero(2.5), 2.5, epsilon = 1e-12);
        assert_relative_eq!(finite_or_zero(f64::INFINITY), 0.0, epsilon = 1e-12);
        assert_relative_eq!(finite_or_zero(f64::NAN), 0.0, epsilon = 1e-12);
    }
}
