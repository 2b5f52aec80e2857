//! # Fisher information
//!
//! Finite-difference empirical Fisher information for the four lifetime
//! families, and the guarded conversion from an information matrix to
//! parameter variances.
//!
//! The log-density of each family is declared statically through
//! [`DensityFamily`], so the parameter ordering the derivative columns
//! follow is fixed at the type level rather than recovered by runtime
//! introspection. Callers must keep the point-estimate vector in the same
//! order.

use faer::Mat;

/// Finite-difference step for the per-point derivative columns.
pub const FINITE_DIFFERENCE_STEP: f64 = 1.0e-6;

/// Lifetime distribution family, tagging a log-density and its parameter
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityFamily {
    /// Parameters `[theta, location]`.
    Exponential,
    /// Parameters `[mu, sigma]`.
    Gaussian,
    /// Parameters `[mu, sigma]`.
    LogNormal,
    /// Parameters `[eta, beta]`.
    Weibull,
}

impl DensityFamily {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exponential => "Exponential",
            Self::Gaussian => "Gaussian",
            Self::LogNormal => "LogNormal",
            Self::Weibull => "Weibull",
        }
    }

    /// Number of parameters the log-density is differentiated against.
    #[must_use]
    pub const fn parameter_count(self) -> usize {
        2
    }

    /// Number of parameters free in the fit; the Exponential location is
    /// pinned at zero.
    #[must_use]
    pub const fn free_parameter_count(self) -> usize {
        match self {
            Self::Exponential => 1,
            Self::Gaussian | Self::LogNormal | Self::Weibull => 2,
        }
    }

    /// Closed-form log-density at `x` for the given parameter vector.
    #[must_use]
    pub fn log_pdf(self, x: f64, params: &[f64]) -> f64 {
        match self {
            Self::Exponential => params[0].ln() - params[0] * (x - params[1]),
            Self::Gaussian | Self::LogNormal => {
                let standardized = (x.ln() - params[0]) / params[1];
                (1.0 / params[1]) * std::f64::consts::TAU.sqrt()
                    - 0.5 * standardized * standardized
            }
            Self::Weibull => {
                let ratio = x / params[0];
                (params[1] / params[0]).ln() + (params[1] - 1.0) * ratio.ln()
                    - ratio.powf(params[1])
            }
        }
    }
}

/// Parameter variances recovered from an information matrix, with the
/// source slot convention `1/F[0,0]`, `1/F[0,1]`, `1/F[1,1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceEstimate {
    pub scale: f64,
    pub shape: f64,
    pub covariance: f64,
    /// True when any requested slot was singular or non-finite and was
    /// defaulted to zero.
    pub degenerate: bool,
}

/// Empirical Fisher information matrix for `family` sampled at `data` with
/// parameters `point`, assuming uncorrelated samples with variance
/// `noise^2`.
///
/// Each row of the derivative matrix holds the centered finite-difference
/// derivative of the log-density with respect to one parameter, evaluated at
/// every data point; the result is `(1/noise^2) * D * D^T`.
#[must_use]
pub fn fisher_information(
    family: DensityFamily,
    point: &[f64],
    data: &[f64],
    noise: f64,
) -> Mat<f64> {
    let n_params = family.parameter_count().min(point.len());
    let mut derivatives = Mat::<f64>::zeros(n_params, data.len());
    for k in 0..n_params {
        let mut shifted_up = point.to_vec();
        let mut shifted_down = point.to_vec();
        shifted_up[k] += FINITE_DIFFERENCE_STEP;
        shifted_down[k] -= FINITE_DIFFERENCE_STEP;
        for (j, &x) in data.iter().enumerate() {
            let upper = family.log_pdf(x, &shifted_up);
            let lower = family.log_pdf(x, &shifted_down);
            derivatives[(k, j)] = (upper - lower) / (2.0 * FINITE_DIFFERENCE_STEP);
        }
    }

    let weight = 1.0 / (noise * noise);
    let mut information = Mat::<f64>::zeros(n_params, n_params);
    for m in 0..n_params {
        for n in 0..n_params {
            let mut sum = 0.0;
            for j in 0..data.len() {
                sum += derivatives[(m, j)] * derivatives[(n, j)];
            }
            information[(m, n)] = weight * sum;
        }
    }
    information
}

/// Parameter variances as the elementwise reciprocals of the information
/// matrix entries.
///
/// A singular or non-finite entry yields a zero in that slot and sets the
/// degeneracy flag; the failure is reported, never propagated. With a single
/// free parameter only the scale slot is computed.
#[must_use]
pub fn variance_from_information(
    information: &Mat<f64>,
    free_parameters: usize,
) -> VarianceEstimate {
    let mut degenerate = false;
    let mut invert = |value: f64| -> f64 {
        if value.is_finite() && value != 0.0 {
            let inverse = 1.0 / value;
            if inverse.is_finite() {
                return inverse;
            }
        }
        degenerate = true;
        0.0
    };

    let scale = invert(information[(0, 0)]);
    let (shape, covariance) = if free_parameters > 1 {
        (invert(information[(1, 1)]), invert(information[(0, 1)]))
    } else {
        (0.0, 0.0)
    };

    VarianceEstimate {
        scale,
        shape,
        covariance,
        degenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exponential_information_matches_analytic_curvature() {
        // d/dtheta log f = 1/theta - (x - loc); at theta = 0.5 and x = 2 the
        // derivative is exactly 0, so pick points away from the stationary
        // value to get a nonzero information entry.
        let data = [1.0, 3.0, 5.0];
        let theta = 0.5;
        let information = fisher_information(DensityFamily::Exponential, &[theta, 0.0], &data, 1.0);
        let expected: f64 = data.iter().map(|x| (1.0 / theta - x) * (1.0 / theta - x)).sum();
        assert_relative_eq!(information[(0, 0)], expected, epsilon = 1e-4);
    }

    #[test]
    fn noise_scales_information_inversely_squared() {
        let data = [1.0, 2.0, 4.0];
        let unit = fisher_information(DensityFamily::Weibull, &[3.0, 1.5], &data, 1.0);
        let doubled = fisher_information(DensityFamily::Weibull, &[3.0, 1.5], &data, 2.0);
        assert_relative_eq!(unit[(0, 0)], 4.0 * doubled[(0, 0)], epsilon = 1e-8);
    }

    #[test]
    fn variance_inverts_diagonal_and_covariance_slots() {
        let information = Mat::from_fn(2, 2, |i, j| match (i, j) {
            (0, 0) => 4.0,
            (1, 1) => 25.0,
            _ => 10.0,
        });
        let variance = variance_from_information(&information, 2);
        assert_relative_eq!(variance.scale, 0.25, epsilon = 1e-12);
        assert_relative_eq!(variance.shape, 0.04, epsilon = 1e-12);
        assert_relative_eq!(variance.covariance, 0.1, epsilon = 1e-12);
        assert!(!variance.degenerate);
    }

    #[test]
    fn singular_information_is_reported_not_propagated() {
        let information = Mat::<f64>::zeros(2, 2);
        let variance = variance_from_information(&information, 2);
        assert!(variance.degenerate);
        assert_relative_eq!(variance.scale, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn single_free_parameter_leaves_shape_slots_untouched() {
        let information = Mat::from_fn(2, 2, |i, j| if i == 0 && j == 0 { 8.0 } else { 0.0 });
        let variance = variance_from_information(&information, 1);
        assert_relative_eq!(variance.scale, 0.125, epsilon = 1e-12);
        assert_relative_eq!(variance.shape, 0.0, epsilon = 1e-12);
        assert!(!variance.degenerate);
    }
}
