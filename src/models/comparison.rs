/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Family comparison workflow: fit every lifetime family and rank the results.
//
// Created on: 03 Aug 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Family comparison
//!
//! Fits all four lifetime families against one data set, collects the
//! information criteria, and renders a ranking report. A family whose fit
//! fails hard is carried with its failure note instead of aborting the
//! whole comparison.

use comfy_table::{
    Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED,
};

use crate::inference::DensityFamily;
use crate::input::ObservationRecord;
use crate::models::{FittedModel, exponential, gaussian, lognormal, weibull};

/// One candidate family with its fit outcome.
#[derive(Debug, Clone)]
pub struct FamilyFit {
    pub family: DensityFamily,
    pub fit: Option<FittedModel>,
    pub failure: Option<String>,
}

/// Comparison output across the four families.
#[derive(Debug, Clone)]
pub struct FamilyComparison {
    pub candidates: Vec<FamilyFit>,
    pub recommended_by_aic: Option<DensityFamily>,
    pub recommended_by_bic: Option<DensityFamily>,
}

/// Rendered tables for a comparison report.
#[derive(Debug, Clone)]
pub struct ComparisonTables {
    pub goodness_of_fit: String,
}

/// Fit every family to `records` truncated to `[start, end]` and rank the
/// successful fits by their information criteria.
#[must_use]
pub fn compare_families(records: &[ObservationRecord], start: f64, end: f64) -> FamilyComparison {
    let families = [
        DensityFamily::Exponential,
        DensityFamily::Gaussian,
        DensityFamily::LogNormal,
        DensityFamily::Weibull,
    ];

    let mut candidates = Vec::with_capacity(families.len());
    for family in families {
        let outcome = match family {
            DensityFamily::Exponential => {
                exponential::maximum_likelihood_estimate(records, start, end)
            }
            DensityFamily::Gaussian => gaussian::maximum_likelihood_estimate(records, start, end),
            DensityFamily::LogNormal => lognormal::maximum_likelihood_estimate(records, start, end),
            DensityFamily::Weibull => weibull::maximum_likelihood_estimate(records, start, end),
        };
        match outcome {
            Ok(fit) => candidates.push(FamilyFit {
                family,
                fit: Some(fit),
                failure: None,
            }),
            Err(error) => candidates.push(FamilyFit {
                family,
                fit: None,
                failure: Some(error.to_string()),
            }),
        }
    }

    let recommended_by_aic = best_by(&candidates, |fit| fit.goodness_of_fit.aic);
    let recommended_by_bic = best_by(&candidates, |fit| fit.goodness_of_fit.bic);

    FamilyComparison {
        candidates,
        recommended_by_aic,
        recommended_by_bic,
    }
}

fn best_by(
    candidates: &[FamilyFit],
    criterion: impl Fn(&FittedModel) -> f64,
) -> Option<DensityFamily> {
    candidates
        .iter()
        .filter_map(|candidate| {
            candidate.fit.as_ref().and_then(|fit| {
                // Defaulted fits carry a zero log-likelihood; skip them.
                if fit.diagnostics.starting_values_defaulted {
                    None
                } else {
                    Some((candidate.family, criterion(fit)))
                }
            })
        })
        .filter(|(_, value)| value.is_finite())
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(family, _)| family)
}

/// Render a comparison report as a formatted table.
#[must_use]
pub fn render_comparison_tables(report: &FamilyComparison) -> ComparisonTables {
    let mut table = make_table(&[
        "Family",
        "Parameters",
        "Log-likelihood",
        "AIC",
        "BIC",
        "Suspensions",
        "Failures",
    ]);

    for candidate in &report.candidates {
        let recommended = report.recommended_by_aic == Some(candidate.family);
        match (&candidate.fit, &candidate.failure) {
            (Some(fit), _) => {
                let parameters = fit
                    .parameters
                    .iter()
                    .map(|p| format!("{p:.4}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut name_cell = Cell::new(candidate.family.name());
                if recommended {
                    name_cell = name_cell
                        .add_attribute(Attribute::Bold)
                        .fg(Color::Green);
                }
                table.add_row(vec![
                    name_cell,
                    Cell::new(parameters),
                    Cell::new(format!("{:.4}", fit.goodness_of_fit.log_likelihood)),
                    Cell::new(format!("{:.4}", fit.goodness_of_fit.aic)),
                    Cell::new(format!("{:.4}", fit.goodness_of_fit.bic)),
                    Cell::new(fit.n_suspensions.to_string()),
                    Cell::new(fit.n_failures.to_string()),
                ]);
            }
            (None, Some(failure)) => {
                table.add_row(vec![
                    Cell::new(candidate.family.name()),
                    Cell::new(failure.as_str()).fg(Color::Red),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
            (None, None) => {}
        }
    }

    ComparisonTables {
        goodness_of_fit: table.to_string(),
    }
}

fn make_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(*h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::CensoringStatus;
    use crate::utils::usize_to_f64;

    fn lifetimes() -> Vec<ObservationRecord> {
        (1..=30)
            .map(|i| {
                let f = (usize_to_f64(i) - 0.5) / 30.0;
                let time = 100.0 * (-(1.0 - f).ln()).powf(0.5);
                ObservationRecord::new(1, 0.0, time, CensoringStatus::Event)
            })
            .collect()
    }

    #[test]
    fn comparison_fits_all_four_families() {
        let report = compare_families(&lifetimes(), 0.0, 0.0);
        assert_eq!(report.candidates.len(), 4);
        for candidate in &report.candidates {
            assert!(candidate.fit.is_some(), "{} failed", candidate.family.name());
        }
        assert!(report.recommended_by_aic.is_some());
        assert!(report.recommended_by_bic.is_some());
    }

    #[test]
    fn comparison_on_empty_input_records_failures() {
        let report = compare_families(&[], 0.0, 0.0);
        assert_eq!(report.candidates.len(), 4);
        for candidate in &report.candidates {
            assert!(candidate.fit.is_none());
            assert!(candidate.failure.is_some());
        }
        assert!(report.recommended_by_aic.is_none());
    }

    #[test]
    fn comparison_tables_render_one_row_per_family() {
        let report = compare_families(&lifetimes(), 0.0, 0.0);
        let tables = render_comparison_tables(&report);
        for name in ["Exponential", "Gaussian", "LogNormal", "Weibull"] {
            assert!(tables.goodness_of_fit.contains(name), "missing {name}");
        }
    }
}
