#![forbid(unsafe_code)]

//! # `lifetime_models`
//!
//! Censored-data distribution fitting for reliability and life-test
//! analysis: Exponential, Gaussian, Lognormal, and Weibull maximum
//! likelihood estimation over mixed event/censored failure-time records,
//! with Fisher-information variances, profile-likelihood confidence
//! bounds, and time-indexed hazard/mean/reliability tables.
//!
//! The crate was initially developed for reliability-growth and field
//! failure analyses, but the API is a plain library contract and carries
//! no assumptions about how results are stored or displayed.

pub mod inference;
pub mod input;
pub mod models;
pub mod preprocess;
pub mod utils;

pub use inference::{
    DensityFamily, FINITE_DIFFERENCE_STEP, VarianceEstimate, fisher_information,
    variance_from_information,
};
pub use input::{
    CensoringStatus, InputError, ObservationRecord, RIGHT_CENSORED_SENTINEL, derive_interarrivals,
    time_between_failures,
};
pub use preprocess::{
    PrepareError, PreparedData, STATUS_EVENT, STATUS_INTERVAL_CENSORED, STATUS_RIGHT_CENSORED,
    StatusRows, format_data_set,
};

pub use models::{
    FitDiagnostics, FitError, FittedModel, GoodnessOfFit, ParamTriplet, ParameterBounds,
    exponential, gaussian, lognormal, weibull,
};

pub use models::comparison::{
    ComparisonTables, FamilyComparison, FamilyFit, compare_families, render_comparison_tables,
};
