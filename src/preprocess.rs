//! # Data preparation
//!
//! Turns raw heterogeneous observation records into the fixed numeric matrix
//! the maximum likelihood estimators consume: truncation, quantity
//! expansion, and censoring-code normalization.

use faer::Mat;
use thiserror::Error;

use crate::input::{CensoringStatus, ObservationRecord};

/// Normalized status code for an exact event.
pub const STATUS_EVENT: f64 = 1.0;
/// Normalized status code for a right-censored observation (suspension).
pub const STATUS_RIGHT_CENSORED: f64 = 2.0;
/// Normalized status code for a left- or interval-censored observation.
pub const STATUS_INTERVAL_CENSORED: f64 = 3.0;

/// Errors returned while preparing a data set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrepareError {
    #[error("truncation window start ({start}) exceeds end ({end})")]
    InvalidWindow { start: f64, end: f64 },
}

/// Per-status view of the prepared matrix used by the likelihood terms.
#[derive(Debug, Clone, Default)]
pub struct StatusRows {
    /// Left interval bounds.
    pub left: Vec<f64>,
    /// Observation times: the right bound for events and interval rows, the
    /// recorded censoring time for suspensions.
    pub time: Vec<f64>,
    /// Observation counts (all 1.0 after expansion).
    pub count: Vec<f64>,
}

/// Prepared data set in the fixed five-column layout
/// `[left, right, quantity, status, interarrival]`.
///
/// The matrix is rebuilt for every fitting call and never mutated in place.
/// Right-censored rows carry `f64::INFINITY` in the right column; the
/// recorded censoring time survives in [`PreparedData::observed_times`],
/// which the estimators use for starting values and survival terms.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub matrix: Mat<f64>,
    /// Fitting time per row: right bound for events, censoring time for
    /// suspensions, interval midpoint for bounded censoring.
    pub observed_times: Vec<f64>,
    pub n_records: usize,
    pub n_suspensions: usize,
    pub n_failures: usize,
}

impl PreparedData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_records == 0
    }

    /// Rows whose normalized status equals `code`, with the suspension time
    /// substituted for the infinite right bound on right-censored rows.
    #[must_use]
    pub fn rows_with_status(&self, code: f64) -> StatusRows {
        let mut rows = StatusRows::default();
        for i in 0..self.n_records {
            if (self.matrix[(i, 3)] - code).abs() > f64::EPSILON {
                continue;
            }
            rows.left.push(self.matrix[(i, 0)]);
            let time = if (code - STATUS_RIGHT_CENSORED).abs() < f64::EPSILON {
                self.observed_times[i]
            } else {
                self.matrix[(i, 1)]
            };
            rows.time.push(time);
            rows.count.push(self.matrix[(i, 2)]);
        }
        rows
    }
}

/// Format a raw data set for the maximum likelihood estimators.
///
/// Records are sorted by the right of the interval, truncated to the
/// `[start, end]` window (`end <= 0` disables the upper cut), expanded so
/// each row represents a single observation, and normalized so every row
/// carries status 1, 2, or 3. Empty input is not an error; it produces an
/// empty matrix with zero counts.
///
/// # Errors
///
/// Returns `PrepareError::InvalidWindow` if `start > end` while `end > 0`.
pub fn format_data_set(
    records: &[ObservationRecord],
    start: f64,
    end: f64,
) -> Result<PreparedData, PrepareError> {
    if end > 0.0 && start > end {
        return Err(PrepareError::InvalidWindow { start, end });
    }

    // Sort by the right of the interval, then drop records outside the
    // truncation window.
    let mut sorted: Vec<&ObservationRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.interval_right.total_cmp(&b.interval_right));
    let kept: Vec<&ObservationRecord> = sorted
        .into_iter()
        .filter(|rec| rec.interval_left >= start)
        .filter(|rec| end <= 0.0 || rec.interval_right <= end)
        .collect();

    // Expand each record into `quantity` unit observations.
    let mut expanded: Vec<&ObservationRecord> = Vec::new();
    for record in kept {
        for _ in 0..record.quantity {
            expanded.push(record);
        }
    }

    let n_records = expanded.len();
    let mut matrix = Mat::<f64>::zeros(n_records, 5);
    let mut observed_times = Vec::with_capacity(n_records);
    let mut n_suspensions = 0usize;
    let mut n_failures = 0usize;

    for (i, record) in expanded.iter().enumerate() {
        let (status, right, time) = match record.status {
            CensoringStatus::RightCensored => {
                n_suspensions += 1;
                (STATUS_RIGHT_CENSORED, f64::INFINITY, record.interval_right)
            }
            CensoringStatus::LeftCensored | CensoringStatus::IntervalCensored => {
                n_failures += 1;
                let midpoint =
                    (record.interval_right - record.interval_left) / 2.0 + record.interval_left;
                (STATUS_INTERVAL_CENSORED, record.interval_right, midpoint)
            }
            CensoringStatus::Event => {
                n_failures += 1;
                (STATUS_EVENT, record.interval_right, record.interval_right)
            }
        };
        matrix[(i, 0)] = record.interval_left;
        matrix[(i, 1)] = right;
        matrix[(i, 2)] = 1.0;
        matrix[(i, 3)] = status;
        matrix[(i, 4)] = record.interarrival;
        observed_times.push(time);
    }

    Ok(PreparedData {
        matrix,
        observed_times,
        n_records,
        n_suspensions,
        n_failures,
    })
}
