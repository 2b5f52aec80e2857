//! # Observation model
//!
//! Defines the canonical failure-time record, the censoring-status taxonomy
//! shared by every distribution, and the interarrival-time transform.
//!
//! # Examples
//!
//! ```
//! use lifetime_models::{CensoringStatus, ObservationRecord};
//!
//! let record = ObservationRecord::new(1, 0.0, 56.7, CensoringStatus::Event);
//! assert_eq!(record.quantity, 1);
//! assert_eq!(record.status.code(), 1);
//! ```

use thiserror::Error;

/// Sentinel interarrival time for a unit that was never observed to fail
/// again. Callers must treat this as non-informative rather than a duration.
pub const RIGHT_CENSORED_SENTINEL: f64 = 1.0e99;

/// Errors returned when normalizing raw observation fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("censoring status {code:?} cannot be normalized")]
    InvalidCensoringCode { code: String },
}

/// Censoring taxonomy for a single failure-time observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CensoringStatus {
    Event,
    RightCensored,
    LeftCensored,
    IntervalCensored,
}

impl CensoringStatus {
    /// Parse a status label. Accepts the descriptive names used by field-data
    /// exports and the legacy numeric codes `1..=4`.
    ///
    /// # Errors
    ///
    /// Returns `InputError::InvalidCensoringCode` for any other label.
    pub fn parse(label: &str) -> Result<Self, InputError> {
        match label.trim() {
            "Event" | "1" => Ok(Self::Event),
            "Right Censored" | "2" => Ok(Self::RightCensored),
            "Left Censored" | "3" => Ok(Self::LeftCensored),
            "Interval Censored" | "4" => Ok(Self::IntervalCensored),
            other => Err(InputError::InvalidCensoringCode {
                code: other.to_owned(),
            }),
        }
    }

    /// Normalized internal code. Left- and interval-censored observations
    /// collapse to the same likelihood term and share code 3.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Event => 1,
            Self::RightCensored => 2,
            Self::LeftCensored | Self::IntervalCensored => 3,
        }
    }
}

/// One failure-time datum. For an exact event the interval collapses to a
/// point (`interval_left == interval_right`, or `interval_left == 0` marking
/// a first observation). Records are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    /// Identifier of the test article; grouping key for interarrival times.
    pub unit_id: u64,
    pub interval_left: f64,
    pub interval_right: f64,
    /// Count of identical observations folded into this record.
    pub quantity: usize,
    pub status: CensoringStatus,
    /// Elapsed time since the previous same-unit observation.
    pub interarrival: f64,
}

impl ObservationRecord {
    #[must_use]
    pub const fn new(
        unit_id: u64,
        interval_left: f64,
        interval_right: f64,
        status: CensoringStatus,
    ) -> Self {
        Self {
            unit_id,
            interval_left,
            interval_right,
            quantity: 1,
            status,
            interarrival: 0.0,
        }
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn with_interarrival(mut self, interarrival: f64) -> Self {
        self.interarrival = interarrival;
        self
    }

    fn midpoint(&self) -> f64 {
        (self.interval_right - self.interval_left) / 2.0 + self.interval_left
    }
}

/// Elapsed time between two chronologically ordered observations.
///
/// Branches on the status of `current`: an exact event differences the right
/// bounds (restarting the clock when the unit changes or no lower bound was
/// recorded), a right-censored observation yields the non-informative
/// sentinel, and bounded censoring types are approximated by their interval
/// midpoints before differencing.
#[must_use]
pub fn time_between_failures(previous: &ObservationRecord, current: &ObservationRecord) -> f64 {
    match current.status {
        CensoringStatus::Event => {
            if current.interval_left == 0.0 {
                current.interval_right
            } else if current.unit_id == previous.unit_id {
                current.interval_right - previous.interval_right
            } else {
                current.interval_right
            }
        }
        CensoringStatus::RightCensored => RIGHT_CENSORED_SENTINEL,
        CensoringStatus::LeftCensored | CensoringStatus::IntervalCensored => {
            if current.unit_id == previous.unit_id {
                current.midpoint() - previous.midpoint()
            } else {
                current.midpoint()
            }
        }
    }
}

/// Populate the interarrival field across a chronologically ordered slice.
///
/// The first record restarts the clock, so its interarrival equals its right
/// bound; every later record is differenced against its predecessor via
/// [`time_between_failures`].
#[must_use]
pub fn derive_interarrivals(records: &[ObservationRecord]) -> Vec<ObservationRecord> {
    let mut out = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let interarrival = if index == 0 {
            record.interval_right
        } else {
            time_between_failures(&records[index - 1], record)
        };
        out.push(record.clone().with_interarrival(interarrival));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_names_and_legacy_codes() {
        assert_eq!(CensoringStatus::parse("Event"), Ok(CensoringStatus::Event));
        assert_eq!(
            CensoringStatus::parse("2"),
            Ok(CensoringStatus::RightCensored)
        );
        assert_eq!(
            CensoringStatus::parse("Interval Censored"),
            Ok(CensoringStatus::IntervalCensored)
        );
        assert_eq!(
            CensoringStatus::parse("4"),
            Ok(CensoringStatus::IntervalCensored)
        );
    }

    #[test]
    fn parse_rejects_unknown_labels() {
        let err = CensoringStatus::parse("Suspended").expect_err("unknown label should fail");
        assert!(matches!(err, InputError::InvalidCensoringCode { .. }));
    }

    #[test]
    fn left_and_interval_censoring_share_a_code() {
        assert_eq!(CensoringStatus::LeftCensored.code(), 3);
        assert_eq!(CensoringStatus::IntervalCensored.code(), 3);
    }

    #[test]
    fn event_on_same_unit_differences_right_bounds() {
        let previous = ObservationRecord::new(1, 0.0, 10.0, CensoringStatus::Event);
        let current = ObservationRecord::new(1, 10.0, 25.0, CensoringStatus::Event);
        let tbf = time_between_failures(&previous, &current);
        assert!((tbf - 15.0).abs() < 1e-12);
    }

    #[test]
    fn event_with_zero_left_bound_restarts_the_clock() {
        let previous = ObservationRecord::new(1, 0.0, 10.0, CensoringStatus::Event);
        let current = ObservationRecord::new(1, 0.0, 25.0, CensoringStatus::Event);
        let tbf = time_between_failures(&previous, &current);
        assert!((tbf - 25.0).abs() < 1e-12);
    }

    #[test]
    fn event_on_new_unit_restarts_the_clock() {
        let previous = ObservationRecord::new(1, 5.0, 10.0, CensoringStatus::Event);
        let current = ObservationRecord::new(2, 5.0, 25.0, CensoringStatus::Event);
        let tbf = time_between_failures(&previous, &current);
        assert!((tbf - 25.0).abs() < 1e-12);
    }

    #[test]
    fn right_censored_yields_the_sentinel() {
        let previous = ObservationRecord::new(1, 0.0, 10.0, CensoringStatus::Event);
        let current = ObservationRecord::new(1, 40.0, 40.0, CensoringStatus::RightCensored);
        assert!((time_between_failures(&previous, &current) - RIGHT_CENSORED_SENTINEL).abs() < 1.0);
    }

    #[test]
    fn interval_censored_differences_midpoints() {
        let previous = ObservationRecord::new(1, 10.0, 20.0, CensoringStatus::IntervalCensored);
        let current = ObservationRecord::new(1, 30.0, 50.0, CensoringStatus::IntervalCensored);
        // Midpoints 15 and 40.
        let tbf = time_between_failures(&previous, &current);
        assert!((tbf - 25.0).abs() < 1e-12);
    }

    #[test]
    fn derive_interarrivals_sets_first_record_to_its_right_bound() {
        let records = vec![
            ObservationRecord::new(1, 0.0, 10.0, CensoringStatus::Event),
            ObservationRecord::new(1, 10.0, 30.0, CensoringStatus::Event),
        ];
        let derived = derive_interarrivals(&records);
        assert!((derived[0].interarrival - 10.0).abs() < 1e-12);
        assert!((derived[1].interarrival - 20.0).abs() < 1e-12);
    }
}
