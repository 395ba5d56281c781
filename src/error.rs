//! Error types raised by payout computation.
//!
//! Every failure is deterministic and stems from the input; callers decide
//! whether to fix the data and recompute, or skip the resource for the period.

use chrono::NaiveDate;
use thiserror::Error;

use crate::client::Client;

/// Input that breaks an invariant of the calculator contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("complete logging cases {complete} exceed total logging cases {total}")]
    CompleteLoggingExceedsTotal { complete: i64, total: i64 },

    #[error("complete logging cases must be non-negative (got {0})")]
    NegativeCompleteLogging(i64),

    #[error("{date}: {field} case count is negative ({value})")]
    NegativeCases {
        date: NaiveDate,
        field: String,
        value: i64,
    },

    #[error("{date}: hours worked is negative ({hours})")]
    NegativeHours { date: NaiveDate, hours: String },

    #[error("{date} lies outside pay period {year}-{month:02}")]
    DateOutsidePeriod {
        date: NaiveDate,
        year: i32,
        month: u32,
    },

    #[error("{0} appears more than once in the daily activity")]
    DuplicateDate(NaiveDate),

    #[error("daily activity is not in chronological order ({later} listed before {earlier})")]
    DatesOutOfOrder { later: NaiveDate, earlier: NaiveDate },

    #[error("invalid pay period {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("resource id must not be empty")]
    EmptyResourceId,

    #[error("{0} is too large to compute")]
    ArithmeticOverflow(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayrollError {
    #[error("no processing rate configured for {client} location '{location_id}' ({cases} cases)")]
    MissingRate {
        client: Client,
        location_id: String,
        cases: i64,
    },

    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] InvariantViolation),

    #[error("no daily activity supplied for resource '{resource_id}' in {year}-{month:02}")]
    EmptyPeriod {
        resource_id: String,
        year: i32,
        month: u32,
    },
}

impl PayrollError {
    /// Stable machine-readable code, used in API error bodies and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            PayrollError::MissingRate { .. } => "missing_rate",
            PayrollError::InvariantViolation(_) => "invariant_violation",
            PayrollError::EmptyPeriod { .. } => "empty_period",
        }
    }
}

pub type PayrollResult<T> = Result<T, PayrollError>;
