pub mod activity;
pub(crate) mod activity_validation;
pub mod calculator;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod payout;
pub mod period;
pub mod persistence;
pub mod resource;

pub use activity::{ClientCaseCounts, DayActivity, PayoutRequest, ProcessingCount};
pub use calculator::{PayrollCalculator, average_cases_per_hour, compute_batch, compute_payout};
pub use client::{ActivityKind, Client};
pub use config::{
    ConfigError, LoggingPolicy, PayrollConfig, ProcessingRate, RateTable, SlabBand, SlabTable,
};
pub use error::{InvariantViolation, PayrollError, PayrollResult};
pub use export::{
    SummaryRow, summary_frame, summary_rows, write_daywise_csv, write_summary, write_summary_csv,
};
pub use payout::{
    DayBreakdown, PayoutKey, PayoutStatus, ProcessingBreakdownEntry, ProcessingTotals,
    ResourcePayout, SlabSelection,
};
pub use period::PayPeriod;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqlitePayoutStore;
pub use persistence::{
    MemoryPayoutStore, PayoutStore, PersistenceError, load_case_log_from_csv,
    load_payouts_from_json, load_resources_from_json, read_case_log, save_payouts_to_json,
};
pub use resource::{ResourceProfile, ResourceSnapshot};
