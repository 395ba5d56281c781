use crate::payout::{PayoutKey, PayoutStatus, ResourcePayout};
use crate::period::PayPeriod;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("payout {key} is {status} and can no longer be changed")]
    Locked { key: PayoutKey, status: PayoutStatus },

    #[error("payout {key} cannot move from {from} to {to}")]
    InvalidTransition {
        key: PayoutKey,
        from: PayoutStatus,
        to: PayoutStatus,
    },

    #[error("no payout stored for {0}")]
    NotFound(PayoutKey),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Keeps one payout per (resource, year, month).
///
/// Saving over an unlocked record replaces it; concurrent saves for the same
/// key resolve last-write-wins. Approved and paid records are never replaced.
pub trait PayoutStore {
    fn save_payout(&self, payout: &ResourcePayout) -> PersistenceResult<()>;
    fn load_payout(&self, key: &PayoutKey) -> PersistenceResult<Option<ResourcePayout>>;
    fn list_payouts(&self, period: PayPeriod) -> PersistenceResult<Vec<ResourcePayout>>;
    fn update_status(
        &self,
        key: &PayoutKey,
        status: PayoutStatus,
    ) -> PersistenceResult<ResourcePayout>;
}

/// Refuses to overwrite a locked record.
pub fn ensure_replaceable(
    key: &PayoutKey,
    existing: Option<PayoutStatus>,
) -> PersistenceResult<()> {
    match existing {
        Some(status) if status.is_locked() => Err(PersistenceError::Locked {
            key: key.clone(),
            status,
        }),
        _ => Ok(()),
    }
}

pub fn ensure_transition(
    key: &PayoutKey,
    from: PayoutStatus,
    to: PayoutStatus,
) -> PersistenceResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(PersistenceError::InvalidTransition {
            key: key.clone(),
            from,
            to,
        })
    }
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_case_log_from_csv, load_payouts_from_json, load_resources_from_json,
    read_case_log, save_payouts_to_json,
};
pub use memory::MemoryPayoutStore;
