use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{PayoutStore, PersistenceError, PersistenceResult};
use crate::payout::{PayoutKey, PayoutStatus, ResourcePayout};
use crate::period::PayPeriod;

/// In-process payout store, used by the CLI and as the default HTTP backend.
#[derive(Debug, Default)]
pub struct MemoryPayoutStore {
    payouts: RwLock<BTreeMap<PayoutKey, ResourcePayout>>,
}

impl MemoryPayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.payouts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.payouts.read().is_empty()
    }

    pub fn all(&self) -> Vec<ResourcePayout> {
        self.payouts.read().values().cloned().collect()
    }

    /// Replaces the whole contents, e.g. after loading a JSON snapshot.
    pub fn replace_all(&self, payouts: Vec<ResourcePayout>) {
        let mut guard = self.payouts.write();
        guard.clear();
        for payout in payouts {
            guard.insert(payout.key(), payout);
        }
    }
}

impl PayoutStore for MemoryPayoutStore {
    fn save_payout(&self, payout: &ResourcePayout) -> PersistenceResult<()> {
        let key = payout.key();
        let mut guard = self.payouts.write();
        super::ensure_replaceable(&key, guard.get(&key).map(|p| p.status))?;
        guard.insert(key, payout.clone());
        Ok(())
    }

    fn load_payout(&self, key: &PayoutKey) -> PersistenceResult<Option<ResourcePayout>> {
        Ok(self.payouts.read().get(key).cloned())
    }

    fn list_payouts(&self, period: PayPeriod) -> PersistenceResult<Vec<ResourcePayout>> {
        Ok(self
            .payouts
            .read()
            .values()
            .filter(|payout| payout.period == period)
            .cloned()
            .collect())
    }

    fn update_status(
        &self,
        key: &PayoutKey,
        status: PayoutStatus,
    ) -> PersistenceResult<ResourcePayout> {
        let mut guard = self.payouts.write();
        let payout = guard
            .get_mut(key)
            .ok_or_else(|| PersistenceError::NotFound(key.clone()))?;
        super::ensure_transition(key, payout.status, status)?;
        payout.status = status;
        Ok(payout.clone())
    }
}
