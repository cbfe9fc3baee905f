use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::FaultPlan;
use crate::Result;
use crate::error::CampaignError;
use crate::traits::CreditLedger;
use crate::types::CampaignId;

const SYSTEM: &str = "credit ledger";

#[derive(Debug)]
struct LedgerState {
    available: u64,
    reservations: HashMap<String, u64>,
}

#[derive(Debug)]
pub struct InMemoryCreditLedger {
    state: Mutex<LedgerState>,
    reserve_calls: AtomicU32,
    release_calls: AtomicU32,
    reserve_faults: FaultPlan,
    release_faults: FaultPlan,
}

impl InMemoryCreditLedger {
    #[must_use]
    pub fn new(balance: u64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                available: balance,
                reservations: HashMap::new(),
            }),
            reserve_calls: AtomicU32::new(0),
            release_calls: AtomicU32::new(0),
            reserve_faults: FaultPlan::default(),
            release_faults: FaultPlan::default(),
        }
    }

    #[must_use]
    pub fn available(&self) -> u64 {
        self.state.lock().available
    }

    #[must_use]
    pub fn held(&self) -> u64 {
        self.state.lock().reservations.values().sum()
    }

    #[must_use]
    pub fn reserve_calls(&self) -> u32 {
        self.reserve_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn release_calls(&self) -> u32 {
        self.release_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn reserve_faults(&self) -> &FaultPlan {
        &self.reserve_faults
    }

    #[must_use]
    pub fn release_faults(&self) -> &FaultPlan {
        &self.release_faults
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn reserve(&self, _campaign_id: &CampaignId, credits: u64) -> Result<String> {
        self.reserve_calls.fetch_add(1, Ordering::SeqCst);
        if self.reserve_faults.should_fail() {
            return Err(CampaignError::Unavailable {
                system: SYSTEM,
                operation: "reserve",
            });
        }

        let mut state = self.state.lock();
        if state.available < credits {
            return Err(CampaignError::InsufficientCredits {
                requested: credits,
                available: state.available,
            });
        }
        let reservation_id = format!("res-{}", uuid::Uuid::new_v4());
        state.available -= credits;
        state.reservations.insert(reservation_id.clone(), credits);
        Ok(reservation_id)
    }

    async fn release(&self, reservation_id: &str) -> Result<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if self.release_faults.should_fail() {
            return Err(CampaignError::Unavailable {
                system: SYSTEM,
                operation: "release",
            });
        }

        let mut state = self.state.lock();
        let credits = state
            .reservations
            .remove(reservation_id)
            .ok_or_else(|| CampaignError::UnknownReservation(reservation_id.to_string()))?;
        state.available += credits;
        Ok(())
    }
}
