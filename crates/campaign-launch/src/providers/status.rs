use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::FaultPlan;
use crate::Result;
use crate::error::CampaignError;
use crate::traits::CampaignStatusStore;
use crate::types::{CampaignId, CampaignStatus};

#[derive(Debug, Default)]
pub struct InMemoryCampaignStatusStore {
    statuses: Mutex<HashMap<CampaignId, CampaignStatus>>,
    set_calls: AtomicU32,
    set_faults: FaultPlan,
}

impl InMemoryCampaignStatusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_status(self, campaign_id: CampaignId, status: CampaignStatus) -> Self {
        self.statuses.lock().insert(campaign_id, status);
        self
    }

    /// Status without going through the async trait.
    #[must_use]
    pub fn current(&self, campaign_id: &CampaignId) -> CampaignStatus {
        self.statuses
            .lock()
            .get(campaign_id)
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn set_calls(&self) -> u32 {
        self.set_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn set_faults(&self) -> &FaultPlan {
        &self.set_faults
    }
}

#[async_trait]
impl CampaignStatusStore for InMemoryCampaignStatusStore {
    async fn status(&self, campaign_id: &CampaignId) -> Result<CampaignStatus> {
        Ok(self.current(campaign_id))
    }

    async fn set_status(&self, campaign_id: &CampaignId, status: CampaignStatus) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.set_faults.should_fail() {
            return Err(CampaignError::Unavailable {
                system: "status store",
                operation: "set_status",
            });
        }
        self.statuses.lock().insert(campaign_id.clone(), status);
        Ok(())
    }
}
