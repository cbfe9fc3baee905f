use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::FaultPlan;
use crate::Result;
use crate::error::CampaignError;
use crate::traits::MessageQueue;
use crate::types::CampaignId;

const SYSTEM: &str = "message queue";

#[derive(Debug, Default)]
pub struct InMemoryMessageQueue {
    batches: Mutex<HashMap<String, Vec<String>>>,
    enqueue_calls: AtomicU32,
    cancel_calls: AtomicU32,
    enqueue_faults: FaultPlan,
    cancel_faults: FaultPlan,
}

impl InMemoryMessageQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sitting in batches that were not cancelled.
    #[must_use]
    pub fn pending_messages(&self) -> usize {
        self.batches.lock().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn enqueue_calls(&self) -> u32 {
        self.enqueue_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn cancel_calls(&self) -> u32 {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn enqueue_faults(&self) -> &FaultPlan {
        &self.enqueue_faults
    }

    #[must_use]
    pub fn cancel_faults(&self) -> &FaultPlan {
        &self.cancel_faults
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn enqueue(&self, campaign_id: &CampaignId, recipients: &[String]) -> Result<String> {
        self.enqueue_calls.fetch_add(1, Ordering::SeqCst);
        if self.enqueue_faults.should_fail() {
            return Err(CampaignError::Unavailable {
                system: SYSTEM,
                operation: "enqueue",
            });
        }
        if recipients.is_empty() {
            return Err(CampaignError::NoRecipients(campaign_id.to_string()));
        }

        let batch_id = format!("batch-{}", uuid::Uuid::new_v4());
        self.batches
            .lock()
            .insert(batch_id.clone(), recipients.to_vec());
        Ok(batch_id)
    }

    async fn cancel(&self, batch_id: &str) -> Result<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.cancel_faults.should_fail() {
            return Err(CampaignError::Unavailable {
                system: SYSTEM,
                operation: "cancel",
            });
        }

        self.batches
            .lock()
            .remove(batch_id)
            .map(|_| ())
            .ok_or_else(|| CampaignError::UnknownBatch(batch_id.to_string()))
    }
}
