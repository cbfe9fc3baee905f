use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::FaultPlan;
use crate::Result;
use crate::error::CampaignError;
use crate::traits::AnalyticsSink;
use crate::types::CampaignId;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AnalyticsRow {
    campaign_id: CampaignId,
    recipients: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryAnalyticsSink {
    rows: Mutex<HashMap<String, AnalyticsRow>>,
    create_calls: AtomicU32,
    delete_calls: AtomicU32,
    create_faults: FaultPlan,
}

impl InMemoryAnalyticsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    /// Recipient count recorded for a campaign, if it has a row.
    #[must_use]
    pub fn recipients_for(&self, campaign_id: &CampaignId) -> Option<usize> {
        self.rows
            .lock()
            .values()
            .find(|row| &row.campaign_id == campaign_id)
            .map(|row| row.recipients)
    }

    #[must_use]
    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn delete_calls(&self) -> u32 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn create_faults(&self) -> &FaultPlan {
        &self.create_faults
    }
}

#[async_trait]
impl AnalyticsSink for InMemoryAnalyticsSink {
    async fn create(&self, campaign_id: &CampaignId, recipients: usize) -> Result<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.create_faults.should_fail() {
            return Err(CampaignError::Unavailable {
                system: "analytics store",
                operation: "create",
            });
        }
        let record_id = format!("analytics-{}", uuid::Uuid::new_v4());
        self.rows.lock().insert(
            record_id.clone(),
            AnalyticsRow {
                campaign_id: campaign_id.clone(),
                recipients,
            },
        );
        Ok(record_id)
    }

    async fn delete(&self, record_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .remove(record_id)
            .map(|_| ())
            .ok_or_else(|| CampaignError::UnknownAnalyticsRecord(record_id.to_string()))
    }
}
