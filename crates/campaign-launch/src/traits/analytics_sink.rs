use async_trait::async_trait;

use crate::Result;
use crate::types::CampaignId;

/// Analytics store that tracks each campaign send.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Create the tracking row for a send, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    async fn create(&self, campaign_id: &CampaignId, recipients: usize) -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if the row is unknown or cannot be deleted.
    async fn delete(&self, record_id: &str) -> Result<()>;
}
