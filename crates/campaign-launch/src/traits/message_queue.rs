use async_trait::async_trait;

use crate::Result;
use crate::types::CampaignId;

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueue one email per recipient as a single batch, returning the batch id.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue rejects the batch or is unreachable.
    async fn enqueue(&self, campaign_id: &CampaignId, recipients: &[String]) -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if the batch is unknown or the queue is unreachable.
    async fn cancel(&self, batch_id: &str) -> Result<()>;
}
