use async_trait::async_trait;

use crate::Result;
use crate::types::{CampaignId, CampaignStatus};

#[async_trait]
pub trait CampaignStatusStore: Send + Sync {
    /// Current status. Unknown campaigns are `Draft`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn status(&self, campaign_id: &CampaignId) -> Result<CampaignStatus>;

    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn set_status(&self, campaign_id: &CampaignId, status: CampaignStatus) -> Result<()>;
}
