use async_trait::async_trait;

use crate::Result;
use crate::types::CampaignId;

/// Billing system that holds credits for a campaign send.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Hold `credits` for `campaign_id`, returning a reservation id.
    ///
    /// # Errors
    ///
    /// Returns an error if the balance is too low or the ledger is unreachable.
    async fn reserve(&self, campaign_id: &CampaignId, credits: u64) -> Result<String>;

    /// Return held credits to the balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation is unknown or the ledger is unreachable.
    async fn release(&self, reservation_id: &str) -> Result<()>;
}
