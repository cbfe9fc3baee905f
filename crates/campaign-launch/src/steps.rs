use std::sync::Arc;

use async_trait::async_trait;
use saga_engine::{SagaContext, SagaStep, StepError, StepOutput};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::error::CampaignError;
use crate::traits::{AnalyticsSink, CampaignStatusStore, CreditLedger, MessageQueue};
use crate::types::{CampaignId, CampaignStatus, keys};

fn required<T: DeserializeOwned>(ctx: &SagaContext, key: &'static str) -> crate::Result<T> {
    ctx.get_as(key)?.ok_or(CampaignError::MissingContext(key))
}

fn output(key: &str, value: &str) -> StepOutput {
    let mut output = StepOutput::new();
    output.insert(key.to_string(), json!(value));
    output
}

/// Holds credits for the send. Compensation releases the reservation.
pub struct ReserveCreditsStep<L> {
    ledger: Arc<L>,
    max_retries: Option<u32>,
}

impl<L> ReserveCreditsStep<L> {
    #[must_use]
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            ledger,
            max_retries: None,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

#[async_trait]
impl<L: CreditLedger + 'static> SagaStep for ReserveCreditsStep<L> {
    fn name(&self) -> &str {
        "reserve_credits"
    }

    async fn execute(&self, ctx: &SagaContext) -> Result<StepOutput, StepError> {
        let campaign_id: CampaignId = required(ctx, keys::CAMPAIGN_ID)?;
        let credits: u64 = required(ctx, keys::CREDITS)?;

        let reservation_id = self.ledger.reserve(&campaign_id, credits).await?;
        debug!(
            campaign = %campaign_id,
            credits,
            reservation = %reservation_id,
            "reserved credits"
        );
        ctx.set(keys::RESERVATION_ID, reservation_id.as_str());
        Ok(output(keys::RESERVATION_ID, &reservation_id))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), StepError> {
        let reservation_id: String = required(ctx, keys::RESERVATION_ID)?;
        debug!(reservation = %reservation_id, "releasing credit reservation");
        self.ledger.release(&reservation_id).await?;
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "release reserved credits".to_string()
    }

    fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }
}

/// Enqueues one email per recipient. Compensation cancels the batch.
pub struct EnqueueEmailsStep<Q> {
    queue: Arc<Q>,
    max_retries: Option<u32>,
}

impl<Q> EnqueueEmailsStep<Q> {
    #[must_use]
    pub fn new(queue: Arc<Q>) -> Self {
        Self {
            queue,
            max_retries: None,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

#[async_trait]
impl<Q: MessageQueue + 'static> SagaStep for EnqueueEmailsStep<Q> {
    fn name(&self) -> &str {
        "enqueue_emails"
    }

    async fn execute(&self, ctx: &SagaContext) -> Result<StepOutput, StepError> {
        let campaign_id: CampaignId = required(ctx, keys::CAMPAIGN_ID)?;
        let recipients: Vec<String> = required(ctx, keys::RECIPIENTS)?;

        let batch_id = self.queue.enqueue(&campaign_id, &recipients).await?;
        debug!(
            campaign = %campaign_id,
            recipients = recipients.len(),
            batch = %batch_id,
            "enqueued email batch"
        );
        ctx.set(keys::EMAIL_BATCH_ID, batch_id.as_str());
        Ok(output(keys::EMAIL_BATCH_ID, &batch_id))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), StepError> {
        let batch_id: String = required(ctx, keys::EMAIL_BATCH_ID)?;
        debug!(batch = %batch_id, "cancelling email batch");
        self.queue.cancel(&batch_id).await?;
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "cancel queued campaign emails".to_string()
    }

    fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }
}

/// Marks the campaign as sending. Compensation restores the previous status.
pub struct UpdateCampaignStatusStep<S> {
    statuses: Arc<S>,
    max_retries: Option<u32>,
}

impl<S> UpdateCampaignStatusStep<S> {
    #[must_use]
    pub fn new(statuses: Arc<S>) -> Self {
        Self {
            statuses,
            max_retries: None,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

#[async_trait]
impl<S: CampaignStatusStore + 'static> SagaStep for UpdateCampaignStatusStep<S> {
    fn name(&self) -> &str {
        "update_campaign_status"
    }

    async fn execute(&self, ctx: &SagaContext) -> Result<StepOutput, StepError> {
        let campaign_id: CampaignId = required(ctx, keys::CAMPAIGN_ID)?;

        let previous = self.statuses.status(&campaign_id).await?;
        self.statuses
            .set_status(&campaign_id, CampaignStatus::Sending)
            .await?;
        debug!(
            campaign = %campaign_id,
            from = %previous,
            to = %CampaignStatus::Sending,
            "updated campaign status"
        );
        ctx.set_as(keys::PREVIOUS_STATUS, &previous)?;
        Ok(output(keys::PREVIOUS_STATUS, &previous.to_string()))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), StepError> {
        let campaign_id: CampaignId = required(ctx, keys::CAMPAIGN_ID)?;
        let previous: CampaignStatus = required(ctx, keys::PREVIOUS_STATUS)?;
        debug!(campaign = %campaign_id, status = %previous, "restoring campaign status");
        self.statuses.set_status(&campaign_id, previous).await?;
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "restore the previous campaign status".to_string()
    }

    fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }
}

/// Creates the analytics row for the send. Compensation deletes it.
pub struct CreateAnalyticsStep<A> {
    analytics: Arc<A>,
    max_retries: Option<u32>,
}

impl<A> CreateAnalyticsStep<A> {
    #[must_use]
    pub fn new(analytics: Arc<A>) -> Self {
        Self {
            analytics,
            max_retries: None,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

#[async_trait]
impl<A: AnalyticsSink + 'static> SagaStep for CreateAnalyticsStep<A> {
    fn name(&self) -> &str {
        "create_analytics"
    }

    async fn execute(&self, ctx: &SagaContext) -> Result<StepOutput, StepError> {
        let campaign_id: CampaignId = required(ctx, keys::CAMPAIGN_ID)?;
        let recipients: Vec<String> = required(ctx, keys::RECIPIENTS)?;

        let record_id = self
            .analytics
            .create(&campaign_id, recipients.len())
            .await?;
        debug!(campaign = %campaign_id, record = %record_id, "created analytics record");
        ctx.set(keys::ANALYTICS_ID, record_id.as_str());
        Ok(output(keys::ANALYTICS_ID, &record_id))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), StepError> {
        let record_id: String = required(ctx, keys::ANALYTICS_ID)?;
        debug!(record = %record_id, "deleting analytics record");
        self.analytics.delete(&record_id).await?;
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "delete the analytics record".to_string()
    }

    fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }
}
