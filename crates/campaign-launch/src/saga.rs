use std::sync::Arc;

use saga_engine::{Saga, SagaBuilder, SagaError, SagaExecution, SagaOrchestrator};
use tracing::info;

use crate::steps::{
    CreateAnalyticsStep, EnqueueEmailsStep, ReserveCreditsStep, UpdateCampaignStatusStep,
};
use crate::traits::{AnalyticsSink, CampaignStatusStore, CreditLedger, MessageQueue};
use crate::types::LaunchRequest;

pub const SAGA_NAME: &str = "campaign_launch";

/// Collaborators the launch saga talks to.
pub struct CampaignServices<L, Q, S, A> {
    pub ledger: Arc<L>,
    pub queue: Arc<Q>,
    pub statuses: Arc<S>,
    pub analytics: Arc<A>,
    /// Attempt budget applied to every step. `None` uses the orchestrator default.
    pub max_retries: Option<u32>,
}

impl<L, Q, S, A> CampaignServices<L, Q, S, A> {
    #[must_use]
    pub fn new(ledger: Arc<L>, queue: Arc<Q>, statuses: Arc<S>, analytics: Arc<A>) -> Self {
        Self {
            ledger,
            queue,
            statuses,
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

/// Assemble `reserve_credits → enqueue_emails → update_campaign_status →
/// create_analytics`.
///
/// # Errors
///
/// Returns an error if the saga definition is invalid.
pub fn campaign_launch_saga<L, Q, S, A>(
    services: &CampaignServices<L, Q, S, A>,
) -> Result<Saga, SagaError>
where
    L: CreditLedger + 'static,
    Q: MessageQueue + 'static,
    S: CampaignStatusStore + 'static,
    A: AnalyticsSink + 'static,
{
    let mut reserve = ReserveCreditsStep::new(Arc::clone(&services.ledger));
    let mut enqueue = EnqueueEmailsStep::new(Arc::clone(&services.queue));
    let mut status = UpdateCampaignStatusStep::new(Arc::clone(&services.statuses));
    let mut analytics = CreateAnalyticsStep::new(Arc::clone(&services.analytics));
    if let Some(max_retries) = services.max_retries {
        reserve = reserve.with_max_retries(max_retries);
        enqueue = enqueue.with_max_retries(max_retries);
        status = status.with_max_retries(max_retries);
        analytics = analytics.with_max_retries(max_retries);
    }

    SagaBuilder::new(SAGA_NAME)
        .first_step(reserve)
        .then(enqueue)
        .then(status)
        .then(analytics)
        .build()
}

/// Run the launch saga for one request.
///
/// # Errors
///
/// Returns an error only if the saga cannot be assembled. Step failures are
/// reported through the returned execution.
pub async fn launch_campaign<L, Q, S, A>(
    orchestrator: &SagaOrchestrator,
    services: &CampaignServices<L, Q, S, A>,
    request: &LaunchRequest,
) -> Result<SagaExecution, SagaError>
where
    L: CreditLedger + 'static,
    Q: MessageQueue + 'static,
    S: CampaignStatusStore + 'static,
    A: AnalyticsSink + 'static,
{
    let saga = campaign_launch_saga(services)?;
    info!(
        campaign = %request.campaign_id,
        recipients = request.recipients.len(),
        credits = request.credits,
        "launching campaign"
    );
    Ok(orchestrator
        .execute_saga_with(&saga, request.to_context())
        .await)
}
