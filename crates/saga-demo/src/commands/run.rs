use std::sync::Arc;

use campaign_launch::providers::{
    InMemoryAnalyticsSink, InMemoryCampaignStatusStore, InMemoryCreditLedger, InMemoryMessageQueue,
};
use campaign_launch::{CampaignId, CampaignServices, CampaignStatus, LaunchRequest, launch_campaign};
use clap::{Args, ValueEnum};
use saga_engine::{
    InMemoryExecutionStore, OrchestratorConfig, SagaExecution, SagaOrchestrator, SagaStatus,
};
use tracing::info;

use crate::error::{CliError, Result};

type DemoServices = CampaignServices<
    InMemoryCreditLedger,
    InMemoryMessageQueue,
    InMemoryCampaignStatusStore,
    InMemoryAnalyticsSink,
>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum FailStep {
    ReserveCredits,
    EnqueueEmails,
    UpdateCampaignStatus,
    CreateAnalytics,
}

#[derive(Args)]
pub(crate) struct RunArgs {
    /// Campaign to launch
    #[arg(long, default_value = "demo-campaign")]
    campaign: String,

    /// Number of generated recipients
    #[arg(long, default_value_t = 3)]
    recipients: usize,

    /// Credits available in the ledger before the launch
    #[arg(long, default_value_t = 1000)]
    balance: u64,

    /// Make a step's system unavailable
    #[arg(long, value_enum)]
    fail_step: Option<FailStep>,

    /// Fail only the first N calls of --fail-step (default: every call)
    #[arg(long, requires = "fail_step")]
    fail_times: Option<u32>,

    /// Attempts per step (default: from config)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Print the persisted execution record as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) fn run(args: RunArgs, config: OrchestratorConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let services = build_services(&args);
    let request = LaunchRequest::new(
        CampaignId::new(args.campaign.clone()),
        (1..=args.recipients)
            .map(|i| format!("recipient-{i}@example.com"))
            .collect(),
    );
    let orchestrator = SagaOrchestrator::new(config, Arc::new(InMemoryExecutionStore::new()));

    let execution = runtime.block_on(launch_campaign(&orchestrator, &services, &request))?;
    info!(
        saga_id = %execution.saga_id,
        status = %execution.status,
        "campaign launch finished"
    );

    if args.json {
        let record = runtime
            .block_on(orchestrator.load_record(&execution.saga_id))
            .map_err(CliError::LoadRecord)?
            .ok_or_else(|| CliError::RecordMissing {
                saga_id: execution.saga_id.to_string(),
            })?;
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_execution(&execution);
    }

    if execution.status == SagaStatus::Completed {
        Ok(())
    } else {
        Err(CliError::NotCompleted {
            status: execution.status,
        })
    }
}

fn build_services(args: &RunArgs) -> DemoServices {
    let campaign_id = CampaignId::new(args.campaign.clone());
    let mut services = CampaignServices::new(
        Arc::new(InMemoryCreditLedger::new(args.balance)),
        Arc::new(InMemoryMessageQueue::new()),
        Arc::new(InMemoryCampaignStatusStore::new().with_status(campaign_id, CampaignStatus::Scheduled)),
        Arc::new(InMemoryAnalyticsSink::new()),
    );
    if let Some(max_retries) = args.max_retries {
        services = services.with_max_retries(max_retries);
    }

    if let Some(step) = args.fail_step {
        let faults = match step {
            FailStep::ReserveCredits => services.ledger.reserve_faults(),
            FailStep::EnqueueEmails => services.queue.enqueue_faults(),
            FailStep::UpdateCampaignStatus => services.statuses.set_faults(),
            FailStep::CreateAnalytics => services.analytics.create_faults(),
        };
        match args.fail_times {
            Some(times) => faults.fail_times(times),
            None => faults.fail_always(),
        }
    }
    services
}

fn print_execution(execution: &SagaExecution) {
    println!("Saga: {} ({})", execution.saga_name, execution.saga_id);
    println!("Status: {}", execution.status);
    println!();
    println!("{}", execution.summary());

    if let Some(error) = &execution.error {
        println!();
        println!("Error: {error}");
    }
    for step in &execution.steps {
        if let Some(error) = &step.compensation_error {
            println!("Compensation error ({}): {error}", step.name);
        }
    }
}
