//! Integration tests for the retry boundary and exponential backoff.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{FailingStep, new_log, orchestrator, orchestrator_with};
use saga_engine::{
    FnStep, OrchestratorConfig, SagaBuilder, SagaContext, SagaStatus, SagaStep, StepError,
    StepOutput, StepStatus,
};
use tokio::time::Instant;

/// Always fails and remembers when each attempt started.
struct TimestampedFailure {
    attempts: Arc<Mutex<Vec<Instant>>>,
    max_retries: u32,
}

#[async_trait]
impl SagaStep for TimestampedFailure {
    fn name(&self) -> &str {
        "timestamped"
    }

    async fn execute(&self, _ctx: &SagaContext) -> Result<StepOutput, StepError> {
        self.attempts.lock().expect("attempts lock").push(Instant::now());
        Err(StepError::new("still failing"))
    }

    fn max_retries(&self) -> Option<u32> {
        Some(self.max_retries)
    }
}

#[tokio::test(start_paused = true)]
async fn always_failing_step_is_attempted_exactly_max_retries_times() -> anyhow::Result<()> {
    for max_retries in [1, 2, 3, 5] {
        let (orchestrator, _store) = orchestrator();
        let log = new_log();
        let saga = SagaBuilder::new("boundary")
            .first_step(FailingStep { name: "failing", log: log.clone(), max_retries })
            .build()?;

        let execution = orchestrator.execute_saga(&saga).await;

        let attempts = log.lock().expect("log lock").len();
        assert_eq!(attempts, usize::try_from(max_retries)?, "max_retries = {max_retries}");
        let record = execution.step("failing").expect("failing recorded");
        assert_eq!(record.attempts, max_retries);
        assert_eq!(record.max_retries, max_retries);
        assert_eq!(record.status, StepStatus::Failed);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn delay_before_each_retry_doubles() -> anyhow::Result<()> {
    let base = Duration::from_millis(100);
    let (orchestrator, _store) =
        orchestrator_with(OrchestratorConfig::default().with_base_delay(base));
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let saga = SagaBuilder::new("backoff")
        .first_step(TimestampedFailure {
            attempts: Arc::clone(&attempts),
            max_retries: 4,
        })
        .build()?;

    orchestrator.execute_saga(&saga).await;

    let attempts = attempts.lock().expect("attempts lock").clone();
    assert_eq!(attempts.len(), 4);
    let gaps: Vec<Duration> = attempts.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(
        gaps,
        vec![
            base,     // before attempt 2: base * 2^0
            base * 2, // before attempt 3: base * 2^1
            base * 4, // before attempt 4: base * 2^2
        ]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn backoff_respects_max_delay() -> anyhow::Result<()> {
    let (orchestrator, _store) = orchestrator_with(
        OrchestratorConfig::default()
            .with_base_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3)),
    );
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let saga = SagaBuilder::new("capped")
        .first_step(TimestampedFailure {
            attempts: Arc::clone(&attempts),
            max_retries: 4,
        })
        .build()?;

    orchestrator.execute_saga(&saga).await;

    let attempts = attempts.lock().expect("attempts lock").clone();
    let gaps: Vec<Duration> = attempts.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(3),
        ]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn timeouts_are_retried_like_failures() -> anyhow::Result<()> {
    let (orchestrator, _store) = orchestrator();
    let calls = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&calls);
    let slow_then_fast = FnStep::new("slow_then_fast", move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            let call = {
                let mut calls = counter.lock().expect("calls lock");
                *calls += 1;
                *calls
            };
            if call == 1 {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(StepOutput::new())
        }
    })
    .with_timeout(Duration::from_millis(500))
    .with_max_retries(3);
    let saga = SagaBuilder::new("timeout_retry").first_step(slow_then_fast).build()?;

    let execution = orchestrator.execute_saga(&saga).await;

    assert_eq!(execution.status, SagaStatus::Completed);
    assert_eq!(execution.steps[0].attempts, 2);
    assert_eq!(*calls.lock().expect("calls lock"), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn step_default_retries_come_from_config() -> anyhow::Result<()> {
    let (orchestrator, _store) =
        orchestrator_with(OrchestratorConfig::default().with_default_max_retries(4));
    let calls = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&calls);
    let failing = FnStep::new("uses_default", move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            *counter.lock().expect("calls lock") += 1;
            Err(StepError::new("nope"))
        }
    });
    let saga = SagaBuilder::new("defaults").first_step(failing).build()?;

    let execution = orchestrator.execute_saga(&saga).await;

    assert_eq!(*calls.lock().expect("calls lock"), 4);
    assert_eq!(execution.steps[0].max_retries, 4);
    Ok(())
}
