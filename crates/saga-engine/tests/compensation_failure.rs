//! Integration tests for best-effort compensation.

mod common;

use std::time::Duration;

use common::{FailingCompensationStep, FailingStep, TrackedStep, entries, new_log, orchestrator};
use saga_engine::{FnStep, SagaBuilder, SagaStatus, StepOutput, StepStatus};

#[tokio::test(start_paused = true)]
async fn failing_compensation_does_not_stop_earlier_compensations() -> anyhow::Result<()> {
    let (orchestrator, _store) = orchestrator();
    let log = new_log();
    let saga = SagaBuilder::new("best_effort")
        .first_step(TrackedStep { name: "step_a", log: log.clone() })
        .then(FailingCompensationStep { name: "step_b", log: log.clone() })
        .then(TrackedStep { name: "step_c", log: log.clone() })
        .then(FailingStep { name: "step_d", log: log.clone(), max_retries: 1 })
        .build()?;

    let execution = orchestrator.execute_saga(&saga).await;

    assert_eq!(execution.status, SagaStatus::Compensated);
    assert_eq!(
        entries(&log),
        vec![
            "execute step_a",
            "execute step_b",
            "execute step_c",
            "execute step_d",
            "compensate step_c",
            "failed to compensate step_b",
            "compensate step_a",
        ]
    );

    let step_b = execution.step("step_b").expect("step_b recorded");
    assert_eq!(step_b.status, StepStatus::Compensating);
    assert_eq!(
        step_b.compensation_error.as_deref(),
        Some("compensation failed for step 'step_b': roll back step_b: cannot undo step_b")
    );
    assert_eq!(
        execution.step("step_a").map(|s| s.status),
        Some(StepStatus::Compensated)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn every_compensation_failing_still_ends_compensated() -> anyhow::Result<()> {
    let (orchestrator, _store) = orchestrator();
    let log = new_log();
    let saga = SagaBuilder::new("all_fail")
        .first_step(FailingCompensationStep { name: "step_a", log: log.clone() })
        .then(FailingCompensationStep { name: "step_b", log: log.clone() })
        .then(FailingStep { name: "step_c", log: log.clone(), max_retries: 1 })
        .build()?;

    let execution = orchestrator.execute_saga(&saga).await;

    assert_eq!(execution.status, SagaStatus::Compensated);
    assert_eq!(
        entries(&log),
        vec![
            "execute step_a",
            "execute step_b",
            "execute step_c",
            "failed to compensate step_b",
            "failed to compensate step_a",
        ]
    );
    // the saga error names the forward failure, not the compensations
    assert!(
        execution
            .error
            .as_deref()
            .is_some_and(|e| e.contains("step 'step_c'"))
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hanging_compensation_times_out_and_rollback_continues() -> anyhow::Result<()> {
    let (orchestrator, _store) = orchestrator();
    let log = new_log();
    let hanging = FnStep::new("hanging", |_ctx| async { Ok(StepOutput::new()) })
        .with_compensation(|_ctx| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        })
        .with_timeout(Duration::from_millis(100));
    let saga = SagaBuilder::new("hanging_rollback")
        .first_step(TrackedStep { name: "step_a", log: log.clone() })
        .then(hanging)
        .then(FailingStep { name: "step_c", log: log.clone(), max_retries: 1 })
        .build()?;

    let execution = orchestrator.execute_saga(&saga).await;

    assert_eq!(execution.status, SagaStatus::Compensated);
    assert!(entries(&log).contains(&"compensate step_a".to_string()));
    let hanging = execution.step("hanging").expect("hanging recorded");
    assert!(
        hanging
            .compensation_error
            .as_deref()
            .is_some_and(|e| e.contains("timed out after 100ms"))
    );
    Ok(())
}
