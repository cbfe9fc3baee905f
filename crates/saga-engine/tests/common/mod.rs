#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use saga_engine::{
    InMemoryExecutionStore, OrchestratorConfig, SagaContext, SagaOrchestrator, SagaStep,
    StepError, StepOutput,
};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().expect("log lock").clone()
}

fn push(log: &Log, entry: String) {
    log.lock().expect("log lock").push(entry);
}

pub fn orchestrator_with(config: OrchestratorConfig) -> (SagaOrchestrator, Arc<InMemoryExecutionStore>) {
    let store = Arc::new(InMemoryExecutionStore::new());
    (SagaOrchestrator::new(config, store.clone()), store)
}

pub fn orchestrator() -> (SagaOrchestrator, Arc<InMemoryExecutionStore>) {
    orchestrator_with(
        OrchestratorConfig::default()
            .with_base_delay(Duration::from_millis(10))
            .with_default_timeout(Duration::from_secs(5)),
    )
}

/// Succeeds and logs every execution and compensation.
pub struct TrackedStep {
    pub name: &'static str,
    pub log: Log,
}

#[async_trait]
impl SagaStep for TrackedStep {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, _ctx: &SagaContext) -> Result<StepOutput, StepError> {
        push(&self.log, format!("execute {}", self.name));
        Ok(StepOutput::new())
    }

    async fn compensate(&self, _ctx: &SagaContext) -> Result<(), StepError> {
        push(&self.log, format!("compensate {}", self.name));
        Ok(())
    }
}

/// Fails on every attempt.
pub struct FailingStep {
    pub name: &'static str,
    pub log: Log,
    pub max_retries: u32,
}

#[async_trait]
impl SagaStep for FailingStep {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, _ctx: &SagaContext) -> Result<StepOutput, StepError> {
        push(&self.log, format!("execute {}", self.name));
        Err(StepError::new(format!("{} is unavailable", self.name)))
    }

    async fn compensate(&self, _ctx: &SagaContext) -> Result<(), StepError> {
        push(&self.log, format!("compensate {}", self.name));
        Ok(())
    }

    fn max_retries(&self) -> Option<u32> {
        Some(self.max_retries)
    }
}

/// Succeeds forward, fails to compensate.
pub struct FailingCompensationStep {
    pub name: &'static str,
    pub log: Log,
}

#[async_trait]
impl SagaStep for FailingCompensationStep {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, _ctx: &SagaContext) -> Result<StepOutput, StepError> {
        push(&self.log, format!("execute {}", self.name));
        Ok(StepOutput::new())
    }

    async fn compensate(&self, _ctx: &SagaContext) -> Result<(), StepError> {
        push(&self.log, format!("failed to compensate {}", self.name));
        Err(StepError::new(format!("cannot undo {}", self.name)))
    }

    fn compensation_description(&self) -> String {
        format!("roll back {}", self.name)
    }
}
