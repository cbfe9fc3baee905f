use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::OrchestratorConfig;
use crate::context::{SagaContext, SagaId};
use crate::error::{SagaError, StepError, StoreError};
use crate::execution::{ExecutionRecord, SagaExecution, SagaStatus, StepRecord, StepStatus};
use crate::registry::ExecutionRegistry;
use crate::retry::{RetryPolicy, StepPolicy};
use crate::saga::Saga;
use crate::step::{SagaStep, StepOutput};
use crate::store::ExecutionStore;

/// What running one step with its retries produced.
#[derive(Debug)]
enum StepOutcome {
    Completed(StepOutput),
    /// Always `SagaError::RetriesExhausted`.
    Failed(SagaError),
}

/// Removes a saga's registry entry if its run is dropped before reaching a
/// terminal status, so abandoned runs are not reported as active.
struct InFlight {
    registry: ExecutionRegistry,
    saga_id: SagaId,
    finished: bool,
}

impl InFlight {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished && self.registry.remove(&self.saga_id).is_some() {
            warn!(saga_id = %self.saga_id, "saga run dropped before finishing, removed from registry");
        }
    }
}

/// Drives saga executions.
///
/// Steps of one saga run strictly in order. If a step exhausts its attempts,
/// every completed step is compensated in reverse order (LIFO) and the saga
/// ends `compensated`. The terminal record is written to the store once.
///
/// The orchestrator is cheap to clone and clones share the registry and the
/// store, so many sagas can be spawned concurrently from one instance.
///
/// Dropping an `execute_saga` future before it finishes removes that run
/// from the registry; no compensation runs for it.
///
/// Finished executions stay in the registry until [`forget`](Self::forget)
/// or [`prune_terminal`](Self::prune_terminal) is called, so a long-lived
/// orchestrator should prune periodically.
#[derive(Clone)]
pub struct SagaOrchestrator {
    config: Arc<OrchestratorConfig>,
    retry: RetryPolicy,
    store: Arc<dyn ExecutionStore>,
    registry: ExecutionRegistry,
}

impl SagaOrchestrator {
    #[must_use]
    pub fn new(config: OrchestratorConfig, store: Arc<dyn ExecutionStore>) -> Self {
        Self::with_registry(config, store, ExecutionRegistry::new())
    }

    #[must_use]
    pub fn with_registry(
        config: OrchestratorConfig,
        store: Arc<dyn ExecutionStore>,
        registry: ExecutionRegistry,
    ) -> Self {
        Self {
            retry: config.retry_policy(),
            config: Arc::new(config),
            store,
            registry,
        }
    }

    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ExecutionRegistry {
        &self.registry
    }

    /// Run a saga to a terminal status.
    ///
    /// Failures never surface as errors: inspect `status` and `error` on the
    /// returned execution.
    pub async fn execute_saga(&self, saga: &Saga) -> SagaExecution {
        self.execute_saga_with(saga, IndexMap::new()).await
    }

    /// Run a saga with its context seeded from `initial`.
    pub async fn execute_saga_with(
        &self,
        saga: &Saga,
        initial: IndexMap<String, Value>,
    ) -> SagaExecution {
        let context = SagaContext::with_data(SagaId::generate(), initial);
        let records = saga
            .steps()
            .iter()
            .map(|step| {
                let policy = self.policy_for(step.as_ref());
                StepRecord::new(
                    step.name(),
                    policy.max_retries,
                    policy.timeout,
                    step.compensation_description(),
                )
            })
            .collect();
        let mut execution = SagaExecution::new(saga.name(), context.clone(), records);
        self.registry.publish(&execution);
        let in_flight = InFlight {
            registry: self.registry.clone(),
            saga_id: execution.saga_id.clone(),
            finished: false,
        };

        execution.status = SagaStatus::InProgress;
        self.registry.publish(&execution);
        info!(
            saga_id = %execution.saga_id,
            saga = saga.name(),
            steps = saga.len(),
            "saga started"
        );

        let mut failure = None;
        for (index, step) in saga.steps().iter().enumerate() {
            match self
                .run_step(&mut execution, index, step.as_ref(), &context)
                .await
            {
                StepOutcome::Completed(output) => {
                    execution.record_success(index, output);
                    context.mark_completed(step.name());
                    self.registry.publish(&execution);
                    debug!(saga_id = %execution.saga_id, step = step.name(), "step completed");
                }
                StepOutcome::Failed(error) => {
                    failure = Some((index, error));
                    break;
                }
            }
        }

        match failure {
            None => execution.finish(SagaStatus::Completed),
            Some((index, error)) => {
                let message = error.report();
                warn!(saga_id = %execution.saga_id, error = %message, "saga failed, compensating");
                execution.record_failure(index, message.clone());
                execution.error = Some(message);
                execution.status = SagaStatus::Failed;
                self.registry.publish(&execution);

                self.compensate(&mut execution, saga, &context).await;
                execution.finish(SagaStatus::Compensated);
            }
        }

        self.persist(&mut execution).await;
        self.registry.publish(&execution);
        in_flight.finish();
        info!(
            saga_id = %execution.saga_id,
            saga = saga.name(),
            status = %execution.status,
            "saga finished"
        );
        execution
    }

    /// Latest snapshot of an execution known to this orchestrator.
    #[must_use]
    pub fn get_execution(&self, saga_id: &SagaId) -> Option<SagaExecution> {
        self.registry.get(saga_id)
    }

    /// Executions currently `in_progress` or `compensating`.
    #[must_use]
    pub fn list_active_sagas(&self) -> Vec<SagaExecution> {
        self.registry.active()
    }

    /// Drop a finished execution from the registry. The persisted record is kept.
    pub fn forget(&self, saga_id: &SagaId) -> Option<SagaExecution> {
        self.registry.remove(saga_id)
    }

    /// Drop every finished execution from the registry.
    pub fn prune_terminal(&self) -> usize {
        self.registry.prune_terminal()
    }

    /// Read a persisted record back from the store.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::Store` if the store fails or the record is malformed.
    pub async fn load_record(&self, saga_id: &SagaId) -> Result<Option<ExecutionRecord>, SagaError> {
        let key = self.config.record_key(saga_id.as_str());
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let record = serde_json::from_str(&raw)
            .map_err(|source| StoreError::Decode { key, source })?;
        Ok(Some(record))
    }

    fn policy_for(&self, step: &dyn SagaStep) -> StepPolicy {
        StepPolicy::resolve(
            step.max_retries(),
            step.timeout(),
            self.config.default_max_retries(),
            self.config.default_timeout(),
        )
    }

    async fn run_step(
        &self,
        execution: &mut SagaExecution,
        index: usize,
        step: &dyn SagaStep,
        ctx: &SagaContext,
    ) -> StepOutcome {
        let policy = self.policy_for(step);
        let mut attempt = 0;

        loop {
            attempt += 1;
            execution.record_attempt(index, attempt);
            self.registry.publish(execution);
            debug!(
                saga_id = %execution.saga_id,
                step = step.name(),
                attempt,
                max_retries = policy.max_retries,
                "attempting step"
            );

            let error = match tokio::time::timeout(policy.timeout, step.execute(ctx)).await {
                Ok(Ok(output)) => return StepOutcome::Completed(output),
                Ok(Err(source)) => SagaError::StepExecution {
                    step: step.name().to_string(),
                    attempt,
                    source,
                },
                Err(_) => SagaError::StepTimeout {
                    step: step.name().to_string(),
                    attempt,
                    timeout: policy.timeout,
                },
            };
            warn!(
                saga_id = %execution.saga_id,
                step = step.name(),
                attempt,
                error = %error.report(),
                "step attempt failed"
            );

            if attempt >= policy.max_retries {
                return StepOutcome::Failed(SagaError::RetriesExhausted {
                    step: step.name().to_string(),
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = self.retry.delay_for(attempt - 1);
            debug!(
                saga_id = %execution.saga_id,
                step = step.name(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "backing off before retry"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn compensate(&self, execution: &mut SagaExecution, saga: &Saga, ctx: &SagaContext) {
        execution.status = SagaStatus::Compensating;
        self.registry.publish(execution);

        for (index, step) in saga.steps().iter().enumerate().rev() {
            if execution.steps[index].status != StepStatus::Completed {
                continue;
            }
            execution.record_compensating(index);
            self.registry.publish(execution);

            let timeout = execution.steps[index].timeout;
            let result = match tokio::time::timeout(timeout, step.compensate(ctx)).await {
                Ok(result) => result,
                Err(_) => Err(StepError::new(format!("timed out after {timeout:?}"))),
            };

            match result {
                Ok(()) => {
                    execution.record_compensated(index);
                    debug!(saga_id = %execution.saga_id, step = step.name(), "step compensated");
                }
                Err(source) => {
                    let failure = SagaError::CompensationFailure {
                        step: step.name().to_string(),
                        description: step.compensation_description(),
                        source,
                    };
                    let message = failure.report();
                    warn!(saga_id = %execution.saga_id, error = %message, "compensation failed");
                    execution.record_compensation_failed(index, message);
                }
            }
            self.registry.publish(execution);
        }
    }

    async fn persist(&self, execution: &mut SagaExecution) {
        let key = self.config.record_key(execution.saga_id.as_str());
        let result = match serde_json::to_string(&execution.to_record()) {
            Ok(json) => self
                .store
                .put(&key, json, self.config.retention())
                .await
                .map_err(SagaError::from),
            Err(source) => Err(SagaError::Store(StoreError::Encode(source))),
        };

        if let Err(err) = result {
            let message = err.report();
            error!(saga_id = %execution.saga_id, key = %key, error = %message, "failed to persist saga execution");
            execution.persist_error = Some(message);
        }
    }
}
