use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::context::SagaId;
use crate::execution::SagaExecution;

/// Snapshots of the executions an orchestrator knows about.
///
/// Cheap to clone; clones share the same map. Locks are only held for the
/// duration of a map operation, never across an `.await`. Every stored and
/// returned execution carries a detached context, so readers cannot write
/// into a running saga or into each other's copies.
#[derive(Debug, Clone, Default)]
pub struct ExecutionRegistry {
    executions: Arc<RwLock<HashMap<SagaId, SagaExecution>>>,
}

impl ExecutionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot for `execution.saga_id`.
    pub fn publish(&self, execution: &SagaExecution) {
        let snapshot = execution.snapshot();
        self.executions
            .write()
            .insert(execution.saga_id.clone(), snapshot);
    }

    #[must_use]
    pub fn get(&self, saga_id: &SagaId) -> Option<SagaExecution> {
        self.executions.read().get(saga_id).map(SagaExecution::snapshot)
    }

    /// Executions in `in_progress` or `compensating`, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<SagaExecution> {
        let mut active: Vec<SagaExecution> = self
            .executions
            .read()
            .values()
            .filter(|execution| execution.status.is_active())
            .map(SagaExecution::snapshot)
            .collect();
        active.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.saga_id.cmp(&b.saga_id))
        });
        active
    }

    pub fn remove(&self, saga_id: &SagaId) -> Option<SagaExecution> {
        self.executions.write().remove(saga_id)
    }

    /// Drop every terminal execution, returning how many were removed.
    pub fn prune_terminal(&self) -> usize {
        let mut executions = self.executions.write();
        let before = executions.len();
        executions.retain(|_, execution| !execution.status.is_terminal());
        before - executions.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.executions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executions.read().is_empty()
    }
}
