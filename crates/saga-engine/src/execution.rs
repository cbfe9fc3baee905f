use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::{SagaContext, SagaId};
use crate::step::StepOutput;

/// Status of a single step within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StepStatus {
    /// Not attempted yet.
    Pending,
    /// An attempt is running or waiting for its next retry.
    Executing,
    Completed,
    /// Every allowed attempt failed.
    Failed,
    /// Compensation is running, or ran and failed.
    Compensating,
    Compensated,
}

/// Status of a saga execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SagaStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Compensating,
    Compensated,
}

impl SagaStatus {
    /// `completed` and `compensated` end a saga.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Compensated)
    }

    /// Whether the saga is in flight, as reported by `list_active_sagas`.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::InProgress | Self::Compensating)
    }
}

impl fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Compensating => "compensating",
            Self::Compensated => "compensated",
        };
        f.write_str(label)
    }
}

/// Runtime record of one step.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    /// Output of the successful forward action.
    pub result: Option<StepOutput>,
    /// Failure of the forward action, rendered with its cause chain.
    pub error: Option<String>,
    /// Failure of the compensation, if it ran and failed.
    pub compensation_error: Option<String>,
    pub attempts: u32,
    pub max_retries: u32,
    pub timeout: Duration,
    pub compensation_description: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    pub(crate) fn new(
        name: &str,
        max_retries: u32,
        timeout: Duration,
        compensation_description: String,
    ) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Pending,
            result: None,
            error: None,
            compensation_error: None,
            attempts: 0,
            max_retries,
            timeout,
            compensation_description,
            started_at: None,
            completed_at: None,
        }
    }
}

/// Record of one saga run.
#[derive(Debug, Clone)]
pub struct SagaExecution {
    pub saga_id: SagaId,
    pub saga_name: String,
    pub status: SagaStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
    pub context: SagaContext,
    /// Why the saga stopped making forward progress.
    pub error: Option<String>,
    /// Set when the terminal record could not be written to the store.
    pub persist_error: Option<String>,
}

impl SagaExecution {
    /// Copy of this execution whose context no longer shares data with the
    /// running saga.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            context: self.context.detached(),
            ..self.clone()
        }
    }

    pub(crate) fn new(saga_name: &str, context: SagaContext, steps: Vec<StepRecord>) -> Self {
        Self {
            saga_id: context.saga_id().clone(),
            saga_name: saga_name.to_string(),
            status: SagaStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            steps,
            context,
            error: None,
            persist_error: None,
        }
    }

    /// Look up a step record by name.
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|record| record.name == name)
    }

    pub(crate) fn record_attempt(&mut self, index: usize, attempt: u32) {
        if let Some(record) = self.steps.get_mut(index) {
            if record.started_at.is_none() {
                record.started_at = Some(Utc::now());
            }
            record.status = StepStatus::Executing;
            record.attempts = attempt;
        }
    }

    pub(crate) fn record_success(&mut self, index: usize, output: StepOutput) {
        if let Some(record) = self.steps.get_mut(index) {
            record.status = StepStatus::Completed;
            record.result = Some(output);
            record.completed_at = Some(Utc::now());
        }
    }

    pub(crate) fn record_failure(&mut self, index: usize, error: String) {
        if let Some(record) = self.steps.get_mut(index) {
            record.status = StepStatus::Failed;
            record.error = Some(error);
            record.completed_at = Some(Utc::now());
        }
    }

    pub(crate) fn record_compensating(&mut self, index: usize) {
        if let Some(record) = self.steps.get_mut(index) {
            record.status = StepStatus::Compensating;
        }
    }

    pub(crate) fn record_compensated(&mut self, index: usize) {
        if let Some(record) = self.steps.get_mut(index) {
            record.status = StepStatus::Compensated;
            record.completed_at = Some(Utc::now());
        }
    }

    pub(crate) fn record_compensation_failed(&mut self, index: usize, error: String) {
        if let Some(record) = self.steps.get_mut(index) {
            record.compensation_error = Some(error);
            record.completed_at = Some(Utc::now());
        }
    }

    pub(crate) fn finish(&mut self, status: SagaStatus) {
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    /// The structured record written to the execution store.
    #[must_use]
    pub fn to_record(&self) -> ExecutionRecord {
        ExecutionRecord {
            saga_id: self.saga_id.clone(),
            saga_name: self.saga_name.clone(),
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            steps: self
                .steps
                .iter()
                .map(|record| PersistedStep {
                    name: record.name.clone(),
                    status: record.status,
                    attempts: record.attempts,
                    error: record.error.clone(),
                    result: record.result.clone(),
                })
                .collect(),
            error: self.error.clone(),
        }
    }

    /// One line per step, for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.steps {
            let status = match record.status {
                StepStatus::Pending => "·",
                StepStatus::Executing => "…",
                StepStatus::Completed => "✓",
                StepStatus::Failed => "✗",
                StepStatus::Compensated => "↩",
                StepStatus::Compensating => "⚠",
            };
            lines.push(format!(
                "{status} {} (attempts: {})",
                record.name, record.attempts
            ));
        }
        lines.join("\n")
    }
}

/// Persisted shape of an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    #[serde(rename = "sagaID")]
    pub saga_id: SagaId,
    pub saga_name: String,
    pub status: SagaStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub steps: Vec<PersistedStep>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedStep {
    pub name: String,
    pub status: StepStatus,
    pub attempts: u32,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StepOutput>,
}
