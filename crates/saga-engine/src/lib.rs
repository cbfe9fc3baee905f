//! Saga orchestration for business transactions spanning independent systems.
//!
//! A saga is an ordered list of steps, each with a forward action and a
//! compensating action. The orchestrator runs the steps one after another,
//! retrying failed or timed-out attempts with exponential backoff. When a
//! step runs out of attempts, every step that already completed is
//! compensated in reverse order and the saga ends `compensated`. The final
//! execution record is written once to an [`ExecutionStore`].

mod builder;
mod config;
mod context;
mod error;
mod execution;
mod orchestrator;
mod registry;
mod retry;
mod saga;
mod step;
mod store;

pub use builder::{Empty, HasSteps, SagaBuilder};
pub use config::{DEFAULT_KEY_PREFIX, OrchestratorConfig};
pub use context::{SagaContext, SagaId};
pub use error::{ConfigError, ContextError, SagaError, StepError, StoreError};
pub use execution::{
    ExecutionRecord, PersistedStep, SagaExecution, SagaStatus, StepRecord, StepStatus,
};
pub use orchestrator::SagaOrchestrator;
pub use registry::ExecutionRegistry;
pub use retry::RetryPolicy;
pub use saga::Saga;
pub use step::{FnStep, SagaStep, StepOutput};
pub use store::{ExecutionStore, InMemoryExecutionStore};
