use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::SagaContext;
use crate::error::StepError;

/// Values a forward action reports back. Stored as the step's `result` and
/// embedded in the persisted execution record.
pub type StepOutput = Map<String, Value>;

/// A step in a saga that can be executed and compensated.
///
/// Actions may be attempted more than once: the orchestrator retries failed
/// and timed-out attempts, so implementations must be idempotent or safe to
/// repeat.
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// Name used in the execution record and logs. Unique within a saga.
    fn name(&self) -> &str;

    /// Run the forward action.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt failed. The orchestrator decides
    /// whether to retry.
    async fn execute(&self, ctx: &SagaContext) -> Result<StepOutput, StepError>;

    /// Undo the forward action's effects.
    ///
    /// Called at most once, and only after `execute` succeeded. The default
    /// implementation is a no-op, suitable for read-only steps.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails. The failure is logged and the
    /// remaining compensations still run.
    async fn compensate(&self, ctx: &SagaContext) -> Result<(), StepError> {
        let _ = ctx;
        Ok(())
    }

    /// Human-readable description of what compensation will do.
    fn compensation_description(&self) -> String {
        format!("undo {}", self.name())
    }

    /// Total attempts allowed for this step. `None` uses the orchestrator default.
    fn max_retries(&self) -> Option<u32> {
        None
    }

    /// Time budget for a single attempt. `None` uses the orchestrator default.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
type ActionFn = Arc<dyn Fn(SagaContext) -> BoxFuture<Result<StepOutput, StepError>> + Send + Sync>;
type CompensationFn = Arc<dyn Fn(SagaContext) -> BoxFuture<Result<(), StepError>> + Send + Sync>;

/// A step assembled from closures.
///
/// ```
/// use saga_engine::{FnStep, StepOutput};
///
/// let step = FnStep::new("reserve_credits", |ctx| async move {
///     ctx.set("reservation_id", "r-1");
///     Ok(StepOutput::new())
/// })
/// .with_compensation(|ctx| async move {
///     let _ = ctx.remove("reservation_id");
///     Ok(())
/// })
/// .with_max_retries(3);
/// # let _ = step;
/// ```
#[derive(Clone)]
pub struct FnStep {
    name: String,
    action: ActionFn,
    compensation: Option<CompensationFn>,
    description: Option<String>,
    max_retries: Option<u32>,
    timeout: Option<Duration>,
}

impl FnStep {
    pub fn new<F, Fut>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(SagaContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StepOutput, StepError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            action: Arc::new(move |ctx| Box::pin(action(ctx))),
            compensation: None,
            description: None,
            max_retries: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_compensation<F, Fut>(mut self, compensation: F) -> Self
    where
        F: Fn(SagaContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), StepError>> + Send + 'static,
    {
        self.compensation = Some(Arc::new(move |ctx| Box::pin(compensation(ctx))));
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("has_compensation", &self.compensation.is_some())
            .field("max_retries", &self.max_retries)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SagaStep for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &SagaContext) -> Result<StepOutput, StepError> {
        (self.action)(ctx.clone()).await
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), StepError> {
        match &self.compensation {
            Some(compensation) => compensation(ctx.clone()).await,
            None => Ok(()),
        }
    }

    fn compensation_description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("undo {}", self.name))
    }

    fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SagaId;

    struct ReadOnlyStep;

    #[async_trait]
    impl SagaStep for ReadOnlyStep {
        fn name(&self) -> &str {
            "read_only"
        }

        async fn execute(&self, _ctx: &SagaContext) -> Result<StepOutput, StepError> {
            Ok(StepOutput::new())
        }
    }

    #[tokio::test]
    async fn default_compensation_is_noop() {
        let ctx = SagaContext::new(SagaId::from("saga-1"));

        assert!(ReadOnlyStep.compensate(&ctx).await.is_ok());
        assert_eq!(ReadOnlyStep.compensation_description(), "undo read_only");
        assert_eq!(ReadOnlyStep.max_retries(), None);
        assert_eq!(ReadOnlyStep.timeout(), None);
    }

    #[tokio::test]
    async fn fn_step_runs_action_and_compensation_against_context() -> anyhow::Result<()> {
        let ctx = SagaContext::new(SagaId::from("saga-1"));
        let step = FnStep::new("reserve", |ctx| async move {
            ctx.set("reservation_id", "r-1");
            let mut output = StepOutput::new();
            output.insert("reservation_id".to_string(), Value::from("r-1"));
            Ok(output)
        })
        .with_compensation(|ctx| async move {
            ctx.set("released", true);
            Ok(())
        })
        .with_description("release reservation");

        let output = step.execute(&ctx).await?;
        step.compensate(&ctx).await?;

        assert_eq!(output.get("reservation_id"), Some(&Value::from("r-1")));
        assert_eq!(ctx.value("released"), Some(Value::Bool(true)));
        assert_eq!(step.compensation_description(), "release reservation");
        Ok(())
    }

    #[tokio::test]
    async fn fn_step_without_compensation_succeeds_on_compensate() {
        let ctx = SagaContext::new(SagaId::from("saga-1"));
        let step = FnStep::new("noop", |_ctx| async { Ok(StepOutput::new()) })
            .with_max_retries(5)
            .with_timeout(Duration::from_secs(2));

        assert!(step.compensate(&ctx).await.is_ok());
        assert_eq!(step.max_retries(), Some(5));
        assert_eq!(step.timeout(), Some(Duration::from_secs(2)));
    }
}
