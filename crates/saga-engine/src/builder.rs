use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::SagaError;
use crate::saga::Saga;
use crate::step::SagaStep;

/// Marker type for a builder with no steps.
pub struct Empty;

/// Marker type for a builder with at least one step.
pub struct HasSteps;

/// Type-state builder for sagas.
///
/// `build()` only exists once `first_step()` was called, so an empty saga
/// cannot be constructed:
///
/// ```compile_fail
/// use saga_engine::SagaBuilder;
///
/// let saga = SagaBuilder::new("empty").build();
/// ```
pub struct SagaBuilder<State> {
    name: String,
    steps: Vec<Arc<dyn SagaStep>>,
    _state: PhantomData<State>,
}

impl SagaBuilder<Empty> {
    /// Create a new saga builder in the empty state.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            _state: PhantomData,
        }
    }

    /// Add the first step to the saga.
    #[must_use]
    pub fn first_step<S>(self, step: S) -> SagaBuilder<HasSteps>
    where
        S: SagaStep + 'static,
    {
        self.first_shared(Arc::new(step))
    }

    /// Add the first step from an already shared definition.
    #[must_use]
    pub fn first_shared(self, step: Arc<dyn SagaStep>) -> SagaBuilder<HasSteps> {
        let mut steps = self.steps;
        steps.push(step);
        SagaBuilder {
            name: self.name,
            steps,
            _state: PhantomData,
        }
    }
}

impl SagaBuilder<HasSteps> {
    /// Append a step. Steps run in the order they are added.
    #[must_use]
    pub fn then<S>(self, step: S) -> Self
    where
        S: SagaStep + 'static,
    {
        self.then_shared(Arc::new(step))
    }

    #[must_use]
    pub fn then_shared(mut self, step: Arc<dyn SagaStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Build the saga from the accumulated steps.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::DuplicateStep` if two steps share a name.
    pub fn build(self) -> Result<Saga, SagaError> {
        let duplicate = {
            let mut seen = HashSet::new();
            self.steps
                .iter()
                .find(|step| !seen.insert(step.name()))
                .map(|step| step.name().to_string())
        };
        if let Some(name) = duplicate {
            return Err(SagaError::DuplicateStep { name });
        }
        Ok(Saga::from_steps(self.name, self.steps))
    }
}
