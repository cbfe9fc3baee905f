use std::fmt;
use std::sync::Arc;

use crate::step::SagaStep;

/// An ordered list of steps ready to be executed by an orchestrator.
///
/// Cheap to clone: step definitions are shared.
#[derive(Clone)]
pub struct Saga {
    name: String,
    steps: Vec<Arc<dyn SagaStep>>,
}

impl Saga {
    pub(crate) fn from_steps(name: String, steps: Vec<Arc<dyn SagaStep>>) -> Self {
        Self { name, steps }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn steps(&self) -> &[Arc<dyn SagaStep>] {
        &self.steps
    }

    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false: the builder refuses to create an empty saga.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for Saga {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Saga")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .finish()
    }
}
