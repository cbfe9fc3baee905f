use std::error::Error as StdError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error raised by a step's forward action or compensation.
///
/// Steps wrap whatever their collaborators returned; the orchestrator only
/// needs the message and the source chain for logging and the execution record.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StepError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl StepError {
    /// Create an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, using its `Display` output as the message.
    pub fn from_source<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap an underlying error with a custom message.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error from saga execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError {
    /// A single attempt exceeded the step's time budget.
    #[error("step '{step}' timed out on attempt {attempt} after {timeout:?}")]
    StepTimeout {
        step: String,
        attempt: u32,
        timeout: Duration,
    },

    /// A single attempt returned an error.
    #[error("step '{step}' failed on attempt {attempt}")]
    StepExecution {
        step: String,
        attempt: u32,
        #[source]
        source: StepError,
    },

    /// Every allowed attempt of a step failed.
    #[error("step '{step}' failed after {attempts} attempt(s)")]
    RetriesExhausted {
        step: String,
        attempts: u32,
        /// The failure of the final attempt.
        #[source]
        last: Box<SagaError>,
    },

    /// A compensation failed. Logged and recorded, never escalated.
    #[error("compensation failed for step '{step}': {description}")]
    CompensationFailure {
        step: String,
        /// Description of what the compensation was trying to do.
        description: String,
        #[source]
        source: StepError,
    },

    #[error("saga already contains a step named '{name}'")]
    DuplicateStep { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SagaError {
    /// Name of the step this error is about, if any.
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::StepTimeout { step, .. }
            | Self::StepExecution { step, .. }
            | Self::RetriesExhausted { step, .. }
            | Self::CompensationFailure { step, .. } => Some(step),
            Self::DuplicateStep { name } => Some(name),
            Self::Store(_) => None,
        }
    }

    /// Whether the orchestrator retries this failure locally.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::StepTimeout { .. } | Self::StepExecution { .. })
    }

    /// Render the error together with its full source chain on one line.
    #[must_use]
    pub fn report(&self) -> String {
        report_chain(self)
    }
}

pub(crate) fn report_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut previous = message.clone();
    let mut source = error.source();
    while let Some(cause) = source {
        // `StepError::from_source` reuses the cause's text as its own message
        let text = cause.to_string();
        if text != previous {
            message.push_str(": ");
            message.push_str(&text);
        }
        previous = text;
        source = cause.source();
    }
    message
}

/// Error from the execution log store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to encode execution record")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode execution record at '{key}'")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("execution store rejected key '{key}': {message}")]
    Backend { key: String, message: String },
}

/// Error converting a context value to or from a typed representation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContextError {
    #[error("failed to encode context value '{key}'")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("context value '{key}' has an unexpected shape")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ContextError> for StepError {
    fn from(error: ContextError) -> Self {
        Self::from_source(error)
    }
}

/// Error loading or validating orchestrator configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse orchestrator config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid orchestrator config: {0}")]
    Invalid(String),
}
