use saga_engine::{ContextError, StepError};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CampaignError {
    #[error("insufficient credits: requested {requested}, available {available}")]
    InsufficientCredits { requested: u64, available: u64 },

    #[error("unknown credit reservation '{0}'")]
    UnknownReservation(String),

    #[error("unknown email batch '{0}'")]
    UnknownBatch(String),

    #[error("unknown analytics record '{0}'")]
    UnknownAnalyticsRecord(String),

    #[error("campaign '{0}' has no recipients")]
    NoRecipients(String),

    #[error("{system} unavailable during {operation}")]
    Unavailable {
        system: &'static str,
        operation: &'static str,
    },

    #[error("saga context is missing '{0}'")]
    MissingContext(&'static str),

    #[error(transparent)]
    Context(#[from] ContextError),
}

impl From<CampaignError> for StepError {
    fn from(error: CampaignError) -> Self {
        StepError::from_source(error)
    }
}

pub type Result<T> = std::result::Result<T, CampaignError>;
