use saga_engine::{ConfigError, SagaError, SagaStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("failed to assemble saga")]
    Saga(#[from] SagaError),

    #[error("failed to start async runtime")]
    Runtime(#[source] std::io::Error),

    #[error("failed to read execution record back from the store")]
    LoadRecord(#[source] SagaError),

    #[error("no stored execution record for saga '{saga_id}'")]
    RecordMissing { saga_id: String },

    #[error("failed to render execution record")]
    Json(#[from] serde_json::Error),

    #[error("campaign launch ended {status}")]
    NotCompleted { status: SagaStatus },
}

pub type Result<T> = std::result::Result<T, CliError>;
