use crate::option::OptionDecodeError;
use crate::orchestrator::CycleError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BootselError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Decode(#[from] OptionDecodeError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

pub type Result<T> = std::result::Result<T, BootselError>;
