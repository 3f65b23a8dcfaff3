use crate::domain::resource::ResourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("{kind} {key} not found")]
    NotFound { kind: ResourceKind, key: String },
    #[error("{kind} {key} already exists")]
    Conflict { kind: ResourceKind, key: String },
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("A transition is already running for {kind} {key}")]
    TransitionActive { kind: ResourceKind, key: String },
    #[error("Delivery to {uri} failed: {reason}")]
    Delivery { uri: String, reason: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SimError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SimError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, SimError::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
