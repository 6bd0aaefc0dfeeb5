use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Invalid chunk coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable { collaborator: &'static str, reason: String },

    #[error("Graph traversal failed for key {key}: {reason}")]
    KeyFailure { key: String, reason: String },

    #[error("Graph assembly failed: {0}")]
    GraphAssembly(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn unavailable(collaborator: &'static str, reason: impl ToString) -> Self {
        Self::CollaboratorUnavailable { collaborator, reason: reason.to_string() }
    }

    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
