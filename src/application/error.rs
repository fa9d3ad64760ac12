// Application errors
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VitalsError {
    #[error("data access failed: {0}")]
    DataAccess(String),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("observation transport failed: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VitalsError {
    pub fn data_access(err: impl std::fmt::Display) -> Self {
        VitalsError::DataAccess(err.to_string())
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        VitalsError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VitalsError>;
