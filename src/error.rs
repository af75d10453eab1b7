use thiserror::Error;

use crate::env::EnvError;

#[derive(Error, Debug)]
pub enum LearnerError {
    /// A state was looked up before `ensure_entry` registered it.
    #[error("state {state} has no entry in the policy table")]
    KeyNotFound { state: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error(transparent)]
    Environment(#[from] EnvError),

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("policy table shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl LearnerError {
    pub(crate) fn key_not_found<S: std::fmt::Debug>(state: &S) -> Self {
        LearnerError::KeyNotFound {
            state: format!("{:?}", state),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LearnerError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LearnerError>;
