use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum BenchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build data store: {0}")]
    StoreError(String),

    #[error("failed to compile policy module: {0}")]
    CompileError(String),

    #[error("partial evaluation error: {0}")]
    PartialEvalError(String),

    #[error("evaluation error: {0}")]
    EvalError(String),

    #[error("unexpected result: expected {expected} but got {actual}")]
    UnexpectedResult { expected: String, actual: String },

    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::SerializationError(err.to_string())
    }
}

impl From<strum::ParseError> for BenchError {
    fn from(err: strum::ParseError) -> Self {
        BenchError::InvalidConfig(err.to_string())
    }
}
