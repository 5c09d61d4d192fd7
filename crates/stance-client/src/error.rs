use thiserror::Error;

/// Failure of a single inference call. The classifier turns any of these into
/// a neutral, zero-confidence result.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("inference service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("unusable model output: {0}")]
    InvalidResponse(String),

    #[error("stance model is not loaded")]
    ModelNotLoaded,

    #[error("inference call timed out")]
    Timeout,

    #[error("inference payload (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type InferenceResult<T> = Result<T, InferenceError>;
