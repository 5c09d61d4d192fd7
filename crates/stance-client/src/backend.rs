use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::InferenceResult;

/// Probability assigned by the model to one of its classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Transport-agnostic interface to a text-classification model.
///
/// Implemented by the remote inference client and by the embedded
/// in-process engine. Implementations hold read-only model state and must
/// be safe to call concurrently.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Per-class probabilities for `text`. Order is not significant.
    async fn predict(&self, text: &str) -> InferenceResult<Vec<LabelScore>>;

    /// Whether the backend is currently able to serve predictions.
    async fn health(&self) -> InferenceResult<bool> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str;
}
