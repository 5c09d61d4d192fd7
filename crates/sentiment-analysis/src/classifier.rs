use brief_core::{SentimentResult, Stance};
use stance_client::error::{InferenceError, InferenceResult};
use stance_client::scores::{self, MAX_INPUT_TOKENS};
use stance_client::{BackendKind, InferenceBackend, RemoteBackend, StanceConfig};
use std::sync::Arc;
use std::time::Duration;

/// Headline stance classifier on top of a pretrained classification model.
///
/// Holds the backend behind an `Arc` so a single loaded model is shared by
/// every concurrent call; `classify` never reloads or mutates it.
#[derive(Clone)]
pub struct StanceClassifier {
    backend: Arc<dyn InferenceBackend>,
    labels: Vec<String>,
    call_timeout: Duration,
}

impl StanceClassifier {
    /// `labels` lists the model's classes in class-index order; argmax ties
    /// resolve to the earliest entry.
    pub fn new(backend: Arc<dyn InferenceBackend>, labels: Vec<String>, call_timeout: Duration) -> Self {
        Self {
            backend,
            labels,
            call_timeout,
        }
    }

    /// Build the configured backend and wrap it.
    ///
    /// The embedded backend loads the model synchronously; call this from a
    /// blocking context when using it.
    pub fn from_config(config: &StanceConfig) -> InferenceResult<Self> {
        let backend: Arc<dyn InferenceBackend> = match config.backend {
            BackendKind::Remote => Arc::new(RemoteBackend::new(config)?),
            BackendKind::Embedded => embedded_backend(config)?,
        };
        tracing::info!(
            "Stance classifier using {} backend for {}",
            backend.backend_name(),
            config.model
        );
        Ok(Self::new(backend, config.labels.clone(), config.timeout))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    pub async fn health(&self) -> bool {
        match self.backend.health().await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!("Classifier backend health check failed: {}", e);
                false
            }
        }
    }

    /// Classify `text`, degrading inference failures to `(neutral, 0.0)`.
    ///
    /// Empty or whitespace-only text yields `(invalid_input, 0.0)`.
    pub async fn classify(&self, text: &str) -> SentimentResult {
        match self.try_classify(text).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend_name(),
                    "Stance classification failed, recording neutral: {}",
                    e
                );
                SentimentResult::degraded()
            }
        }
    }

    /// Classify `text`, surfacing inference failures to the caller.
    pub async fn try_classify(&self, text: &str) -> InferenceResult<SentimentResult> {
        if text.trim().is_empty() {
            tracing::debug!("Empty headline passed to classifier");
            return Ok(SentimentResult::invalid_input());
        }

        let text = scores::truncate_words(text, MAX_INPUT_TOKENS);
        let raw = tokio::time::timeout(self.call_timeout, self.backend.predict(text))
            .await
            .map_err(|_| InferenceError::Timeout)??;

        let ordered = scores::order_by_labels(raw, &self.labels);
        scores::validate(&ordered)?;
        let best = scores::argmax(&ordered).ok_or_else(|| {
            InferenceError::InvalidResponse("model returned no class scores".to_string())
        })?;

        Ok(SentimentResult::new(
            Stance::from_model_label(&best.label),
            best.score,
        ))
    }
}

#[cfg(feature = "embedded-ml")]
fn embedded_backend(config: &StanceConfig) -> InferenceResult<Arc<dyn InferenceBackend>> {
    Ok(Arc::new(stance_engine::EmbeddedStanceEngine::initialize(config)?))
}

#[cfg(not(feature = "embedded-ml"))]
fn embedded_backend(_config: &StanceConfig) -> InferenceResult<Arc<dyn InferenceBackend>> {
    Err(InferenceError::Other(
        "embedded backend requires building with the `embedded-ml` feature".to_string(),
    ))
}
