mod finbert;
mod init;

use async_trait::async_trait;
use stance_client::error::{InferenceError, InferenceResult};
use stance_client::scores::{softmax, MAX_INPUT_TOKENS};
use stance_client::{InferenceBackend, LabelScore, StanceConfig};
use std::sync::Arc;

use self::finbert::EmbeddedFinbert;

/// Stance model running inside the Rust process via PyO3.
///
/// Logits come from the model; softmax and label pairing happen here so the
/// output matches what the remote backend reports.
pub struct EmbeddedStanceEngine {
    model: Arc<EmbeddedFinbert>,
    labels: Vec<String>,
    device: String,
}

impl EmbeddedStanceEngine {
    /// Boot the embedded interpreter and load the configured model.
    ///
    /// Weights are fetched into `cache_dir` on first use; afterwards the
    /// model loads from the local cache.
    pub fn initialize(config: &StanceConfig) -> InferenceResult<Self> {
        // Tokenizers would otherwise fork worker processes whose executable
        // is this binary.
        std::env::set_var("TOKENIZERS_PARALLELISM", "false");
        std::env::set_var("OMP_NUM_THREADS", "1");

        init::setup_python()
            .map_err(|e| InferenceError::Other(format!("Python setup failed: {e}")))?;

        let device = config
            .device
            .clone()
            .unwrap_or_else(|| init::detect_device().unwrap_or_else(|| "cpu".to_string()));

        let cache_dir = config
            .cache_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());

        tracing::info!(
            "Loading embedded stance model {} on {} (cache={})",
            config.model,
            device,
            cache_dir.as_deref().unwrap_or("default")
        );

        let model = EmbeddedFinbert::load(&config.model, &device, cache_dir.as_deref(), MAX_INPUT_TOKENS)
            .map_err(|e| {
                tracing::warn!("Stance model failed to load: {e}");
                InferenceError::ModelNotLoaded
            })?;
        let labels = model.labels_sync()?;
        if labels.is_empty() {
            return Err(InferenceError::InvalidResponse(
                "model reports no class labels".to_string(),
            ));
        }

        tracing::info!("Embedded stance engine ready: labels=[{}]", labels.join(", "));

        Ok(Self {
            model: Arc::new(model),
            labels,
            device,
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

/// Pair softmax probabilities with their labels.
fn label_probabilities(labels: &[String], logits: &[f64]) -> InferenceResult<Vec<LabelScore>> {
    if logits.len() != labels.len() {
        return Err(InferenceError::InvalidResponse(format!(
            "model produced {} logits for {} labels",
            logits.len(),
            labels.len()
        )));
    }
    Ok(labels
        .iter()
        .zip(softmax(logits))
        .map(|(label, p)| LabelScore::new(label.clone(), p))
        .collect())
}

#[async_trait]
impl InferenceBackend for EmbeddedStanceEngine {
    async fn predict(&self, text: &str) -> InferenceResult<Vec<LabelScore>> {
        let model = self.model.clone();
        let text = text.to_string();
        let logits = tokio::task::spawn_blocking(move || model.logits_sync(&text))
            .await
            .map_err(|e| InferenceError::Other(e.to_string()))??;

        label_probabilities(&self.labels, &logits)
    }

    fn backend_name(&self) -> &'static str {
        "embedded-pyo3"
    }
}
