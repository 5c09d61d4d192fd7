use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::{InferenceBackend, LabelScore};
use crate::error::{InferenceError, InferenceResult};
use crate::scores::MAX_INPUT_TOKENS;
use crate::StanceConfig;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    truncation: bool,
    max_length: usize,
    top_k: usize,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

/// Text-classification responses come back either batched or flat.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl InferenceResponse {
    fn into_scores(self) -> InferenceResult<Vec<LabelScore>> {
        match self {
            InferenceResponse::Nested(mut batches) => {
                if batches.is_empty() {
                    return Err(InferenceError::InvalidResponse(
                        "empty prediction batch".to_string(),
                    ));
                }
                Ok(batches.swap_remove(0))
            }
            InferenceResponse::Flat(scores) => Ok(scores),
        }
    }
}

/// Client for a hosted text-classification inference endpoint.
///
/// Tokenization and truncation happen server-side; the request asks for
/// leading-token truncation at `MAX_INPUT_TOKENS`.
#[derive(Clone)]
pub struct RemoteBackend {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
    top_k: usize,
}

impl RemoteBackend {
    pub fn new(config: &StanceConfig) -> InferenceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/models/{}",
                config.inference_url.trim_end_matches('/'),
                config.model
            ),
            api_token: config.api_token.clone(),
            top_k: config.labels.len().max(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl InferenceBackend for RemoteBackend {
    async fn predict(&self, text: &str) -> InferenceResult<Vec<LabelScore>> {
        let request = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                truncation: true,
                max_length: MAX_INPUT_TOKENS,
                top_k: self.top_k,
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .authorize(self.client.post(&self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else {
                    InferenceError::RequestFailed(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Inference endpoint {} answered {}", self.endpoint, status);
            return Err(InferenceError::ServiceUnavailable(format!("Status: {}", status)));
        }

        let body = response.text().await?;
        let parsed: InferenceResponse = serde_json::from_str(&body)
            .map_err(|e| InferenceError::InvalidResponse(format!("{}: {}", e, body)))?;
        parsed.into_scores()
    }

    async fn health(&self) -> InferenceResult<bool> {
        let response = self
            .authorize(self.client.get(&self.endpoint))
            .send()
            .await?;

        Ok(response.status().is_success())
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}
