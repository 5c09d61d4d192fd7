pub mod backend;
pub mod error;
pub mod remote;
pub mod scores;

pub use backend::{InferenceBackend, LabelScore};
pub use error::{InferenceError, InferenceResult};
pub use remote::RemoteBackend;

use anyhow::Context;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "ProsusAI/finbert";
pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";

/// Which transport serves the classification model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Remote,
    Embedded,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "http" => Ok(BackendKind::Remote),
            "embedded" | "local" => Ok(BackendKind::Embedded),
            other => anyhow::bail!("unknown stance backend '{}'", other),
        }
    }
}

/// Configuration for the stance model and its transport
#[derive(Debug, Clone)]
pub struct StanceConfig {
    pub backend: BackendKind,
    pub model: String,
    pub inference_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    /// Class labels in model class-index order.
    pub labels: Vec<String>,
    /// Forced device for the embedded engine; autodetected when `None`.
    pub device: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

impl Default for StanceConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Remote,
            model: DEFAULT_MODEL.to_string(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(10),
            labels: vec![
                "positive".to_string(),
                "negative".to_string(),
                "neutral".to_string(),
            ],
            device: None,
            cache_dir: None,
        }
    }
}

impl StanceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let labels = match env::var("STANCE_LABELS") {
            Ok(raw) => parse_labels(&raw)?,
            Err(_) => defaults.labels,
        };

        Ok(Self {
            backend: match env::var("STANCE_BACKEND") {
                Ok(raw) => parse_backend(&raw)?,
                Err(_) => defaults.backend,
            },
            model: env::var("STANCE_MODEL").unwrap_or(defaults.model),
            inference_url: env::var("STANCE_INFERENCE_URL").unwrap_or(defaults.inference_url),
            api_token: env::var("HF_API_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout: match env::var("STANCE_TIMEOUT_SECS") {
                Ok(raw) => parse_timeout(&raw)?,
                Err(_) => defaults.timeout,
            },
            labels,
            device: env::var("STANCE_DEVICE").ok().filter(|d| !d.is_empty()),
            cache_dir: env::var("STANCE_CACHE_DIR").ok().map(PathBuf::from),
        })
    }
}

fn parse_backend(raw: &str) -> anyhow::Result<BackendKind> {
    raw.parse()
        .context("STANCE_BACKEND must be 'remote' or 'embedded'")
}

fn parse_timeout(raw: &str) -> anyhow::Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("STANCE_TIMEOUT_SECS must be whole seconds, got '{}'", raw))?;
    Ok(Duration::from_secs(secs))
}

fn parse_labels(raw: &str) -> anyhow::Result<Vec<String>> {
    let labels: Vec<String> = raw
        .split(',')
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect();
    if labels.is_empty() {
        anyhow::bail!("STANCE_LABELS must name at least one class");
    }
    Ok(labels)
}
