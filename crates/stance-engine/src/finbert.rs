use pyo3::prelude::*;
use std::ffi::CStr;
use stance_client::error::{InferenceError, InferenceResult};

const MODEL_SOURCE: &CStr = c"
import torch
from transformers import AutoModelForSequenceClassification, AutoTokenizer


class StanceModel:
    def __init__(self, model_name, device, cache_dir, max_length):
        self.device = device
        self.max_length = max_length
        self.tokenizer = AutoTokenizer.from_pretrained(model_name, cache_dir=cache_dir)
        self.model = AutoModelForSequenceClassification.from_pretrained(
            model_name, cache_dir=cache_dir
        )
        self.model.to(device)
        self.model.eval()

    def labels(self):
        id2label = self.model.config.id2label
        return [str(id2label[i]) for i in range(len(id2label))]

    def logits(self, text):
        inputs = self.tokenizer(
            text,
            return_tensors='pt',
            truncation=True,
            max_length=self.max_length,
            padding=True,
        )
        inputs = {k: v.to(self.device) for k, v in inputs.items()}
        with torch.no_grad():
            outputs = self.model(**inputs)
        return outputs.logits[0].detach().cpu().tolist()
";

/// In-process wrapper around a HuggingFace sequence-classification model.
pub struct EmbeddedFinbert {
    model: Py<PyAny>,
}

impl EmbeddedFinbert {
    pub fn load(
        model_name: &str,
        device: &str,
        cache_dir: Option<&str>,
        max_length: usize,
    ) -> InferenceResult<Self> {
        Python::attach(|py| {
            let module = PyModule::from_code(py, MODEL_SOURCE, c"stance_model.py", c"stance_model")
                .map_err(|e: PyErr| {
                    InferenceError::Other(format!("Failed to compile stance model module: {e}"))
                })?;

            let model = module
                .getattr("StanceModel")
                .map_err(|e: PyErr| InferenceError::Other(format!("StanceModel not found: {e}")))?
                .call1((model_name, device, cache_dir, max_length))
                .map_err(|e: PyErr| {
                    InferenceError::Other(format!("StanceModel init failed: {e}"))
                })?;

            Ok(Self {
                model: model.unbind(),
            })
        })
    }

    /// Class labels in logit order.
    pub fn labels_sync(&self) -> InferenceResult<Vec<String>> {
        Python::attach(|py| {
            let result = self
                .model
                .call_method0(py, "labels")
                .map_err(|e: PyErr| InferenceError::Other(format!("labels() failed: {e}")))?;

            result
                .bind(py)
                .extract()
                .map_err(|e: PyErr| InferenceError::Other(format!("Failed to extract labels: {e}")))
        })
    }

    pub fn logits_sync(&self, text: &str) -> InferenceResult<Vec<f64>> {
        Python::attach(|py| {
            let result = self
                .model
                .call_method1(py, "logits", (text,))
                .map_err(|e: PyErr| {
                    InferenceError::Other(format!("StanceModel.logits() failed: {e}"))
                })?;

            result.bind(py).extract().map_err(|e: PyErr| {
                InferenceError::InvalidResponse(format!("Failed to extract logits: {e}"))
            })
        })
    }
}
