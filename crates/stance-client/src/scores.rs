//! Helpers shared by every backend for turning raw model output into an
//! ordered, validated class distribution.

use crate::backend::LabelScore;
use crate::error::{InferenceError, InferenceResult};

/// Maximum model input length in tokens.
pub const MAX_INPUT_TOKENS: usize = 512;

/// Keep the first `max_words` whitespace-separated words of `text`.
///
/// Every word yields at least one token, so clipping to
/// `MAX_INPUT_TOKENS` words never removes text the tokenizer would keep.
pub fn truncate_words(text: &str, max_words: usize) -> &str {
    if max_words == 0 {
        return "";
    }

    let mut words = 0;
    let mut in_word = false;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                in_word = false;
                if words == max_words {
                    return &text[..idx];
                }
            }
        } else if !in_word {
            in_word = true;
            words += 1;
        }
    }
    text
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Re-order scores into model class-index order.
///
/// Labels listed in `class_labels` come first in that order (matched
/// case-insensitively); any other labels follow in the order received.
pub fn order_by_labels(scores: Vec<LabelScore>, class_labels: &[String]) -> Vec<LabelScore> {
    let mut remaining = scores;
    let mut ordered = Vec::with_capacity(remaining.len());

    for wanted in class_labels {
        if let Some(pos) = remaining
            .iter()
            .position(|s| s.label.trim().eq_ignore_ascii_case(wanted.trim()))
        {
            ordered.push(remaining.remove(pos));
        }
    }
    ordered.extend(remaining);
    ordered
}

/// Reject distributions that cannot be trusted.
pub fn validate(scores: &[LabelScore]) -> InferenceResult<()> {
    if scores.is_empty() {
        return Err(InferenceError::InvalidResponse(
            "model returned no class scores".to_string(),
        ));
    }
    if let Some(bad) = scores
        .iter()
        .find(|s| !s.score.is_finite() || !(0.0..=1.0).contains(&s.score))
    {
        return Err(InferenceError::InvalidResponse(format!(
            "score for '{}' out of range: {}",
            bad.label, bad.score
        )));
    }
    Ok(())
}

/// Highest-scoring class; ties resolve to the lowest index.
pub fn argmax(scores: &[LabelScore]) -> Option<&LabelScore> {
    let mut best: Option<&LabelScore> = None;
    for candidate in scores {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }
    best
}
