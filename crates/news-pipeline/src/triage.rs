use brief_core::{AnalyzedArticle, SentimentCounts, SentimentResult};
use sentiment_analysis::ArticleAggregator;
use std::fmt;

/// Confidence above which a classification is trusted without review.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triage {
    HighConfidence,
    NeedsReview,
}

impl Triage {
    pub fn of(result: &SentimentResult) -> Self {
        if result.confidence > HIGH_CONFIDENCE_THRESHOLD {
            Triage::HighConfidence
        } else {
            Triage::NeedsReview
        }
    }
}

impl fmt::Display for Triage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Triage::HighConfidence => f.write_str("high_confidence"),
            Triage::NeedsReview => f.write_str("needs_review"),
        }
    }
}

/// Totals printed at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub counts: SentimentCounts,
    pub safety_score: f64,
    pub high_confidence: usize,
    pub needs_review: usize,
}

impl RunSummary {
    pub fn from_articles(articles: &[AnalyzedArticle]) -> Self {
        let aggregate = ArticleAggregator::new().aggregate(articles);
        let high_confidence = articles
            .iter()
            .filter(|a| Triage::of(&a.sentiment) == Triage::HighConfidence)
            .count();

        Self {
            counts: aggregate.counts,
            safety_score: aggregate.safety_score(),
            high_confidence,
            needs_review: articles.len() - high_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::{Headline, Stance};

    fn article(stance: Stance, confidence: f64) -> AnalyzedArticle {
        AnalyzedArticle {
            headline: Headline::new("headline"),
            sentiment: SentimentResult::new(stance, confidence),
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(
            Triage::of(&SentimentResult::new(Stance::Bullish, 0.85)),
            Triage::NeedsReview
        );
        assert_eq!(
            Triage::of(&SentimentResult::new(Stance::Bullish, 0.851)),
            Triage::HighConfidence
        );
        assert_eq!(Triage::of(&SentimentResult::degraded()), Triage::NeedsReview);
    }

    #[test]
    fn test_summary_counts() {
        let articles = vec![
            article(Stance::Bullish, 0.97),
            article(Stance::Bullish, 0.60),
            article(Stance::Bearish, 0.92),
            article(Stance::Neutral, 0.0),
        ];
        let summary = RunSummary::from_articles(&articles);

        assert_eq!(summary.counts.bullish, 2);
        assert_eq!(summary.counts.bearish, 1);
        assert_eq!(summary.counts.neutral, 1);
        assert_eq!(summary.high_confidence, 2);
        assert_eq!(summary.needs_review, 2);
        assert_eq!(summary.safety_score, 0.63);
    }

    #[test]
    fn test_empty_run() {
        let summary = RunSummary::from_articles(&[]);
        assert_eq!(summary.counts.total(), 0);
        assert_eq!(summary.high_confidence, 0);
        assert_eq!(summary.safety_score, 0.5);
    }
}
