use brief_core::indicators::round2;
use brief_core::{AnalyzedArticle, SentimentCounts, Stance, TickerBrief};

/// Weight each stance contributes to the safety score.
fn stance_weight(stance: Stance) -> f64 {
    match stance {
        Stance::Bullish => 1.0,
        Stance::Bearish => 0.0,
        Stance::Neutral | Stance::InvalidInput => 0.5,
    }
}

/// Counts and unrounded safety score for one ticker's articles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub counts: SentimentCounts,
    /// Unrounded; use `safety_score()` for presentation.
    pub raw_score: f64,
}

impl Aggregate {
    /// Safety score rounded to two decimals.
    pub fn safety_score(&self) -> f64 {
        round2(self.raw_score)
    }
}

/// Reduces classified articles to per-stance counts and a safety score.
///
/// The score is `(bullish + 0.5 * neutral) / total`, or 0.5 for no articles.
/// Confidence does not weight the score. Articles with invalid input carry
/// no signal and are counted as neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleAggregator;

impl ArticleAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, articles: &[AnalyzedArticle]) -> Aggregate {
        let mut counts = SentimentCounts::default();
        let mut weighted = 0.0;

        for article in articles {
            let stance = article.sentiment.stance;
            match stance {
                Stance::Bullish => counts.bullish += 1,
                Stance::Bearish => counts.bearish += 1,
                Stance::Neutral | Stance::InvalidInput => counts.neutral += 1,
            }
            weighted += stance_weight(stance);
        }

        assert_eq!(
            counts.total(),
            articles.len(),
            "stance counts must cover every article"
        );

        let raw_score = if articles.is_empty() {
            TickerBrief::DEFAULT_SAFETY_SCORE
        } else {
            weighted / articles.len() as f64
        };
        debug_assert!((0.0..=1.0).contains(&raw_score));

        Aggregate { counts, raw_score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::{Headline, SentimentResult};

    fn article(stance: Stance, confidence: f64) -> AnalyzedArticle {
        AnalyzedArticle {
            headline: Headline::new(format!("{} headline", stance)),
            sentiment: SentimentResult::new(stance, confidence),
        }
    }

    fn batch(bullish: usize, bearish: usize, neutral: usize) -> Vec<AnalyzedArticle> {
        let mut out = Vec::new();
        out.extend((0..bullish).map(|_| article(Stance::Bullish, 0.9)));
        out.extend((0..bearish).map(|_| article(Stance::Bearish, 0.8)));
        out.extend((0..neutral).map(|_| article(Stance::Neutral, 0.7)));
        out
    }

    #[test]
    fn test_all_bullish_scores_one() {
        let agg = ArticleAggregator::new().aggregate(&batch(4, 0, 0));
        assert_eq!(agg.counts.bullish, 4);
        assert_eq!(agg.safety_score(), 1.0);
    }

    #[test]
    fn test_all_bearish_scores_zero() {
        let agg = ArticleAggregator::new().aggregate(&batch(0, 4, 0));
        assert_eq!(agg.counts.bearish, 4);
        assert_eq!(agg.safety_score(), 0.0);
    }

    #[test]
    fn test_even_split_scores_half() {
        let agg = ArticleAggregator::new().aggregate(&batch(2, 2, 0));
        assert_eq!(agg.safety_score(), 0.5);
    }

    #[test]
    fn test_neutrals_pull_toward_midpoint() {
        let agg = ArticleAggregator::new().aggregate(&batch(1, 1, 2));
        assert_eq!(
            agg.counts,
            SentimentCounts {
                bullish: 1,
                bearish: 1,
                neutral: 2
            }
        );
        assert_eq!(agg.safety_score(), 0.5);
    }

    #[test]
    fn test_empty_batch_defaults_to_half() {
        let agg = ArticleAggregator::new().aggregate(&[]);
        assert_eq!(agg.counts, SentimentCounts::default());
        assert_eq!(agg.safety_score(), 0.5);
    }

    #[test]
    fn test_rounding_only_for_presentation() {
        // (1 + 0.5) / 3 = 0.5
        let agg = ArticleAggregator::new().aggregate(&batch(1, 1, 1));
        assert_eq!(agg.safety_score(), 0.5);

        // 2 / 3
        let agg = ArticleAggregator::new().aggregate(&batch(2, 1, 0));
        assert_eq!(agg.safety_score(), 0.67);
        assert!((agg.raw_score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_does_not_weight_score() {
        let low = vec![article(Stance::Bullish, 0.1), article(Stance::Bearish, 0.99)];
        let high = vec![article(Stance::Bullish, 0.99), article(Stance::Bearish, 0.1)];
        let agg = ArticleAggregator::new();
        assert_eq!(agg.aggregate(&low), agg.aggregate(&high));
    }

    #[test]
    fn test_invalid_input_counts_as_neutral() {
        let articles = vec![
            article(Stance::Bullish, 0.9),
            AnalyzedArticle {
                headline: Headline::new(""),
                sentiment: SentimentResult::invalid_input(),
            },
        ];
        let agg = ArticleAggregator::new().aggregate(&articles);
        assert_eq!(agg.counts.neutral, 1);
        assert_eq!(agg.counts.total(), 2);
        assert_eq!(agg.safety_score(), 0.75);
    }

    #[test]
    fn test_order_independent() {
        let mut articles = batch(3, 2, 4);
        let forward = ArticleAggregator::new().aggregate(&articles);
        articles.reverse();
        let reversed = ArticleAggregator::new().aggregate(&articles);
        articles.rotate_left(4);
        let rotated = ArticleAggregator::new().aggregate(&articles);

        assert_eq!(forward.counts, reversed.counts);
        assert_eq!(forward.counts, rotated.counts);
        assert!((forward.raw_score - reversed.raw_score).abs() < 1e-12);
        assert!((forward.raw_score - rotated.raw_score).abs() < 1e-12);
    }

    #[test]
    fn test_score_bounded_for_all_small_mixes() {
        let agg = ArticleAggregator::new();
        for b in 0..6 {
            for r in 0..6 {
                for n in 0..6 {
                    let result = agg.aggregate(&batch(b, r, n));
                    assert_eq!(result.counts.total(), b + r + n);
                    assert!((0.0..=1.0).contains(&result.raw_score));
                    assert!((0.0..=1.0).contains(&result.safety_score()));
                }
            }
        }
    }
}
