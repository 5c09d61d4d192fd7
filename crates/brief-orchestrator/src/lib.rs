use anyhow::Context;
use brief_core::{
    normalize_symbol, AnalyzedArticle, BriefError, Headline, HistoryPeriod, MarketDataSource,
    MarketSignals, NewsSource, PricePoint, TickerBrief,
};
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use sentiment_analysis::{ArticleAggregator, StanceClassifier};
use std::sync::Arc;

pub mod history;

pub use history::{intraday_points, price_points};

/// Limits applied while building a brief
#[derive(Debug, Clone)]
pub struct BriefConfig {
    /// Headlines fetched per brief
    pub news_limit: u32,
    /// Classification calls in flight at once
    pub concurrency: usize,
}

impl Default for BriefConfig {
    fn default() -> Self {
        Self {
            news_limit: 20,
            concurrency: 8,
        }
    }
}

impl BriefConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let news_limit: u32 = std::env::var("NEWS_LIMIT")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .context("NEWS_LIMIT must be a non-negative integer")?;
        let concurrency: usize = std::env::var("CLASSIFY_CONCURRENCY")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .context("CLASSIFY_CONCURRENCY must be a positive integer")?;

        if concurrency == 0 {
            anyhow::bail!("CLASSIFY_CONCURRENCY must be at least 1");
        }

        Ok(Self {
            news_limit,
            concurrency,
        })
    }
}

/// Composes per-ticker briefs from news, the stance classifier and market data.
pub struct BriefBuilder {
    classifier: Arc<StanceClassifier>,
    aggregator: ArticleAggregator,
    news: Arc<dyn NewsSource>,
    market: Arc<dyn MarketDataSource>,
    config: BriefConfig,
}

impl BriefBuilder {
    pub fn new(
        classifier: Arc<StanceClassifier>,
        news: Arc<dyn NewsSource>,
        market: Arc<dyn MarketDataSource>,
        config: BriefConfig,
    ) -> Self {
        Self {
            classifier,
            aggregator: ArticleAggregator::new(),
            news,
            market,
            config,
        }
    }

    pub fn classifier(&self) -> &StanceClassifier {
        &self.classifier
    }

    /// Build the brief for `raw_symbol`.
    ///
    /// A symbol with no news (or whose news source fails) yields a brief with
    /// zero counts and the default safety score. Only an invalid symbol is an
    /// error.
    pub async fn build(&self, raw_symbol: &str) -> Result<TickerBrief, BriefError> {
        let symbol = normalize_symbol(raw_symbol)?;

        let (headlines, market) =
            tokio::join!(self.fetch_headlines(&symbol), self.fetch_market(&symbol));

        let articles = self.classify_headlines(headlines).await;
        let aggregate = self.aggregator.aggregate(&articles);

        let brief = TickerBrief {
            symbol,
            bullish_count: aggregate.counts.bullish,
            bearish_count: aggregate.counts.bearish,
            neutral_count: aggregate.counts.neutral,
            articles,
            safety_score: aggregate.safety_score(),
            market,
        };

        tracing::info!(
            symbol = %brief.symbol,
            articles = brief.articles.len(),
            safety_score = brief.safety_score,
            "Brief built"
        );

        Ok(brief)
    }

    /// Classify every headline with at most `concurrency` calls in flight.
    ///
    /// Waits for all classifications; output order matches input order.
    pub async fn classify_headlines(&self, headlines: Vec<Headline>) -> Vec<AnalyzedArticle> {
        let limit = self.config.concurrency.max(1);
        stream::iter(headlines)
            .map(|headline| {
                let classifier = self.classifier.clone();
                async move {
                    let sentiment = classifier.classify(&headline.text).await;
                    AnalyzedArticle {
                        headline,
                        sentiment,
                    }
                }
            })
            .buffered(limit)
            .collect()
            .await
    }

    /// Chart points for `period`: intraday closes for `1d`/`5d`, otherwise
    /// daily closes with moving averages.
    pub async fn price_history(
        &self,
        raw_symbol: &str,
        period: HistoryPeriod,
    ) -> Result<Vec<PricePoint>, BriefError> {
        let symbol = normalize_symbol(raw_symbol)?;

        let points = match period.intraday() {
            Some(window) => {
                let bars = self
                    .market
                    .intraday_bars(&symbol, window.minutes, period.fetch_days())
                    .await?;
                intraday_points(&bars, window.sessions)
            }
            None => {
                let bars = self.market.daily_bars(&symbol, period.fetch_days()).await?;
                price_points(&bars, period.cutoff(Utc::now()))
            }
        };

        tracing::debug!(
            "Price history for {} ({}): {} points",
            symbol,
            period.as_str(),
            points.len()
        );
        Ok(points)
    }

    async fn fetch_headlines(&self, symbol: &str) -> Vec<Headline> {
        match self.news.headlines(symbol, self.config.news_limit).await {
            Ok(mut headlines) => {
                headlines.truncate(self.config.news_limit as usize);
                headlines
            }
            Err(e) => {
                tracing::warn!("News unavailable for {}, building empty brief: {}", symbol, e);
                Vec::new()
            }
        }
    }

    async fn fetch_market(&self, symbol: &str) -> MarketSignals {
        match self.market.market_signals(symbol).await {
            Ok(signals) => signals,
            Err(e) => {
                tracing::warn!("Market signals unavailable for {}: {}", symbol, e);
                MarketSignals::default()
            }
        }
    }
}
