use async_trait::async_trait;
use crate::{BriefError, Headline, MarketSignals, PriceBar};

/// Source of news headlines for a ticker.
///
/// No ordering contract is assumed by callers; the brief mirrors whatever
/// order the source returns.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn headlines(&self, symbol: &str, limit: u32) -> Result<Vec<Headline>, BriefError>;
}

/// Source of auxiliary market signals merged verbatim into a brief.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn market_signals(&self, symbol: &str) -> Result<MarketSignals, BriefError>;

    /// Daily bars covering roughly the last `days` calendar days, oldest first.
    async fn daily_bars(&self, symbol: &str, days: i64) -> Result<Vec<PriceBar>, BriefError>;

    /// `minutes`-wide bars covering roughly the last `days` calendar days, oldest first.
    async fn intraday_bars(
        &self,
        symbol: &str,
        minutes: u32,
        days: i64,
    ) -> Result<Vec<PriceBar>, BriefError>;
}
