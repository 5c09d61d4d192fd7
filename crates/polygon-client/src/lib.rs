use brief_core::{BriefError, Headline, PriceBar};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

mod source;

pub use source::{insider_sentiment, put_call_ratio};

const BASE_URL: &str = "https://api.polygon.io";

/// Largest page Polygon serves for aggregates; decades of daily bars fit.
const AGGREGATES_LIMIT: u32 = 50_000;

/// Default request budget per minute (Starter plan). Free tier is 5.
pub const DEFAULT_RATE_LIMIT: usize = 500;

/// Allows `max_requests` calls in any trailing `window`.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait for the oldest request to leave the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).duration_since(now) + Duration::from_millis(50),
                None => Duration::from_millis(50),
            };
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Polygon API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
    retry_wait: Duration,
}

impl PolygonClient {
    pub fn new(api_key: String, rate_limit: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
            retry_wait: Duration::from_secs(15),
        }
    }

    /// Point the client at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the pause between 429 retries.
    pub fn with_retry_wait(mut self, wait: Duration) -> Self {
        self.retry_wait = wait;
        self
    }

    /// Rate-limited GET; a 429 is retried up to three times before giving up.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, BriefError> {
        let request = builder.build().map_err(|e| BriefError::Upstream(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| BriefError::Upstream("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| BriefError::Upstream(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            tracing::warn!(
                "Polygon 429 rate limited, waiting {}s before retry {}/3",
                self.retry_wait.as_secs(),
                attempt + 1
            );
            tokio::time::sleep(self.retry_wait).await;
        }

        Err(BriefError::Upstream("Rate limited by Polygon after 3 retries".to_string()))
    }

    /// GET `path` and decode the JSON body, mapping non-2xx to `Upstream`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        label: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BriefError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .send_request(
                self.client
                    .get(&url)
                    .query(&[("apiKey", self.api_key.as_str())])
                    .query(query),
            )
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(BriefError::NotFound(format!("{} not found", label)));
        }
        if !status.is_success() {
            return Err(BriefError::Upstream(format!(
                "{} HTTP {}: {}",
                label,
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BriefError::InvalidData(format!("{}: {}", label, e)))
    }

    /// Get aggregates (bars) for a symbol, oldest first
    pub async fn get_aggregates(
        &self,
        symbol: &str,
        multiplier: u32,
        timespan: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, BriefError> {
        let path = format!(
            "/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            symbol,
            multiplier,
            timespan,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let agg_response: AggregateResponse = self
            .get_json(
                "Aggregates",
                &path,
                &[
                    ("adjusted", "true".to_string()),
                    ("sort", "asc".to_string()),
                    ("limit", AGGREGATES_LIMIT.to_string()),
                ],
            )
            .await?;

        Ok(agg_response
            .results
            .into_iter()
            .filter_map(|r| {
                Some(PriceBar {
                    timestamp: DateTime::from_timestamp_millis(r.t)?,
                    open: r.o,
                    high: r.h,
                    low: r.l,
                    close: r.c,
                    volume: r.v,
                })
            })
            .collect())
    }

    /// Get news headlines, newest first
    pub async fn get_news(&self, symbol: Option<&str>, limit: u32) -> Result<Vec<Headline>, BriefError> {
        let mut query = vec![
            ("limit", limit.to_string()),
            ("order", "desc".to_string()),
            ("sort", "published_utc".to_string()),
        ];
        if let Some(sym) = symbol {
            query.push(("ticker", sym.to_string()));
        }

        let news_response: NewsResponse = self.get_json("News", "/v2/reference/news", &query).await?;

        Ok(news_response
            .results
            .into_iter()
            .filter(|r| !r.title.trim().is_empty())
            .map(|r| Headline {
                text: r.title,
                source: r.publisher.and_then(|p| p.name),
                link: r.article_url,
                ticker: symbol
                    .map(str::to_string)
                    .or_else(|| r.tickers.into_iter().next()),
                published_at: r.published_utc,
            })
            .collect())
    }

    /// Reference data (exchange, market cap) for one ticker
    pub async fn get_ticker_details(&self, symbol: &str) -> Result<TickerDetails, BriefError> {
        let path = format!("/v3/reference/tickers/{}", symbol);
        let details_response: TickerDetailsResponse =
            self.get_json("Ticker details", &path, &[]).await?;
        Ok(details_response.results)
    }

    /// Up to 250 contracts on `underlying`, for the put/call ratio
    pub async fn get_options_snapshot(&self, underlying: &str) -> Result<Vec<OptionsContractSnapshot>, BriefError> {
        let path = format!("/v3/snapshot/options/{}", underlying);
        let snap_response: OptionsSnapshotResponse = self
            .get_json("Options snapshot", &path, &[("limit", "250".to_string())])
            .await?;
        Ok(snap_response.results.unwrap_or_default())
    }

    /// Get insider filings for a symbol
    pub async fn get_insider_transactions(&self, symbol: &str, limit: u32) -> Result<Vec<InsiderFiling>, BriefError> {
        let insider_response: InsiderResponse = self
            .get_json(
                "Insiders",
                "/vX/reference/insiders",
                &[("ticker", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(insider_response.results.unwrap_or_default())
    }

    /// Get snapshot for a ticker (last trade, today's OHLCV, prev day)
    pub async fn get_snapshot(&self, symbol: &str) -> Result<SnapshotTicker, BriefError> {
        let path = format!("/v2/snapshot/locale/us/markets/stocks/tickers/{}", symbol);
        let snap_response: SnapshotResponse = self.get_json("Snapshot", &path, &[]).await?;
        Ok(snap_response.ticker)
    }
}

// Polygon wire formats
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64, // timestamp
    o: f64, // open
    h: f64, // high
    l: f64, // low
    c: f64, // close
    #[serde(default)]
    v: f64, // volume
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<NewsResult>,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    #[serde(default)]
    title: String,
    published_utc: Option<String>,
    article_url: Option<String>,
    publisher: Option<NewsPublisher>,
    #[serde(default)]
    tickers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NewsPublisher {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: TickerDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerDetails {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_exchange: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

// /v3/snapshot/options
#[derive(Debug, Deserialize)]
struct OptionsSnapshotResponse {
    results: Option<Vec<OptionsContractSnapshot>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsContractSnapshot {
    #[serde(default)]
    pub details: Option<OptionsDetails>,
    pub open_interest: Option<i64>,
    #[serde(default)]
    pub day: Option<OptionsDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsDetails {
    pub contract_type: Option<String>,
    pub strike_price: Option<f64>,
    pub expiration_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsDay {
    pub volume: Option<i64>,
}

// /vX/reference/insiders
#[derive(Debug, Deserialize)]
struct InsiderResponse {
    results: Option<Vec<InsiderFiling>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderFiling {
    pub filing_date: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub shares: Option<f64>,
    #[serde(default)]
    pub total_value: Option<f64>,
}

// /v2/snapshot/locale/us/markets/stocks/tickers
#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    ticker: SnapshotTicker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTicker {
    pub day: Option<SnapshotDay>,
    #[serde(rename = "lastTrade")]
    pub last_trade: Option<SnapshotLastTrade>,
    #[serde(rename = "todaysChangePerc")]
    pub todays_change_perc: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDay {
    pub c: Option<f64>,
    pub v: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotLastTrade {
    pub p: Option<f64>,
}
