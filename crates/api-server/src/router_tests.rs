use super::*;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use brief_core::{
    BriefError, Headline, HistoryPeriod, MarketDataSource, MarketSignals, NewsSource, PriceBar,
};
use chrono::{Duration, TimeZone, Utc};
use stance_client::{InferenceBackend, InferenceResult, LabelScore};
use std::time::Duration as StdDuration;
use tower::ServiceExt;

struct KeywordBackend;

#[async_trait]
impl InferenceBackend for KeywordBackend {
    async fn predict(&self, text: &str) -> InferenceResult<Vec<LabelScore>> {
        let label = if text.contains("beats") {
            "positive"
        } else if text.contains("misses") {
            "negative"
        } else {
            "neutral"
        };
        Ok(vec![LabelScore::new(label, 0.88), LabelScore::new("other", 0.12)])
    }

    fn backend_name(&self) -> &'static str {
        "keyword"
    }
}

struct FakeNews;

#[async_trait]
impl NewsSource for FakeNews {
    async fn headlines(&self, symbol: &str, _limit: u32) -> Result<Vec<Headline>, BriefError> {
        if symbol == "EMPTY" {
            return Ok(Vec::new());
        }
        Ok(vec![
            Headline {
                source: Some("Wire".into()),
                link: Some("https://example.com/1".into()),
                ticker: Some(symbol.to_string()),
                ..Headline::new(format!("{} beats estimates", symbol))
            },
            Headline::new(format!("{} misses on revenue", symbol)),
            Headline::new(format!("{} holds annual meeting", symbol)),
            Headline::new(format!("{} names new director", symbol)),
        ])
    }
}

struct FakeMarket;

#[async_trait]
impl MarketDataSource for FakeMarket {
    async fn market_signals(&self, _symbol: &str) -> Result<MarketSignals, BriefError> {
        Ok(MarketSignals {
            price: Some(42.0),
            put_call_ratio: Some(0.8),
            ..MarketSignals::default()
        })
    }

    async fn daily_bars(&self, symbol: &str, days: i64) -> Result<Vec<PriceBar>, BriefError> {
        if symbol == "NOPE" {
            return Err(BriefError::NotFound(format!("{} has no bars", symbol)));
        }
        let now = Utc::now();
        Ok((0..days)
            .rev()
            .map(|d| PriceBar {
                timestamp: now - Duration::days(d),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 10.0,
                volume: 1.0,
            })
            .collect())
    }

    async fn intraday_bars(
        &self,
        _symbol: &str,
        minutes: u32,
        _days: i64,
    ) -> Result<Vec<PriceBar>, BriefError> {
        // two sessions of four bars each
        let last_open = Utc.with_ymd_and_hms(2025, 3, 14, 13, 30, 0).unwrap();
        Ok([Duration::days(1), Duration::zero()]
            .iter()
            .flat_map(|back| {
                (0..4).map(move |i| PriceBar {
                    timestamp: last_open - *back + Duration::minutes(minutes as i64 * i),
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 12.5,
                    volume: 1.0,
                })
            })
            .collect())
    }
}

fn test_app() -> Router {
    let classifier = StanceClassifier::new(
        Arc::new(KeywordBackend),
        vec!["positive".into(), "negative".into(), "neutral".into()],
        StdDuration::from_secs(5),
    );
    let builder = BriefBuilder::new(
        Arc::new(classifier),
        Arc::new(FakeNews),
        Arc::new(FakeMarket),
        BriefConfig::default(),
    );
    let trending: Vec<String> = (0..15).map(|i| format!("T{}", i)).collect();
    let state = AppState {
        builder: Arc::new(builder),
        trending: Arc::new(trending),
    };
    build_router(state, &["http://localhost:3000".to_string()])
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_root_and_health() {
    let (status, body) = get_json(test_app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, body) = get_json(test_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["classifier_backend"], "keyword");
    assert_eq!(body["classifier_ready"], true);
}

#[tokio::test]
async fn test_ticker_brief_shape() {
    let (status, body) = get_json(test_app(), "/api/v1/ticker/aapl").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["bullish_count"], 1);
    assert_eq!(body["bearish_count"], 1);
    assert_eq!(body["neutral_count"], 2);
    assert_eq!(body["safety_score"], 0.5);
    assert_eq!(body["price"], 42.0);
    assert_eq!(body["put_call_ratio"], 0.8);
    assert!(body.get("exchange").is_none());

    let first = &body["articles"][0];
    assert_eq!(first["headline"], "AAPL beats estimates");
    assert_eq!(first["source"], "Wire");
    assert_eq!(first["sentiment"]["stance"], "bullish");
    assert_eq!(first["sentiment"]["confidence"], 0.88);
    assert!(body["articles"][1].get("link").is_none());
}

#[tokio::test]
async fn test_ticker_without_news_is_empty_brief() {
    let (status, body) = get_json(test_app(), "/api/v1/ticker/EMPTY").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["articles"].as_array().unwrap().len(), 0);
    assert_eq!(body["safety_score"], 0.5);
}

#[tokio::test]
async fn test_invalid_symbol_is_bad_request() {
    let (status, body) = get_json(test_app(), "/api/v1/ticker/WAY_TOO_LONG_SYMBOL").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Invalid symbol"));
}

#[tokio::test]
async fn test_history_default_and_bad_period() {
    let (status, body) = get_json(test_app(), "/api/v1/ticker/SPY/history").await;
    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert!(!points.is_empty());
    assert_eq!(points[0]["price"], 10.0);
    assert_eq!(points[0]["ma100"], 10.0);

    let (status, body) = get_json(test_app(), "/api/v1/ticker/SPY/history?period=7w").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("7w"));

    let (status, _) = get_json(test_app(), "/api/v1/ticker/NOPE/history?period=3mo").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_intraday_period() {
    let (status, body) = get_json(test_app(), "/api/v1/ticker/SPY/history?period=1d").await;
    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 4);
    assert_eq!(points[0]["time"], "2025-03-14 13:30");
    assert_eq!(points[1]["time"], "2025-03-14 13:35");
    assert_eq!(points[0]["price"], 12.5);
    assert!(points[0]["ma50"].is_null());

    let (status, body) = get_json(test_app(), "/api/v1/ticker/SPY/history?period=5d").await;
    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 8);
    assert_eq!(points[0]["time"], "2025-03-13 13:30");
    assert_eq!(points[1]["time"], "2025-03-13 13:45");
}

#[tokio::test]
async fn test_history_max_keeps_every_bar() {
    let (status, body) = get_json(test_app(), "/api/v1/ticker/SPY/history?period=max").await;
    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len() as i64, HistoryPeriod::Max.fetch_days());
    assert_eq!(points.last().unwrap()["ma100"], 10.0);
    assert_eq!(points.last().unwrap()["ema100"], 10.0);

    let (status, body) = get_json(test_app(), "/api/v1/ticker/SPY/history?period=ytd").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().len() <= 366);
}

#[tokio::test]
async fn test_trending_is_capped() {
    let (status, body) = get_json(test_app(), "/api/v1/trending").await;
    assert_eq!(status, StatusCode::OK);
    let tickers = body.as_array().unwrap();
    assert_eq!(tickers.len(), MAX_TRENDING);
    assert_eq!(tickers[0], "T0");
}

#[tokio::test]
async fn test_classify_endpoint() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/classify")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"text": "Retailer misses guidance"}"#))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["stance"], "bearish");

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/classify")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"text": "  "}"#))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["stance"], "invalid_input");
    assert_eq!(body["confidence"], 0.0);
}

#[tokio::test]
async fn test_request_id_propagated_or_generated() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}
