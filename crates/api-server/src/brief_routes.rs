use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use brief_core::{HistoryPeriod, PricePoint, SentimentResult, TickerBrief};
use serde::Deserialize;

use crate::request_id::RequestId;
use crate::{AppError, AppState, MAX_TRENDING};

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub period: Option<String>,
}

#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

pub fn brief_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/ticker/:symbol", get(get_ticker_brief))
        .route("/api/v1/ticker/:symbol/history", get(get_price_history))
        .route("/api/v1/trending", get(get_trending))
        .route("/api/v1/classify", post(classify_text))
}

async fn get_ticker_brief(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(symbol): Path<String>,
) -> Result<Json<TickerBrief>, AppError> {
    tracing::debug!(request_id = %request_id.0, "Building brief for {}", symbol);
    let brief = state.builder.build(&symbol).await?;
    Ok(Json(brief))
}

async fn get_price_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<PricePoint>>, AppError> {
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse::<HistoryPeriod>()?,
        None => HistoryPeriod::default(),
    };
    let points = state.builder.price_history(&symbol, period).await?;
    Ok(Json(points))
}

async fn get_trending(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.trending.iter().take(MAX_TRENDING).cloned().collect())
}

async fn classify_text(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Json<SentimentResult> {
    Json(state.builder.classifier().classify(&req.text).await)
}
