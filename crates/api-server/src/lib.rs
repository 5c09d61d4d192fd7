//! HTTP API over the brief builder.

pub mod brief_routes;
pub mod config;
pub mod error;
pub mod request_id;

#[cfg(test)]
mod router_tests;

pub use config::{ServerConfig, MAX_TRENDING};
pub use error::AppError;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware,
    routing::get,
    Json, Router,
};
use brief_orchestrator::{BriefBuilder, BriefConfig};
use polygon_client::PolygonClient;
use sentiment_analysis::StanceClassifier;
use serde_json::{json, Value};
use stance_client::StanceConfig;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::brief_routes::brief_routes;
use crate::request_id::request_id_middleware;

#[derive(Clone)]
pub struct AppState {
    pub builder: Arc<BriefBuilder>,
    pub trending: Arc<Vec<String>>,
}

/// Install the global subscriber. `RUST_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(brief_routes())
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors_layer(allowed_origins))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Balanced Alpha API is running" }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let classifier = state.builder.classifier();
    Json(json!({
        "ok": true,
        "classifier_backend": classifier.backend_name(),
        "classifier_ready": classifier.health().await,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    let stance_config = StanceConfig::from_env()?;
    let brief_config = BriefConfig::from_env()?;

    // Model loading may block for a while with the embedded backend.
    let classifier =
        tokio::task::spawn_blocking(move || StanceClassifier::from_config(&stance_config)).await??;

    let polygon = Arc::new(PolygonClient::new(
        config.polygon_api_key.clone(),
        config.polygon_rate_limit,
    ));
    let builder = BriefBuilder::new(Arc::new(classifier), polygon.clone(), polygon, brief_config);

    let state = AppState {
        builder: Arc::new(builder),
        trending: Arc::new(config.trending.clone()),
    };
    let app = build_router(state, &config.allowed_origins);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
