//! news-pipeline: classify a batch of headlines and triage them by confidence.
//!
//! Usage:
//!   cargo run -p news-pipeline -- --mode general --max 200
//!   cargo run -p news-pipeline -- --mode ticker --max 25
//!
//! `general` reads headlines for the market proxies and keeps at most `--max`
//! unique ones; `ticker` reads headlines for the first `--max` symbols of the
//! built-in large-cap list.

mod triage;

use anyhow::Context;
use brief_core::{Headline, NewsSource};
use brief_orchestrator::{BriefBuilder, BriefConfig};
use polygon_client::PolygonClient;
use sentiment_analysis::StanceClassifier;
use stance_client::StanceConfig;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use crate::triage::{RunSummary, Triage};

const MARKET_PROXIES: &[&str] = &["SPY", "QQQ", "DIA"];

const LARGE_CAPS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "BRK.B", "JNJ", "V", "WMT", "JPM",
    "META", "NVDA", "UNH", "HD", "PG", "DIS", "MA", "PYPL", "BAC", "XOM",
    "AVGO", "LLY", "COST", "ORCL", "NFLX",
];

const DEFAULT_GENERAL_MAX: usize = 200;
const DEFAULT_TICKER_MAX: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    General,
    Ticker,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(Mode::General),
            "ticker" => Ok(Mode::Ticker),
            other => anyhow::bail!("unknown mode '{}', expected general or ticker", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    mode: Mode,
    max: usize,
}

impl Args {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mode = match flag_value(args, "--mode") {
            Some(raw) => raw.parse()?,
            None => Mode::General,
        };
        let max = match flag_value(args, "--max") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("--max expects a positive integer, got '{}'", raw))?,
            None => match mode {
                Mode::General => DEFAULT_GENERAL_MAX,
                Mode::Ticker => DEFAULT_TICKER_MAX,
            },
        };
        Ok(Self { mode, max })
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

/// Headlines for every symbol in turn. A failing symbol is skipped.
async fn collect_headlines(news: &dyn NewsSource, symbols: &[&str], limit: u32) -> Vec<Headline> {
    let mut all = Vec::new();
    for symbol in symbols {
        match news.headlines(symbol, limit).await {
            Ok(mut headlines) => {
                tracing::info!("{}: {} headlines", symbol, headlines.len());
                for h in headlines.iter_mut() {
                    h.ticker.get_or_insert_with(|| symbol.to_string());
                }
                all.extend(headlines);
            }
            Err(e) => tracing::warn!("Skipping {}: {}", symbol, e),
        }
    }
    all
}

/// Drop repeated `(text, link)` pairs, keeping first occurrences, then cap at `max`.
fn dedup_headlines(headlines: Vec<Headline>, max: usize) -> Vec<Headline> {
    let mut seen = HashSet::new();
    headlines
        .into_iter()
        .filter(|h| seen.insert((h.text.clone(), h.link.clone())))
        .take(max)
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "news_pipeline=info,polygon_client=warn".into()),
        )
        .init();

    let argv: Vec<String> = std::env::args().collect();
    let args = match Args::parse(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: news-pipeline [--mode general|ticker] [--max N]");
            std::process::exit(2);
        }
    };

    let api_key = std::env::var("POLYGON_API_KEY")
        .map_err(|_| anyhow::anyhow!("POLYGON_API_KEY must be set"))?;
    let rate_limit: usize = match std::env::var("POLYGON_RATE_LIMIT") {
        Ok(raw) => raw
            .parse()
            .context("POLYGON_RATE_LIMIT must be a positive integer")?,
        Err(_) => polygon_client::DEFAULT_RATE_LIMIT,
    };
    let polygon = Arc::new(PolygonClient::new(api_key, rate_limit));

    let stance_config = StanceConfig::from_env()?;
    let brief_config = BriefConfig::from_env()?;
    let news_limit = brief_config.news_limit;
    let classifier =
        tokio::task::spawn_blocking(move || StanceClassifier::from_config(&stance_config)).await??;
    tracing::info!("Classifier backend: {}", classifier.backend_name());

    let builder = BriefBuilder::new(Arc::new(classifier), polygon.clone(), polygon.clone(), brief_config);

    let headlines = match args.mode {
        Mode::General => {
            let raw = collect_headlines(polygon.as_ref(), MARKET_PROXIES, news_limit).await;
            dedup_headlines(raw, args.max)
        }
        Mode::Ticker => {
            let symbols: Vec<&str> = LARGE_CAPS.iter().copied().take(args.max).collect();
            collect_headlines(polygon.as_ref(), &symbols, news_limit).await
        }
    };
    tracing::info!("Classifying {} headlines ({:?} mode)", headlines.len(), args.mode);

    let articles = builder.classify_headlines(headlines).await;
    for article in &articles {
        tracing::info!(
            ticker = article.headline.ticker.as_deref().unwrap_or("-"),
            stance = %article.sentiment.stance,
            confidence = article.sentiment.confidence,
            triage = %Triage::of(&article.sentiment),
            "{}",
            article.headline.text
        );
    }

    let summary = RunSummary::from_articles(&articles);
    tracing::info!(
        "Done: {} bullish, {} bearish, {} neutral (safety {:.2}); {} high confidence, {} flagged for review",
        summary.counts.bullish,
        summary.counts.bearish,
        summary.counts.neutral,
        summary.safety_score,
        summary.high_confidence,
        summary.needs_review
    );

    Ok(())
}
