//! Polygon-backed collaborators for brief building.

use async_trait::async_trait;
use brief_core::{
    BriefError, Headline, InsiderTransaction, MarketDataSource, MarketSignals, NewsSource, PriceBar,
};
use brief_core::indicators::round2;
use chrono::{Duration, Utc};

use crate::{InsiderFiling, OptionsContractSnapshot, PolygonClient, SnapshotTicker};

/// Bars averaged for `average_volume`.
const AVERAGE_VOLUME_BARS: usize = 30;
/// Insider filings shown in a brief.
const MAX_INSIDERS: usize = 5;
const INSIDER_FETCH_LIMIT: u32 = 20;

#[async_trait]
impl NewsSource for PolygonClient {
    async fn headlines(&self, symbol: &str, limit: u32) -> Result<Vec<Headline>, BriefError> {
        self.get_news(Some(symbol), limit).await
    }
}

#[async_trait]
impl MarketDataSource for PolygonClient {
    async fn market_signals(&self, symbol: &str) -> Result<MarketSignals, BriefError> {
        let to = Utc::now();
        // ~30 trading days
        let from = to - Duration::days(45);

        let (snapshot, details, bars, options, insiders) = tokio::join!(
            self.get_snapshot(symbol),
            self.get_ticker_details(symbol),
            self.get_aggregates(symbol, 1, "day", from, to),
            self.get_options_snapshot(symbol),
            self.get_insider_transactions(symbol, INSIDER_FETCH_LIMIT),
        );

        let mut signals = MarketSignals::default();

        match snapshot {
            Ok(snap) => apply_snapshot(&mut signals, &snap),
            Err(e) => tracing::warn!("Snapshot unavailable for {}: {}", symbol, e),
        }

        match details {
            Ok(d) => signals.exchange = d.primary_exchange.filter(|x| !x.is_empty()),
            Err(e) => tracing::warn!("Ticker details unavailable for {}: {}", symbol, e),
        }

        match bars {
            Ok(bars) => signals.average_volume = average_volume(&bars, AVERAGE_VOLUME_BARS),
            Err(e) => tracing::warn!("Daily bars unavailable for {}: {}", symbol, e),
        }

        match options {
            Ok(contracts) => signals.put_call_ratio = put_call_ratio(&contracts),
            Err(e) => tracing::warn!("Options snapshot unavailable for {}: {}", symbol, e),
        }

        match insiders {
            Ok(filings) if !filings.is_empty() => {
                signals.insider_sentiment = insider_sentiment(&filings).map(str::to_string);
                signals.corporate_insiders = Some(
                    filings
                        .iter()
                        .take(MAX_INSIDERS)
                        .map(to_insider_transaction)
                        .collect(),
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Insider filings unavailable for {}: {}", symbol, e),
        }

        Ok(signals)
    }

    async fn daily_bars(&self, symbol: &str, days: i64) -> Result<Vec<PriceBar>, BriefError> {
        let to = Utc::now();
        let from = to - Duration::days(days);
        self.get_aggregates(symbol, 1, "day", from, to).await
    }

    async fn intraday_bars(
        &self,
        symbol: &str,
        minutes: u32,
        days: i64,
    ) -> Result<Vec<PriceBar>, BriefError> {
        let to = Utc::now();
        let from = to - Duration::days(days);
        self.get_aggregates(symbol, minutes, "minute", from, to).await
    }
}

fn apply_snapshot(signals: &mut MarketSignals, snap: &SnapshotTicker) {
    let day_close = snap.day.as_ref().and_then(|d| d.c).filter(|c| *c > 0.0);
    signals.price = snap
        .last_trade
        .as_ref()
        .and_then(|t| t.p)
        .filter(|p| *p > 0.0)
        .or(day_close);
    signals.change_percent = snap.todays_change_perc;
    signals.volume = snap.day.as_ref().and_then(|d| d.v);
}

fn average_volume(bars: &[PriceBar], window: usize) -> Option<f64> {
    let recent = &bars[bars.len().saturating_sub(window)..];
    if recent.is_empty() {
        return None;
    }
    Some(recent.iter().map(|b| b.volume).sum::<f64>() / recent.len() as f64)
}

/// Put volume over call volume, rounded to two decimals; falls back to open
/// interest when the chain has no traded volume. `None` when there are no
/// calls to divide by.
pub fn put_call_ratio(contracts: &[OptionsContractSnapshot]) -> Option<f64> {
    let (mut put_vol, mut call_vol, mut put_oi, mut call_oi) = (0i64, 0i64, 0i64, 0i64);

    for contract in contracts {
        let kind = contract
            .details
            .as_ref()
            .and_then(|d| d.contract_type.as_deref())
            .unwrap_or("");
        let volume = contract.day.as_ref().and_then(|d| d.volume).unwrap_or(0);
        let oi = contract.open_interest.unwrap_or(0);

        if kind.eq_ignore_ascii_case("put") {
            put_vol += volume;
            put_oi += oi;
        } else if kind.eq_ignore_ascii_case("call") {
            call_vol += volume;
            call_oi += oi;
        }
    }

    let ratio = if call_vol > 0 {
        put_vol as f64 / call_vol as f64
    } else if put_vol == 0 && call_oi > 0 {
        put_oi as f64 / call_oi as f64
    } else {
        return None;
    };
    Some(round2(ratio))
}

/// `Bullish` when insiders bought more often than they sold, `Bearish` for
/// the reverse, `Neutral` otherwise. `None` when there are no filings.
pub fn insider_sentiment(filings: &[InsiderFiling]) -> Option<&'static str> {
    if filings.is_empty() {
        return None;
    }

    let (mut buys, mut sells) = (0usize, 0usize);
    for filing in filings {
        let kind = filing
            .transaction_type
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        if kind.contains("buy") || kind.contains("purchase") || kind == "p" {
            buys += 1;
        } else if kind.contains("sell") || kind.contains("sale") || kind == "s" {
            sells += 1;
        }
    }

    Some(if buys > sells {
        "Bullish"
    } else if sells > buys {
        "Bearish"
    } else {
        "Neutral"
    })
}

fn to_insider_transaction(filing: &InsiderFiling) -> InsiderTransaction {
    InsiderTransaction {
        holder: filing.name.clone().unwrap_or_else(|| "Unknown".to_string()),
        shares: filing
            .shares
            .map(|s| format!("{:.0}", s))
            .unwrap_or_default(),
        position: filing.title.clone().unwrap_or_default(),
        date: filing.filing_date.clone().unwrap_or_default(),
        transaction_text: filing.transaction_type.clone().unwrap_or_default(),
    }
}
