use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::BriefError;

/// Longest ticker symbol accepted at the API boundary (e.g. `BRK-B`, `^GSPC`).
pub const MAX_SYMBOL_LEN: usize = 10;

/// Upper-case and validate a user supplied ticker symbol.
pub fn normalize_symbol(raw: &str) -> Result<String, BriefError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(BriefError::InvalidSymbol("symbol is empty".to_string()));
    }
    if symbol.len() > MAX_SYMBOL_LEN {
        return Err(BriefError::InvalidSymbol(format!(
            "{} exceeds {} characters",
            symbol, MAX_SYMBOL_LEN
        )));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'))
    {
        return Err(BriefError::InvalidSymbol(format!(
            "{} contains unsupported characters",
            symbol
        )));
    }
    Ok(symbol)
}

/// News headline as delivered by a news source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    #[serde(rename = "headline")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl Headline {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
            link: None,
            ticker: None,
            published_at: None,
        }
    }
}

/// Market stance of a headline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Bullish,
    Bearish,
    Neutral,
    /// Sentinel for empty input; never produced by the model itself.
    InvalidInput,
}

impl Stance {
    /// Map a raw model label onto a stance.
    ///
    /// `positive` → bullish, `negative` → bearish, anything else → neutral.
    /// Matching ignores case and surrounding whitespace.
    pub fn from_model_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("positive") {
            Stance::Bullish
        } else if label.eq_ignore_ascii_case("negative") {
            Stance::Bearish
        } else {
            Stance::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Bullish => "bullish",
            Stance::Bearish => "bearish",
            Stance::Neutral => "neutral",
            Stance::InvalidInput => "invalid_input",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output for a single headline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub stance: Stance,
    /// Probability mass of the chosen class, 0.0 to 1.0
    pub confidence: f64,
}

impl SentimentResult {
    pub fn new(stance: Stance, confidence: f64) -> Self {
        Self {
            stance,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Result for empty or whitespace-only text.
    pub const fn invalid_input() -> Self {
        Self {
            stance: Stance::InvalidInput,
            confidence: 0.0,
        }
    }

    /// Result recorded when inference fails: a no-signal observation.
    pub const fn degraded() -> Self {
        Self {
            stance: Stance::Neutral,
            confidence: 0.0,
        }
    }
}

/// Headline paired with its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedArticle {
    #[serde(flatten)]
    pub headline: Headline,
    pub sentiment: SentimentResult,
}

/// Per-stance article counts for one ticker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    pub fn total(&self) -> usize {
        self.bullish + self.bearish + self.neutral
    }
}

/// Corporate insider filing as shown in a brief
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderTransaction {
    pub holder: String,
    pub shares: String,
    pub position: String,
    pub date: String,
    pub transaction_text: String,
}

/// Congressional trade disclosure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliticianTrade {
    pub politician: String,
    pub party: String,
    pub date: String,
    #[serde(rename = "type")]
    pub trade_type: String,
    pub amount: String,
    pub ticker: String,
}

/// Auxiliary market signals passed through into a brief without interpretation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSignals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_call_ratio: Option<f64>,
    /// Reserved pass-through; no bundled source fills it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institutional_holders: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insider_sentiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corporate_insiders: Option<Vec<InsiderTransaction>>,
    /// Reserved pass-through like `institutional_holders`. Carried verbatim
    /// when a caller supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub politician_trades: Option<Vec<PoliticianTrade>>,
}

/// Per-ticker brief returned to API consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerBrief {
    pub symbol: String,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub neutral_count: usize,
    pub articles: Vec<AnalyzedArticle>,
    /// 0.0 (all bearish) to 1.0 (all bullish), rounded to 2 decimals
    pub safety_score: f64,
    #[serde(flatten)]
    pub market: MarketSignals,
}

impl TickerBrief {
    /// Neutral prior used when no score can be computed.
    pub const DEFAULT_SAFETY_SCORE: f64 = 0.5;

    /// Well-formed brief with no articles.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bullish_count: 0,
            bearish_count: 0,
            neutral_count: 0,
            articles: Vec::new(),
            safety_score: Self::DEFAULT_SAFETY_SCORE,
            market: MarketSignals::default(),
        }
    }

    pub fn counts(&self) -> SentimentCounts {
        SentimentCounts {
            bullish: self.bullish_count,
            bearish: self.bearish_count,
            neutral: self.neutral_count,
        }
    }
}

/// Daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Chart point with moving averages over closes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma50: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma100: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ema50: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ema100: Option<f64>,
}

/// Chart range accepted by the price-history endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[default]
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "max")]
    Max,
}

/// Intraday bar size and the number of trading sessions shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntradayWindow {
    pub minutes: u32,
    pub sessions: usize,
}

impl HistoryPeriod {
    pub const ALL: [HistoryPeriod; 11] = [
        HistoryPeriod::OneDay,
        HistoryPeriod::FiveDays,
        HistoryPeriod::OneMonth,
        HistoryPeriod::ThreeMonths,
        HistoryPeriod::SixMonths,
        HistoryPeriod::YearToDate,
        HistoryPeriod::OneYear,
        HistoryPeriod::TwoYears,
        HistoryPeriod::FiveYears,
        HistoryPeriod::TenYears,
        HistoryPeriod::Max,
    ];

    /// `Some` for the ranges charted from intraday bars.
    pub fn intraday(&self) -> Option<IntradayWindow> {
        match self {
            HistoryPeriod::OneDay => Some(IntradayWindow { minutes: 5, sessions: 1 }),
            HistoryPeriod::FiveDays => Some(IntradayWindow { minutes: 15, sessions: 5 }),
            _ => None,
        }
    }

    /// Calendar days of bars to request. Daily ranges up to two years fetch a
    /// full two years so the long averages have settled by the first point.
    pub fn fetch_days(&self) -> i64 {
        match self {
            HistoryPeriod::OneDay => 7,
            HistoryPeriod::FiveDays => 10,
            HistoryPeriod::OneMonth
            | HistoryPeriod::ThreeMonths
            | HistoryPeriod::SixMonths
            | HistoryPeriod::YearToDate
            | HistoryPeriod::OneYear
            | HistoryPeriod::TwoYears => 730,
            HistoryPeriod::FiveYears => 1826,
            HistoryPeriod::TenYears => 3652,
            HistoryPeriod::Max => 18_262,
        }
    }

    /// Earliest bar shown for a daily range. `None` shows everything fetched.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            HistoryPeriod::OneMonth => 30,
            HistoryPeriod::ThreeMonths => 90,
            HistoryPeriod::SixMonths => 180,
            HistoryPeriod::OneYear => 365,
            HistoryPeriod::YearToDate => {
                return Utc.with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0).single();
            }
            _ => return None,
        };
        Some(now - Duration::days(days))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::OneDay => "1d",
            HistoryPeriod::FiveDays => "5d",
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::YearToDate => "ytd",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::FiveYears => "5y",
            HistoryPeriod::TenYears => "10y",
            HistoryPeriod::Max => "max",
        }
    }
}

impl FromStr for HistoryPeriod {
    type Err = BriefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        HistoryPeriod::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = HistoryPeriod::ALL.iter().map(|p| p.as_str()).collect();
                BriefError::InvalidData(format!(
                    "unsupported period '{}', expected one of {}",
                    wanted,
                    valid.join(", ")
                ))
            })
    }
}
