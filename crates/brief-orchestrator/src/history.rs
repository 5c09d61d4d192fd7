use brief_core::indicators::{ema, round2, sma};
use brief_core::{PriceBar, PricePoint};
use chrono::{DateTime, NaiveDate, Utc};

/// Daily chart points from bars at or after `cutoff` (all bars when `None`).
/// Moving averages are computed over the full series, so the bars before the
/// cutoff only serve as look-back. `bars` must be oldest first.
pub fn price_points(bars: &[PriceBar], cutoff: Option<DateTime<Utc>>) -> Vec<PricePoint> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ma50 = sma(&closes, 50);
    let ma100 = sma(&closes, 100);
    let ema50 = ema(&closes, 50);
    let ema100 = ema(&closes, 100);

    bars.iter()
        .enumerate()
        .filter(|(_, bar)| cutoff.map_or(true, |c| bar.timestamp >= c))
        .map(|(i, bar)| PricePoint {
            time: bar.timestamp.format("%Y-%m-%d").to_string(),
            price: round2(bar.close),
            ma50: ma50[i].map(round2),
            ma100: ma100[i].map(round2),
            ema50: Some(round2(ema50[i])),
            ema100: Some(round2(ema100[i])),
        })
        .collect()
}

/// Intraday chart points for the last `sessions` trading days present in
/// `bars`, stamped `YYYY-MM-DD HH:MM` (UTC) and without averages.
pub fn intraday_points(bars: &[PriceBar], sessions: usize) -> Vec<PricePoint> {
    let mut days: Vec<NaiveDate> = bars.iter().map(|b| b.timestamp.date_naive()).collect();
    days.dedup();
    let Some(&first_day) = days.get(days.len().saturating_sub(sessions.max(1))) else {
        return Vec::new();
    };

    bars.iter()
        .filter(|bar| bar.timestamp.date_naive() >= first_day)
        .map(|bar| PricePoint {
            time: bar.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            price: round2(bar.close),
            ma50: None,
            ma100: None,
            ema50: None,
            ema100: None,
        })
        .collect()
}
