//! Moving averages aligned to their input series.
//!
//! Each output has the same length as the input. SMA positions before a full
//! window are `None`; the EMA is defined from the first value.

/// Round to two decimals for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    let mut window_sum: f64 = data[..period].iter().sum();
    result[period - 1] = Some(window_sum / period as f64);
    for i in period..data.len() {
        window_sum += data[i] - data[i - period];
        result[i] = Some(window_sum / period as f64);
    }
    result
}

/// Exponential Moving Average with smoothing `2 / (span + 1)`, seeded with
/// the first value and defined for every position (non-adjusted recursion).
pub fn ema(data: &[f64], span: usize) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let alpha = 2.0 / (span.max(1) as f64 + 1.0);

    let mut prev = first;
    let mut result = Vec::with_capacity(data.len());
    result.push(prev);
    for &x in &data[1..] {
        prev = alpha * x + (1.0 - alpha) * prev;
        result.push(prev);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_alignment() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sma(&data, 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_sma_short_series() {
        assert_eq!(sma(&[1.0, 2.0], 3), vec![None, None]);
        assert!(sma(&[], 3).is_empty());
        assert_eq!(sma(&[1.0], 0), vec![None]);
    }

    #[test]
    fn test_ema_recursive_from_first_value() {
        // pandas: Series([10, 20, 30, 40]).ewm(span=3, adjust=False).mean()
        assert_eq!(ema(&[10.0, 20.0, 30.0, 40.0], 3), vec![10.0, 15.0, 22.5, 31.25]);
    }

    #[test]
    fn test_ema_edge_cases() {
        assert!(ema(&[], 50).is_empty());
        assert_eq!(ema(&[7.0], 50), vec![7.0]);

        let flat = ema(&[10.0; 60], 50);
        assert_eq!(flat.len(), 60);
        assert!(flat.iter().all(|v| (v - 10.0).abs() < 1e-12));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.625), 0.63);
        assert_eq!(round2(1.0 / 3.0), 0.33);
        assert_eq!(round2(-2.004), -2.0);
    }
}
