//! Bollinger Bands indicator.
//!
//! Middle = SMA(close, period), upper/lower = middle +- k * population
//! standard deviation over the same window.

use crate::models::{BollingerPoint, Candle};

/// Calculate the full Bollinger Bands series, index-aligned with the input
/// candles. The first `period - 1` entries are `None`.
pub fn calculate_bollinger(
    candles: &[Candle],
    period: usize,
    k: f64,
) -> Vec<Option<BollingerPoint>> {
    let len = candles.len();
    if period == 0 {
        return vec![None; len];
    }
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let mut out = vec![None; len];

    for i in (period - 1)..len {
        let window = &closes[i + 1 - period..=i];
        let middle = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();
        out[i] = Some(BollingerPoint {
            upper: middle + k * std,
            middle,
            lower: middle - k * std,
        });
    }

    out
}
