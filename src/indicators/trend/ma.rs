//! Simple and exponential moving averages.

use crate::models::Candle;

/// Sliding-window SMA over raw values. Entries before index `period - 1`
/// are `None`.
pub fn sma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut out = vec![None; values.len()];
    let mut window_sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        window_sum += v;
        if i >= period {
            window_sum -= values[i - period];
        }
        if i + 1 >= period {
            out[i] = Some(window_sum / period as f64);
        }
    }
    out
}

/// EMA over raw values with multiplier `2 / (period + 1)`, seeded with the
/// SMA of the first `period` values. Entries before index `period - 1`
/// are `None`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }
    let mut out = vec![None; values.len()];
    let k = 2.0 / (period as f64 + 1.0);

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(seed);

    let mut ema = seed;
    for i in period..values.len() {
        ema = values[i] * k + ema * (1.0 - k);
        out[i] = Some(ema);
    }
    out
}

/// SMA of candle closes.
pub fn calculate_sma(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    sma_series(&closes, period)
}

/// EMA of candle closes.
pub fn calculate_ema(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    ema_series(&closes, period)
}
