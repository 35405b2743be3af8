//! RSI (Relative Strength Index) with Wilder smoothing.

use crate::models::Candle;

/// Calculate the full RSI series, index-aligned with the input candles.
///
/// The first `period - 1` entries are `None`; the value at index
/// `period - 1` seeds the average gain/loss from the deltas observed so
/// far, after which Wilder smoothing applies:
/// `avg = (avg * (period - 1) + delta) / period`.
/// A zero average loss saturates RSI at 100.
pub fn calculate_rsi(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let len = candles.len();
    if period < 2 || len < period {
        return vec![None; len];
    }

    let mut out = vec![None; len];
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    // Seed from the deltas inside the first `period` candles.
    for i in 1..period {
        let change = candles[i].close - candles[i - 1].close;
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss += -change;
        }
    }
    let seed_deltas = (period - 1) as f64;
    avg_gain /= seed_deltas;
    avg_loss /= seed_deltas;
    out[period - 1] = Some(rsi_value(avg_gain, avg_loss));

    for i in period..len {
        let change = candles[i].close - candles[i - 1].close;
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
