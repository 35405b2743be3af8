//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! DIF = fast EMA - slow EMA, DEA = EMA(DIF, signal period),
//! histogram = (DIF - DEA) * histogram_scale.

use crate::indicators::trend::ma::ema_series;
use crate::models::indicators::{Alignment, CrossType, MacdParams};
use crate::models::{Candle, MacdPoint};

/// Calculate the full MACD series, index-aligned with the input candles.
/// Entries are `None` until both EMAs and the signal line have warmed up
/// (`slow_period + signal_period - 1` candles).
///
/// A `Golden` cross is flagged on the candle where DIF moves from at-or-
/// below DEA to above it, `Death` on the symmetric move. When no fresh
/// cross occurred the point carries the current DIF/DEA alignment instead.
pub fn calculate_macd(candles: &[Candle], params: MacdParams) -> Vec<Option<MacdPoint>> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast = ema_series(&closes, params.fast_period);
    let slow = ema_series(&closes, params.slow_period);

    // DIF exists from slow warm-up onward; DEA is an EMA over that compact
    // DIF run, re-anchored back to candle indices afterwards.
    let dif_start = params.slow_period.saturating_sub(1);
    let mut dif_compact = Vec::new();
    for i in dif_start..closes.len() {
        if let (Some(f), Some(s)) = (fast[i], slow[i]) {
            dif_compact.push(f - s);
        }
    }
    let dea_compact = ema_series(&dif_compact, params.signal_period);

    let mut out: Vec<Option<MacdPoint>> = vec![None; closes.len()];
    let mut prev: Option<(f64, f64)> = None;

    for (j, dea) in dea_compact.iter().enumerate() {
        let Some(dea) = *dea else { continue };
        let dif = dif_compact[j];
        let i = dif_start + j;

        let cross = match prev {
            Some((prev_dif, prev_dea)) => {
                if prev_dif <= prev_dea && dif > dea {
                    Some(CrossType::Golden)
                } else if prev_dif >= prev_dea && dif < dea {
                    Some(CrossType::Death)
                } else {
                    None
                }
            }
            None => None,
        };
        let alignment = match cross {
            Some(_) => None,
            None if dif > dea => Some(Alignment::Bullish),
            None if dif < dea => Some(Alignment::Bearish),
            None => None,
        };

        out[i] = Some(MacdPoint {
            dif,
            dea,
            histogram: (dif - dea) * params.histogram_scale,
            cross,
            alignment,
        });
        prev = Some((dif, dea));
    }

    out
}
