//! Parabolic SAR (Stop-And-Reverse) indicator.

use crate::models::indicators::{SarParams, SarPoint};
use crate::models::signal::Direction;
use crate::models::Candle;

/// Calculate the full SAR series.
///
/// The initial trend is `Long` when `close[1] >= close[0]`, `Short`
/// otherwise; the first point carries the seed SAR (first low for a long
/// start, first high for a short start) and is never a reversal. On every
/// later candle the SAR advances by `af * (ep - sar)`; a close breach of
/// the SAR flips the trend, swaps SAR and the extreme point, and resets the
/// acceleration factor. On non-flip candles the acceleration factor grows
/// by `af_step` up to `af_max`.
///
/// Fewer than two candles cannot seed a trend; the result is empty.
///
/// Note for callers: the *last* point reflects a possibly in-progress
/// candle. Confirmed-signal consumers must read the second-to-last point
/// (see [`crate::signals::classifier`]).
pub fn calculate_sar(candles: &[Candle], params: SarParams) -> Vec<SarPoint> {
    if candles.len() < 2 {
        return Vec::new();
    }

    let mut points = Vec::with_capacity(candles.len());
    let mut is_long = candles[1].close >= candles[0].close;
    let mut af = params.af_step;
    let mut ep = if is_long {
        candles[0].high
    } else {
        candles[0].low
    };
    let mut sar = if is_long {
        candles[0].low
    } else {
        candles[0].high
    };

    points.push(SarPoint {
        value: sar,
        trend: trend_of(is_long),
        is_reversal: false,
    });

    for candle in &candles[1..] {
        sar += af * (ep - sar);
        let mut reversed = false;

        if is_long {
            if candle.low < sar {
                is_long = false;
                sar = ep;
                ep = candle.low;
                af = params.af_step;
                reversed = true;
            } else {
                if candle.high > ep {
                    ep = candle.high;
                }
                af = (af + params.af_step).min(params.af_max);
            }
        } else if candle.high > sar {
            is_long = true;
            sar = ep;
            ep = candle.high;
            af = params.af_step;
            reversed = true;
        } else {
            if candle.low < ep {
                ep = candle.low;
            }
            af = (af + params.af_step).min(params.af_max);
        }

        points.push(SarPoint {
            value: sar,
            trend: trend_of(is_long),
            is_reversal: reversed,
        });
    }

    points
}

fn trend_of(is_long: bool) -> Direction {
    if is_long {
        Direction::Long
    } else {
        Direction::Short
    }
}
