//! Turns raw indicator series into the confirmed readings strategy
//! conditions query: "what is the directional state now?" and "did a
//! reversal or cross just happen?".
//!
//! The SAR reading is always taken from the *second-to-last* computed
//! point. The last point reflects a candle whose window may still be open,
//! and acting on it causes intrabar signal flicker; the one-candle
//! confirmation lag is the system's core defense against that.

use crate::candles;
use crate::indicators::{calculate_macd, calculate_sar};
use crate::models::indicators::{Alignment, CrossType, MacdParams, SarParams};
use crate::models::signal::Direction;
use crate::models::Candle;
use serde::{Deserialize, Serialize};

/// Confirmed SAR state for one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SarReading {
    pub value: f64,
    pub signal: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_signal: Option<Direction>,
    pub is_reversal: bool,
}

/// Latest fully computed MACD state for one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub dif: f64,
    pub dea: f64,
    pub histogram: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross: Option<CrossType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

/// Confirmed SAR reading from a full series: the second-to-last point,
/// with the point before it as `prev_signal`. `None` until two points
/// exist (two candles, since the seed candle pair yields two points).
pub fn classify_sar(candles: &[Candle], params: SarParams) -> Option<SarReading> {
    let points = calculate_sar(candles, params);
    if points.len() < 2 {
        return None;
    }
    let confirmed = points[points.len() - 2];
    let prev_signal = if points.len() >= 3 {
        Some(points[points.len() - 3].trend)
    } else {
        None
    };
    Some(SarReading {
        value: confirmed.value,
        signal: confirmed.trend,
        prev_signal,
        is_reversal: confirmed.is_reversal,
    })
}

/// MACD reading from the latest fully computed point. `None` during the
/// warm-up window.
pub fn classify_macd(candles: &[Candle], params: MacdParams) -> Option<MacdReading> {
    let series = calculate_macd(candles, params);
    let point = series.iter().rev().find_map(|p| *p)?;
    Some(MacdReading {
        dif: point.dif,
        dea: point.dea,
        histogram: point.histogram,
        cross: point.cross,
        alignment: point.alignment,
    })
}

/// The classified bundle the validator evaluates conditions against.
/// Readings are `None` when the underlying series has not warmed up yet;
/// the validator treats "no signal yet" as a failed condition, not an
/// error.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClassifiedIndicators {
    pub daily_sar: Option<SarReading>,
    pub sar_15m: Option<SarReading>,
    pub macd_15m: Option<MacdReading>,
}

impl ClassifiedIndicators {
    /// Build all readings from one raw 15-minute feed. The feed is
    /// normalized first (ascending order, malformed rows dropped); the
    /// daily series is rolled up from the normalized candles by UTC date.
    pub fn from_candles_15m(
        raw_15m: Vec<Candle>,
        sar_params: SarParams,
        macd_params: MacdParams,
    ) -> Self {
        let candles_15m = candles::prepare(raw_15m);
        let daily = candles::aggregate_daily(&candles_15m);
        Self {
            daily_sar: classify_sar(&daily, sar_params),
            sar_15m: classify_sar(&candles_15m, sar_params),
            macd_15m: classify_macd(&candles_15m, macd_params),
        }
    }
}
