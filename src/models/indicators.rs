//! Per-candle indicator point types and indicator parameter sets.
//!
//! Every indicator series is index-aligned 1:1 with its input candle series;
//! warm-up gaps are `None`, never silently re-indexed.

use crate::models::signal::Direction;
use serde::{Deserialize, Serialize};

/// Timeframes the strategy layer can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1D")]
    Daily,
    #[serde(rename = "15m")]
    FifteenMinute,
}

/// Parabolic SAR acceleration parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SarParams {
    pub af_step: f64,
    pub af_max: f64,
}

impl Default for SarParams {
    fn default() -> Self {
        Self {
            af_step: 0.02,
            af_max: 0.2,
        }
    }
}

/// One computed SAR point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SarPoint {
    pub value: f64,
    pub trend: Direction,
    /// True exactly on the candle where the trend flipped.
    pub is_reversal: bool,
}

/// MACD EMA periods and histogram scaling.
///
/// The canonical parameterization is 12/26/9 with an unscaled histogram.
/// [`MacdParams::legacy`] reproduces the 21/30/5 variant some charting
/// frontends use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    /// Multiplier applied to `dif - dea` when reporting the histogram.
    pub histogram_scale: f64,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            histogram_scale: 1.0,
        }
    }
}

impl MacdParams {
    /// 21/30/5 variant carried over from the original charting layer,
    /// which also doubled the histogram bars.
    pub fn legacy() -> Self {
        Self {
            fast_period: 21,
            slow_period: 30,
            signal_period: 5,
            histogram_scale: 2.0,
        }
    }

    /// Candles needed before the first fully computed MACD point.
    pub fn warmup(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }
}

/// DIF crossing DEA from below (`Golden`) or above (`Death`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossType {
    Golden,
    Death,
}

/// DIF/DEA ordering when no fresh cross occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Bullish,
    Bearish,
}

/// One fully computed MACD point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub dif: f64,
    pub dea: f64,
    pub histogram: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross: Option<CrossType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

/// One Bollinger Bands point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}
