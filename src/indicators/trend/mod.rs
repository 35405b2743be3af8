//! Trend-following indicators.

pub mod ma;
pub mod sar;
