//! Volatility indicators.

pub mod bollinger;
