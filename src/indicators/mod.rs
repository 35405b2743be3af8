//! Pure indicator functions over ordered candle series.
//!
//! Every function here is deterministic and stateless between calls: it
//! re-derives the full series from scratch and returns one entry per input
//! candle, with `None` (or absent flags) during warm-up. Input must be
//! ascending by timestamp; run feeds through [`crate::candles::prepare`]
//! first.

pub mod momentum;
pub mod trend;
pub mod volatility;

pub use momentum::macd::calculate_macd;
pub use momentum::rsi::calculate_rsi;
pub use trend::ma::{calculate_ema, calculate_sma, ema_series, sma_series};
pub use trend::sar::calculate_sar;
pub use volatility::bollinger::calculate_bollinger;
