//! Classified indicator readings the strategy layer queries.

pub mod classifier;

pub use classifier::{classify_macd, classify_sar, ClassifiedIndicators, MacdReading, SarReading};
