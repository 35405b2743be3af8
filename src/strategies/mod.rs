//! Strategy validation against classified indicator readings.

pub mod validator;

pub use validator::StrategyValidator;
