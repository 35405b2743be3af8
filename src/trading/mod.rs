//! Stateful auto-trading loop.

pub mod engine;

pub use engine::{AutoTradingEngine, CloseReason, ClosedPosition, CycleOutcome, EngineConfig, SkipReason};
