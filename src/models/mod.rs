//! Shared data models spanning the engine layers.

pub mod candle;
pub mod indicators;
pub mod signal;
pub mod strategy;
pub mod trading;

pub use candle::Candle;
pub use indicators::{
    Alignment, BollingerPoint, CrossType, MacdParams, MacdPoint, SarParams, SarPoint, Timeframe,
};
pub use signal::{AiAnalysis, Direction, SignalType};
pub use strategy::{
    ConditionCheck, ConditionOperator, FundConfig, FundMode, IndicatorKind, LogicType, RiskControl,
    StrategyCondition, StrategyConfig, ValidationResult,
};
pub use trading::{Position, TradeStats, TradingState};
