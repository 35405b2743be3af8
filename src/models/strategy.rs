//! User-configurable strategy data models.
//!
//! The engine treats a [`StrategyConfig`] as an immutable snapshot per
//! evaluation cycle; the UI layer owns persistence and edits.

use crate::models::indicators::Timeframe;
use crate::models::signal::Direction;
use serde::{Deserialize, Serialize};

/// Which indicator a condition queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Sar,
    Macd,
}

/// What the condition asserts about the indicator.
///
/// Only some pairings are meaningful: `Reversal` applies to SAR,
/// `Cross`/`Alignment` apply to MACD. The validator rejects the rest
/// explicitly instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOperator {
    Direction,
    Reversal,
    Cross,
    Alignment,
}

/// How optional conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicType {
    And,
    Or,
}

/// One typed strategy condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyCondition {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub indicator: IndicatorKind,
    pub timeframe: Timeframe,
    pub operator: ConditionOperator,
    /// Explicit expected direction; when absent the AI hint is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Required conditions are hard gates evaluated before the And/Or logic.
    #[serde(default)]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

/// Position sizing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FundMode {
    FixedAmount,
    AccountBalance,
}

/// Fund management block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundConfig {
    pub mode: FundMode,
    /// USD per order in `FixedAmount` mode.
    pub fixed_amount: f64,
    /// Fraction of total equity (0..=1) in `AccountBalance` mode.
    pub balance_fraction: f64,
    pub leverage: u32,
    pub margin_mode: String,
}

impl FundConfig {
    /// Order notional in USD for the given account equity.
    pub fn order_size_usd(&self, total_equity: f64) -> f64 {
        match self.mode {
            FundMode::FixedAmount => self.fixed_amount,
            FundMode::AccountBalance => total_equity * self.balance_fraction,
        }
    }
}

impl Default for FundConfig {
    fn default() -> Self {
        Self {
            mode: FundMode::FixedAmount,
            fixed_amount: 50.0,
            balance_fraction: 0.1,
            leverage: 3,
            margin_mode: "cross".to_string(),
        }
    }
}

/// Risk-control block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskControl {
    pub max_positions: usize,
    pub cooldown_seconds: u64,
    pub min_hold_seconds: u64,
    /// Entries are refused after this many losing closes in a row.
    pub max_consecutive_losses: u32,
}

impl Default for RiskControl {
    fn default() -> Self {
        Self {
            max_positions: 3,
            cooldown_seconds: 60,
            min_hold_seconds: 0,
            max_consecutive_losses: 5,
        }
    }
}

/// Full strategy configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub symbol: String,
    pub buy_conditions: Vec<StrategyCondition>,
    pub buy_logic: LogicType,
    pub sell_conditions: Vec<StrategyCondition>,
    pub sell_logic: LogicType,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    /// Minimum AI confidence (0..=1) before a cycle may trade.
    pub min_confidence: f64,
    pub fund_config: FundConfig,
    pub risk_control: RiskControl,
}

impl StrategyConfig {
    /// The original "pure SAR" preset: daily SAR direction as a required
    /// gate, 15-minute SAR reversal as the entry trigger, OR logic.
    pub fn pure_sar(symbol: &str) -> Self {
        Self {
            name: "SAR standard".to_string(),
            symbol: symbol.to_string(),
            buy_conditions: vec![
                StrategyCondition {
                    id: "daily_sar_direction".to_string(),
                    name: "Daily SAR direction".to_string(),
                    enabled: true,
                    indicator: IndicatorKind::Sar,
                    timeframe: Timeframe::Daily,
                    operator: ConditionOperator::Direction,
                    direction: None,
                    required: true,
                },
                StrategyCondition {
                    id: "sar_15m_reversal".to_string(),
                    name: "15m SAR reversal".to_string(),
                    enabled: true,
                    indicator: IndicatorKind::Sar,
                    timeframe: Timeframe::FifteenMinute,
                    operator: ConditionOperator::Reversal,
                    direction: None,
                    required: false,
                },
            ],
            buy_logic: LogicType::Or,
            sell_conditions: vec![StrategyCondition {
                id: "sar_15m_reversal".to_string(),
                name: "15m SAR reversal".to_string(),
                enabled: true,
                indicator: IndicatorKind::Sar,
                timeframe: Timeframe::FifteenMinute,
                operator: ConditionOperator::Reversal,
                direction: None,
                required: false,
            }],
            sell_logic: LogicType::Or,
            stop_loss_percent: 0.5,
            take_profit_percent: 1.0,
            min_confidence: 0.7,
            fund_config: FundConfig::default(),
            risk_control: RiskControl::default(),
        }
    }
}

/// Outcome of checking one condition, kept for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionCheck {
    pub condition_id: String,
    pub condition_name: String,
    pub passed: bool,
    pub reason: String,
    pub expected: String,
    pub actual: String,
}

/// Full validation outcome. Produced fresh on every evaluation and never
/// mutated; the per-condition breakdown is part of the API, not a debug
/// afterthought.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub reason: String,
    pub details: Vec<ConditionCheck>,
}
