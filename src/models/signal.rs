//! Directional signal types shared by the classifier, validator and engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// Upstream AI recommendation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

impl SignalType {
    /// Directional reading of the signal; `Hold` carries none.
    pub fn direction(self) -> Option<Direction> {
        match self {
            SignalType::Buy => Some(Direction::Long),
            SignalType::Sell => Some(Direction::Short),
            SignalType::Hold => None,
        }
    }
}

/// Latest AI-generated analysis for a symbol, as served by the upstream
/// signal provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub symbol: String,
    pub signal_type: SignalType,
    /// 0..=1
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    pub timestamp: DateTime<Utc>,
}
