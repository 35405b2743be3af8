//! Trading state and bookkeeping types.

use crate::models::signal::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open position as reported by the execution gateway. The core only
/// reads and aggregates positions; it never fabricates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub symbol: String,
    pub side: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub leverage: u32,
    pub unrealized_pnl: f64,
    pub entry_time: DateTime<Utc>,
}

impl Position {
    /// Unrealized P&L as a percentage of entry notional.
    pub fn pnl_percent(&self) -> f64 {
        let notional = self.entry_price * self.size;
        if notional <= 0.0 {
            return 0.0;
        }
        self.unrealized_pnl / notional * 100.0
    }
}

/// Running trade statistics. Monotonic except for [`TradeStats::reset`];
/// all updates are routed through the trading engine (single writer).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: u64,
    pub win_trades: u64,
    pub loss_trades: u64,
    pub total_pnl: f64,
    pub consecutive_losses: u32,
}

impl TradeStats {
    /// Win rate in 0..=1; zero when no trades yet.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.win_trades as f64 / self.total_trades as f64
    }

    pub fn record_open(&mut self) {
        self.total_trades += 1;
    }

    pub fn record_close(&mut self, realized_pnl: f64) {
        self.total_pnl += realized_pnl;
        if realized_pnl >= 0.0 {
            self.win_trades += 1;
            self.consecutive_losses = 0;
        } else {
            self.loss_trades += 1;
            self.consecutive_losses += 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Mutable engine state. Single writer: the auto-trading engine serializes
/// cycle execution and position sweeps behind one lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradingState {
    pub is_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_analysis_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_trade_time: Option<DateTime<Utc>>,
    pub stats: TradeStats,
    pub current_positions: Vec<Position>,
}
