//! Order execution gateway interface.

use crate::models::{Direction, Position};
use crate::services::ServiceError;
use serde::{Deserialize, Serialize};

/// Result of an order placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_price: Option<f64>,
}

/// Result of closing a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseResult {
    pub position_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realized_pnl: Option<f64>,
}

/// Account balance snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccountBalance {
    pub total_equity: f64,
}

/// Places and closes orders and reports account state. Positions are
/// created by the gateway on fill and destroyed on close confirmation;
/// the core only reads them.
#[async_trait::async_trait]
pub trait ExecutionGateway: Send + Sync {
    async fn execute_trade(
        &self,
        symbol: &str,
        side: Direction,
        size_usd: f64,
        leverage: u32,
    ) -> Result<OrderResult, ServiceError>;

    async fn close_position(&self, position_id: &str) -> Result<CloseResult, ServiceError>;

    async fn get_positions(&self) -> Result<Vec<Position>, ServiceError>;

    async fn get_account_balance(&self) -> Result<AccountBalance, ServiceError>;
}
