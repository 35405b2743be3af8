//! REST-backed implementation of the external service interfaces.
//!
//! Talks to a host-provided HTTP API with a `{ success, data, error }`
//! response envelope. All requests share one client with an explicit
//! timeout; a timed-out call surfaces as an error the engine treats as a
//! skipped cycle, never a crash.

use crate::models::{AiAnalysis, Candle, Direction, Position, SignalType};
use crate::services::execution::{AccountBalance, CloseResult, ExecutionGateway, OrderResult};
use crate::services::{AiSignalProvider, MarketDataProvider, ServiceError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");
        let response = self.http.get(&url).send().await?;
        Self::unwrap_envelope(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");
        let response = self.http.post(&url).json(body).send().await?;
        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            return Err(format!("API returned HTTP {}", status).into());
        }
        let envelope: Envelope<T> = response.json().await?;
        if !envelope.success {
            return Err(envelope
                .error
                .unwrap_or_else(|| "request failed".to_string())
                .into());
        }
        envelope
            .data
            .ok_or_else(|| "API response missing data".into())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandleRow {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct AnalysisRow {
    inst_id: String,
    signal_type: SignalType,
    confidence: f64,
    suggested_price: Option<f64>,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionRow {
    id: String,
    symbol: String,
    side: Direction,
    size: f64,
    entry_price: f64,
    #[serde(default = "default_leverage")]
    leverage: u32,
    unrealized_pnl: f64,
    entry_time: i64,
}

fn default_leverage() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct BalanceRow {
    #[serde(deserialize_with = "f64_from_string_or_number")]
    total_equity: f64,
}

#[derive(Debug, Deserialize)]
struct TradeRow {
    order_id: String,
    #[serde(default)]
    filled_price: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct CloseRow {
    #[serde(default)]
    position_id: Option<String>,
    #[serde(default)]
    realized_pnl: Option<f64>,
}

/// The balance endpoint serves `total_equity` as a decimal string; accept
/// a bare number too.
fn f64_from_string_or_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("invalid number")),
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid decimal string: {}", e))),
        other => Err(serde::de::Error::custom(format!(
            "expected number or string, got {}",
            other
        ))),
    }
}

fn timestamp_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

#[async_trait::async_trait]
impl MarketDataProvider for RestClient {
    async fn get_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ServiceError> {
        let rows: Vec<CandleRow> = self
            .get(&format!(
                "/candles?symbol={}&bar={}&limit={}",
                symbol, timeframe, limit
            ))
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Candle::new(r.open, r.high, r.low, r.close, r.volume, timestamp_ms(r.time)))
            .collect())
    }
}

#[async_trait::async_trait]
impl AiSignalProvider for RestClient {
    async fn get_latest_analysis(&self, symbol: &str) -> Result<AiAnalysis, ServiceError> {
        let row: AnalysisRow = self
            .get(&format!("/ai/analysis/latest?symbol={}", symbol))
            .await?;
        Ok(AiAnalysis {
            symbol: row.inst_id,
            signal_type: row.signal_type,
            confidence: row.confidence,
            suggested_price: row.suggested_price,
            stop_loss: row.stop_loss,
            take_profit: row.take_profit,
            timestamp: timestamp_ms(row.timestamp),
        })
    }
}

#[async_trait::async_trait]
impl ExecutionGateway for RestClient {
    async fn execute_trade(
        &self,
        symbol: &str,
        side: Direction,
        size_usd: f64,
        leverage: u32,
    ) -> Result<OrderResult, ServiceError> {
        let row: TradeRow = self
            .post(
                "/trade",
                &json!({
                    "symbol": symbol,
                    "side": side,
                    "size": size_usd,
                    "leverage": leverage,
                }),
            )
            .await?;
        Ok(OrderResult {
            order_id: row.order_id,
            filled_price: row.filled_price,
        })
    }

    async fn close_position(&self, position_id: &str) -> Result<CloseResult, ServiceError> {
        let row: CloseRow = self
            .post("/positions/close", &json!({ "positionId": position_id }))
            .await?;
        Ok(CloseResult {
            position_id: row
                .position_id
                .unwrap_or_else(|| position_id.to_string()),
            realized_pnl: row.realized_pnl,
        })
    }

    async fn get_positions(&self) -> Result<Vec<Position>, ServiceError> {
        let rows: Vec<PositionRow> = self.get("/positions").await?;
        Ok(rows
            .into_iter()
            .map(|r| Position {
                id: r.id,
                symbol: r.symbol,
                side: r.side,
                size: r.size,
                entry_price: r.entry_price,
                leverage: r.leverage,
                unrealized_pnl: r.unrealized_pnl,
                entry_time: timestamp_ms(r.entry_time),
            })
            .collect())
    }

    async fn get_account_balance(&self) -> Result<AccountBalance, ServiceError> {
        let row: BalanceRow = self.get("/account/balance").await?;
        Ok(AccountBalance {
            total_equity: row.total_equity,
        })
    }
}
