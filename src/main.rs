//! Sarpilot auto-trader
//!
//! Wires the REST-backed services into the trading engine and runs it
//! until interrupted.

use sarpilot::config;
use sarpilot::logging::init_logging;
use sarpilot::models::strategy::StrategyConfig;
use sarpilot::services::{LogNotificationSink, RestClient};
use sarpilot::trading::{AutoTradingEngine, EngineConfig};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    init_logging();

    let symbol = env::var("SYMBOL").unwrap_or_else(|_| "ETH-USDT-SWAP".to_string());
    let analysis_interval: u64 = env::var("ANALYSIS_INTERVAL_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    let client = Arc::new(RestClient::with_timeout(
        config::api_base_url(),
        config::api_timeout(),
    )?);

    let engine_config = EngineConfig {
        symbol: symbol.clone(),
        analysis_interval: Duration::from_secs(analysis_interval),
        api_timeout: config::api_timeout(),
        ..EngineConfig::default()
    };

    let engine = Arc::new(AutoTradingEngine::new(
        engine_config,
        Arc::clone(&client) as Arc<dyn sarpilot::services::MarketDataProvider>,
        Arc::clone(&client) as Arc<dyn sarpilot::services::AiSignalProvider>,
        Arc::clone(&client) as Arc<dyn sarpilot::services::ExecutionGateway>,
        Arc::new(LogNotificationSink),
    ));
    engine.attach_strategy(StrategyConfig::pure_sar(&symbol)).await;

    info!(
        symbol = %symbol,
        environment = %config::get_environment(),
        api = %config::api_base_url(),
        interval_seconds = analysis_interval,
        "starting auto-trader"
    );
    engine.start().await;

    // Position sweeps run on the same cadence as analysis cycles.
    let sweeper = Arc::clone(&engine);
    let sweep_handle = tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(analysis_interval));
        loop {
            interval.tick().await;
            if !sweeper.is_running() {
                break;
            }
            sweeper.check_positions().await;
        }
    });

    signal::ctrl_c().await?;
    info!("shutdown requested, stopping engine");
    engine.stop().await;
    sweep_handle.abort();

    let stats = engine.stats().await;
    info!(
        total_trades = stats.total_trades,
        win_rate = stats.win_rate(),
        total_pnl = stats.total_pnl,
        "final statistics"
    );
    Ok(())
}
