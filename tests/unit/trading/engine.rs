//! Unit tests for the auto-trading engine's cycle gates

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use sarpilot::models::strategy::StrategyConfig;
use sarpilot::models::{AiAnalysis, Candle, Direction, Position, SignalType};
use sarpilot::services::{
    AccountBalance, AiSignalProvider, CloseResult, ExecutionGateway, MarketDataProvider,
    NotificationSink, OrderResult, ServiceError,
};
use sarpilot::trading::{
    AutoTradingEngine, CloseReason, CycleOutcome, EngineConfig, SkipReason,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FakeAi {
    analysis: Mutex<Option<AiAnalysis>>,
}

impl FakeAi {
    fn with(signal_type: SignalType, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            analysis: Mutex::new(Some(AiAnalysis {
                symbol: "ETH-USDT-SWAP".to_string(),
                signal_type,
                confidence,
                suggested_price: None,
                stop_loss: None,
                take_profit: None,
                timestamp: Utc::now(),
            })),
        })
    }

    fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            analysis: Mutex::new(None),
        })
    }
}

#[async_trait]
impl AiSignalProvider for FakeAi {
    async fn get_latest_analysis(&self, _symbol: &str) -> Result<AiAnalysis, ServiceError> {
        self.analysis
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| "analysis feed down".into())
    }
}

struct FakeMarketData {
    candles: Vec<Candle>,
}

impl FakeMarketData {
    fn uptrend() -> Arc<Self> {
        // Several days of rising 15m candles: SAR long on both timeframes.
        let base = Utc::now() - ChronoDuration::days(5);
        let candles = (0..(4 * 96))
            .map(|i| {
                let close = 100.0 + i as f64 * 0.2;
                Candle::new(
                    close,
                    close + 0.5,
                    close - 0.5,
                    close,
                    1000.0,
                    base + ChronoDuration::minutes(15 * i as i64),
                )
            })
            .collect();
        Arc::new(Self { candles })
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarketData {
    async fn get_candles(
        &self,
        _symbol: &str,
        _timeframe: &str,
        _limit: usize,
    ) -> Result<Vec<Candle>, ServiceError> {
        Ok(self.candles.clone())
    }
}

#[derive(Default)]
struct FakeGateway {
    positions: Mutex<Vec<Position>>,
    equity: Mutex<f64>,
    trades: AtomicUsize,
    closes: AtomicUsize,
    fail_trades: bool,
}

impl FakeGateway {
    fn with_equity(equity: f64) -> Arc<Self> {
        let gateway = Self::default();
        *gateway.equity.lock().unwrap() = equity;
        Arc::new(gateway)
    }

    fn set_positions(&self, positions: Vec<Position>) {
        *self.positions.lock().unwrap() = positions;
    }
}

#[async_trait]
impl ExecutionGateway for FakeGateway {
    async fn execute_trade(
        &self,
        symbol: &str,
        side: Direction,
        size_usd: f64,
        _leverage: u32,
    ) -> Result<OrderResult, ServiceError> {
        if self.fail_trades {
            return Err("exchange rejected order".into());
        }
        self.trades.fetch_add(1, Ordering::SeqCst);
        self.positions.lock().unwrap().push(Position {
            id: format!("pos-{}", self.trades.load(Ordering::SeqCst)),
            symbol: symbol.to_string(),
            side,
            size: size_usd / 100.0,
            entry_price: 100.0,
            leverage: 3,
            unrealized_pnl: 0.0,
            entry_time: Utc::now(),
        });
        Ok(OrderResult {
            order_id: "order-1".to_string(),
            filled_price: Some(100.0),
        })
    }

    async fn close_position(&self, position_id: &str) -> Result<CloseResult, ServiceError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        let mut positions = self.positions.lock().unwrap();
        let pnl = positions
            .iter()
            .find(|p| p.id == position_id)
            .map(|p| p.unrealized_pnl);
        positions.retain(|p| p.id != position_id);
        Ok(CloseResult {
            position_id: position_id.to_string(),
            realized_pnl: pnl,
        })
    }

    async fn get_positions(&self) -> Result<Vec<Position>, ServiceError> {
        Ok(self.positions.lock().unwrap().clone())
    }

    async fn get_account_balance(&self) -> Result<AccountBalance, ServiceError> {
        Ok(AccountBalance {
            total_equity: *self.equity.lock().unwrap(),
        })
    }
}

#[derive(Default)]
struct SilentSink;

#[async_trait]
impl NotificationSink for SilentSink {
    async fn notify(&self, _title: &str, _body: &str, _detail: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

fn engine_with(
    ai: Arc<FakeAi>,
    gateway: Arc<FakeGateway>,
) -> AutoTradingEngine {
    let config = EngineConfig {
        cooldown: Duration::ZERO,
        ..EngineConfig::default()
    };
    AutoTradingEngine::new(
        config,
        FakeMarketData::uptrend(),
        ai,
        gateway,
        Arc::new(SilentSink),
    )
}

fn open_position(id: &str, side: Direction, unrealized_pnl: f64) -> Position {
    Position {
        id: id.to_string(),
        symbol: "ETH-USDT-SWAP".to_string(),
        side,
        size: 1.0,
        entry_price: 100.0,
        leverage: 3,
        unrealized_pnl,
        entry_time: Utc::now() - ChronoDuration::minutes(10),
    }
}

#[tokio::test]
async fn test_cycle_trades_on_buy_signal() {
    let gateway = FakeGateway::with_equity(1000.0);
    let engine = engine_with(FakeAi::with(SignalType::Buy, 0.9), Arc::clone(&gateway));

    let outcome = engine.run_cycle().await;
    match outcome {
        CycleOutcome::Traded { side, size_usd, .. } => {
            assert_eq!(side, Direction::Long);
            // AccountBalance mode, 40% of equity.
            assert!((size_usd - 400.0).abs() < 1e-9);
        }
        other => panic!("expected trade, got {:?}", other),
    }
    assert_eq!(gateway.trades.load(Ordering::SeqCst), 1);
    let stats = engine.stats().await;
    assert_eq!(stats.total_trades, 1);
    assert!(engine.state().await.last_trade_time.is_some());
}

#[tokio::test]
async fn test_cycle_skips_when_ai_unavailable() {
    let gateway = FakeGateway::with_equity(1000.0);
    let engine = engine_with(FakeAi::unavailable(), Arc::clone(&gateway));

    let outcome = engine.run_cycle().await;
    assert!(matches!(
        outcome,
        CycleOutcome::Skipped(SkipReason::AiUnavailable(_))
    ));
    assert_eq!(gateway.trades.load(Ordering::SeqCst), 0);
    assert_eq!(engine.stats().await.total_trades, 0);
}

#[tokio::test]
async fn test_cycle_skips_low_confidence() {
    let gateway = FakeGateway::with_equity(1000.0);
    let engine = engine_with(FakeAi::with(SignalType::Buy, 0.5), Arc::clone(&gateway));

    let outcome = engine.run_cycle().await;
    assert!(matches!(
        outcome,
        CycleOutcome::Skipped(SkipReason::LowConfidence { .. })
    ));
    // The analysis was still consumed.
    assert!(engine.state().await.last_analysis_time.is_some());
}

#[tokio::test]
async fn test_cycle_skips_hold_signal() {
    let gateway = FakeGateway::with_equity(1000.0);
    let engine = engine_with(FakeAi::with(SignalType::Hold, 0.9), Arc::clone(&gateway));

    let outcome = engine.run_cycle().await;
    assert!(matches!(
        outcome,
        CycleOutcome::Skipped(SkipReason::NoDirection)
    ));
}

#[tokio::test]
async fn test_cycle_respects_max_positions() {
    let gateway = FakeGateway::with_equity(1000.0);
    gateway.set_positions(vec![
        open_position("p1", Direction::Long, 0.0),
        open_position("p2", Direction::Long, 0.0),
        open_position("p3", Direction::Long, 0.0),
    ]);
    let engine = engine_with(FakeAi::with(SignalType::Buy, 0.9), Arc::clone(&gateway));

    let outcome = engine.run_cycle().await;
    assert!(matches!(
        outcome,
        CycleOutcome::Skipped(SkipReason::MaxPositions { open: 3, limit: 3 })
    ));
    assert_eq!(gateway.trades.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cycle_cooldown_blocks_second_trade() {
    let gateway = FakeGateway::with_equity(1000.0);
    let config = EngineConfig {
        cooldown: Duration::from_secs(3600),
        ..EngineConfig::default()
    };
    let engine = AutoTradingEngine::new(
        config,
        FakeMarketData::uptrend(),
        FakeAi::with(SignalType::Buy, 0.9),
        Arc::clone(&gateway) as Arc<dyn ExecutionGateway>,
        Arc::new(SilentSink),
    );

    assert!(matches!(engine.run_cycle().await, CycleOutcome::Traded { .. }));
    let outcome = engine.run_cycle().await;
    assert!(matches!(
        outcome,
        CycleOutcome::Skipped(SkipReason::Cooldown { .. })
    ));
    assert_eq!(gateway.trades.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cycle_strategy_rejection() {
    let gateway = FakeGateway::with_equity(1000.0);
    let engine = engine_with(FakeAi::with(SignalType::Sell, 0.9), Arc::clone(&gateway));
    // Pure-SAR entry against an uptrending feed: the required daily SAR
    // gate expects short and fails.
    engine
        .attach_strategy(StrategyConfig::pure_sar("ETH-USDT-SWAP"))
        .await;

    let outcome = engine.run_cycle().await;
    match outcome {
        CycleOutcome::Skipped(SkipReason::StrategyRejected(result)) => {
            assert!(!result.passed);
            assert!(result.reason.contains("required"));
        }
        other => panic!("expected strategy rejection, got {:?}", other),
    }
    assert_eq!(gateway.trades.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cycle_strategy_pass_with_aligned_signal() {
    let gateway = FakeGateway::with_equity(1000.0);
    let engine = engine_with(FakeAi::with(SignalType::Buy, 0.9), Arc::clone(&gateway));
    // Drop the 15m reversal trigger so the required daily gate alone
    // decides; the uptrend feed holds it long.
    let mut strategy = StrategyConfig::pure_sar("ETH-USDT-SWAP");
    strategy.buy_conditions.retain(|c| c.required);
    strategy.risk_control.cooldown_seconds = 0;
    engine.attach_strategy(strategy).await;

    assert!(matches!(engine.run_cycle().await, CycleOutcome::Traded { .. }));
}

#[tokio::test]
async fn test_cycle_failed_trade_leaves_stats_untouched() {
    let gateway = Arc::new(FakeGateway {
        fail_trades: true,
        ..FakeGateway::default()
    });
    *gateway.equity.lock().unwrap() = 1000.0;
    let engine = engine_with(FakeAi::with(SignalType::Buy, 0.9), Arc::clone(&gateway));

    let outcome = engine.run_cycle().await;
    assert!(matches!(outcome, CycleOutcome::Failed(_)));
    assert_eq!(engine.stats().await.total_trades, 0);
    assert!(engine.state().await.last_trade_time.is_none());
}

#[tokio::test]
async fn test_loss_streak_pauses_entries() {
    let gateway = FakeGateway::with_equity(1000.0);
    let engine = engine_with(FakeAi::with(SignalType::Buy, 0.9), Arc::clone(&gateway));

    // Simulate five straight losing closes through the position sweep.
    for i in 0..5 {
        gateway.set_positions(vec![open_position(
            &format!("p{}", i),
            Direction::Long,
            -50.0, // -50% of notional, far past stop-loss
        )]);
        let closed = engine.check_positions().await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].reason, CloseReason::StopLoss);
    }
    assert_eq!(engine.stats().await.consecutive_losses, 5);

    gateway.set_positions(Vec::new());
    let outcome = engine.run_cycle().await;
    assert!(matches!(
        outcome,
        CycleOutcome::Skipped(SkipReason::LossStreakPaused { .. })
    ));
}

#[tokio::test]
async fn test_check_positions_take_profit() {
    let gateway = FakeGateway::with_equity(1000.0);
    gateway.set_positions(vec![open_position("p1", Direction::Long, 5.0)]); // +5%
    let engine = engine_with(FakeAi::with(SignalType::Buy, 0.9), Arc::clone(&gateway));

    let closed = engine.check_positions().await;
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].reason, CloseReason::TakeProfit);
    assert!((closed[0].realized_pnl - 5.0).abs() < 1e-9);

    let stats = engine.stats().await;
    assert_eq!(stats.win_trades, 1);
    assert_eq!(gateway.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_check_positions_holds_inside_bands() {
    let gateway = FakeGateway::with_equity(1000.0);
    gateway.set_positions(vec![open_position("p1", Direction::Long, 0.05)]); // +0.05%
    let engine = engine_with(FakeAi::with(SignalType::Buy, 0.9), Arc::clone(&gateway));

    let closed = engine.check_positions().await;
    assert!(closed.is_empty());
    assert_eq!(gateway.closes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_check_positions_min_hold() {
    let gateway = FakeGateway::with_equity(1000.0);
    let mut position = open_position("p1", Direction::Long, -50.0);
    position.entry_time = Utc::now();
    gateway.set_positions(vec![position]);

    let config = EngineConfig {
        min_hold: Duration::from_secs(3600),
        ..EngineConfig::default()
    };
    let engine = AutoTradingEngine::new(
        config,
        FakeMarketData::uptrend(),
        FakeAi::with(SignalType::Buy, 0.9),
        Arc::clone(&gateway) as Arc<dyn ExecutionGateway>,
        Arc::new(SilentSink),
    );

    // Deep under water but inside the minimum hold window: untouched.
    let closed = engine.check_positions().await;
    assert!(closed.is_empty());
}

#[tokio::test]
async fn test_metrics_track_cycles() {
    let metrics = Arc::new(sarpilot::metrics::Metrics::new().unwrap());
    let gateway = FakeGateway::with_equity(1000.0);
    let engine = engine_with(FakeAi::with(SignalType::Buy, 0.9), Arc::clone(&gateway))
        .with_metrics(Arc::clone(&metrics));

    assert!(matches!(engine.run_cycle().await, CycleOutcome::Traded { .. }));
    // Second cycle hits max positions only after three trades; here it
    // trades again (cooldown is zero), so counters keep climbing.
    assert!(matches!(engine.run_cycle().await, CycleOutcome::Traded { .. }));

    let exported = metrics.export().unwrap();
    assert!(exported.contains("trading_cycles_total 2"));
    assert!(exported.contains("trading_trades_total 2"));
}

#[tokio::test]
async fn test_start_and_stop() {
    let gateway = FakeGateway::with_equity(1000.0);
    let engine = Arc::new(AutoTradingEngine::new(
        EngineConfig {
            analysis_interval: Duration::from_secs(3600),
            cooldown: Duration::ZERO,
            ..EngineConfig::default()
        },
        FakeMarketData::uptrend(),
        FakeAi::with(SignalType::Hold, 0.9),
        Arc::clone(&gateway) as Arc<dyn ExecutionGateway>,
        Arc::new(SilentSink),
    ));

    assert!(engine.start().await);
    assert!(!engine.start().await, "second start must be a no-op");
    assert!(engine.is_running());

    assert!(engine.stop().await);
    assert!(!engine.is_running());
    assert!(!engine.stop().await, "second stop must be a no-op");
    assert!(!engine.state().await.is_running);
}
