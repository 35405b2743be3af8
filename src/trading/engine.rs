//! The auto-trading engine: periodic analysis cycles with safety gates.
//!
//! One engine instance is constructed per account by the host, with all
//! external collaborators injected. Cycles are serialized: the interval is
//! a minimum spacing, and an in-flight guard skips a tick whenever the
//! previous cycle is still executing. `stop` prevents new cycles but never
//! aborts one mid-flight, so an order is never left half-placed.
//!
//! Every cycle failure is recovered here at the cycle boundary: a bad
//! upstream call skips the cycle, leaves the trade counters untouched and
//! keeps the scheduler alive.

use crate::metrics::Metrics;
use crate::models::indicators::{MacdParams, SarParams};
use crate::models::strategy::{FundConfig, FundMode, StrategyConfig, ValidationResult};
use crate::models::{Direction, Position, TradeStats, TradingState};
use crate::services::{
    AiSignalProvider, ExecutionGateway, MarketDataProvider, NotificationSink,
};
use crate::signals::ClassifiedIndicators;
use crate::strategies::StrategyValidator;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Engine-level defaults, used when no strategy snapshot is attached.
/// An attached [`StrategyConfig`] overrides the gating fields.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub symbol: String,
    pub candle_timeframe: String,
    pub candle_limit: usize,
    pub analysis_interval: Duration,
    /// Applied to every upstream network call.
    pub api_timeout: Duration,
    pub min_confidence: f64,
    pub max_positions: usize,
    pub cooldown: Duration,
    pub min_hold: Duration,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    pub max_consecutive_losses: u32,
    pub fund: FundConfig,
    pub sar_params: SarParams,
    pub macd_params: MacdParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "ETH-USDT-SWAP".to_string(),
            candle_timeframe: "15m".to_string(),
            candle_limit: 100,
            analysis_interval: Duration::from_secs(30),
            api_timeout: Duration::from_secs(60),
            min_confidence: 0.7,
            max_positions: 3,
            cooldown: Duration::from_secs(60),
            min_hold: Duration::ZERO,
            stop_loss_percent: 0.2,
            take_profit_percent: 1.0,
            max_consecutive_losses: 5,
            fund: FundConfig {
                mode: FundMode::AccountBalance,
                balance_fraction: 0.4,
                ..FundConfig::default()
            },
            sar_params: SarParams::default(),
            macd_params: MacdParams::default(),
        }
    }
}

/// Why a cycle ended without placing an order.
#[derive(Debug, Clone)]
pub enum SkipReason {
    AiUnavailable(String),
    LowConfidence { confidence: f64, minimum: f64 },
    MarketDataUnavailable(String),
    StrategyRejected(ValidationResult),
    GatewayUnavailable(String),
    MaxPositions { open: usize, limit: usize },
    LossStreakPaused { consecutive: u32, limit: u32 },
    Cooldown { remaining: Duration },
    NoDirection,
}

/// Outcome of one analysis cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Traded {
        side: Direction,
        size_usd: f64,
        order_id: String,
    },
    Skipped(SkipReason),
    /// Order placement itself failed; counters are not mutated and the
    /// next scheduled cycle may retry naturally.
    Failed(String),
}

/// Why a position was closed by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    ExitSignal,
}

/// A position closed by [`AutoTradingEngine::check_positions`].
#[derive(Debug, Clone)]
pub struct ClosedPosition {
    pub position_id: String,
    pub reason: CloseReason,
    pub realized_pnl: f64,
}

/// Effective gate parameters for one cycle: strategy snapshot wins over
/// engine defaults.
struct CycleParams {
    min_confidence: f64,
    max_positions: usize,
    cooldown: Duration,
    min_hold: Duration,
    stop_loss_percent: f64,
    take_profit_percent: f64,
    max_consecutive_losses: u32,
    fund: FundConfig,
    leverage: u32,
}

impl CycleParams {
    fn resolve(config: &EngineConfig, strategy: Option<&StrategyConfig>) -> Self {
        match strategy {
            Some(s) => Self {
                min_confidence: s.min_confidence,
                max_positions: s.risk_control.max_positions,
                cooldown: Duration::from_secs(s.risk_control.cooldown_seconds),
                min_hold: Duration::from_secs(s.risk_control.min_hold_seconds),
                stop_loss_percent: s.stop_loss_percent,
                take_profit_percent: s.take_profit_percent,
                max_consecutive_losses: s.risk_control.max_consecutive_losses,
                fund: s.fund_config.clone(),
                leverage: s.fund_config.leverage,
            },
            None => Self {
                min_confidence: config.min_confidence,
                max_positions: config.max_positions,
                cooldown: config.cooldown,
                min_hold: config.min_hold,
                stop_loss_percent: config.stop_loss_percent,
                take_profit_percent: config.take_profit_percent,
                max_consecutive_losses: config.max_consecutive_losses,
                fund: config.fund.clone(),
                leverage: config.fund.leverage,
            },
        }
    }
}

pub struct AutoTradingEngine {
    config: EngineConfig,
    strategy: RwLock<Option<StrategyConfig>>,
    state: Mutex<TradingState>,
    market_data: Arc<dyn MarketDataProvider>,
    ai: Arc<dyn AiSignalProvider>,
    gateway: Arc<dyn ExecutionGateway>,
    notifier: Arc<dyn NotificationSink>,
    metrics: Option<Arc<Metrics>>,
    running: AtomicBool,
    stop_notify: Notify,
    /// In-flight guard: a tick that arrives while a cycle is still
    /// executing is skipped instead of overlapping it.
    cycle_guard: Mutex<()>,
    handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl AutoTradingEngine {
    pub fn new(
        config: EngineConfig,
        market_data: Arc<dyn MarketDataProvider>,
        ai: Arc<dyn AiSignalProvider>,
        gateway: Arc<dyn ExecutionGateway>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            strategy: RwLock::new(None),
            state: Mutex::new(TradingState::default()),
            market_data,
            ai,
            gateway,
            notifier,
            metrics: None,
            running: AtomicBool::new(false),
            stop_notify: Notify::new(),
            cycle_guard: Mutex::new(()),
            handle: Mutex::new(None),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Attach (or replace) the strategy snapshot used by future cycles.
    /// In-flight evaluations keep the snapshot they started with.
    pub async fn attach_strategy(&self, strategy: StrategyConfig) {
        *self.strategy.write().await = Some(strategy);
    }

    pub async fn detach_strategy(&self) {
        *self.strategy.write().await = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the current trading state.
    pub async fn state(&self) -> TradingState {
        self.state.lock().await.clone()
    }

    pub async fn stats(&self) -> TradeStats {
        self.state.lock().await.stats.clone()
    }

    pub async fn win_rate(&self) -> f64 {
        self.state.lock().await.stats.win_rate()
    }

    pub async fn reset_stats(&self) {
        self.state.lock().await.stats.reset();
    }

    /// Start the recurring analysis loop: one cycle immediately, then one
    /// per interval. Returns false if already running.
    pub async fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.state.lock().await.is_running = true;

        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            info!(symbol = %engine.config.symbol, "auto-trading engine started");
            engine.guarded_cycle().await;

            let mut interval = tokio::time::interval(engine.config.analysis_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // first tick fires immediately; already ran

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if !engine.running.load(Ordering::SeqCst) {
                            break;
                        }
                        engine.guarded_cycle().await;
                    }
                    _ = engine.stop_notify.notified() => break,
                }
            }
            info!(symbol = %engine.config.symbol, "auto-trading engine stopped");
        });

        *self.handle.lock().await = Some(handle);
        true
    }

    /// Stop the loop. No new cycle starts; an in-flight cycle finishes.
    /// Returns false if not running.
    pub async fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.stop_notify.notify_waiters();
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.state.lock().await.is_running = false;
        true
    }

    async fn guarded_cycle(&self) {
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            warn!("previous analysis cycle still in flight, skipping tick");
            return;
        };
        let _ = self.run_cycle().await;
    }

    /// Execute one analysis cycle. Public so hosts and tests can drive
    /// cycles without the timer.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let started = Instant::now();
        let outcome = self.analyze_and_trade().await;

        if let Some(metrics) = &self.metrics {
            metrics.cycles_total.inc();
            metrics
                .cycle_duration_seconds
                .observe(started.elapsed().as_secs_f64());
            match &outcome {
                CycleOutcome::Skipped(SkipReason::StrategyRejected(_)) => {
                    metrics.cycles_skipped_total.inc();
                    metrics.validation_rejections_total.inc();
                }
                CycleOutcome::Skipped(_) => metrics.cycles_skipped_total.inc(),
                CycleOutcome::Failed(_) => metrics.trade_failures_total.inc(),
                CycleOutcome::Traded { .. } => metrics.trades_total.inc(),
            }
        }

        match &outcome {
            CycleOutcome::Traded { side, size_usd, order_id } => info!(
                side = %side,
                size_usd = size_usd,
                order_id = %order_id,
                "cycle placed a trade"
            ),
            CycleOutcome::Skipped(reason) => debug!(reason = ?reason, "cycle skipped"),
            CycleOutcome::Failed(error) => warn!(error = %error, "order placement failed"),
        }
        outcome
    }

    async fn analyze_and_trade(&self) -> CycleOutcome {
        // Copy-on-read: the whole cycle evaluates one immutable snapshot,
        // so a concurrent strategy edit cannot race an evaluation.
        let strategy = self.strategy.read().await.clone();
        let params = CycleParams::resolve(&self.config, strategy.as_ref());
        let symbol = self.config.symbol.clone();

        // 1. Latest AI analysis.
        let analysis = match timeout(
            self.config.api_timeout,
            self.ai.get_latest_analysis(&symbol),
        )
        .await
        {
            Ok(Ok(analysis)) => analysis,
            Ok(Err(e)) => {
                return CycleOutcome::Skipped(SkipReason::AiUnavailable(e.to_string()))
            }
            Err(_) => {
                return CycleOutcome::Skipped(SkipReason::AiUnavailable(
                    "AI analysis request timed out".to_string(),
                ))
            }
        };
        self.state.lock().await.last_analysis_time = Some(Utc::now());
        let ai_direction = analysis.signal_type.direction();

        // 2. Confidence gate.
        if analysis.confidence < params.min_confidence {
            return CycleOutcome::Skipped(SkipReason::LowConfidence {
                confidence: analysis.confidence,
                minimum: params.min_confidence,
            });
        }

        // 3. Strategy validation, when a strategy is attached.
        if let Some(strategy_config) = &strategy {
            let raw = match timeout(
                self.config.api_timeout,
                self.market_data.get_candles(
                    &symbol,
                    &self.config.candle_timeframe,
                    self.config.candle_limit,
                ),
            )
            .await
            {
                Ok(Ok(candles)) => candles,
                Ok(Err(e)) => {
                    return CycleOutcome::Skipped(SkipReason::MarketDataUnavailable(
                        e.to_string(),
                    ))
                }
                Err(_) => {
                    return CycleOutcome::Skipped(SkipReason::MarketDataUnavailable(
                        "candle request timed out".to_string(),
                    ))
                }
            };
            let indicators = ClassifiedIndicators::from_candles_15m(
                raw,
                self.config.sar_params,
                self.config.macd_params,
            );
            let result =
                StrategyValidator::validate_entry(strategy_config, ai_direction, &indicators);
            if !result.passed {
                self.notify("Strategy rejected", &result.reason, &symbol).await;
                return CycleOutcome::Skipped(SkipReason::StrategyRejected(result));
            }
        }

        // 4. Position limit.
        let positions = match timeout(self.config.api_timeout, self.gateway.get_positions()).await
        {
            Ok(Ok(positions)) => positions,
            Ok(Err(e)) => {
                return CycleOutcome::Skipped(SkipReason::GatewayUnavailable(e.to_string()))
            }
            Err(_) => {
                return CycleOutcome::Skipped(SkipReason::GatewayUnavailable(
                    "position request timed out".to_string(),
                ))
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.open_positions.set(positions.len() as f64);
        }
        {
            let mut state = self.state.lock().await;
            state.current_positions = positions.clone();
        }
        if positions.len() >= params.max_positions {
            return CycleOutcome::Skipped(SkipReason::MaxPositions {
                open: positions.len(),
                limit: params.max_positions,
            });
        }

        // Loss-streak protection.
        {
            let state = self.state.lock().await;
            if params.max_consecutive_losses > 0
                && state.stats.consecutive_losses >= params.max_consecutive_losses
            {
                return CycleOutcome::Skipped(SkipReason::LossStreakPaused {
                    consecutive: state.stats.consecutive_losses,
                    limit: params.max_consecutive_losses,
                });
            }
        }

        // 5. Cooldown: a hard rate limiter independent of signal quality.
        if let Some(last_trade) = self.state.lock().await.last_trade_time {
            let elapsed = (Utc::now() - last_trade)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if elapsed < params.cooldown {
                return CycleOutcome::Skipped(SkipReason::Cooldown {
                    remaining: params.cooldown - elapsed,
                });
            }
        }

        // 6. Trade direction from the AI signal.
        let Some(side) = ai_direction else {
            return CycleOutcome::Skipped(SkipReason::NoDirection);
        };

        // 7. Size and place the order.
        let balance = match timeout(
            self.config.api_timeout,
            self.gateway.get_account_balance(),
        )
        .await
        {
            Ok(Ok(balance)) => balance,
            Ok(Err(e)) => {
                return CycleOutcome::Skipped(SkipReason::GatewayUnavailable(e.to_string()))
            }
            Err(_) => {
                return CycleOutcome::Skipped(SkipReason::GatewayUnavailable(
                    "balance request timed out".to_string(),
                ))
            }
        };
        let size_usd = params.fund.order_size_usd(balance.total_equity);

        match timeout(
            self.config.api_timeout,
            self.gateway
                .execute_trade(&symbol, side, size_usd, params.leverage),
        )
        .await
        {
            Ok(Ok(order)) => {
                {
                    let mut state = self.state.lock().await;
                    state.stats.record_open();
                    state.last_trade_time = Some(Utc::now());
                }
                self.notify(
                    "Trade executed",
                    &format!("{} {}", side, symbol),
                    &format!("confidence: {:.0}%", analysis.confidence * 100.0),
                )
                .await;
                CycleOutcome::Traded {
                    side,
                    size_usd,
                    order_id: order.order_id,
                }
            }
            Ok(Err(e)) => {
                self.notify("Trade failed", &e.to_string(), &symbol).await;
                CycleOutcome::Failed(e.to_string())
            }
            Err(_) => {
                let message = "order placement timed out".to_string();
                self.notify("Trade failed", &message, &symbol).await;
                CycleOutcome::Failed(message)
            }
        }
    }

    /// Sweep open positions: close on stop-loss/take-profit breach, or on
    /// a passing exit-condition validation. May run on its own cadence;
    /// state writes serialize with the analysis cycle through the state
    /// lock.
    pub async fn check_positions(&self) -> Vec<ClosedPosition> {
        let strategy = self.strategy.read().await.clone();
        let params = CycleParams::resolve(&self.config, strategy.as_ref());

        let positions = match timeout(self.config.api_timeout, self.gateway.get_positions()).await
        {
            Ok(Ok(positions)) => positions,
            Ok(Err(e)) => {
                warn!(error = %e, "position sweep: gateway unavailable");
                return Vec::new();
            }
            Err(_) => {
                warn!("position sweep: position request timed out");
                return Vec::new();
            }
        };

        // Exit conditions need indicators; fetch the feed once per sweep.
        let indicators = match &strategy {
            Some(s) if !s.sell_conditions.is_empty() => {
                match timeout(
                    self.config.api_timeout,
                    self.market_data.get_candles(
                        &self.config.symbol,
                        &self.config.candle_timeframe,
                        self.config.candle_limit,
                    ),
                )
                .await
                {
                    Ok(Ok(raw)) => Some(ClassifiedIndicators::from_candles_15m(
                        raw,
                        self.config.sar_params,
                        self.config.macd_params,
                    )),
                    _ => {
                        debug!("position sweep: candles unavailable, SL/TP checks only");
                        None
                    }
                }
            }
            _ => None,
        };

        let now = Utc::now();
        let mut closed = Vec::new();

        for position in &positions {
            let held = (now - position.entry_time).to_std().unwrap_or(Duration::ZERO);
            if held < params.min_hold {
                continue;
            }

            let pnl_pct = position.pnl_percent();
            let reason = if pnl_pct <= -params.stop_loss_percent {
                Some(CloseReason::StopLoss)
            } else if pnl_pct >= params.take_profit_percent {
                Some(CloseReason::TakeProfit)
            } else {
                self.exit_signal_reason(strategy.as_ref(), indicators.as_ref(), position)
            };

            let Some(reason) = reason else { continue };
            match timeout(
                self.config.api_timeout,
                self.gateway.close_position(&position.id),
            )
            .await
            {
                Ok(Ok(result)) => {
                    let realized = result.realized_pnl.unwrap_or(position.unrealized_pnl);
                    {
                        let mut state = self.state.lock().await;
                        state.stats.record_close(realized);
                        state.current_positions.retain(|p| p.id != position.id);
                    }
                    if let Some(metrics) = &self.metrics {
                        metrics.positions_closed_total.inc();
                    }
                    info!(
                        position_id = %position.id,
                        reason = ?reason,
                        pnl_pct = pnl_pct,
                        "position closed"
                    );
                    self.notify(
                        "Position closed",
                        &format!("{} {} ({:?})", position.side, position.symbol, reason),
                        &format!("pnl: {:.2}%", pnl_pct),
                    )
                    .await;
                    closed.push(ClosedPosition {
                        position_id: position.id.clone(),
                        reason,
                        realized_pnl: realized,
                    });
                }
                Ok(Err(e)) => {
                    warn!(position_id = %position.id, error = %e, "failed to close position");
                }
                Err(_) => {
                    warn!(position_id = %position.id, "close request timed out");
                }
            }
        }

        closed
    }

    fn exit_signal_reason(
        &self,
        strategy: Option<&StrategyConfig>,
        indicators: Option<&ClassifiedIndicators>,
        position: &Position,
    ) -> Option<CloseReason> {
        let strategy = strategy?;
        let indicators = indicators?;
        if strategy.sell_conditions.is_empty() {
            return None;
        }
        let result =
            StrategyValidator::validate_exit(strategy, position.side.opposite(), indicators);
        if result.passed {
            Some(CloseReason::ExitSignal)
        } else {
            None
        }
    }

    async fn notify(&self, title: &str, body: &str, detail: &str) {
        if let Err(e) = self.notifier.notify(title, body, detail).await {
            debug!(error = %e, "notification sink error");
        }
    }
}
