//! Prometheus metrics for the trading engine.

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

/// Engine counters and histograms. Optional on the engine; hosts that
/// scrape metrics call [`Metrics::export`].
pub struct Metrics {
    registry: Registry,
    pub cycles_total: IntCounter,
    pub cycles_skipped_total: IntCounter,
    pub trades_total: IntCounter,
    pub trade_failures_total: IntCounter,
    pub validation_rejections_total: IntCounter,
    pub positions_closed_total: IntCounter,
    pub open_positions: Gauge,
    pub cycle_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles_total =
            IntCounter::new("trading_cycles_total", "Analysis cycles executed")?;
        let cycles_skipped_total = IntCounter::new(
            "trading_cycles_skipped_total",
            "Analysis cycles that ended without a trade",
        )?;
        let trades_total = IntCounter::new("trading_trades_total", "Orders placed")?;
        let trade_failures_total =
            IntCounter::new("trading_trade_failures_total", "Order placements that failed")?;
        let validation_rejections_total = IntCounter::new(
            "trading_validation_rejections_total",
            "Cycles rejected by strategy validation",
        )?;
        let positions_closed_total =
            IntCounter::new("trading_positions_closed_total", "Positions closed")?;
        let open_positions =
            Gauge::new("trading_open_positions", "Open positions at last check")?;
        let cycle_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "trading_cycle_duration_seconds",
            "Analysis cycle duration",
        ))?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycles_skipped_total.clone()))?;
        registry.register(Box::new(trades_total.clone()))?;
        registry.register(Box::new(trade_failures_total.clone()))?;
        registry.register(Box::new(validation_rejections_total.clone()))?;
        registry.register(Box::new(positions_closed_total.clone()))?;
        registry.register(Box::new(open_positions.clone()))?;
        registry.register(Box::new(cycle_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycles_skipped_total,
            trades_total,
            trade_failures_total,
            validation_rejections_total,
            positions_closed_total,
            open_positions,
            cycle_duration_seconds,
        })
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap_or_default())
    }
}
