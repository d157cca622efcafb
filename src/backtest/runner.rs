use crate::backtest::metrics::{BacktestReport, FillLedger, TradeRecord};
use crate::config::StrategyConfig;
use crate::error::EngineError;
use crate::execution::{PaperGateway, StrategyCore};
use crate::models::{Bar, Event};

/// Replays bars through a strategy core against the paper gateway
pub struct BacktestRunner {
    instrument: String,
    config: StrategyConfig,
    warmup_bars: usize,
}

impl BacktestRunner {
    /// Create a runner that warms up on the first `window_size` bars
    pub fn new(instrument: impl Into<String>, config: StrategyConfig) -> Self {
        let warmup_bars = config.window_size;
        Self {
            instrument: instrument.into(),
            config,
            warmup_bars,
        }
    }

    /// Run a backtest over `bars`
    ///
    /// The first `warmup_bars` go through `on_init`; the rest are traded.
    /// Before each traded bar reaches the core, orders resting from the
    /// previous bar are matched against it and the fills are dispatched.
    pub fn run(&self, bars: &[Bar]) -> Result<BacktestReport, EngineError> {
        if bars.len() <= self.warmup_bars {
            return Err(EngineError::InsufficientHistory {
                indicator: "backtest",
                needed: self.warmup_bars + 1,
                available: bars.len(),
            });
        }

        let mut core = StrategyCore::new(self.instrument.clone(), self.config.clone())?;
        let mut gateway = PaperGateway::new();
        let mut ledger = FillLedger::default();
        let mut trades = Vec::new();
        let mut max_long_units = 0;
        let mut max_short_units = 0;

        tracing::info!(
            "Starting backtest: {} bars, {} for warm-up",
            bars.len(),
            self.warmup_bars
        );

        let (warmup, live) = bars.split_at(self.warmup_bars);
        core.on_init(warmup);
        core.on_start();

        for bar in live {
            for event in gateway.match_bar(bar) {
                if let Event::Trade(trade) = &event {
                    ledger.apply(trade);
                }
                core.dispatch(&event, &mut gateway);

                if let Event::Trade(trade) = event {
                    let position = core.position();
                    max_long_units = max_long_units.max(position.max(0) as u32);
                    max_short_units = max_short_units.max((-position).max(0) as u32);
                    trades.push(TradeRecord {
                        instant: bar.instant,
                        direction: trade.direction,
                        price: trade.price,
                        quantity: trade.quantity,
                        position_after: position,
                    });
                }
            }

            core.on_bar(bar, &mut gateway);
        }

        core.on_stop(&mut gateway);

        let last_close = live.last().map_or(0.0, |bar| bar.close);
        let report = BacktestReport {
            instrument: self.instrument.clone(),
            bars: bars.len(),
            orders_sent: gateway.orders_sent(),
            orders_cancelled: gateway.orders_cancelled(),
            trades,
            final_position: core.position(),
            max_long_units,
            max_short_units,
            realized_pnl: ledger.realized_pnl(),
            net_pnl: ledger.net_pnl(last_close),
        };

        tracing::info!(
            "Backtest complete: {} fills, final position {}, net P&L {:.2}",
            report.trades.len(),
            report.final_position,
            report.net_pnl
        );

        Ok(report)
    }

    /// Run backtest and print report
    pub fn run_and_report(
        &self,
        bars: &[Bar],
        scenario_name: &str,
    ) -> Result<BacktestReport, EngineError> {
        println!("\n🔬 Running backtest: {}", scenario_name);
        println!("   Instrument: {}", self.instrument);
        println!("   Bars: {}", bars.len());
        println!("   Signals: {}", self.config.signals.len());

        let report = self.run(bars)?;
        report.print_report();

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::synthetic::{MarketScenario, SyntheticDataGenerator};
    use crate::models::Direction;

    fn turtle_only() -> StrategyConfig {
        StrategyConfig {
            signals: Vec::new(),
            window_size: 30,
            ..StrategyConfig::default()
        }
    }

    #[test]
    fn test_backtest_breakout_goes_long() {
        tracing_subscriber::fmt()
            .with_env_filter("ctabot=debug")
            .try_init()
            .ok();

        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Breakout, 400, 1);

        let runner = BacktestRunner::new("SYNTH", turtle_only());
        let report = runner.run(&bars).unwrap();

        assert_eq!(report.bars, 400);
        assert!(report.orders_sent > 0);
        assert!(report
            .trades
            .iter()
            .any(|t| t.direction == Direction::Long && t.position_after > 0));
        assert!(report.max_long_units >= 1);
        assert!(report.max_long_units <= 4);
        assert!(report.max_short_units <= 4);
    }

    #[test]
    fn test_backtest_with_default_signals() {
        let mut gen = SyntheticDataGenerator::new(3);
        let bars = gen.generate(MarketScenario::Volatile, 600, 1);

        let runner = BacktestRunner::new("SYNTH", StrategyConfig::default());
        let report = runner.run(&bars).unwrap();

        assert!(report.max_long_units <= 4);
        assert!(report.max_short_units <= 4);
        assert!(report.final_position.abs() <= 4);
        assert!(report.net_pnl.is_finite());
    }

    #[test]
    fn test_backtest_insufficient_data() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Uptrend, 30, 1);

        let runner = BacktestRunner::new("SYNTH", turtle_only());
        let err = runner.run(&bars).unwrap_err();
        assert!(err.to_string().contains("insufficient history for backtest"));
    }

    #[test]
    fn test_backtest_invalid_config() {
        let mut gen = SyntheticDataGenerator::new(42);
        let bars = gen.generate(MarketScenario::Uptrend, 200, 1);

        let config = StrategyConfig {
            pyramid_limit: 0,
            ..turtle_only()
        };
        let runner = BacktestRunner::new("SYNTH", config);
        assert!(matches!(runner.run(&bars), Err(EngineError::InvalidConfig(_))));
    }
}
