use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ctabot::backtest::{BacktestReport, BacktestRunner, MarketScenario, SyntheticDataGenerator};
use ctabot::config::EngineConfig;
use ctabot::market::BarAggregator;
use ctabot::models::Bar;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    Uptrend,
    Downtrend,
    Sideways,
    Volatile,
    Breakout,
    Gaps,
    All,
}

impl Scenario {
    fn market(self) -> Vec<(MarketScenario, &'static str)> {
        let named = |s: MarketScenario| {
            let name = match s {
                MarketScenario::Uptrend => "📈 Uptrend",
                MarketScenario::Downtrend => "📉 Downtrend",
                MarketScenario::Sideways => "↔️  Sideways (mean-reverting)",
                MarketScenario::Volatile => "⚡ Volatile (±3% swings)",
                MarketScenario::Breakout => "🚀 Range then breakout",
                MarketScenario::WithGaps => "🕳️  With time gaps",
            };
            (s, name)
        };

        match self {
            Scenario::Uptrend => vec![named(MarketScenario::Uptrend)],
            Scenario::Downtrend => vec![named(MarketScenario::Downtrend)],
            Scenario::Sideways => vec![named(MarketScenario::Sideways)],
            Scenario::Volatile => vec![named(MarketScenario::Volatile)],
            Scenario::Breakout => vec![named(MarketScenario::Breakout)],
            Scenario::Gaps => vec![named(MarketScenario::WithGaps)],
            Scenario::All => MarketScenario::ALL.into_iter().map(named).collect(),
        }
    }
}

/// Replay the turtle engine over synthetic bars
#[derive(Debug, Parser)]
#[command(name = "ctabot", version)]
struct Args {
    /// TOML settings file (layered over defaults, under CTABOT__* env vars)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "all")]
    scenario: Scenario,

    /// RNG seed for the synthetic series
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Base bars to generate per scenario
    #[arg(short, long, default_value_t = 1_000)]
    bars: usize,

    /// Minutes per generated base bar
    #[arg(long, default_value_t = 1)]
    interval: u32,

    /// Aggregate this many base bars into each traded bar
    #[arg(long, default_value_t = 1)]
    bar_window: u32,

    /// Print reports as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = EngineConfig::load(args.config.as_deref()).context("loading configuration")?;
    setup_logging(&config.log_filter);

    tracing::info!(
        "🚀 ctabot replay: {} (entry {}, exit {}, atr {}, {} signal units)",
        config.instrument,
        config.strategy.entry_window,
        config.strategy.exit_window,
        config.strategy.atr_window,
        config.strategy.signals.len()
    );

    let runner = BacktestRunner::new(config.instrument.clone(), config.strategy.clone());
    let mut reports = Vec::new();

    for (scenario, name) in args.scenario.market() {
        let mut generator = SyntheticDataGenerator::new(args.seed);
        let base = generator.generate(scenario, args.bars, args.interval);
        let bars = aggregate(&base, args.bar_window);

        let result = if args.json {
            runner.run(&bars)
        } else {
            runner.run_and_report(&bars, name)
        };

        match result {
            Ok(report) => reports.push((name, report)),
            Err(e) => eprintln!("❌ Backtest failed for {}: {}", name, e),
        }
    }

    if args.json {
        let out: Vec<&BacktestReport> = reports.iter().map(|(_, r)| r).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_summary(&reports);
    }

    Ok(())
}

/// Roll base bars up through the same aggregator the live path uses
fn aggregate(base: &[Bar], window: u32) -> Vec<Bar> {
    if window <= 1 {
        return base.to_vec();
    }

    let mut aggregator = BarAggregator::new(window);
    base.iter()
        .filter_map(|bar| aggregator.update_bar(bar))
        .collect()
}

fn print_summary(reports: &[(&str, BacktestReport)]) {
    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              SCENARIO COMPARISON                      ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");
    println!(
        "{:<32} {:>7} {:>6} {:>6} {:>12}",
        "Scenario", "Orders", "Fills", "Pos", "Net P&L"
    );
    for (name, report) in reports {
        println!(
            "{:<32} {:>7} {:>6} {:>6} {:>12.2}",
            name,
            report.orders_sent,
            report.trades.len(),
            report.final_position,
            report.net_pnl
        );
    }
}

/// RUST_LOG wins over the configured filter
fn setup_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
