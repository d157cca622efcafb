// Offline replay of the strategy core over synthetic bars
pub mod metrics;
pub mod runner;
pub mod synthetic;

pub use metrics::{BacktestReport, FillLedger, TradeRecord};
pub use runner::BacktestRunner;
pub use synthetic::{MarketScenario, SyntheticDataGenerator};
