// Bar plumbing: timeframe aggregation and rolling indicator history
pub mod aggregator;
pub mod window;

pub use aggregator::BarAggregator;
pub use window::IndicatorWindow;
