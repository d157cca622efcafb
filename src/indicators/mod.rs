// Technical indicators module
// Pure functions over bar/price slices; the rolling window wraps them

pub mod atr;
pub mod cci;
pub mod donchian;
pub mod moving_average;
pub mod rsi;

pub use atr::{calculate_atr, true_range};
pub use cci::calculate_cci;
pub use donchian::calculate_donchian;
pub use moving_average::calculate_sma;
pub use rsi::calculate_rsi;
