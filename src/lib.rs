// Core modules
pub mod backtest;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod market;
pub mod models;
pub mod strategy;

// Re-export commonly used types
pub use crate::config::{EngineConfig, StrategyConfig};
pub use error::EngineError;
pub use execution::{OrderGateway, PaperGateway, StrategyCore};
pub use models::*;
pub use strategy::SignalUnit;
