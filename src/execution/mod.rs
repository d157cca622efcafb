// Order routing, position bookkeeping and the strategy core
pub mod core;
pub mod gateway;
pub mod position;

pub use self::core::{StrategyCore, StrategyState};
pub use gateway::{OrderGateway, PaperGateway};
pub use position::{EntryRecord, FillEffect, PositionBook};
