use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gateway-assigned order identifier
pub type OrderId = Uuid;

/// Single last-price update
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Tick {
    pub instant: DateTime<Utc>,
    pub last_price: f64,
}

/// Bar period
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Interval {
    Minutes(u32),
    Daily,
}

impl Interval {
    /// Span in minutes for intraday intervals
    pub fn minutes(&self) -> Option<u32> {
        match self {
            Interval::Minutes(n) => Some(*n),
            Interval::Daily => None,
        }
    }

    /// Interval covering `window` consecutive bars of this interval
    pub fn scaled(&self, window: u32) -> Interval {
        match self {
            Interval::Minutes(n) => Interval::Minutes(n.saturating_mul(window)),
            Interval::Daily => Interval::Daily,
        }
    }
}

/// OHLCV bar, immutable once emitted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub instant: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub interval: Interval,
}

impl Bar {
    /// Minute of the day the bar starts at
    pub fn minute_of_day(&self) -> u32 {
        self.instant.hour() * 60 + self.instant.minute()
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Directional vote of a signal unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SignalValue {
    Short = -1,
    #[default]
    Flat = 0,
    Long = 1,
}

impl SignalValue {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Order side as seen by the gateway
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
    Short,
    Cover,
}

impl Side {
    /// Direction a fill of this side moves the position
    pub fn direction(self) -> Direction {
        match self {
            Side::Buy | Side::Cover => Direction::Long,
            Side::Sell | Side::Short => Direction::Short,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn sign(self) -> i64 {
        match self {
            Direction::Long => 1,
            Direction::Short => -1,
        }
    }
}

/// Order intent handed to the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderIntent {
    pub instrument: String,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    /// Stop order: rests until the trigger price trades
    pub conditional: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Submitting,
    NotTraded,
    PartTraded,
    AllTraded,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            OrderStatus::Submitting | OrderStatus::NotTraded | OrderStatus::PartTraded
        )
    }
}

/// Order status report from the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderUpdate {
    pub id: OrderId,
    pub status: OrderStatus,
}

/// Fill report from the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trade {
    pub order_id: OrderId,
    pub price: f64,
    pub quantity: f64,
    pub direction: Direction,
}

/// Anything the reactor delivers to a strategy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    Tick(Tick),
    Bar(Bar),
    Order(OrderUpdate),
    Trade(Trade),
}
