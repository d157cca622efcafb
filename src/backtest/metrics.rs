use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Direction, Trade};

/// Record of a single fill for analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub instant: DateTime<Utc>,
    pub direction: Direction,
    pub price: f64,
    pub quantity: f64,
    /// Signed engine units after the fill
    pub position_after: i64,
}

/// Average-cost ledger over signed quantities
#[derive(Debug, Clone, Default)]
pub struct FillLedger {
    quantity: f64,
    avg_price: f64,
    realized: f64,
}

impl FillLedger {
    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized
    }

    /// Realised plus open P&L marked at `price`
    pub fn net_pnl(&self, price: f64) -> f64 {
        self.realized + self.quantity * (price - self.avg_price)
    }

    pub fn apply(&mut self, trade: &Trade) {
        let signed = trade.direction.sign() as f64 * trade.quantity;

        if self.quantity == 0.0 || self.quantity.signum() == signed.signum() {
            let held = self.quantity.abs();
            self.avg_price =
                (self.avg_price * held + trade.price * trade.quantity) / (held + trade.quantity);
            self.quantity += signed;
            return;
        }

        let closing = trade.quantity.min(self.quantity.abs());
        self.realized += closing * (trade.price - self.avg_price) * self.quantity.signum();

        let before = self.quantity;
        self.quantity += signed;
        if self.quantity.abs() < 1e-9 {
            self.quantity = 0.0;
            self.avg_price = 0.0;
        } else if self.quantity.signum() != before.signum() {
            // the remainder opened the other side at this fill
            self.avg_price = trade.price;
        }
    }
}

/// Summary of one replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub instrument: String,
    pub bars: usize,
    pub orders_sent: usize,
    pub orders_cancelled: usize,
    pub trades: Vec<TradeRecord>,
    pub final_position: i64,
    pub max_long_units: u32,
    pub max_short_units: u32,
    pub realized_pnl: f64,
    /// Realised plus open P&L at the last close
    pub net_pnl: f64,
}

impl BacktestReport {
    pub fn print_report(&self) {
        println!("\n📊 Backtest report: {}", self.instrument);
        println!("   Bars replayed:    {}", self.bars);
        println!("   Orders sent:      {}", self.orders_sent);
        println!("   Orders cancelled: {}", self.orders_cancelled);
        println!("   Fills:            {}", self.trades.len());
        println!(
            "   Max units:        {} long / {} short",
            self.max_long_units, self.max_short_units
        );
        println!("   Final position:   {}", self.final_position);
        println!("   Realized P&L:     {:.2}", self.realized_pnl);
        println!("   Net P&L:          {:.2}", self.net_pnl);
    }
}
