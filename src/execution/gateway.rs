use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{Bar, Event, OrderId, OrderIntent, OrderStatus, OrderUpdate, Trade};

/// Order routing seam between the strategy core and whatever executes orders
pub trait OrderGateway {
    /// Submit one order intent
    fn send_order(&mut self, intent: &OrderIntent) -> Result<OrderId, EngineError>;

    /// Cancel every resting order for `instrument`, returning how many were cancelled
    fn cancel_all(&mut self, instrument: &str) -> Result<usize, EngineError>;
}

#[derive(Debug, Clone)]
struct RestingOrder {
    id: OrderId,
    intent: OrderIntent,
}

/// In-process gateway that fills resting orders against later bars
///
/// Stop orders trigger once the bar trades through the stop price and fill
/// at the stop or the open, whichever is worse for the order. Limit orders
/// fill at the limit or the open, whichever is better.
#[derive(Debug, Default)]
pub struct PaperGateway {
    resting: Vec<RestingOrder>,
    orders_sent: usize,
    cancelled: usize,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders waiting for a trigger, in submission order
    pub fn resting(&self) -> impl Iterator<Item = &OrderIntent> {
        self.resting.iter().map(|order| &order.intent)
    }

    pub fn orders_sent(&self) -> usize {
        self.orders_sent
    }

    pub fn orders_cancelled(&self) -> usize {
        self.cancelled
    }

    /// Match resting orders against `bar`
    ///
    /// Returns the resulting order and trade events in submission order;
    /// filled orders are removed from the book.
    pub fn match_bar(&mut self, bar: &Bar) -> Vec<Event> {
        let mut events = Vec::new();

        self.resting.retain(|order| match Self::fill_price(&order.intent, bar) {
            Some(price) => {
                events.push(Event::Order(OrderUpdate {
                    id: order.id,
                    status: OrderStatus::AllTraded,
                }));
                events.push(Event::Trade(Trade {
                    order_id: order.id,
                    price,
                    quantity: order.intent.quantity,
                    direction: order.intent.side.direction(),
                }));
                false
            }
            None => true,
        });

        events
    }

    fn fill_price(intent: &OrderIntent, bar: &Bar) -> Option<f64> {
        use crate::models::Direction::{Long, Short};

        match (intent.side.direction(), intent.conditional) {
            (Long, true) if bar.high >= intent.price => Some(intent.price.max(bar.open)),
            (Short, true) if bar.low <= intent.price => Some(intent.price.min(bar.open)),
            (Long, false) if bar.low <= intent.price => Some(intent.price.min(bar.open)),
            (Short, false) if bar.high >= intent.price => Some(intent.price.max(bar.open)),
            _ => None,
        }
    }
}

impl OrderGateway for PaperGateway {
    fn send_order(&mut self, intent: &OrderIntent) -> Result<OrderId, EngineError> {
        if !(intent.price.is_finite() && intent.price > 0.0) {
            return Err(EngineError::rejected(format!(
                "invalid price {} for {}",
                intent.price, intent.instrument
            )));
        }
        if !(intent.quantity.is_finite() && intent.quantity > 0.0) {
            return Err(EngineError::rejected(format!(
                "invalid quantity {} for {}",
                intent.quantity, intent.instrument
            )));
        }

        let id = Uuid::new_v4();
        self.resting.push(RestingOrder {
            id,
            intent: intent.clone(),
        });
        self.orders_sent += 1;

        Ok(id)
    }

    fn cancel_all(&mut self, instrument: &str) -> Result<usize, EngineError> {
        let before = self.resting.len();
        self.resting
            .retain(|order| order.intent.instrument != instrument);
        let cancelled = before - self.resting.len();
        self.cancelled += cancelled;

        Ok(cancelled)
    }
}
