use std::collections::HashSet;

use crate::config::StrategyConfig;
use crate::error::EngineError;
use crate::execution::gateway::OrderGateway;
use crate::execution::position::{EntryRecord, FillEffect, PositionBook};
use crate::market::{BarAggregator, IndicatorWindow};
use crate::models::{Bar, Event, OrderId, OrderIntent, OrderStatus, OrderUpdate, Side, Tick, Trade};
use crate::strategy::{build_units, SignalUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    Created,
    Inited,
    Trading,
    Stopped,
}

/// Turtle-style breakout engine for one instrument
///
/// Per bar: cancel resting orders, feed every signal unit and the core
/// window, sum the votes into a target, then work the entry ladders or the
/// protective stop depending on the current position. Orders only go out
/// while the strategy is trading; warm-up and stopped phases still keep
/// every indicator current.
pub struct StrategyCore {
    instrument: String,
    config: StrategyConfig,
    units: Vec<Box<dyn SignalUnit>>,
    tick_bars: BarAggregator,
    history: IndicatorWindow,
    book: PositionBook,
    state: StrategyState,
    target: i32,
    entry_channel: Option<(f64, f64)>,
    exit_channel: Option<(f64, f64)>,
    /// ATR captured on the last flat bar; sizes ladders and the hard stop
    atr_value: Option<f64>,
    active_orders: HashSet<OrderId>,
}

impl StrategyCore {
    pub fn new(instrument: impl Into<String>, config: StrategyConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let units = build_units(&config.signals, config.window_size);
        Ok(Self::with_units(instrument, config, units))
    }

    /// Build a core around already constructed signal units
    ///
    /// `config.signals` is ignored here.
    pub fn with_units(
        instrument: impl Into<String>,
        config: StrategyConfig,
        units: Vec<Box<dyn SignalUnit>>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            history: IndicatorWindow::new(config.window_size),
            book: PositionBook::new(config.stop_atr_multiple),
            tick_bars: BarAggregator::new(1),
            units,
            config,
            state: StrategyState::Created,
            target: 0,
            entry_channel: None,
            exit_channel: None,
            atr_value: None,
            active_orders: HashSet::new(),
        }
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    pub fn trading(&self) -> bool {
        self.state == StrategyState::Trading
    }

    /// Signed units held
    pub fn position(&self) -> i64 {
        self.book.units()
    }

    pub fn entry_record(&self) -> Option<&EntryRecord> {
        self.book.entry()
    }

    /// Sum of the unit votes from the last bar
    pub fn target(&self) -> i32 {
        self.target
    }

    /// (entry_up, entry_down), refreshed only while flat
    pub fn entry_channel(&self) -> Option<(f64, f64)> {
        self.entry_channel
    }

    /// (exit_up, exit_down), refreshed every bar
    pub fn exit_channel(&self) -> Option<(f64, f64)> {
        self.exit_channel
    }

    pub fn atr_value(&self) -> Option<f64> {
        self.atr_value
    }

    pub fn active_orders(&self) -> usize {
        self.active_orders.len()
    }

    /// Warm up on historical bars without trading
    pub fn on_init<'a>(&mut self, history: impl IntoIterator<Item = &'a Bar>) {
        let mut count = 0;
        for bar in history {
            self.update(bar);
            count += 1;
        }

        self.state = StrategyState::Inited;
        tracing::info!(
            "[{}] strategy initialised on {} bars (window inited: {})",
            self.instrument,
            count,
            self.history.inited()
        );
    }

    pub fn on_start(&mut self) {
        self.state = StrategyState::Trading;
        tracing::info!("[{}] strategy started", self.instrument);
    }

    pub fn on_stop(&mut self, gateway: &mut dyn OrderGateway) {
        self.cancel_all(gateway);
        self.state = StrategyState::Stopped;
        tracing::info!("[{}] strategy stopped", self.instrument);
    }

    /// Route one reactor event to its handler
    pub fn dispatch(&mut self, event: &Event, gateway: &mut dyn OrderGateway) {
        match event {
            Event::Tick(tick) => self.on_tick(tick, gateway),
            Event::Bar(bar) => self.on_bar(bar, gateway),
            Event::Order(update) => self.on_order(update),
            Event::Trade(trade) => self.on_trade(trade),
        }
    }

    /// Build 1-minute bars from ticks and process each finished one
    pub fn on_tick(&mut self, tick: &Tick, gateway: &mut dyn OrderGateway) {
        if let Some(bar) = self.tick_bars.update_tick(tick) {
            self.on_bar(&bar, gateway);
        }
    }

    pub fn on_bar(&mut self, bar: &Bar, gateway: &mut dyn OrderGateway) {
        if self.trading() {
            self.cancel_all(gateway);
        }

        if !self.update(bar) || !self.trading() {
            return;
        }

        if self.book.is_flat() {
            self.work_entry(gateway);
        } else {
            self.work_position(bar, gateway);
        }
    }

    pub fn on_order(&mut self, update: &OrderUpdate) {
        if update.status.is_active() {
            self.active_orders.insert(update.id);
            return;
        }

        self.active_orders.remove(&update.id);
        if update.status == OrderStatus::Rejected {
            let err = EngineError::rejected(format!("order {} rejected by gateway", update.id));
            tracing::warn!("[{}] {}", self.instrument, err);
        }
    }

    pub fn on_trade(&mut self, trade: &Trade) {
        let ratio = trade.quantity / self.config.fixed_size;
        let units = ratio.round() as i64;
        if (ratio - ratio.round()).abs() > 1e-9 {
            tracing::warn!(
                "[{}] fill of {} is not a whole number of {}-lots, booking {} unit(s)",
                self.instrument,
                trade.quantity,
                self.config.fixed_size,
                units.max(0)
            );
        }
        if units <= 0 {
            tracing::warn!(
                "[{}] ignoring fill of {} (below one unit of {})",
                self.instrument,
                trade.quantity,
                self.config.fixed_size
            );
            return;
        }

        let atr = self.atr_value.unwrap_or(0.0);
        let effect = self.book.apply_fill(trade.direction, units, trade.price, atr);

        match effect {
            FillEffect::Opened | FillEffect::Reversed => {
                if self.atr_value.is_none() {
                    tracing::warn!(
                        "[{}] no ATR basis yet, stop placed at the fill price {:.4}",
                        self.instrument,
                        trade.price
                    );
                }
                if let Some(entry) = self.book.entry() {
                    tracing::info!(
                        "[{}] opened {:?} @ {:.4}, stop {:.4} (ATR {:.4})",
                        self.instrument,
                        entry.direction,
                        entry.entry_price,
                        entry.stop_price,
                        atr
                    );
                }
            }
            FillEffect::Added => tracing::info!(
                "[{}] added {} unit(s) @ {:.4}, position {}",
                self.instrument,
                units,
                trade.price,
                self.book.units()
            ),
            FillEffect::Reduced => tracing::info!(
                "[{}] reduced by {} unit(s) @ {:.4}, position {}",
                self.instrument,
                units,
                trade.price,
                self.book.units()
            ),
            FillEffect::Closed => tracing::info!(
                "[{}] position closed @ {:.4}",
                self.instrument,
                trade.price
            ),
        }

        let held = self.book.units().unsigned_abs();
        if held > u64::from(self.config.pyramid_limit) {
            tracing::warn!(
                "[{}] holding {} units, above the pyramid limit of {}",
                self.instrument,
                held,
                self.config.pyramid_limit
            );
        }
    }

    /// Feed the bar everywhere and refresh channels; false while the core
    /// window is still filling
    fn update(&mut self, bar: &Bar) -> bool {
        for unit in self.units.iter_mut() {
            unit.on_bar(bar);
        }
        self.target = self.units.iter().map(|u| u.signal_pos().as_i32()).sum();

        self.history.push(bar.clone());
        if !self.history.inited() {
            return false;
        }

        if self.book.is_flat() {
            self.entry_channel = self.indicator(self.history.donchian(self.config.entry_window));
            self.atr_value = self.indicator(self.history.atr(self.config.atr_window));
        }
        self.exit_channel = self.indicator(self.history.donchian(self.config.exit_window));

        tracing::debug!(
            "[{}] {} close {:.4} target {} entry {:?} exit {:?} atr {:?}",
            self.instrument,
            bar.instant,
            bar.close,
            self.target,
            self.entry_channel,
            self.exit_channel,
            self.atr_value
        );

        true
    }

    fn indicator<T>(&self, value: Result<T, EngineError>) -> Option<T> {
        match value {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!("[{}] skipping decision: {}", self.instrument, e);
                None
            }
        }
    }

    fn work_entry(&mut self, gateway: &mut dyn OrderGateway) {
        let (Some((entry_up, entry_down)), Some(atr)) = (self.entry_channel, self.atr_value) else {
            return;
        };

        self.send_ladder(Side::Buy, entry_up, atr, gateway);
        self.send_ladder(Side::Short, entry_down, atr, gateway);
    }

    fn work_position(&mut self, bar: &Bar, gateway: &mut dyn OrderGateway) {
        if let Some(atr) = self.atr_value {
            if self.target > 0 {
                self.send_ladder(Side::Buy, bar.close, atr, gateway);
            } else if self.target < 0 {
                self.send_ladder(Side::Short, bar.close, atr, gateway);
            }
        }

        let Some((exit_up, exit_down)) = self.exit_channel else {
            return;
        };
        let stop = self.book.entry().map(|e| e.stop_price);
        let quantity = self.book.units().unsigned_abs() as f64 * self.config.fixed_size;

        if self.book.units() > 0 {
            let price = stop.map_or(exit_down, |s| s.max(exit_down));
            self.submit(Side::Sell, price, quantity, gateway);
        } else {
            let price = stop.map_or(exit_up, |s| s.min(exit_up));
            self.submit(Side::Cover, price, quantity, gateway);
        }
    }

    /// Stage up to `pyramid_limit` stop orders from `base`, skipping tiers
    /// already held on that side
    fn send_ladder(&mut self, side: Side, base: f64, atr: f64, gateway: &mut dyn OrderGateway) {
        let (held, sign) = match side {
            Side::Short => (self.book.short_units(), -1.0),
            _ => (self.book.long_units(), 1.0),
        };

        for tier in held..self.config.pyramid_limit {
            let price = base + sign * f64::from(tier) * self.config.pyramid_step_atr * atr;
            self.submit(side, price, self.config.fixed_size, gateway);
        }
    }

    fn submit(&mut self, side: Side, price: f64, quantity: f64, gateway: &mut dyn OrderGateway) {
        if !self.trading() {
            return;
        }

        let intent = OrderIntent {
            instrument: self.instrument.clone(),
            side,
            price,
            quantity,
            conditional: true,
        };

        match gateway.send_order(&intent) {
            Ok(id) => {
                self.active_orders.insert(id);
                tracing::debug!(
                    "[{}] {:?} {} @ {:.4} -> {}",
                    self.instrument,
                    side,
                    quantity,
                    price,
                    id
                );
            }
            Err(e) => tracing::warn!(
                "[{}] {:?} {} @ {:.4} not placed: {}",
                self.instrument,
                side,
                quantity,
                price,
                e
            ),
        }
    }

    fn cancel_all(&mut self, gateway: &mut dyn OrderGateway) {
        match gateway.cancel_all(&self.instrument) {
            Ok(_) => self.active_orders.clear(),
            Err(e) => tracing::warn!("[{}] cancel_all failed: {}", self.instrument, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Interval, SignalValue};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    /// Gateway that records intents and can refuse chosen prices
    #[derive(Default)]
    struct RecordingGateway {
        sent: Vec<OrderIntent>,
        reject_prices: Vec<f64>,
        cancels: usize,
    }

    impl RecordingGateway {
        fn prices(&self, side: Side) -> Vec<f64> {
            self.sent
                .iter()
                .filter(|i| i.side == side)
                .map(|i| i.price)
                .collect()
        }
    }

    impl OrderGateway for RecordingGateway {
        fn send_order(&mut self, intent: &OrderIntent) -> Result<OrderId, EngineError> {
            if self.reject_prices.contains(&intent.price) {
                return Err(EngineError::rejected("test reject"));
            }
            self.sent.push(intent.clone());
            Ok(Uuid::new_v4())
        }

        fn cancel_all(&mut self, _instrument: &str) -> Result<usize, EngineError> {
            self.cancels += 1;
            Ok(0)
        }
    }

    /// Unit with a vote the test sets directly
    struct FixedVote(SignalValue);

    impl SignalUnit for FixedVote {
        fn on_bar(&mut self, _bar: &Bar) {}

        fn signal_pos(&self) -> SignalValue {
            self.0
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn small_config() -> StrategyConfig {
        StrategyConfig {
            entry_window: 3,
            exit_window: 2,
            atr_window: 3,
            window_size: 5,
            signals: Vec::new(),
            ..StrategyConfig::default()
        }
    }

    fn bar(i: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            instant: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::days(i),
            open: close,
            high,
            low,
            close,
            volume: 100.0,
            interval: Interval::Daily,
        }
    }

    fn trade(direction: Direction, price: f64) -> Trade {
        Trade {
            order_id: Uuid::new_v4(),
            price,
            quantity: 1.0,
            direction,
        }
    }

    /// Five bars with high 100, low 98, close 99: entry_up 100, ATR 2
    fn primed(units: Vec<Box<dyn SignalUnit>>) -> (StrategyCore, RecordingGateway) {
        let mut core = StrategyCore::with_units("IF", small_config(), units);
        let mut gw = RecordingGateway::default();
        core.on_start();
        for i in 0..5 {
            core.on_bar(&bar(i, 100.0, 98.0, 99.0), &mut gw);
        }
        (core, gw)
    }

    #[test]
    fn test_no_orders_until_window_inited() {
        let mut core = StrategyCore::with_units("IF", small_config(), Vec::new());
        let mut gw = RecordingGateway::default();
        core.on_start();
        for i in 0..4 {
            core.on_bar(&bar(i, 100.0, 98.0, 99.0), &mut gw);
        }
        assert!(gw.sent.is_empty());
        assert_eq!(gw.cancels, 4);
        assert!(core.entry_channel().is_none());
    }

    #[test]
    fn test_flat_breakout_ladder() {
        let (core, gw) = primed(Vec::new());

        assert_eq!(core.entry_channel(), Some((100.0, 98.0)));
        assert_eq!(core.atr_value(), Some(2.0));
        assert_eq!(gw.prices(Side::Buy), vec![100.0, 101.0, 102.0, 103.0]);
        assert_eq!(gw.prices(Side::Short), vec![98.0, 97.0, 96.0, 95.0]);
        assert!(gw.sent.iter().all(|i| i.conditional && i.quantity == 1.0));
        assert_eq!(core.active_orders(), 8);
    }

    #[test]
    fn test_protective_sell_uses_worse_of_stop_and_channel() {
        let (mut core, mut gw) = primed(Vec::new());

        core.on_trade(&trade(Direction::Long, 99.0));
        core.on_trade(&trade(Direction::Long, 99.0));
        assert_eq!(core.entry_record().unwrap().stop_price, 95.0);

        gw.sent.clear();
        core.on_bar(&bar(5, 100.0, 97.0, 99.0), &mut gw);

        assert_eq!(core.exit_channel(), Some((100.0, 97.0)));
        assert_eq!(gw.sent.len(), 1);
        let sell = &gw.sent[0];
        assert_eq!(sell.side, Side::Sell);
        assert_eq!(sell.price, 97.0);
        assert_eq!(sell.quantity, 2.0);
        assert!(sell.conditional);
    }

    #[test]
    fn test_hard_stop_when_above_channel() {
        let (mut core, mut gw) = primed(Vec::new());
        core.on_trade(&trade(Direction::Long, 102.0)); // stop 98

        gw.sent.clear();
        core.on_bar(&bar(5, 100.0, 96.0, 97.0), &mut gw);
        assert_eq!(gw.prices(Side::Sell), vec![98.0]);
    }

    #[test]
    fn test_short_protective_cover() {
        let (mut core, mut gw) = primed(Vec::new());
        core.on_trade(&trade(Direction::Short, 98.0)); // stop 102

        gw.sent.clear();
        core.on_bar(&bar(5, 101.0, 97.0, 98.0), &mut gw);
        let covers: Vec<&OrderIntent> = gw.sent.iter().filter(|i| i.side == Side::Cover).collect();
        assert_eq!(covers.len(), 1);
        assert_eq!(covers[0].price, 101.0);
        assert_eq!(covers[0].quantity, 1.0);
    }

    #[test]
    fn test_continuation_ladder_skips_held_tiers() {
        let (mut core, mut gw) = primed(vec![Box::new(FixedVote(SignalValue::Long))]);
        core.on_trade(&trade(Direction::Long, 100.0));
        core.on_trade(&trade(Direction::Long, 101.0));

        gw.sent.clear();
        core.on_bar(&bar(5, 104.0, 99.0, 104.0), &mut gw);

        // ATR basis stays at the flat value of 2
        assert_eq!(gw.prices(Side::Buy), vec![106.0, 107.0]);
        assert!(gw.prices(Side::Short).is_empty());
        assert_eq!(gw.prices(Side::Sell).len(), 1);
    }

    #[test]
    fn test_reversal_ladder_when_target_short() {
        let (mut core, mut gw) = primed(vec![
            Box::new(FixedVote(SignalValue::Short)),
            Box::new(FixedVote(SignalValue::Short)),
            Box::new(FixedVote(SignalValue::Long)),
        ]);
        assert_eq!(core.target(), -1);
        core.on_trade(&trade(Direction::Long, 100.0));

        gw.sent.clear();
        core.on_bar(&bar(5, 100.0, 98.0, 99.0), &mut gw);

        assert!(gw.prices(Side::Buy).is_empty());
        assert_eq!(gw.prices(Side::Short), vec![99.0, 98.0, 97.0, 96.0]);
        assert_eq!(gw.prices(Side::Sell).len(), 1);
    }

    #[test]
    fn test_no_fifth_tier() {
        let (mut core, mut gw) = primed(vec![Box::new(FixedVote(SignalValue::Long))]);
        for price in [100.0, 101.0, 102.0, 103.0] {
            core.on_trade(&trade(Direction::Long, price));
        }
        assert_eq!(core.entry_record().unwrap().tier_count, 4);

        gw.sent.clear();
        core.on_bar(&bar(5, 104.0, 99.0, 104.0), &mut gw);
        assert!(gw.prices(Side::Buy).is_empty());
        assert_eq!(gw.prices(Side::Sell).len(), 1);
    }

    #[test]
    fn test_stop_price_survives_adds() {
        let (mut core, _gw) = primed(Vec::new());
        core.on_trade(&trade(Direction::Long, 100.0));
        let stop = core.entry_record().unwrap().stop_price;

        core.on_trade(&trade(Direction::Long, 101.0));
        core.on_trade(&trade(Direction::Long, 102.5));

        let entry = core.entry_record().unwrap();
        assert_eq!(entry.stop_price, stop);
        assert_eq!(entry.stop_price, 96.0);
        assert_eq!(entry.tier_count, 3);
    }

    #[test]
    fn test_exit_clears_entry_record() {
        let (mut core, _gw) = primed(Vec::new());
        core.on_trade(&trade(Direction::Long, 100.0));
        core.on_trade(&trade(Direction::Long, 101.0));

        core.on_trade(&Trade {
            quantity: 2.0,
            ..trade(Direction::Short, 97.0)
        });
        assert_eq!(core.position(), 0);
        assert!(core.entry_record().is_none());
    }

    #[test]
    fn test_fractional_fill_rounds_to_whole_units() {
        let (mut core, _gw) = primed(Vec::new());
        core.on_trade(&Trade {
            quantity: 0.4,
            ..trade(Direction::Long, 100.0)
        });
        assert_eq!(core.position(), 0);
        assert!(core.entry_record().is_none());

        core.on_trade(&Trade {
            quantity: 1.4,
            ..trade(Direction::Long, 100.0)
        });
        assert_eq!(core.position(), 1);
        assert_eq!(core.entry_record().unwrap().tier_count, 1);
    }

    #[test]
    fn test_fill_without_atr_stops_at_entry() {
        let mut core = StrategyCore::with_units("IF", small_config(), Vec::new());
        core.on_start();
        assert!(core.atr_value().is_none());

        core.on_trade(&trade(Direction::Short, 100.0));
        let entry = core.entry_record().unwrap();
        assert_eq!(core.position(), -1);
        assert_eq!(entry.stop_price, entry.entry_price);
    }

    #[test]
    fn test_rejected_tier_does_not_stop_the_rest() {
        let mut core = StrategyCore::with_units("IF", small_config(), Vec::new());
        let mut gw = RecordingGateway {
            reject_prices: vec![101.0],
            ..RecordingGateway::default()
        };
        core.on_start();
        for i in 0..5 {
            core.on_bar(&bar(i, 100.0, 98.0, 99.0), &mut gw);
        }

        assert_eq!(gw.prices(Side::Buy), vec![100.0, 102.0, 103.0]);
        assert_eq!(gw.prices(Side::Short).len(), 4);
    }

    #[test]
    fn test_warmup_sends_nothing() {
        let mut core = StrategyCore::with_units("IF", small_config(), Vec::new());
        let history: Vec<Bar> = (0..10).map(|i| bar(i, 100.0, 98.0, 99.0)).collect();
        core.on_init(&history);

        assert_eq!(core.state(), StrategyState::Inited);
        assert_eq!(core.entry_channel(), Some((100.0, 98.0)));

        let mut gw = RecordingGateway::default();
        core.on_bar(&bar(10, 100.0, 98.0, 99.0), &mut gw);
        assert!(gw.sent.is_empty());
        assert_eq!(gw.cancels, 0);

        core.on_start();
        core.on_bar(&bar(11, 100.0, 98.0, 99.0), &mut gw);
        assert_eq!(gw.sent.len(), 8);

        core.on_stop(&mut gw);
        assert_eq!(core.state(), StrategyState::Stopped);
        assert_eq!(core.active_orders(), 0);
    }

    #[test]
    fn test_order_tracking() {
        let mut core = StrategyCore::with_units("IF", small_config(), Vec::new());
        let id = Uuid::new_v4();

        core.on_order(&OrderUpdate {
            id,
            status: OrderStatus::NotTraded,
        });
        assert_eq!(core.active_orders(), 1);

        core.on_order(&OrderUpdate {
            id,
            status: OrderStatus::Rejected,
        });
        assert_eq!(core.active_orders(), 0);
    }

    #[test]
    fn test_ticks_drive_minute_bars() {
        let mut core = StrategyCore::with_units("IF", small_config(), Vec::new());
        let mut gw = RecordingGateway::default();
        core.on_start();

        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        for minute in 0..6 {
            for (secs, price) in [(5, 99.0), (20, 100.0), (40, 98.0), (55, 99.0)] {
                let tick = Tick {
                    instant: start + Duration::minutes(minute) + Duration::seconds(secs),
                    last_price: price,
                };
                core.dispatch(&Event::Tick(tick), &mut gw);
            }
        }

        // minutes 0..=4 are complete, the fifth finished bar inits the window
        assert_eq!(core.entry_channel(), Some((100.0, 98.0)));
        assert_eq!(gw.prices(Side::Buy), vec![100.0, 101.0, 102.0, 103.0]);
    }

    #[test]
    fn test_new_validates_config() {
        let config = StrategyConfig {
            window_size: 2,
            ..small_config()
        };
        assert!(matches!(
            StrategyCore::new("IF", config),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(StrategyCore::new("IF", StrategyConfig::default()).is_ok());
    }
}
