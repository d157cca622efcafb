use super::SignalUnit;
use crate::market::{BarAggregator, IndicatorWindow};
use crate::models::{Bar, SignalValue};

/// RSI threshold vote
///
/// LONG when `rsi >= 50 + level`, SHORT when `rsi <= 50 - level`.
#[derive(Debug)]
pub struct RsiSignal {
    window: usize,
    rsi_long: f64,
    rsi_short: f64,
    aggregator: BarAggregator,
    history: IndicatorWindow,
    signal: SignalValue,
}

impl RsiSignal {
    /// # Arguments
    /// * `window` - RSI period
    /// * `level` - Distance from 50 that counts as a vote
    /// * `bar_window` - Base bars per evaluated bar (1 = native bars)
    /// * `capacity` - History kept for the indicator
    pub fn new(window: usize, level: f64, bar_window: u32, capacity: usize) -> Self {
        Self {
            window,
            rsi_long: 50.0 + level,
            rsi_short: 50.0 - level,
            aggregator: BarAggregator::new(bar_window),
            history: IndicatorWindow::new(capacity),
            signal: SignalValue::Flat,
        }
    }

    fn on_window_bar(&mut self, bar: Bar) {
        self.history.push(bar);

        self.signal = match self.history.rsi(self.window) {
            Ok(rsi) if rsi >= self.rsi_long => SignalValue::Long,
            Ok(rsi) if rsi <= self.rsi_short => SignalValue::Short,
            Ok(_) => SignalValue::Flat,
            Err(_) => SignalValue::Flat,
        };
    }
}

impl SignalUnit for RsiSignal {
    fn on_bar(&mut self, bar: &Bar) {
        if let Some(window_bar) = self.aggregator.update_bar(bar) {
            self.on_window_bar(window_bar);
        }
    }

    fn signal_pos(&self) -> SignalValue {
        self.signal
    }

    fn name(&self) -> &str {
        "rsi"
    }
}
