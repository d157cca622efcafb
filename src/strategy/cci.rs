use super::SignalUnit;
use crate::market::{BarAggregator, IndicatorWindow};
use crate::models::{Bar, SignalValue};

/// CCI threshold vote: LONG at `cci >= level`, SHORT at `cci <= -level`
#[derive(Debug)]
pub struct CciSignal {
    window: usize,
    cci_long: f64,
    cci_short: f64,
    aggregator: BarAggregator,
    history: IndicatorWindow,
    signal: SignalValue,
}

impl CciSignal {
    pub fn new(window: usize, level: f64, bar_window: u32, capacity: usize) -> Self {
        Self {
            window,
            cci_long: level,
            cci_short: -level,
            aggregator: BarAggregator::new(bar_window),
            history: IndicatorWindow::new(capacity),
            signal: SignalValue::Flat,
        }
    }

    fn on_window_bar(&mut self, bar: Bar) {
        self.history.push(bar);

        self.signal = match self.history.cci(self.window) {
            Ok(cci) if cci >= self.cci_long => SignalValue::Long,
            Ok(cci) if cci <= self.cci_short => SignalValue::Short,
            _ => SignalValue::Flat,
        };
    }
}

impl SignalUnit for CciSignal {
    fn on_bar(&mut self, bar: &Bar) {
        if let Some(window_bar) = self.aggregator.update_bar(bar) {
            self.on_window_bar(window_bar);
        }
    }

    fn signal_pos(&self) -> SignalValue {
        self.signal
    }

    fn name(&self) -> &str {
        "cci"
    }
}
