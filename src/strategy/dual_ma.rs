use super::SignalUnit;
use crate::market::{BarAggregator, IndicatorWindow};
use crate::models::{Bar, SignalValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Unknown,
    Up,
    Down,
}

/// Two-timeframe moving-average vote
///
/// The coarse timeframe sets the trend each time it completes a bar
/// (`fast > slow` is up). The fine timeframe votes in the trend's direction
/// only while its own fast average agrees; anything else is FLAT.
#[derive(Debug)]
pub struct DualMaSignal {
    fast_window: usize,
    slow_window: usize,
    fine: BarAggregator,
    fine_history: IndicatorWindow,
    coarse: BarAggregator,
    coarse_history: IndicatorWindow,
    trend: Trend,
    signal: SignalValue,
}

impl DualMaSignal {
    pub fn new(
        fast_window: usize,
        slow_window: usize,
        fine_window: u32,
        coarse_window: u32,
        capacity: usize,
    ) -> Self {
        Self {
            fast_window,
            slow_window,
            fine: BarAggregator::new(fine_window),
            fine_history: IndicatorWindow::new(capacity),
            coarse: BarAggregator::new(coarse_window),
            coarse_history: IndicatorWindow::new(capacity),
            trend: Trend::Unknown,
            signal: SignalValue::Flat,
        }
    }

    fn averages(history: &IndicatorWindow, fast: usize, slow: usize) -> Option<(f64, f64)> {
        let fast_ma = history.sma(fast).ok()?;
        let slow_ma = history.sma(slow).ok()?;
        Some((fast_ma, slow_ma))
    }

    fn on_fine_bar(&mut self, bar: Bar) {
        self.fine_history.push(bar);

        let averages = Self::averages(&self.fine_history, self.fast_window, self.slow_window);
        self.signal = match (self.trend, averages) {
            (Trend::Up, Some((fast, slow))) if fast > slow => SignalValue::Long,
            (Trend::Down, Some((fast, slow))) if fast < slow => SignalValue::Short,
            _ => SignalValue::Flat,
        };
    }

    fn on_coarse_bar(&mut self, bar: Bar) {
        self.coarse_history.push(bar);

        if let Some((fast, slow)) =
            Self::averages(&self.coarse_history, self.fast_window, self.slow_window)
        {
            let trend = if fast > slow { Trend::Up } else { Trend::Down };
            if trend != self.trend {
                tracing::debug!(
                    "dual_ma trend {:?} -> {:?} (fast {:.4}, slow {:.4})",
                    self.trend,
                    trend,
                    fast,
                    slow
                );
            }
            self.trend = trend;
        }
    }
}

impl SignalUnit for DualMaSignal {
    fn on_bar(&mut self, bar: &Bar) {
        // fine first: a bar closing both windows is judged on the old trend
        if let Some(fine_bar) = self.fine.update_bar(bar) {
            self.on_fine_bar(fine_bar);
        }
        if let Some(coarse_bar) = self.coarse.update_bar(bar) {
            self.on_coarse_bar(coarse_bar);
        }
    }

    fn signal_pos(&self) -> SignalValue {
        self.signal
    }

    fn name(&self) -> &str {
        "dual_ma"
    }
}
