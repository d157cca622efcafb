// Directional signal units voting on the strategy's target position
pub mod cci;
pub mod dual_ma;
pub mod rsi;

pub use cci::CciSignal;
pub use dual_ma::DualMaSignal;
pub use rsi::RsiSignal;

use serde::{Deserialize, Serialize};

use crate::models::{Bar, SignalValue};

/// Base trait for all signal units
///
/// A unit owns its own aggregation and history. The strategy core pushes
/// every base bar in and polls the cached vote afterwards.
pub trait SignalUnit: Send {
    /// Feed one base bar and recompute the cached signal
    fn on_bar(&mut self, bar: &Bar);

    /// Cached vote from the last bar
    fn signal_pos(&self) -> SignalValue;

    /// Unit name for logging
    fn name(&self) -> &str;
}

fn default_bar_window() -> u32 {
    1
}

/// Declarative description of one signal unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalSpec {
    Rsi {
        window: usize,
        level: f64,
        #[serde(default = "default_bar_window")]
        bar_window: u32,
    },
    Cci {
        window: usize,
        level: f64,
        #[serde(default = "default_bar_window")]
        bar_window: u32,
    },
    DualMa {
        fast_window: usize,
        slow_window: usize,
        fine_window: u32,
        coarse_window: u32,
    },
}

impl SignalSpec {
    /// Longest indicator period this unit will evaluate
    pub fn max_period(&self) -> usize {
        match self {
            // rsi needs one more close than its period
            SignalSpec::Rsi { window, .. } => window + 1,
            SignalSpec::Cci { window, .. } => *window,
            SignalSpec::DualMa {
                fast_window,
                slow_window,
                ..
            } => (*fast_window).max(*slow_window),
        }
    }

    /// Build the unit with windows of `capacity` bars
    pub fn build(&self, capacity: usize) -> Box<dyn SignalUnit> {
        match *self {
            SignalSpec::Rsi {
                window,
                level,
                bar_window,
            } => Box::new(RsiSignal::new(window, level, bar_window, capacity)),
            SignalSpec::Cci {
                window,
                level,
                bar_window,
            } => Box::new(CciSignal::new(window, level, bar_window, capacity)),
            SignalSpec::DualMa {
                fast_window,
                slow_window,
                fine_window,
                coarse_window,
            } => Box::new(DualMaSignal::new(
                fast_window,
                slow_window,
                fine_window,
                coarse_window,
                capacity,
            )),
        }
    }
}

/// Build every configured unit, preserving order
pub fn build_units(specs: &[SignalSpec], capacity: usize) -> Vec<Box<dyn SignalUnit>> {
    specs.iter().map(|spec| spec.build(capacity)).collect()
}
