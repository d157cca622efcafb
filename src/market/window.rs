use std::collections::VecDeque;

use crate::error::EngineError;
use crate::indicators::{
    calculate_atr, calculate_cci, calculate_donchian, calculate_rsi, calculate_sma,
};
use crate::models::Bar;

/// Fixed-capacity rolling history of bars
///
/// Keeps the most recent `capacity` bars in arrival order and computes
/// indicators lazily over them. Accessors refuse to answer until the window
/// has been filled once (`inited`).
#[derive(Debug)]
pub struct IndicatorWindow {
    bars: VecDeque<Bar>,
    capacity: usize,
    inited: bool,
}

impl IndicatorWindow {
    /// Create a new window
    ///
    /// # Arguments
    /// * `capacity` - Number of bars kept; a capacity of 0 is treated as 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            bars: VecDeque::with_capacity(capacity + 1),
            capacity,
            inited: false,
        }
    }

    /// Append a bar, evicting the oldest one on overflow
    pub fn push(&mut self, bar: Bar) {
        self.bars.push_back(bar);

        while self.bars.len() > self.capacity {
            self.bars.pop_front();
        }

        // keep storage contiguous so indicators can borrow one slice
        self.bars.make_contiguous();

        if self.bars.len() == self.capacity {
            self.inited = true;
        }
    }

    pub fn inited(&self) -> bool {
        self.inited
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent bar
    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// Bars in arrival order
    pub fn bars(&self) -> &[Bar] {
        self.bars.as_slices().0
    }

    /// Mean of the last `n` closes
    pub fn sma(&self, n: usize) -> Result<f64, EngineError> {
        let closes = self.closes("sma", n)?;
        calculate_sma(&closes, n).ok_or_else(|| self.insufficient("sma", n))
    }

    /// Simple-average RSI over the last `n` close changes
    pub fn rsi(&self, n: usize) -> Result<f64, EngineError> {
        let closes = self.closes("rsi", n + 1)?;
        calculate_rsi(&closes, n).ok_or_else(|| self.insufficient("rsi", n + 1))
    }

    /// Mean true range over the last `n` bars
    pub fn atr(&self, n: usize) -> Result<f64, EngineError> {
        let bars = self.require("atr", n + 1)?;
        calculate_atr(bars, n).ok_or_else(|| self.insufficient("atr", n + 1))
    }

    pub fn cci(&self, n: usize) -> Result<f64, EngineError> {
        let bars = self.require("cci", n)?;
        calculate_cci(bars, n).ok_or_else(|| self.insufficient("cci", n))
    }

    /// (highest high, lowest low) over the last `n` bars
    pub fn donchian(&self, n: usize) -> Result<(f64, f64), EngineError> {
        let bars = self.require("donchian", n)?;
        calculate_donchian(bars, n).ok_or_else(|| self.insufficient("donchian", n))
    }

    fn closes(&self, indicator: &'static str, needed: usize) -> Result<Vec<f64>, EngineError> {
        let bars = self.require(indicator, needed)?;
        Ok(bars.iter().map(|b| b.close).collect())
    }

    fn require(&self, indicator: &'static str, needed: usize) -> Result<&[Bar], EngineError> {
        if !self.inited || needed == 0 || needed > self.bars.len() {
            return Err(self.insufficient(indicator, needed));
        }
        Ok(self.bars())
    }

    fn insufficient(&self, indicator: &'static str, needed: usize) -> EngineError {
        EngineError::InsufficientHistory {
            indicator,
            needed: if self.inited {
                needed
            } else {
                needed.max(self.capacity)
            },
            available: self.bars.len(),
        }
    }
}
