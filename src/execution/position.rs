use serde::{Deserialize, Serialize};

use crate::models::Direction;

/// Bookkeeping for the position opened from flat
///
/// The stop is fixed from the ATR basis at the flat-to-open transition;
/// pyramiding adds only raise `tier_count`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EntryRecord {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub tier_count: u32,
}

/// What a fill did to the position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillEffect {
    Opened,
    Added,
    Reduced,
    Closed,
    Reversed,
}

/// Signed unit position plus its entry record
///
/// Invariant: `entry` is Some exactly while `units != 0`.
#[derive(Debug, Clone)]
pub struct PositionBook {
    units: i64,
    entry: Option<EntryRecord>,
    stop_atr_multiple: f64,
}

impl PositionBook {
    pub fn new(stop_atr_multiple: f64) -> Self {
        Self {
            units: 0,
            entry: None,
            stop_atr_multiple,
        }
    }

    /// Signed count of units held
    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn is_flat(&self) -> bool {
        self.units == 0
    }

    pub fn entry(&self) -> Option<&EntryRecord> {
        self.entry.as_ref()
    }

    /// Units held on the long side (0 when short or flat)
    pub fn long_units(&self) -> u32 {
        self.units.max(0) as u32
    }

    /// Units held on the short side (0 when long or flat)
    pub fn short_units(&self) -> u32 {
        (-self.units).max(0) as u32
    }

    /// Apply a fill of `units` in `direction` at `price`
    ///
    /// # Arguments
    /// * `atr_basis` - ATR captured while flat, used only when a new entry opens
    pub fn apply_fill(
        &mut self,
        direction: Direction,
        units: i64,
        price: f64,
        atr_basis: f64,
    ) -> FillEffect {
        let before = self.units;
        let after = before + direction.sign() * units;
        self.units = after;

        let effect = if after == 0 {
            FillEffect::Closed
        } else if before == 0 {
            FillEffect::Opened
        } else if before.signum() != after.signum() {
            FillEffect::Reversed
        } else if after.abs() > before.abs() {
            FillEffect::Added
        } else {
            FillEffect::Reduced
        };

        match effect {
            FillEffect::Closed => self.entry = None,
            FillEffect::Opened | FillEffect::Reversed => {
                self.entry = Some(self.open_entry(after, price, atr_basis));
            }
            FillEffect::Added | FillEffect::Reduced => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.tier_count = after.unsigned_abs() as u32;
                }
            }
        }

        effect
    }

    fn open_entry(&self, units: i64, price: f64, atr_basis: f64) -> EntryRecord {
        let offset = self.stop_atr_multiple * atr_basis;
        let (direction, stop_price) = if units > 0 {
            (Direction::Long, price - offset)
        } else {
            (Direction::Short, price + offset)
        };

        EntryRecord {
            direction,
            entry_price: price,
            stop_price,
            tier_count: units.unsigned_abs() as u32,
        }
    }
}
