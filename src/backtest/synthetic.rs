use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::models::{Bar, Interval};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketScenario {
    /// Steady uptrend with noise (+0.15% per bar on average)
    Uptrend,
    /// Steady downtrend with noise (-0.15% per bar on average)
    Downtrend,
    /// Mean-reverting chop around the base price
    Sideways,
    /// Large random swings (±3% per bar)
    Volatile,
    /// Quiet range for the first 40% of bars, then a strong trend up
    Breakout,
    /// Random walk with every 50th bar missing
    WithGaps,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 6] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
        MarketScenario::Breakout,
        MarketScenario::WithGaps,
    ];
}

/// Generates reproducible OHLCV bars for replaying the engine
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
    start: DateTime<Utc>,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    ///
    /// Bars start at 2024-01-02 09:00 UTC so identical seeds give
    /// identical series, timestamps included.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 3_500.0,
            base_volume: 1_000.0,
            start: Utc
                .with_ymd_and_hms(2024, 1, 2, 9, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }

    /// Generate bars for a specific market scenario
    ///
    /// # Arguments
    /// * `scenario` - The market scenario to simulate
    /// * `num_bars` - Number of bar slots (WithGaps leaves some empty)
    /// * `interval_minutes` - Minutes between bars
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_bars: usize,
        interval_minutes: u32,
    ) -> Vec<Bar> {
        let mut bars = Vec::with_capacity(num_bars);
        let mut price = self.base_price;
        let trend_start = num_bars * 2 / 5;

        for i in 0..num_bars {
            price = match scenario {
                MarketScenario::Uptrend => self.drift(price, 0.0015, 0.002),
                MarketScenario::Downtrend => self.drift(price, -0.0015, 0.002),
                MarketScenario::Sideways => {
                    // 10% pull back to the base each bar
                    let reversion = (self.base_price - price) * 0.1;
                    self.drift(price, 0.0, 0.005) + reversion
                }
                MarketScenario::Volatile => {
                    self.drift(price, 0.0, 0.03).max(self.base_price * 0.5)
                }
                MarketScenario::Breakout if i < trend_start => {
                    let reversion = (self.base_price - price) * 0.2;
                    self.drift(price, 0.0, 0.002) + reversion
                }
                MarketScenario::Breakout => self.drift(price, 0.004, 0.002),
                MarketScenario::WithGaps => self.drift(price, 0.0, 0.005),
            };

            if scenario == MarketScenario::WithGaps && i % 50 == 49 {
                continue;
            }

            let instant =
                self.start + Duration::minutes(i as i64 * i64::from(interval_minutes));
            bars.push(self.create_bar(price, instant, interval_minutes));
        }

        bars
    }

    fn drift(&mut self, price: f64, mean: f64, noise: f64) -> f64 {
        price * (1.0 + mean + self.rng.gen_range(-noise..=noise))
    }

    /// Helper to create a bar around a close price
    fn create_bar(&mut self, close: f64, instant: DateTime<Utc>, interval_minutes: u32) -> Bar {
        let noise_pct = 0.002;

        let high = close * (1.0 + self.rng.gen_range(0.0..noise_pct));
        let low = close * (1.0 - self.rng.gen_range(0.0..noise_pct));
        let open = (close * (1.0 + self.rng.gen_range(-noise_pct..noise_pct))).clamp(low, high);
        let volume = self.base_volume * self.rng.gen_range(0.7..1.3);

        Bar {
            instant,
            open,
            high,
            low,
            close,
            volume,
            interval: Interval::Minutes(interval_minutes),
        }
    }
}
