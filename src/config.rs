use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::strategy::SignalSpec;

/// Per-instance strategy parameters
///
/// Every strategy core owns its copy; nothing here is shared between
/// instruments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrategyConfig {
    /// Donchian period for breakout entries
    pub entry_window: usize,
    /// Donchian period for channel exits
    pub exit_window: usize,
    pub atr_window: usize,
    /// Quantity of one unit
    pub fixed_size: f64,
    /// Maximum units per side
    pub pyramid_limit: u32,
    /// Ladder spacing in ATRs
    pub pyramid_step_atr: f64,
    /// Hard stop distance from the first fill, in ATRs
    pub stop_atr_multiple: f64,
    /// Bars kept by every indicator window
    pub window_size: usize,
    pub signals: Vec<SignalSpec>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            entry_window: 20,
            exit_window: 10,
            atr_window: 20,
            fixed_size: 1.0,
            pyramid_limit: 4,
            pyramid_step_atr: 0.5,
            stop_atr_multiple: 2.0,
            window_size: 100,
            signals: vec![
                SignalSpec::Rsi {
                    window: 14,
                    level: 20.0,
                    bar_window: 1,
                },
                SignalSpec::Cci {
                    window: 30,
                    level: 10.0,
                    bar_window: 1,
                },
                SignalSpec::DualMa {
                    fast_window: 5,
                    slow_window: 20,
                    fine_window: 5,
                    coarse_window: 15,
                },
            ],
        }
    }
}

impl StrategyConfig {
    /// Longest lookback any indicator of this strategy evaluates
    pub fn max_period(&self) -> usize {
        let own = self
            .entry_window
            .max(self.exit_window)
            .max(self.atr_window + 1);

        self.signals
            .iter()
            .map(SignalSpec::max_period)
            .fold(own, usize::max)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.entry_window == 0 || self.exit_window == 0 || self.atr_window == 0 {
            return Err(EngineError::InvalidConfig(
                "entry, exit and atr windows must be positive".to_string(),
            ));
        }
        if !(self.fixed_size.is_finite() && self.fixed_size > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "fixed_size must be positive, got {}",
                self.fixed_size
            )));
        }
        if self.pyramid_limit == 0 {
            return Err(EngineError::InvalidConfig(
                "pyramid_limit must be at least 1".to_string(),
            ));
        }
        if self.pyramid_step_atr < 0.0 || self.stop_atr_multiple < 0.0 {
            return Err(EngineError::InvalidConfig(
                "ATR multiples cannot be negative".to_string(),
            ));
        }

        for spec in &self.signals {
            let bad_window = match spec {
                SignalSpec::Rsi {
                    window, bar_window, ..
                }
                | SignalSpec::Cci {
                    window, bar_window, ..
                } => *window == 0 || *bar_window == 0,
                SignalSpec::DualMa {
                    fast_window,
                    slow_window,
                    fine_window,
                    coarse_window,
                } => {
                    *fast_window == 0
                        || *slow_window == 0
                        || *fine_window == 0
                        || *coarse_window == 0
                }
            };
            if bad_window {
                return Err(EngineError::InvalidConfig(format!(
                    "signal {:?} has a zero window",
                    spec
                )));
            }
        }

        let needed = self.max_period();
        if self.window_size < needed {
            return Err(EngineError::InvalidConfig(format!(
                "window_size {} is shorter than the longest lookback {}",
                self.window_size, needed
            )));
        }

        Ok(())
    }
}

/// Top-level settings for one engine process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub instrument: String,
    /// tracing-subscriber filter directive
    pub log_filter: String,
    pub strategy: StrategyConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instrument: "SYNTH".to_string(),
            log_filter: "ctabot=info".to_string(),
            strategy: StrategyConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load settings in layers: defaults, optional TOML file, then
    /// `CTABOT__*` environment variables (e.g. `CTABOT__STRATEGY__ENTRY_WINDOW=55`)
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix("CTABOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.strategy.validate()?;
        Ok(config)
    }
}
