use thiserror::Error;

/// Everything that can go wrong inside the engine
///
/// None of these are fatal: the strategy core logs them and skips the
/// decision that depended on the failing piece for the current bar.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("insufficient history for {indicator}: need {needed} bars, have {available}")]
    InsufficientHistory {
        indicator: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("order rejected: {reason}")]
    OrderRejected { reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl EngineError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        EngineError::OrderRejected {
            reason: reason.into(),
        }
    }
}
