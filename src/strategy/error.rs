//! Ошибки стратегии. Любая из них прерывает прогон.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StrategyError {
    #[error("invalid strategy state: {0}")]
    InvalidState(String),

    #[error("invalid signal: {0}")]
    InvalidSignal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StrategyError::InvalidSignal("score is NaN".to_string());
        assert_eq!(err.to_string(), "invalid signal: score is NaN");
    }
}
