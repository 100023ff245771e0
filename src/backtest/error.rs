//! Ошибки бэктеста: конфиг, входные данные, сбой стратегии

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::strategy::StrategyError;

/// Ошибки конфигурации, поднимаются до старта прогона
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("initial_capital must be > 0, got {0}")]
    NonPositiveCapital(f64),

    #[error("commission_pct must be >= 0, got {0}")]
    NegativeCommission(f64),

    #[error("{field}: window must be > 0")]
    ZeroWindow { field: &'static str },

    #[error("{field}: invalid value {value}")]
    InvalidValue { field: &'static str, value: f64 },

    #[error("{0}")]
    Invalid(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Битые входные бары, отклоняются до цикла
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    #[error("bar {index}: timestamp {timestamp} is not after previous {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("bar {index}: {field} is not a finite positive price ({value})")]
    InvalidPrice {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("bar {index}: high {high} is below low {low}")]
    InvertedRange { index: usize, high: f64, low: f64 },

    #[error("bar {index}: volume is not a finite non-negative number ({value})")]
    InvalidVolume { index: usize, value: f64 },
}

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("market data error: {0}")]
    Data(#[from] DataError),

    /// Стратегия упала посреди прогона; частичный журнал остаётся в движке
    #[error("strategy fault at bar {index}: {source}")]
    Strategy {
        index: usize,
        #[source]
        source: StrategyError,
    },
}

impl BacktestError {
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, BacktestError::Config(_))
    }

    /// Категория для отчёта: `config`, `market_data`, `strategy`
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            BacktestError::Config(_) => "config",
            BacktestError::Data(_) => "market_data",
            BacktestError::Strategy { .. } => "strategy",
        }
    }
}
