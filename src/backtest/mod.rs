//! Backtest Engine - побаровая симуляция одной позиции по историческим свечам
//! Конфиг, проверка данных, журнал сделок и сам движок

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod validation;

pub use config::BacktestConfig;
pub use engine::{BacktestEngine, BacktestReport, RunStatus};
pub use error::{BacktestError, ConfigError, DataError};
pub use ledger::TradeLedger;
pub use validation::validate_bars;
