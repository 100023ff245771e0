pub mod indicators;
pub mod models;
pub mod utils;

// Core simulation
pub mod backtest;
pub mod risk;
pub mod strategy;

// Analytics
pub mod analytics;

pub use backtest::{BacktestConfig, BacktestEngine, BacktestError, BacktestReport, RunStatus};
