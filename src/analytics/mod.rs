//! Аналитика прогона: сводка по журналу сделок и просадка по кривой капитала

pub mod drawdown;
pub mod performance;

pub use drawdown::{DrawdownStats, drawdown_series};
pub use performance::PerformanceSummary;
